// src/bbref/mod.rs
pub mod client;
pub mod crawl;
pub mod links;
pub mod models;

pub use crawl::Crawler;
pub use models::{CrawlSettings, RunSummary};
