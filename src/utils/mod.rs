// src/utils/mod.rs
pub mod diagnostics;
pub mod error;
pub mod html_debug;
pub mod logging;

pub use diagnostics::{CollectingDiagnostics, Diagnostics, TracingDiagnostics};
pub use error::AppError; // Re-export main error type for convenience
