// src/lib.rs
//! Scrapes per-game player statistics ("gamelogs") from basketball-reference.
//!
//! `extractors` is the pure part: it reads a parsed page and returns the
//! gamelog table and player name. `bbref`, `pipeline` and `storage` fetch
//! pages and write the results out.

pub mod bbref;
pub mod extractors;
pub mod pipeline;
pub mod storage;
pub mod utils;
