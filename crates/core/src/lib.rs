//! Core types and shared functionality for macmodels.
//!
//! This crate provides:
//! - Product code enumeration (`codec`)
//! - The record database and its compressed file store
//! - The re-query policy, the crawl driver and database merging
//! - Unified error types
//! - Configuration structures

pub mod codec;
pub mod config;
pub mod crawler;
pub mod error;
pub mod merge;
pub mod policy;
pub mod record;
pub mod resolver;
pub mod store;

pub use crawler::{CrawlSettings, CrawlStats, Crawler, IdRange, Visit};
pub use error::Error;
pub use merge::{MergeReport, merge, merge_file};
pub use record::{Database, Record, Status};
pub use resolver::{Lookup, LookupFailure, Resolver};
