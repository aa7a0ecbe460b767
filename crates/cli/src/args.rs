//! Command-line arguments.
//!
//! Flags that map onto [`AppConfig`](macmodels_core::config::AppConfig) fields
//! serialize only when given, so they override file and environment settings
//! without masking them.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

/// Check and store product information.
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "update-products", version)]
pub struct Args {
    /// Starting product code.
    #[arg(default_value = "000")]
    #[serde(skip)]
    pub start: String,

    /// Ending product code (inclusive).
    #[arg(default_value = "0ZZZ")]
    #[serde(skip)]
    pub end: String,

    /// Recheck all products, including ones with a known name.
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,

    /// Recheck unknown products older than this many days.
    #[arg(long, value_name = "DAYS")]
    #[serde(rename = "retention_days", skip_serializing_if = "Option::is_none")]
    pub retention: Option<u32>,

    /// Save every N products while lookups keep failing.
    #[arg(long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savenum: Option<u32>,

    /// Merge the specified database into the main one and exit.
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub merge: Option<PathBuf>,

    /// Use the specified database file.
    #[arg(long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}
