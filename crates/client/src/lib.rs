//! Client code for macmodels.
//!
//! This crate provides the HTTP resolver that looks product codes up on the
//! support site, implementing the core [`Resolver`](macmodels_core::Resolver) trait.

pub mod support;

pub use support::{LookupError, SupportClient, SupportConfig, parse_product, random_user_agent};
