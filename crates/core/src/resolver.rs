//! Remote lookup seam.

use async_trait::async_trait;

/// Answer from the lookup service for one product code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The code resolved to a product name.
    Found(String),
    /// The code is known but has no name yet.
    Pending,
    /// The service does not know the code.
    NotFound,
}

/// A lookup that could not be completed (transport, HTTP or parse failure).
///
/// The message is stored verbatim as the record's exception detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LookupFailure(pub String);

/// Resolves product codes against a remote service.
///
/// Implementations must report a well-formed "unknown code" answer as
/// [`Lookup::NotFound`], and reserve `Err` for genuine failures.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, id: &str) -> Result<Lookup, LookupFailure>;
}
