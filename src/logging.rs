//! Logging context handed through chains, results and buffers.

use std::sync::Arc;
use tracing::Span;

/// Names the realm a processing pipeline logs under.
///
/// Every buffer, driver thread and worker unit of a pipeline logs inside a
/// `processing` span tagged with this realm, so output of concurrently
/// running pipelines can be told apart.
#[derive(Clone, Debug)]
pub struct LogContext {
    realm: Arc<str>,
}

impl LogContext {
    #[must_use]
    pub fn new(realm: impl AsRef<str>) -> Self {
        Self { realm: Arc::from(realm.as_ref()) }
    }

    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// A span to run background work of this pipeline in.
    pub fn span(&self) -> Span {
        tracing::debug_span!("processing", realm = %self.realm)
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new("processing")
    }
}
