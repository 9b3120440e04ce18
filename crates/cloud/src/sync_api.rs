//! Blocking (synchronous) API for native platforms.
//!
//! Wraps the async [`OverpassClient`] with a Tokio runtime so the pipeline,
//! which is synchronous, can use it as a [`RecordSource`].

#[cfg(feature = "native")]
mod inner {
    use landmix_core::{BoundingBox, RawRecord, RecordSource};
    use tokio_util::sync::CancellationToken;

    use crate::error::{CloudError, Result};
    use crate::models::OverpassResponse;
    use crate::overpass::{OverpassClient, OverpassClientOptions, OverpassEndpoint, OverpassQuery};

    /// Blocking wrapper around [`OverpassClient`].
    ///
    /// Uses an internal single-threaded Tokio runtime. Every query observes
    /// the source's cancellation token.
    pub struct OverpassSource {
        rt: tokio::runtime::Runtime,
        inner: OverpassClient,
        cancel: CancellationToken,
    }

    impl OverpassSource {
        /// Create a new blocking source.
        pub fn new(endpoint: OverpassEndpoint, options: OverpassClientOptions) -> Result<Self> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| CloudError::Network(e.to_string()))?;

            let inner = OverpassClient::new(endpoint, options)?;
            Ok(Self {
                rt,
                inner,
                cancel: CancellationToken::new(),
            })
        }

        /// Share a cancellation token with the caller; cancelling it aborts
        /// in-flight and future queries with [`CloudError::Cancelled`].
        pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
            self.cancel = cancel;
            self
        }

        /// Run a query (blocking).
        pub fn query(&self, query: &OverpassQuery) -> Result<OverpassResponse> {
            self.rt.block_on(self.inner.query_cancellable(query, &self.cancel))
        }

        /// Fetch points of interest for several areas concurrently (blocking).
        pub fn fetch_many(&self, bboxes: &[BoundingBox]) -> Vec<Result<Vec<RawRecord>>> {
            self.rt.block_on(self.inner.fetch_many(bboxes))
        }
    }

    impl RecordSource for OverpassSource {
        fn fetch_amenities(&self, bbox: &BoundingBox) -> landmix_core::Result<Vec<RawRecord>> {
            Ok(self.query(&OverpassQuery::amenities(bbox))?.elements)
        }

        fn fetch_buildings(&self, bbox: &BoundingBox) -> landmix_core::Result<Vec<RawRecord>> {
            Ok(self.query(&OverpassQuery::buildings(bbox))?.elements)
        }
    }
}

#[cfg(feature = "native")]
pub use inner::*;
