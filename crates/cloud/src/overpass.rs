//! Async client for the Overpass API.
//!
//! Queries the public Overpass instances (or any compatible endpoint) for
//! points of interest and building footprints inside a bounding box.

use std::fmt;
use std::time::Duration;

use futures::stream::{FuturesOrdered, StreamExt};
use landmix_core::{BoundingBox, RawRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{CloudError, Result};
use crate::models::OverpassResponse;

// ---------------------------------------------------------------------------
// Endpoint enum
// ---------------------------------------------------------------------------

/// Well-known Overpass instances plus custom endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverpassEndpoint {
    /// The main instance at overpass-api.de.
    #[default]
    Main,
    /// The Kumi Systems mirror.
    Kumi,
    /// Any Overpass interpreter URL.
    Custom(String),
}

impl OverpassEndpoint {
    /// Full interpreter URL for this endpoint.
    pub fn url(&self) -> &str {
        match self {
            Self::Main => "https://overpass-api.de/api/interpreter",
            Self::Kumi => "https://overpass.kumi.systems/api/interpreter",
            Self::Custom(url) => url,
        }
    }

    /// Parse a shorthand string into an endpoint.
    ///
    /// Recognized shorthands: `"main"`, `"de"`, `"kumi"`. Anything else is
    /// treated as a custom URL.
    pub fn from_str_or_url(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "main" | "de" | "overpass-api" => Self::Main,
            "kumi" | "kumi-systems" => Self::Kumi,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl fmt::Display for OverpassEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// An Overpass QL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassQuery {
    text: String,
}

impl OverpassQuery {
    /// Points of interest: shops, amenities, leisure, stations, sport,
    /// healthcare, crafts, public transport stops and cultural tourism.
    pub fn amenities(bbox: &BoundingBox) -> Self {
        let b = bbox.to_overpass();
        let text = format!(
            r#"[out:json];
(
    nwr[shop][!leisure]({b});
    nwr[amenity][!leisure]({b});
    nwr[leisure][!amenity]({b});
    nwr[railway~"station"]({b});
    nwr[sport][!shop][!amenity]({b});
    nwr[healthcare][!amenity]({b});
    nwr[craft][!amenity]({b});
    node[public_transport][!railway]({b});
    nwr[tourism~"gallery|theme_park|zoo|museum|aquarium"]({b});
);
out geom;"#
        );
        Self { text }
    }

    /// Building footprints (ways and relations).
    pub fn buildings(bbox: &BoundingBox) -> Self {
        let b = bbox.to_overpass();
        let text = format!(
            r#"[out:json];
(
    way[building]({b});
    relation[building]({b});
);
out geom;"#
        );
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`OverpassClient`].
#[derive(Debug, Clone)]
pub struct OverpassClientOptions {
    /// Per-request timeout (default 60 s).
    pub request_timeout: Duration,
    /// Maximum retries on transient failures (default 3).
    pub max_retries: u32,
}

impl Default for OverpassClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async Overpass client.
pub struct OverpassClient {
    endpoint: OverpassEndpoint,
    client: reqwest::Client,
    options: OverpassClientOptions,
}

impl OverpassClient {
    /// Create a new client.
    pub fn new(endpoint: OverpassEndpoint, options: OverpassClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .user_agent(concat!("landmix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            client,
            options,
        })
    }

    /// The endpoint this client is configured for.
    pub fn endpoint(&self) -> &OverpassEndpoint {
        &self.endpoint
    }

    pub fn options(&self) -> &OverpassClientOptions {
        &self.options
    }

    /// Run a query and decode the JSON response.
    ///
    /// A response the server marked as partial is an error; its elements
    /// are discarded.
    pub async fn query(&self, query: &OverpassQuery) -> Result<OverpassResponse> {
        let body = self.execute_with_retry(query).await?;
        let response: OverpassResponse = serde_json::from_str(&body)?;

        if response.is_partial() {
            let remark = response.remark.unwrap_or_default();
            warn!(%remark, elements = response.elements.len(), "discarding partial Overpass response");
            return Err(CloudError::Partial(remark));
        }
        debug!(elements = response.elements.len(), "Overpass response decoded");
        Ok(response)
    }

    /// [`query`](Self::query) that stops early with [`CloudError::Cancelled`]
    /// once `cancel` fires.
    pub async fn query_cancellable(
        &self,
        query: &OverpassQuery,
        cancel: &CancellationToken,
    ) -> Result<OverpassResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CloudError::Cancelled),
            result = self.query(query) => result,
        }
    }

    /// Points of interest inside `bbox`.
    pub async fn fetch_amenities(&self, bbox: &BoundingBox) -> Result<Vec<RawRecord>> {
        Ok(self.query(&OverpassQuery::amenities(bbox)).await?.elements)
    }

    /// Building footprints inside `bbox`.
    pub async fn fetch_buildings(&self, bbox: &BoundingBox) -> Result<Vec<RawRecord>> {
        Ok(self.query(&OverpassQuery::buildings(bbox)).await?.elements)
    }

    /// Fetch points of interest for several areas concurrently.
    ///
    /// Returns one result per bounding box, in the same order; one failure
    /// does not affect the others.
    pub async fn fetch_many(&self, bboxes: &[BoundingBox]) -> Vec<Result<Vec<RawRecord>>> {
        let mut futs = FuturesOrdered::new();
        for bbox in bboxes {
            futs.push_back(self.fetch_amenities(bbox));
        }

        let mut results = Vec::with_capacity(bboxes.len());
        while let Some(res) = futs.next().await {
            results.push(res);
        }
        results
    }

    /// GET the query with exponential backoff retry.
    ///
    /// Transport failures, 5xx and 429 are retried; any other non-success
    /// status fails immediately.
    async fn execute_with_retry(&self, query: &OverpassQuery) -> Result<String> {
        let url = self.endpoint.url();
        let mut last_err = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let backoff_ms = 500u64 * 2u64.pow(attempt - 1);
                debug!(attempt, backoff_ms, "retrying Overpass request");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }

            let resp = match self
                .client
                .get(url)
                .query(&[("data", query.as_str())])
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() => {
                    last_err = Some(CloudError::Timeout(self.options.request_timeout));
                    continue;
                }
                Err(e) if e.is_connect() || e.is_request() => {
                    last_err = Some(CloudError::Http(e));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = resp.status();
            if status.is_success() {
                return match resp.text().await {
                    Ok(body) => Ok(body),
                    Err(e) if e.is_timeout() => Err(CloudError::Timeout(self.options.request_timeout)),
                    Err(e) => Err(e.into()),
                };
            }

            let err = CloudError::Network(format!("HTTP {status} from {url}"));
            if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!(%status, attempt, "Overpass request failed");
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_err.unwrap_or_else(|| CloudError::Network(format!("no response from {url}"))))
    }
}
