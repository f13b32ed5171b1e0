//! Concurrent GetFeatureInfo queries for a map click.
//!
//! Every active date-bearing layer is queried at once. A failing layer is
//! logged and left out of the merged result instead of failing the click.
//! Each click takes a fresh token; a batch that finishes after a newer click
//! started is reported as superseded so its popup is never shown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use floodwatch_common::{FloodwatchError, FloodwatchResult};
use floodwatch_wms::{classify_response, Feature, FeatureInfoBody};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::http::HttpFetcher;
use crate::session::LayerRequest;

/// Popup placeholder when no queried layer returned features.
pub const NO_DATA_MESSAGE: &str = "No flood impact data at this location";

/// Hint shown under the placeholder.
pub const NO_DATA_HINT: &str = "Try clicking on a colored area of an active impact layer";

/// Features returned by one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerFeatures {
    pub layer_name: String,
    /// Card heading, e.g. `Total People Affected - 2025-06-24`
    pub title: String,
    /// Resolved `QUERY_LAYERS` value the features came from
    pub layer_param: String,
    pub features: Vec<Feature>,
}

/// Result of a click query batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Features {
        layers: Vec<LayerFeatures>,
    },
    NoData {
        message: String,
        hint: String,
        /// Clicked location as (longitude, latitude)
        coordinates: (f64, f64),
    },
    /// A newer click started before this batch completed
    Superseded,
}

impl ClickOutcome {
    pub fn feature_count(&self) -> usize {
        match self {
            ClickOutcome::Features { layers } => layers.iter().map(|l| l.features.len()).sum(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClickQueryClient {
    fetcher: HttpFetcher,
    latest: Arc<AtomicU64>,
}

impl ClickQueryClient {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self {
            fetcher,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a new click, invalidating every batch still in flight.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `token` belongs to the most recent click.
    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    /// Query every layer for one click and merge the results.
    #[instrument(skip(self, requests), fields(layers = requests.len()))]
    pub async fn query(
        &self,
        requests: Vec<LayerRequest>,
        coordinates: (f64, f64),
    ) -> ClickOutcome {
        let token = self.begin();
        self.query_with_token(token, requests, coordinates).await
    }

    /// Run a batch under a token taken earlier with [`begin`](Self::begin).
    pub async fn query_with_token(
        &self,
        token: u64,
        requests: Vec<LayerRequest>,
        coordinates: (f64, f64),
    ) -> ClickOutcome {
        let results = join_all(requests.iter().map(|r| self.query_layer(r))).await;

        if !self.is_current(token) {
            debug!(token, "Discarding results of superseded click");
            return ClickOutcome::Superseded;
        }

        let layers: Vec<LayerFeatures> = requests
            .iter()
            .zip(results)
            .filter_map(|(request, result)| match result {
                Ok(layer) => Some(layer),
                Err(e) => {
                    warn!(
                        layer = %request.request.layer_param,
                        error = %e,
                        "Feature info query failed, excluding layer"
                    );
                    None
                }
            })
            .filter(|layer| !layer.features.is_empty())
            .collect();

        if layers.is_empty() {
            info!(lon = coordinates.0, lat = coordinates.1, "No features at click location");
            return ClickOutcome::NoData {
                message: NO_DATA_MESSAGE.to_string(),
                hint: NO_DATA_HINT.to_string(),
                coordinates,
            };
        }

        ClickOutcome::Features { layers }
    }

    async fn query_layer(&self, request: &LayerRequest) -> FloodwatchResult<LayerFeatures> {
        let body = self.fetcher.get_text(&request.request.url).await?;

        let features = match classify_response(&body) {
            FeatureInfoBody::Features(features) => features,
            FeatureInfoBody::NoResults => Vec::new(),
            FeatureInfoBody::ServiceException(message) => {
                return Err(FloodwatchError::ServiceException(message));
            }
        };

        debug!(
            layer = %request.request.layer_param,
            features = features.len(),
            "Parsed feature info"
        );

        Ok(LayerFeatures {
            layer_name: request.layer_name.clone(),
            title: request.title.clone(),
            layer_param: request.request.layer_param.clone(),
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpConfig;

    fn client() -> ClickQueryClient {
        ClickQueryClient::new(HttpFetcher::new(HttpConfig::default()).unwrap())
    }

    #[test]
    fn test_tokens_are_monotonic() {
        let client = client();
        let first = client.begin();
        let second = client.begin();
        assert!(second > first);
        assert!(!client.is_current(first));
        assert!(client.is_current(second));
    }

    #[tokio::test]
    async fn test_empty_batch_is_no_data() {
        let outcome = client().query(Vec::new(), (36.8, -1.3)).await;
        match outcome {
            ClickOutcome::NoData { message, coordinates, .. } => {
                assert_eq!(message, NO_DATA_MESSAGE);
                assert_eq!(coordinates, (36.8, -1.3));
            }
            other => panic!("Expected no data, got {:?}", other),
        }
    }
}
