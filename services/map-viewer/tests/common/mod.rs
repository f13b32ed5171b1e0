//! In-process mock of the MapServer CGI and the static station asset.
//!
//! Behavior of `/cgi-bin/mapserv` by `QUERY_LAYERS`:
//! - `popafftot_%date%`: two features when `date=20250624` and
//!   `datetime=202506240000`, a service exception otherwise
//! - `healthtot_%date%`: no results
//! - anything else: HTTP 500
//!
//! Requests with `map=/slow.map` are answered after [`SLOW_RESPONSE`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use floodwatch_wms::WmsEndpoints;
use test_utils::{station_collection, GFI_NO_RESULTS, GFI_SERVICE_EXCEPTION, GFI_TWO_FEATURES};

pub const SLOW_RESPONSE: Duration = Duration::from_millis(300);

/// Station requests answered with 503 before the asset is served.
const FLAKY_FAILURES: usize = 2;

#[derive(Default)]
pub struct MockState {
    pub station_hits: AtomicUsize,
    pub flaky_hits: AtomicUsize,
    pub queries: Mutex<Vec<HashMap<String, String>>>,
}

impl MockState {
    pub fn station_hits(&self) -> usize {
        self.station_hits.load(Ordering::SeqCst)
    }

    pub fn flaky_hits(&self) -> usize {
        self.flaky_hits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.queries.lock().unwrap().clone()
    }
}

pub struct MockWms {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockWms {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/cgi-bin/mapserv", get(mapserv))
            .route("/data/stations.geojson", get(stations))
            .route("/flaky/stations.geojson", get(flaky_stations))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Endpoints routing click queries to this server.
    pub fn endpoints(&self, mapfile: &str) -> WmsEndpoints {
        WmsEndpoints {
            mapserver: format!("{}/cgi-bin/mapserv", self.base_url),
            mapfile: mapfile.to_string(),
            ..WmsEndpoints::default()
        }
    }
}

async fn mapserv(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.queries.lock().unwrap().push(params.clone());

    if params.get("map").map(String::as_str) == Some("/slow.map") {
        tokio::time::sleep(SLOW_RESPONSE).await;
    }

    match params.get("QUERY_LAYERS").map(String::as_str) {
        Some("popafftot_%date%") => {
            let dated = params.get("date").map(String::as_str) == Some("20250624")
                && params.get("datetime").map(String::as_str) == Some("202506240000");
            if dated {
                (StatusCode::OK, GFI_TWO_FEATURES.to_string())
            } else {
                (StatusCode::OK, GFI_SERVICE_EXCEPTION.to_string())
            }
        }
        Some("healthtot_%date%") => (StatusCode::OK, GFI_NO_RESULTS.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "mapserv failed".to_string()),
    }
}

async fn stations(State(state): State<Arc<MockState>>) -> String {
    state.station_hits.fetch_add(1, Ordering::SeqCst);
    station_collection(3).to_string()
}

async fn flaky_stations(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst);
    if hit < FLAKY_FAILURES {
        (StatusCode::SERVICE_UNAVAILABLE, String::new())
    } else {
        (StatusCode::OK, station_collection(2).to_string())
    }
}
