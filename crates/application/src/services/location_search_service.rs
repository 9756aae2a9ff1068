//! Debounced address search
//!
//! Turns keystrokes into at most one geocoding lookup per quiet period and
//! guarantees that only the most recently issued lookup can update the
//! visible candidate list. Lookup failures are absorbed: the caller simply
//! sees no suggestions.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use domain::{CURRENT_LOCATION_LABEL, Coordinate, LocationCandidate, RequestState};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::debounce::Debouncer;
use super::request_sequence::{RequestSequence, RequestTicket};
use crate::ports::GeocodingPort;

/// Configuration for the location search service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a lookup starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Queries shorter than this (in characters, after trimming) never hit the network
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Maximum number of candidates requested per lookup
    #[serde(default = "default_max_results")]
    pub max_results: u8,
}

const fn default_debounce_ms() -> u64 {
    300
}

const fn default_min_query_chars() -> usize {
    3
}

const fn default_max_results() -> u8 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    /// Quiet period as a [`Duration`]
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_results == 0 {
            return Err("max_results must be greater than 0".to_string());
        }

        if self.max_results > 50 {
            return Err("max_results must be 50 or less".to_string());
        }

        Ok(())
    }
}

/// Observable state of a search stream
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchSnapshot {
    /// Raw input, echoed immediately
    pub query: String,
    /// Input that last survived the quiet period; only this drives lookups
    pub debounced_query: String,
    /// Result of the most recent applicable lookup
    pub candidates: Vec<LocationCandidate>,
    /// Whether the current lookup is in flight
    pub loading: bool,
}

struct SearchInner {
    geocoder: Arc<dyn GeocodingPort>,
    config: SearchConfig,
    state: watch::Sender<SearchSnapshot>,
    sequence: RequestSequence,
}

/// Address search with debouncing and last-wins result handling
pub struct LocationSearchService {
    inner: Arc<SearchInner>,
    debouncer: Debouncer,
}

impl std::fmt::Debug for LocationSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSearchService")
            .field("geocoder", &"<GeocodingPort>")
            .field("config", &self.inner.config)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl LocationSearchService {
    /// Create a search service with default configuration
    #[must_use]
    pub fn new(geocoder: Arc<dyn GeocodingPort>) -> Self {
        Self::with_config(geocoder, SearchConfig::default())
    }

    /// Create a search service with custom configuration
    #[must_use]
    pub fn with_config(geocoder: Arc<dyn GeocodingPort>, config: SearchConfig) -> Self {
        let (state, _) = watch::channel(SearchSnapshot::default());
        let debouncer = Debouncer::new(config.debounce());
        Self {
            inner: Arc::new(SearchInner {
                geocoder,
                config,
                state,
                sequence: RequestSequence::new(),
            }),
            debouncer,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }

    /// Record new raw input and restart the quiet period
    ///
    /// Does not touch the network itself. When the quiet period elapses the
    /// debounced query advances to `text` and, if it changed, a lookup runs.
    /// Must be called from within a tokio runtime.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.state.send_if_modified(|s| {
            if s.query == text {
                false
            } else {
                s.query.clone_from(&text);
                true
            }
        });

        let inner = Arc::clone(&self.inner);
        self.debouncer.schedule(async move {
            inner.settle(text).await;
        });
    }

    /// Run a lookup for `query` right away, as if its quiet period had elapsed
    ///
    /// The debounced query advances to `query`, so a later settled keystroke
    /// with different text always refetches. Returns this lookup's
    /// candidates; the visible state is only updated if no newer lookup was
    /// issued in the meantime.
    pub async fn search(&self, query: &str) -> Vec<LocationCandidate> {
        self.inner.lookup(query).await
    }

    /// Reset input and candidates, discarding any pending or in-flight lookup
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.inner.state.send_modify(|s| {
            self.inner.sequence.invalidate();
            *s = SearchSnapshot::default();
        });
    }

    /// Resolve a coordinate to an address label
    ///
    /// Falls back to `"Current Location"` when the lookup fails or yields no
    /// usable name.
    #[instrument(skip_all, fields(coordinate = %coordinate))]
    pub async fn reverse_lookup(&self, coordinate: Coordinate) -> String {
        match self.inner.geocoder.reverse(coordinate).await {
            Ok(name) if !name.trim().is_empty() => name,
            Ok(_) => {
                debug!("Reverse lookup returned an empty name");
                CURRENT_LOCATION_LABEL.to_string()
            },
            Err(e) => {
                warn!(error = %e, "Reverse lookup failed");
                CURRENT_LOCATION_LABEL.to_string()
            },
        }
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Current candidates
    #[must_use]
    pub fn candidates(&self) -> Vec<LocationCandidate> {
        self.inner.state.borrow().candidates.clone()
    }

    /// Whether a lookup is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Whether a keystroke is still waiting out the quiet period
    #[must_use]
    pub fn is_debouncing(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// State as a request lifecycle; searches never fail visibly
    #[must_use]
    pub fn request_state(&self) -> RequestState<Vec<LocationCandidate>, Infallible> {
        let s = self.inner.state.borrow();
        if s.loading {
            RequestState::Loading
        } else if s.debounced_query.is_empty() && s.candidates.is_empty() {
            RequestState::Idle
        } else {
            RequestState::Succeeded(s.candidates.clone())
        }
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.state.subscribe()
    }
}

impl SearchInner {
    /// Called when the quiet period elapsed for `text`
    async fn settle(&self, text: String) {
        if self.state.borrow().debounced_query == text {
            debug!(query = %text, "Debounced query unchanged");
            return;
        }
        self.lookup(&text).await;
    }

    #[instrument(skip(self))]
    async fn lookup(&self, raw: &str) -> Vec<LocationCandidate> {
        let query = raw.trim();
        let too_short = query.chars().count() < self.config.min_query_chars;

        // Advancing the debounced query, superseding older lookups and raising
        // the loading flag happen in a single state transition.
        let mut ticket: Option<RequestTicket> = None;
        self.state.send_modify(|s| {
            s.debounced_query = raw.to_string();
            if too_short {
                self.sequence.invalidate();
                s.candidates.clear();
                s.loading = false;
            } else {
                ticket = Some(self.sequence.issue());
                s.loading = true;
            }
        });

        let Some(ticket) = ticket else {
            debug!("Query too short, skipping lookup");
            return Vec::new();
        };

        let candidates = match self.geocoder.search(query, self.config.max_results).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Location search failed");
                Vec::new()
            },
        };

        let applied = self.state.send_if_modified(|s| {
            if self.sequence.is_current(ticket) {
                s.candidates.clone_from(&candidates);
                s.loading = false;
                true
            } else {
                false
            }
        });

        if applied {
            debug!(count = candidates.len(), "Search results applied");
        } else {
            debug!(ticket = ticket.value(), "Discarding superseded search result");
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::error::ApplicationError;
    use crate::ports::MockGeocodingPort;

    fn candidate(name: &str, lat: f64, lng: f64) -> LocationCandidate {
        LocationCandidate::new(name, Coordinate::new_unchecked(lat, lng))
    }

    /// Geocoder that counts calls and answers from a fixed table
    struct CountingGeocoder {
        calls: AtomicUsize,
        queries: parking_lot::Mutex<Vec<String>>,
        answers: HashMap<String, Vec<LocationCandidate>>,
    }

    impl CountingGeocoder {
        fn new(answers: &[(&str, Vec<LocationCandidate>)]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                queries: parking_lot::Mutex::new(Vec::new()),
                answers: answers
                    .iter()
                    .map(|(q, c)| ((*q).to_string(), c.clone()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl GeocodingPort for CountingGeocoder {
        async fn search(
            &self,
            query: &str,
            _limit: u8,
        ) -> Result<Vec<LocationCandidate>, ApplicationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().push(query.to_string());
            Ok(self.answers.get(query).cloned().unwrap_or_default())
        }

        async fn reverse(&self, _coordinate: Coordinate) -> Result<String, ApplicationError> {
            Ok(String::new())
        }
    }

    /// Geocoder whose answers are released by the test, in any order
    struct GatedGeocoder {
        gates: parking_lot::Mutex<HashMap<String, oneshot::Receiver<Vec<LocationCandidate>>>>,
    }

    #[async_trait]
    impl GeocodingPort for GatedGeocoder {
        async fn search(
            &self,
            query: &str,
            _limit: u8,
        ) -> Result<Vec<LocationCandidate>, ApplicationError> {
            let gate = self.gates.lock().remove(query);
            match gate {
                Some(rx) => rx
                    .await
                    .map_err(|_| ApplicationError::ExternalService("gate dropped".to_string())),
                None => Ok(Vec::new()),
            }
        }

        async fn reverse(&self, _coordinate: Coordinate) -> Result<String, ApplicationError> {
            Err(ApplicationError::ExternalService("unused".to_string()))
        }
    }

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.min_query_chars, 3);
        assert_eq!(config.max_results, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn short_query_skips_network() {
        let mut mock = MockGeocodingPort::new();
        mock.expect_search().never();
        let service = LocationSearchService::new(Arc::new(mock));

        for query in ["", "a", "ab", "  ab  "] {
            assert!(service.search(query).await.is_empty());
        }
        assert!(service.candidates().is_empty());
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn search_maps_candidates_and_requests_limit() {
        let mut mock = MockGeocodingPort::new();
        mock.expect_search()
            .withf(|query, limit| query.to_string() == "Connaught Place" && *limit == 5)
            .times(1)
            .returning(|_, _| Ok(vec![candidate("Connaught Place, New Delhi", 28.6315, 77.2167)]));
        let service = LocationSearchService::new(Arc::new(mock));

        let result = service.search("Connaught Place").await;
        assert_eq!(result.len(), 1);
        assert!((result[0].coordinate.latitude() - 28.6315).abs() < f64::EPSILON);
        assert!((result[0].coordinate.longitude() - 77.2167).abs() < f64::EPSILON);
        assert_eq!(service.candidates(), result);
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn failure_yields_empty_list() {
        let mut mock = MockGeocodingPort::new();
        mock.expect_search()
            .returning(|_, _| Err(ApplicationError::ExternalService("HTTP 503".to_string())));
        let service = LocationSearchService::new(Arc::new(mock));

        assert!(service.search("Connaught Place").await.is_empty());
        assert!(service.candidates().is_empty());
        assert!(!service.is_loading());
        assert_eq!(service.request_state(), RequestState::Succeeded(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn set_query_echoes_without_lookup() {
        let geocoder = Arc::new(CountingGeocoder::new(&[]));
        let service = LocationSearchService::new(geocoder.clone());

        service.set_query("Conn");
        assert_eq!(service.snapshot().query, "Conn");
        assert!(service.snapshot().debounced_query.is_empty());
        assert!(service.is_debouncing());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_issues_one_lookup() {
        let geocoder = Arc::new(CountingGeocoder::new(&[(
            "Connaught Place",
            vec![candidate("Connaught Place, New Delhi", 28.6315, 77.2167)],
        )]));
        let service = LocationSearchService::new(geocoder.clone());
        let mut rx = service.subscribe();

        for prefix in ["Con", "Conn", "Connaught", "Connaught Pl", "Connaught Place"] {
            service.set_query(prefix);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let snapshot = rx
            .wait_for(|s| s.debounced_query == "Connaught Place" && !s.loading)
            .await
            .unwrap()
            .clone();

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(geocoder.queries.lock().as_slice(), ["Connaught Place"]);
        assert_eq!(snapshot.candidates.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_debounced_query_does_not_refetch() {
        let geocoder = Arc::new(CountingGeocoder::new(&[]));
        let service = LocationSearchService::new(geocoder.clone());

        service.set_query("Delhi");
        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

        service.set_query("Delh");
        service.set_query("Delhi");
        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn direct_search_advances_debounced_query() {
        let geocoder = Arc::new(CountingGeocoder::new(&[
            ("Delhi", vec![candidate("Delhi, India", 28.6139, 77.2090)]),
            ("Mumbai", vec![candidate("Mumbai, India", 19.0760, 72.8777)]),
        ]));
        let service = LocationSearchService::new(geocoder.clone());

        service.set_query("Delhi");
        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(service.candidates()[0].display_name, "Delhi, India");

        service.search("Mumbai").await;
        assert_eq!(service.snapshot().debounced_query, "Mumbai");
        assert_eq!(service.candidates()[0].display_name, "Mumbai, India");

        service.set_query("Delh");
        service.set_query("Delhi");
        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        let snapshot = service.snapshot();
        assert_eq!(snapshot.debounced_query, "Delhi");
        assert_eq!(snapshot.candidates.len(), 1);
        assert_eq!(snapshot.candidates[0].display_name, "Delhi, India");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn superseded_lookup_is_discarded() {
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let geocoder = Arc::new(GatedGeocoder {
            gates: parking_lot::Mutex::new(HashMap::from([
                ("Karol".to_string(), rx_a),
                ("Karol Bagh".to_string(), rx_b),
            ])),
        });
        let service = LocationSearchService::new(geocoder);

        let mut a = task::spawn(service.search("Karol"));
        assert_pending!(a.poll());
        let mut b = task::spawn(service.search("Karol Bagh"));
        assert_pending!(b.poll());

        let b_result = vec![candidate("Karol Bagh, New Delhi", 28.6519, 77.1909)];
        tx_b.send(b_result.clone()).unwrap();
        assert!(b.is_woken());
        assert_eq!(assert_ready!(b.poll()), b_result);
        assert_eq!(service.candidates(), b_result);

        // A settles last but must not overwrite B
        tx_a.send(vec![candidate("Karol, Somewhere", 10.0, 10.0)]).unwrap();
        let a_result = assert_ready!(a.poll());
        assert_eq!(a_result.len(), 1);
        assert_eq!(service.candidates(), b_result);
        assert!(!service.is_loading());
    }

    #[test]
    fn short_query_supersedes_in_flight_lookup() {
        let (tx, rx) = oneshot::channel();
        let geocoder = Arc::new(GatedGeocoder {
            gates: parking_lot::Mutex::new(HashMap::from([("Saket".to_string(), rx)])),
        });
        let service = LocationSearchService::new(geocoder);

        let mut pending = task::spawn(service.search("Saket"));
        assert_pending!(pending.poll());
        assert!(service.is_loading());

        let mut short = task::spawn(service.search("Sa"));
        assert!(assert_ready!(short.poll()).is_empty());
        assert!(!service.is_loading());

        tx.send(vec![candidate("Saket, New Delhi", 28.5245, 77.2066)])
            .unwrap();
        assert_ready!(pending.poll());
        assert!(service.candidates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_and_cancels_pending() {
        let geocoder = Arc::new(CountingGeocoder::new(&[(
            "Connaught Place",
            vec![candidate("Connaught Place, New Delhi", 28.6315, 77.2167)],
        )]));
        let service = LocationSearchService::new(geocoder.clone());

        service.search("Connaught Place").await;
        assert_eq!(service.candidates().len(), 1);

        service.set_query("Lajpat Nagar");
        service.clear();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(service.snapshot(), SearchSnapshot::default());
        assert_eq!(service.request_state(), RequestState::Idle);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reverse_lookup_returns_display_name() {
        let mut mock = MockGeocodingPort::new();
        mock.expect_reverse()
            .returning(|_| Ok("Rajpath, New Delhi".to_string()));
        let service = LocationSearchService::new(Arc::new(mock));

        let label = service.reverse_lookup(Coordinate::new_delhi()).await;
        assert_eq!(label, "Rajpath, New Delhi");
    }

    #[tokio::test]
    async fn reverse_lookup_falls_back_on_failure() {
        let mut mock = MockGeocodingPort::new();
        mock.expect_reverse()
            .returning(|_| Err(ApplicationError::ExternalService("timeout".to_string())));
        let service = LocationSearchService::new(Arc::new(mock));

        let label = service.reverse_lookup(Coordinate::new_delhi()).await;
        assert_eq!(label, CURRENT_LOCATION_LABEL);
    }

    #[tokio::test]
    async fn reverse_lookup_falls_back_on_empty_name() {
        let mut mock = MockGeocodingPort::new();
        mock.expect_reverse().returning(|_| Ok("   ".to_string()));
        let service = LocationSearchService::new(Arc::new(mock));

        let label = service.reverse_lookup(Coordinate::new_delhi()).await;
        assert_eq!(label, "Current Location");
    }
}
