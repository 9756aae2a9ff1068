//! Route planning
//!
//! Holds at most one route per service instance as an explicit
//! `Idle → Loading → Succeeded | Failed` state machine. Failures are always
//! surfaced to the caller and recorded in state.

use std::sync::Arc;

use domain::{Coordinate, RequestState, Route, RouteError};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::request_sequence::RequestSequence;
use crate::error::ApplicationError;
use crate::ports::RoutingPort;

/// Which of several overlapping route calculations may update state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOrdering {
    /// Only the most recently issued calculation is applied
    #[default]
    LatestIssued,
    /// Whichever calculation settles last is applied
    LastSettled,
}

/// Configuration for the route planning service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutePlanningConfig {
    /// Ordering policy for overlapping calculations
    #[serde(default)]
    pub ordering: RouteOrdering,
}

/// Current route state as seen by the presentation layer
pub type RouteState = RequestState<Route, RouteError>;

/// Computes and tracks the route between two endpoints
pub struct RoutePlanningService {
    router: Arc<dyn RoutingPort>,
    config: RoutePlanningConfig,
    state: watch::Sender<RouteState>,
    sequence: RequestSequence,
}

impl std::fmt::Debug for RoutePlanningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutePlanningService")
            .field("router", &"<RoutingPort>")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl RoutePlanningService {
    /// Create a route planning service with default configuration
    #[must_use]
    pub fn new(router: Arc<dyn RoutingPort>) -> Self {
        Self::with_config(router, RoutePlanningConfig::default())
    }

    /// Create a route planning service with custom configuration
    #[must_use]
    pub fn with_config(router: Arc<dyn RoutingPort>, config: RoutePlanningConfig) -> Self {
        let (state, _) = watch::channel(RouteState::Idle);
        Self {
            router,
            config,
            state,
            sequence: RequestSequence::new(),
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &RoutePlanningConfig {
        &self.config
    }

    /// Compute the route from `start` to `end`
    ///
    /// State becomes `Loading` immediately, discarding any previous route or
    /// error. On settle the outcome is recorded in state unless a newer
    /// calculation superseded this one (see [`RouteOrdering`]); the caller
    /// always receives its own outcome.
    #[instrument(skip_all, fields(start = %start, end = %end))]
    pub async fn calculate_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Route, RouteError> {
        let mut ticket = None;
        self.state.send_modify(|s| {
            ticket = Some(self.sequence.issue());
            *s = RouteState::Loading;
        });

        let outcome = self
            .router
            .route(start, end)
            .await
            .map_err(Self::route_error);

        let applied = self.state.send_if_modified(|s| {
            let current = ticket.is_some_and(|t| self.sequence.is_current(t));
            if current || self.config.ordering == RouteOrdering::LastSettled {
                *s = match &outcome {
                    Ok(route) => RouteState::Succeeded(route.clone()),
                    Err(e) => RouteState::Failed(e.clone()),
                };
                true
            } else {
                false
            }
        });

        match &outcome {
            Ok(route) => info!(
                distance_m = route.distance_meters,
                duration_s = route.duration_seconds,
                steps = route.steps.len(),
                "Route calculated"
            ),
            Err(e) => warn!(error = %e, "Route calculation failed"),
        }
        if !applied {
            debug!("Discarding superseded route result");
        }

        outcome
    }

    /// Reset to idle, discarding any route or error
    ///
    /// Under [`RouteOrdering::LatestIssued`] in-flight calculations are
    /// superseded as well.
    pub fn clear_route(&self) {
        self.state.send_modify(|s| {
            self.sequence.invalidate();
            *s = RouteState::Idle;
        });
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RouteState {
        self.state.borrow().clone()
    }

    /// Current route, if the latest calculation succeeded
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        self.state.borrow().result().cloned()
    }

    /// Current error, if the latest calculation failed
    #[must_use]
    pub fn error(&self) -> Option<RouteError> {
        self.state.borrow().error().cloned()
    }

    /// Whether a calculation is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RouteState> {
        self.state.subscribe()
    }

    fn route_error(err: ApplicationError) -> RouteError {
        match err {
            ApplicationError::NoRouteFound => RouteError::NoRouteFound,
            ApplicationError::ExternalService(detail) => RouteError::request_failed(detail),
            other => RouteError::request_failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use domain::RouteGeometry;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::ports::MockRoutingPort;

    fn delhi_start() -> Coordinate {
        Coordinate::new(28.6139, 77.2090).unwrap()
    }

    fn delhi_end() -> Coordinate {
        Coordinate::new(28.6129, 77.2295).unwrap()
    }

    fn sample_route(distance: f64, duration: f64) -> Route {
        Route {
            geometry: RouteGeometry::line_string(vec![[77.209, 28.6139], [77.2295, 28.6129]]),
            distance_meters: distance,
            duration_seconds: duration,
            steps: vec![],
        }
    }

    /// Router whose answers are released by the test, keyed by end latitude
    struct GatedRouter {
        gates: parking_lot::Mutex<HashMap<u64, oneshot::Receiver<Result<Route, ApplicationError>>>>,
    }

    impl GatedRouter {
        fn key(c: Coordinate) -> u64 {
            c.latitude().to_bits()
        }
    }

    #[async_trait]
    impl RoutingPort for GatedRouter {
        async fn route(
            &self,
            _start: Coordinate,
            end: Coordinate,
        ) -> Result<Route, ApplicationError> {
            let gate = self.gates.lock().remove(&Self::key(end));
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ApplicationError::ExternalService("gate dropped".into()))),
                None => Err(ApplicationError::NoRouteFound),
            }
        }
    }

    #[test]
    fn test_default_config() {
        assert_eq!(RoutePlanningConfig::default().ordering, RouteOrdering::LatestIssued);
    }

    #[test]
    fn test_ordering_serialization() {
        let json = serde_json::to_string(&RouteOrdering::LastSettled).unwrap();
        assert_eq!(json, "\"last_settled\"");
    }

    #[tokio::test]
    async fn successful_route_is_recorded() {
        let mut mock = MockRoutingPort::new();
        mock.expect_route()
            .times(1)
            .returning(|_, _| Ok(sample_route(4200.0, 600.0)));
        let service = RoutePlanningService::new(Arc::new(mock));

        let route = service
            .calculate_route(delhi_start(), delhi_end())
            .await
            .unwrap();

        assert!((route.distance_meters - 4200.0).abs() < f64::EPSILON);
        assert!((route.duration_seconds - 600.0).abs() < f64::EPSILON);
        assert_eq!(service.route(), Some(route));
        assert!(service.error().is_none());
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn no_route_found_is_surfaced() {
        let mut mock = MockRoutingPort::new();
        mock.expect_route()
            .returning(|_, _| Err(ApplicationError::NoRouteFound));
        let service = RoutePlanningService::new(Arc::new(mock));

        let result = service.calculate_route(delhi_start(), delhi_end()).await;
        assert_eq!(result, Err(RouteError::NoRouteFound));
        assert_eq!(service.state(), RouteState::Failed(RouteError::NoRouteFound));
        assert!(service.route().is_none());
    }

    #[tokio::test]
    async fn transport_failure_carries_message() {
        let mut mock = MockRoutingPort::new();
        mock.expect_route().returning(|_, _| {
            Err(ApplicationError::ExternalService(
                "Routing request failed: HTTP 500 Internal Server Error".to_string(),
            ))
        });
        let service = RoutePlanningService::new(Arc::new(mock));

        let err = service
            .calculate_route(delhi_start(), delhi_end())
            .await
            .unwrap_err();
        match err {
            RouteError::RequestFailed(message) => assert!(message.contains("HTTP 500")),
            RouteError::NoRouteFound => unreachable!("expected RequestFailed"),
        }
        assert!(service.error().is_some());
    }

    #[tokio::test]
    async fn failure_replaces_previous_route() {
        let mut mock = MockRoutingPort::new();
        let mut calls = 0;
        mock.expect_route().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(sample_route(4200.0, 600.0))
            } else {
                Err(ApplicationError::NoRouteFound)
            }
        });
        let service = RoutePlanningService::new(Arc::new(mock));

        assert!(service.calculate_route(delhi_start(), delhi_end()).await.is_ok());
        assert!(service.calculate_route(delhi_start(), delhi_end()).await.is_err());
        assert!(service.route().is_none());
        assert_eq!(service.error(), Some(RouteError::NoRouteFound));
    }

    #[tokio::test]
    async fn clear_route_resets_from_any_state() {
        let mut mock = MockRoutingPort::new();
        let mut calls = 0;
        mock.expect_route().returning(move |_, _| {
            calls += 1;
            if calls % 2 == 1 {
                Ok(sample_route(1000.0, 120.0))
            } else {
                Err(ApplicationError::ExternalService("boom".to_string()))
            }
        });
        let service = RoutePlanningService::new(Arc::new(mock));

        service.clear_route();
        assert_eq!(service.state(), RouteState::Idle);

        let _ = service.calculate_route(delhi_start(), delhi_end()).await;
        service.clear_route();
        assert_eq!(service.state(), RouteState::Idle);

        let _ = service.calculate_route(delhi_start(), delhi_end()).await;
        assert!(service.error().is_some());
        service.clear_route();
        assert_eq!(service.state(), RouteState::Idle);
    }

    #[test]
    fn loading_while_in_flight() {
        let (tx, rx) = oneshot::channel();
        let router = GatedRouter {
            gates: parking_lot::Mutex::new(HashMap::from([(GatedRouter::key(delhi_end()), rx)])),
        };
        let service = RoutePlanningService::new(Arc::new(router));

        let mut call = task::spawn(service.calculate_route(delhi_start(), delhi_end()));
        assert_pending!(call.poll());
        assert!(service.is_loading());

        tx.send(Ok(sample_route(4200.0, 600.0))).unwrap();
        assert!(assert_ready!(call.poll()).is_ok());
        assert!(!service.is_loading());
    }

    fn overlapping_calls(ordering: RouteOrdering) -> RouteState {
        let first_end = Coordinate::new(28.5, 77.1).unwrap();
        let second_end = Coordinate::new(28.7, 77.3).unwrap();
        let (tx_first, rx_first) = oneshot::channel();
        let (tx_second, rx_second) = oneshot::channel();
        let router = GatedRouter {
            gates: parking_lot::Mutex::new(HashMap::from([
                (GatedRouter::key(first_end), rx_first),
                (GatedRouter::key(second_end), rx_second),
            ])),
        };
        let service =
            RoutePlanningService::with_config(Arc::new(router), RoutePlanningConfig { ordering });

        let mut first = task::spawn(service.calculate_route(delhi_start(), first_end));
        assert_pending!(first.poll());
        let mut second = task::spawn(service.calculate_route(delhi_start(), second_end));
        assert_pending!(second.poll());

        tx_second.send(Ok(sample_route(2000.0, 300.0))).unwrap();
        assert!(assert_ready!(second.poll()).is_ok());

        // The older calculation settles last and still gets its own answer
        tx_first.send(Ok(sample_route(9000.0, 1200.0))).unwrap();
        let own = assert_ready!(first.poll()).unwrap();
        assert!((own.distance_meters - 9000.0).abs() < f64::EPSILON);

        service.state()
    }

    #[test]
    fn latest_issued_ignores_stale_result() {
        let state = overlapping_calls(RouteOrdering::LatestIssued);
        let route = state.result().unwrap();
        assert!((route.distance_meters - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn last_settled_applies_stale_result() {
        let state = overlapping_calls(RouteOrdering::LastSettled);
        let route = state.result().unwrap();
        assert!((route.distance_meters - 9000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_supersedes_in_flight_calculation() {
        let (tx, rx) = oneshot::channel();
        let router = GatedRouter {
            gates: parking_lot::Mutex::new(HashMap::from([(GatedRouter::key(delhi_end()), rx)])),
        };
        let service = RoutePlanningService::new(Arc::new(router));

        let mut call = task::spawn(service.calculate_route(delhi_start(), delhi_end()));
        assert_pending!(call.poll());
        service.clear_route();

        tx.send(Ok(sample_route(4200.0, 600.0))).unwrap();
        assert!(assert_ready!(call.poll()).is_ok());
        assert_eq!(service.state(), RouteState::Idle);
    }
}
