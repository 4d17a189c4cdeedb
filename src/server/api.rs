// Session API endpoints
//
// All endpoints return JSON and are designed for local consumption only.
// Security: binds to 127.0.0.1 by default (localhost only).
//
// Error bodies follow {status: "error", msg: "..."} so the page can show
// the message verbatim. AlreadyActive never reaches the wire: a start
// request while a session runs is a benign no-op and still returns ok.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use crate::core::{CalibrationOutcome, SessionError};

use super::AppState;

/// JSON structure returned by /api/status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub clicks: u64,
    pub mode: &'static str,
    pub calibrated: bool,
    pub clicks_per_cm: Option<f64>,
    pub distance_cm: f64,
    pub distance_mm: f64,
    pub distance_m: f64,
    pub distance_in: f64,
}

/// Body for the plain-acknowledgement endpoints
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub status: &'static str,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { status: "ok" })
    }
}

/// Successful calibration response: the ratio both ways, for display
#[derive(Debug, Clone, Serialize)]
pub struct FinishCalibrationResponse {
    pub status: &'static str,
    pub clicks: u64,
    pub clicks_per_cm: f64,
    pub cm_per_click: f64,
}

impl From<CalibrationOutcome> for FinishCalibrationResponse {
    fn from(outcome: CalibrationOutcome) -> Self {
        Self {
            status: "ok",
            clicks: outcome.clicks,
            clicks_per_cm: outcome.clicks_per_cm,
            cm_per_click: outcome.cm_per_click,
        }
    }
}

/// Errors surfaced by the session endpoints
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NoScrollDetected | SessionError::NotCalibrated => {
                ApiError::BadRequest(error.to_string())
            }
            // AlreadyActive is handled at the endpoints; reaching here
            // would be a bug, surface it loudly
            SessionError::AlreadyActive | SessionError::Source(_) => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::error!("API error: {} - {}", status, msg);

        (status, Json(json!({ "status": "error", "msg": msg }))).into_response()
    }
}

/// Round to `digits` decimal places for display stability in the page
fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// GET /api/status - current mode, ticks, ratio and derived distances
///
/// Polled at high frequency by the page; must stay cheap and non-blocking.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.controller.snapshot();
    let report = snapshot.report;

    Json(StatusResponse {
        clicks: snapshot.ticks,
        mode: snapshot.mode.as_str(),
        calibrated: snapshot.ratio.is_some(),
        clicks_per_cm: snapshot.ratio.map(|r| round_to(r, 4)),
        distance_cm: round_to(report.distance_cm, 2),
        distance_mm: round_to(report.distance_mm, 1),
        distance_m: round_to(report.distance_m, 3),
        distance_in: round_to(report.distance_in, 2),
    })
}

/// GET /api/start_calibration - begin the 30 cm reference roll
pub async fn start_calibration(
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    match state.controller.start_calibration() {
        Ok(()) | Err(SessionError::AlreadyActive) => Ok(OkResponse::ok()),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/finish_calibration - end the roll and derive the ratio
///
/// 400 with "No scroll detected" when the wheel never moved; any prior
/// calibration survives for a retry.
pub async fn finish_calibration(
    State(state): State<AppState>,
) -> Result<Json<FinishCalibrationResponse>, ApiError> {
    let outcome = state.controller.finish_calibration()?;
    Ok(Json(outcome.into()))
}

/// GET /api/start_measure - begin a measurement session
///
/// 400 with "Not calibrated" before the first successful calibration.
pub async fn start_measure(State(state): State<AppState>) -> Result<Json<OkResponse>, ApiError> {
    match state.controller.start_measurement() {
        Ok(()) | Err(SessionError::AlreadyActive) => Ok(OkResponse::ok()),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/stop_measure - end the measurement; ticks retained for reading
pub async fn stop_measure(State(state): State<AppState>) -> Json<OkResponse> {
    state.controller.stop_measurement();
    OkResponse::ok()
}

/// GET /api/reset - zero the tick counter in any mode
pub async fn reset(State(state): State<AppState>) -> Json<OkResponse> {
    state.controller.reset();
    OkResponse::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionController;
    use crate::source::{ScrollSink, ScrollSource, Subscription};
    use std::sync::{Arc, Mutex};

    /// Test source: remembers the sink so ticks can be injected by hand.
    #[derive(Default)]
    struct PushSource {
        sink: Mutex<Option<ScrollSink>>,
    }

    impl PushSource {
        fn push(&self, delta: i64) {
            if let Some(sink) = self.sink.lock().unwrap().as_ref() {
                sink(delta);
            }
        }
    }

    impl ScrollSource for Arc<PushSource> {
        fn subscribe(&self, sink: ScrollSink) -> anyhow::Result<Subscription> {
            *self.sink.lock().unwrap() = Some(sink);
            let slot = self.clone();
            Ok(Subscription::new(move || {
                *slot.sink.lock().unwrap() = None;
            }))
        }
    }

    fn app_state() -> (AppState, Arc<PushSource>) {
        let source = Arc::new(PushSource::default());
        let controller = Arc::new(SessionController::new(Arc::new(source.clone())));
        (AppState { controller }, source)
    }

    #[tokio::test]
    async fn test_status_shape_when_uncalibrated() {
        let (state, _source) = app_state();
        let Json(status) = get_status(State(state)).await;

        assert_eq!(status.clicks, 0);
        assert_eq!(status.mode, "idle");
        assert!(!status.calibrated);
        assert_eq!(status.clicks_per_cm, None);
        assert_eq!(status.distance_cm, 0.0);

        // clicks_per_cm serializes as null, not as a missing field
        let body = serde_json::to_value(&status).unwrap();
        assert!(body.get("clicks_per_cm").unwrap().is_null());
    }

    #[tokio::test]
    async fn test_finish_without_scroll_is_bad_request() {
        let (state, _source) = app_state();
        start_calibration(State(state.clone())).await.unwrap();

        let err = finish_calibration(State(state.clone())).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["msg"], "No scroll detected");
    }

    #[tokio::test]
    async fn test_start_measure_requires_calibration() {
        let (state, _source) = app_state();
        let err = start_measure(State(state)).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["msg"], "Not calibrated");
    }

    #[tokio::test]
    async fn test_calibrate_then_measure_over_the_api() {
        let (state, source) = app_state();

        start_calibration(State(state.clone())).await.unwrap();
        for _ in 0..300 {
            source.push(1);
        }
        let Json(calibration) = finish_calibration(State(state.clone())).await.unwrap();
        assert_eq!(calibration.clicks, 300);
        assert_eq!(calibration.clicks_per_cm, 10.0);
        assert_eq!(calibration.cm_per_click, 0.1);

        start_measure(State(state.clone())).await.unwrap();
        for _ in 0..100 {
            source.push(-1);
        }
        stop_measure(State(state.clone())).await;

        let Json(status) = get_status(State(state.clone())).await;
        assert_eq!(status.clicks, 100);
        assert_eq!(status.mode, "idle");
        assert!(status.calibrated);
        assert_eq!(status.distance_cm, 10.0);
        assert_eq!(status.distance_mm, 100.0);
        assert_eq!(status.distance_m, 0.1);
        assert_eq!(status.distance_in, 3.94); // rounded to 2 places

        reset(State(state.clone())).await;
        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.clicks, 0);
    }

    #[tokio::test]
    async fn test_repeated_start_is_benign() {
        let (state, _source) = app_state();
        start_calibration(State(state.clone())).await.unwrap();
        // Second click on the button: still 200 ok, session untouched
        start_calibration(State(state.clone())).await.unwrap();

        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.mode, "calibrate");
    }
}
