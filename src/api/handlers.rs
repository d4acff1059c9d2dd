use crate::api::responses::{
    BatchErrorCode, BatchErrorResponse, BatchSuccessResponse, EstimateErrorCode,
    EstimateErrorResponse, EstimateSuccessResponse, HealthErrorCode, HealthErrorResponse,
    HealthStatus, HealthSuccessResponse, ReportErrorCode, ReportErrorResponse,
    ReportSuccessResponse,
};
use crate::engine::{self, build_report};
use crate::record::RestaurantRecord;
use crate::scenario::{Archetype, Scenario};
use crate::state::{self, AppState};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const NO_POPULATION_MESSAGE: &str = "No population loaded";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}

fn fallback_timestamp(context: &str) -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, context = context, "Failed to format error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    })
}

// Estimate

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub record: RestaurantRecord,
    pub scenario: Scenario,
    #[serde(default)]
    pub availability_points: Option<f64>,
}

pub enum EstimateResponse {
    Success(EstimateSuccessResponse),
    Error {
        status: StatusCode,
        body: EstimateErrorResponse,
    },
}

impl IntoResponse for EstimateResponse {
    fn into_response(self) -> Response {
        match self {
            EstimateResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            EstimateResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_estimate(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<EstimateRequest>,
) -> impl IntoResponse {
    build_estimate_response(state, request, SystemTime::now())
}

fn build_estimate_response(
    state: Arc<RwLock<AppState>>,
    request: EstimateRequest,
    now: SystemTime,
) -> EstimateResponse {
    if request.scenario.party == 0 {
        return estimate_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            EstimateErrorCode::InvalidScenario,
            "party size must be at least 1",
            now,
        );
    }

    let guard = match state::read(&state) {
        Ok(guard) => guard,
        Err(err) => {
            return estimate_internal_error(&format!("{err} while estimating"));
        }
    };
    let tuning = Arc::clone(guard.tuning());
    let loaded = guard.loaded();
    drop(guard);

    let (_, calibration) = match loaded {
        Ok(loaded) => loaded,
        Err(_) => {
            return estimate_error(
                StatusCode::SERVICE_UNAVAILABLE,
                EstimateErrorCode::NoPopulation,
                NO_POPULATION_MESSAGE,
                now,
            );
        }
    };

    let estimate = engine::estimate(
        &request.record,
        &request.scenario,
        &tuning,
        &calibration,
        request.availability_points,
    );

    match format_timestamp(now) {
        Ok(timestamp) => EstimateResponse::Success(EstimateSuccessResponse {
            archetype: request.scenario.archetype(),
            estimate,
            timestamp,
        }),
        Err(_) => estimate_internal_error("timestamp formatting failure"),
    }
}

fn estimate_error(
    status: StatusCode,
    error_code: EstimateErrorCode,
    message: &str,
    now: SystemTime,
) -> EstimateResponse {
    let timestamp =
        format_timestamp(now).unwrap_or_else(|_| fallback_timestamp("/api/estimate"));
    EstimateResponse::Error {
        status,
        body: EstimateErrorResponse {
            error_code,
            error_message: message.to_string(),
            timestamp,
        },
    }
}

fn estimate_internal_error(message: &str) -> EstimateResponse {
    error!(
        message = message,
        "Internal error while handling /api/estimate"
    );
    EstimateResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: EstimateErrorResponse {
            error_code: EstimateErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp("/api/estimate"),
        },
    }
}

// Batch

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub scenario: Scenario,
}

pub enum BatchResponse {
    Success(BatchSuccessResponse),
    Error {
        status: StatusCode,
        body: BatchErrorResponse,
    },
}

impl IntoResponse for BatchResponse {
    fn into_response(self) -> Response {
        match self {
            BatchResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            BatchResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_batch(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    build_batch_response(state, request, SystemTime::now())
}

fn build_batch_response(
    state: Arc<RwLock<AppState>>,
    request: BatchRequest,
    now: SystemTime,
) -> BatchResponse {
    if request.scenario.party == 0 {
        return batch_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            BatchErrorCode::InvalidScenario,
            "party size must be at least 1",
            now,
        );
    }

    let guard = match state::read(&state) {
        Ok(guard) => guard,
        Err(err) => {
            return batch_internal_error(&format!("{err} while scoring batch"));
        }
    };
    let tuning = Arc::clone(guard.tuning());
    let loaded = guard.loaded();
    drop(guard);

    let (population, calibration) = match loaded {
        Ok(loaded) => loaded,
        Err(_) => {
            return batch_error(
                StatusCode::SERVICE_UNAVAILABLE,
                BatchErrorCode::NoPopulation,
                NO_POPULATION_MESSAGE,
                now,
            );
        }
    };

    let results = engine::estimate_batch(&population, &request.scenario, &tuning, &calibration);

    match format_timestamp(now) {
        Ok(timestamp) => BatchResponse::Success(BatchSuccessResponse {
            archetype: request.scenario.archetype(),
            count: results.len(),
            results,
            timestamp,
        }),
        Err(_) => batch_internal_error("timestamp formatting failure"),
    }
}

fn batch_error(
    status: StatusCode,
    error_code: BatchErrorCode,
    message: &str,
    now: SystemTime,
) -> BatchResponse {
    let timestamp = format_timestamp(now).unwrap_or_else(|_| fallback_timestamp("/api/batch"));
    BatchResponse::Error {
        status,
        body: BatchErrorResponse {
            error_code,
            error_message: message.to_string(),
            timestamp,
        },
    }
}

fn batch_internal_error(message: &str) -> BatchResponse {
    error!(message = message, "Internal error while handling /api/batch");
    BatchResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: BatchErrorResponse {
            error_code: BatchErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp("/api/batch"),
        },
    }
}

// Report

pub enum ReportResponse {
    Success(ReportSuccessResponse),
    Error {
        status: StatusCode,
        body: ReportErrorResponse,
    },
}

impl IntoResponse for ReportResponse {
    fn into_response(self) -> Response {
        match self {
            ReportResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ReportResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_report(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_report_response(state, SystemTime::now())
}

fn build_report_response(state: Arc<RwLock<AppState>>, now: SystemTime) -> ReportResponse {
    let guard = match state::read(&state) {
        Ok(guard) => guard,
        Err(err) => {
            return report_internal_error(&format!("{err} while building report"));
        }
    };
    let tuning = Arc::clone(guard.tuning());
    let extremes = guard.report_extremes();
    let loaded = guard.loaded();
    drop(guard);

    let (population, calibration) = match loaded {
        Ok(loaded) => loaded,
        Err(_) => {
            let timestamp =
                format_timestamp(now).unwrap_or_else(|_| fallback_timestamp("/api/report"));
            return ReportResponse::Error {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: ReportErrorResponse {
                    error_code: ReportErrorCode::NoPopulation,
                    error_message: NO_POPULATION_MESSAGE.to_string(),
                    timestamp,
                },
            };
        }
    };

    let reports = Archetype::ALL
        .iter()
        .map(|&archetype| build_report(&population, &calibration, &tuning, archetype, extremes))
        .collect();

    match format_timestamp(now) {
        Ok(timestamp) => ReportResponse::Success(ReportSuccessResponse { reports, timestamp }),
        Err(_) => report_internal_error("timestamp formatting failure"),
    }
}

fn report_internal_error(message: &str) -> ReportResponse {
    error!(
        message = message,
        "Internal error while handling /api/report"
    );
    ReportResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ReportErrorResponse {
            error_code: ReportErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp("/api/report"),
        },
    }
}

// Health

pub enum HealthResponse {
    Success {
        status: StatusCode,
        body: HealthSuccessResponse,
    },
    Error {
        status: StatusCode,
        body: HealthErrorResponse,
    },
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        match self {
            HealthResponse::Success { status, body } => (status, Json(body)).into_response(),
            HealthResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_health_response(state, SystemTime::now())
}

fn build_health_response(state: Arc<RwLock<AppState>>, now: SystemTime) -> HealthResponse {
    let guard = match state::read(&state) {
        Ok(guard) => guard,
        Err(err) => {
            return health_internal_error(&format!("{err} while reading state"));
        }
    };
    let population_size = guard.population().map(|p| p.len());
    drop(guard);

    let status = if population_size.is_some() {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    match format_timestamp(now) {
        Ok(timestamp) => HealthResponse::Success {
            status: StatusCode::OK,
            body: HealthSuccessResponse {
                status,
                population_size,
                timestamp,
            },
        },
        Err(_) => health_internal_error("timestamp formatting failure"),
    }
}

fn health_internal_error(message: &str) -> HealthResponse {
    error!(
        message = message,
        "Internal error while handling /api/health"
    );
    HealthResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: HealthErrorResponse {
            error_code: HealthErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp("/api/health"),
        },
    }
}
