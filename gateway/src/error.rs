//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use country_metrics::MetricsError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),
    #[error("Unknown country: {input}")]
    UnknownCountry { input: String },
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<&'static str>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParam(_) | Self::Metrics(MetricsError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            Self::UnknownCountry { .. } | Self::Metrics(MetricsError::UnsupportedCountry { .. }) => StatusCode::NOT_FOUND,
            Self::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, suggestions) = match self {
            Self::MissingParam(_) => ("Bad request", None),
            Self::UnknownCountry { input } => ("Country not found", Some(country_codes::suggestions(input))),
            Self::Metrics(e) => match e {
                MetricsError::BadRequest(_) => ("Bad request", None),
                MetricsError::UnsupportedCountry { code, .. } => {
                    ("Country not supported by provider", Some(country_codes::suggestions(code)))
                }
                MetricsError::UpstreamUnavailable { .. } | MetricsError::ParseFailure { .. } => {
                    ("Failed to fetch data", None)
                }
                MetricsError::Dataset(_) => ("Dataset unavailable", None),
            },
        };
        ErrorResponse {
            error: error.to_string(),
            details: self.to_string(),
            suggestions,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
