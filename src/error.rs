use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorBody;
use crate::normalize::INVALID_RESPONSE;
use crate::upstream::UpstreamError;
use crate::validate::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("URL parameter is required")]
    MissingInput,
    #[error("Invalid Instagram URL format")]
    InvalidFormat,
    #[error("Request timeout - the API took too long to respond")]
    Timeout,
    #[error("API request failed with status {status}")]
    UpstreamHttp { status: StatusCode, body: String },
    #[error("Failed to reach the download API")]
    Network(String),
    #[error("{}", INVALID_RESPONSE)]
    MalformedUpstreamResponse,
    #[error("Endpoint not found")]
    NotFound,
    #[error("Internal server error")]
    Unhandled,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInput | ApiError::InvalidFormat => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::UpstreamHttp { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            ApiError::MalformedUpstreamResponse => StatusCode::BAD_GATEWAY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Network(_) | ApiError::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingInput => "MISSING_URL",
            ApiError::InvalidFormat => "INVALID_URL",
            ApiError::Timeout => "TIMEOUT",
            ApiError::UpstreamHttp { .. } | ApiError::MalformedUpstreamResponse => "API_ERROR",
            ApiError::Network(_) => "SERVER_ERROR",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Unhandled => "UNHANDLED_ERROR",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::UpstreamHttp { body, .. } if !body.is_empty() => Some(body.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        match value {
            ValidationError::MissingInput => ApiError::MissingInput,
            ValidationError::InvalidFormat => ApiError::InvalidFormat,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(value: UpstreamError) -> Self {
        match value {
            UpstreamError::Timeout => ApiError::Timeout,
            UpstreamError::Http { status, body } => ApiError::UpstreamHttp { status, body },
            UpstreamError::Network(msg) => ApiError::Network(msg),
            UpstreamError::InvalidBody(_) => ApiError::MalformedUpstreamResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_status_and_code() {
        let cases = [
            (ApiError::MissingInput, 400, "MISSING_URL"),
            (ApiError::InvalidFormat, 400, "INVALID_URL"),
            (ApiError::Timeout, 408, "TIMEOUT"),
            (
                ApiError::UpstreamHttp {
                    status: StatusCode::TOO_MANY_REQUESTS,
                    body: String::new(),
                },
                429,
                "API_ERROR",
            ),
            (ApiError::Network("refused".into()), 500, "SERVER_ERROR"),
            (ApiError::MalformedUpstreamResponse, 502, "API_ERROR"),
            (ApiError::NotFound, 404, "NOT_FOUND"),
            (ApiError::Unhandled, 500, "UNHANDLED_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.code(), code, "{err:?}");
        }
    }

    #[test]
    fn non_error_upstream_status_becomes_bad_gateway() {
        let err = ApiError::UpstreamHttp {
            status: StatusCode::MOVED_PERMANENTLY,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn converts_component_errors() {
        assert!(matches!(
            ApiError::from(ValidationError::MissingInput),
            ApiError::MissingInput
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::Timeout),
            ApiError::Timeout
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::InvalidBody("eof".into())),
            ApiError::MalformedUpstreamResponse
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "down".into()
            }),
            ApiError::UpstreamHttp { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[test]
    fn details_carry_upstream_body() {
        let err = ApiError::UpstreamHttp {
            status: StatusCode::BAD_REQUEST,
            body: "{\"message\":\"private account\"}".into(),
        };
        assert_eq!(err.details().as_deref(), Some("{\"message\":\"private account\"}"));
        assert_eq!(ApiError::Timeout.details(), None);
    }
}
