//! HTTP error responses.
//!
//! Every error body is `{"detail": ...}`: a string for operational errors and
//! a list of issues for request validation failures.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use spamwatch_common::schemas::{ErrorBody, ErrorDetail, ValidationIssue};
use spamwatch_common::SpamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Model not loaded. Please try again later.")]
    ModelNotLoaded,

    #[error("Validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Preprocessing failed")]
    PreprocessingFailed,

    #[error("Prediction failed")]
    PredictionFailed,

    #[error("Model reload failed")]
    ReloadFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PreprocessingFailed
            | ApiError::PredictionFailed
            | ApiError::ReloadFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(self) -> ErrorDetail {
        match self {
            ApiError::Validation(issues) => ErrorDetail::Issues(issues),
            other => ErrorDetail::Message(other.to_string()),
        }
    }
}

impl From<ValidationIssue> for ApiError {
    fn from(issue: ValidationIssue) -> Self {
        ApiError::Validation(vec![issue])
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // A body cut off by the size limit surfaces as a buffering failure
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::Validation(vec![ValidationIssue::malformed(rejection.body_text())])
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Validation(vec![ValidationIssue::body("file", rejection.body_text())])
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("Invalid upload: {}", err.body_text()))
        }
    }
}

impl From<SpamError> for ApiError {
    fn from(err: SpamError) -> Self {
        match err {
            SpamError::Preprocess(_) => ApiError::PreprocessingFailed,
            _ => ApiError::PredictionFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

/// Give responses produced outside the handlers (body limit, unknown method)
/// the same `{"detail": ...}` body as handler errors.
pub async fn json_error_bodies(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    let error = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::METHOD_NOT_ALLOWED => ApiError::MethodNotAllowed,
        _ => return response,
    };

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = error.into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::ModelNotLoaded.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::Validation(vec![]).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ReloadFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_plain_limit_response_rewritten() {
        let plain = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let rewritten = json_error_bodies(plain).await;
        assert_eq!(rewritten.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            rewritten.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_json_errors_untouched() {
        let own = ApiError::Validation(vec![]).into_response();
        let passed = json_error_bodies(own).await;
        assert_eq!(passed.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let ok = (StatusCode::OK, "fine").into_response();
        assert_eq!(json_error_bodies(ok).await.status(), StatusCode::OK);
    }

    #[test]
    fn test_spam_error_mapping() {
        let err: ApiError = SpamError::Preprocess("bad".into()).into();
        assert!(matches!(err, ApiError::PreprocessingFailed));
        assert_eq!(err.to_string(), "Preprocessing failed");

        let err: ApiError = SpamError::Inference("bad".into()).into();
        assert!(matches!(err, ApiError::PredictionFailed));
        assert_eq!(err.to_string(), "Prediction failed");
    }

    #[test]
    fn test_detail_shapes() {
        match ApiError::ModelNotLoaded.detail() {
            ErrorDetail::Message(m) => assert_eq!(m, "Model not loaded. Please try again later."),
            other => panic!("unexpected detail {:?}", other),
        }
        let issue = ValidationIssue::body("message", "Message cannot be empty");
        match ApiError::from(issue.clone()).detail() {
            ErrorDetail::Issues(issues) => assert_eq!(issues, vec![issue]),
            other => panic!("unexpected detail {:?}", other),
        }
    }
}
