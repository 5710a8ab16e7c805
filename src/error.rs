use crate::auth::AuthFailure;
use crate::market_data::UpstreamError;
use crate::model::ErrorBody;
use crate::persistence::queue::QueueError;
use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Operator credentials missing or wrong. The reason is returned to the caller.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthFailure),
    /// EA signature check failed. Deliberately carries no detail.
    #[error("forbidden")]
    Forbidden,
    #[error("queue disabled")]
    QueueDisabled,
    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),
    #[error("{0}")]
    Upstream(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<QueueError> for BridgeError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Unavailable(msg) => BridgeError::QueueUnavailable(msg),
        }
    }
}

impl From<UpstreamError> for BridgeError {
    fn from(e: UpstreamError) -> Self {
        BridgeError::Upstream(e.to_string())
    }
}

impl BridgeError {
    fn body(&self) -> ErrorBody {
        let (error, detail) = match self {
            BridgeError::Unauthorized(reason) => (reason.reason().to_string(), None),
            BridgeError::Forbidden => ("forbidden".to_string(), None),
            BridgeError::QueueDisabled => ("queue disabled".to_string(), None),
            BridgeError::QueueUnavailable(msg) => ("queue unavailable".to_string(), Some(msg.clone())),
            BridgeError::Upstream(msg) => (msg.clone(), None),
            BridgeError::BadRequest(msg) => ("bad request".to_string(), Some(msg.clone())),
            BridgeError::Internal(msg) => ("internal error".to_string(), Some(msg.clone())),
        };
        ErrorBody { error, detail }
    }
}

impl ResponseError for BridgeError {
    fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BridgeError::Forbidden => StatusCode::FORBIDDEN,
            BridgeError::QueueDisabled | BridgeError::QueueUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BridgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, BridgeError::Unauthorized(_)) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"ea-bridge\""));
        }
        builder.json(self.body())
    }
}
