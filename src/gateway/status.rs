use actix_web::http::StatusCode;
use tonic::Code;

use crate::domain::order::StatusKind;

/// HTTP response classes the gateway answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpClass {
    BadRequest,
    NotFound,
    Conflict,
    GatewayTimeout,
    ServerError,
}

impl HttpClass {
    pub fn status_code(self) -> StatusCode {
        match self {
            HttpClass::BadRequest => StatusCode::BAD_REQUEST,
            HttpClass::NotFound => StatusCode::NOT_FOUND,
            HttpClass::Conflict => StatusCode::CONFLICT,
            HttpClass::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            HttpClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StatusKind> for HttpClass {
    fn from(kind: StatusKind) -> Self {
        match kind {
            StatusKind::InvalidArgument => HttpClass::BadRequest,
            StatusKind::NotFound => HttpClass::NotFound,
            StatusKind::FailedPrecondition => HttpClass::Conflict,
            StatusKind::DeadlineExceeded => HttpClass::GatewayTimeout,
            StatusKind::Internal => HttpClass::ServerError,
        }
    }
}

/// Codes outside the order taxonomy are server errors.
pub fn classify(code: Code) -> HttpClass {
    StatusKind::from_code(code).map_or(HttpClass::ServerError, HttpClass::from)
}
