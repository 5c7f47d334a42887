use std::time::Duration;
use tonic::{Code, Status};

use crate::domain::order::{OrderError, StatusKind};

// ============================================================================
// Status Mapping
// ============================================================================

impl StatusKind {
    pub fn code(self) -> Code {
        match self {
            StatusKind::InvalidArgument => Code::InvalidArgument,
            StatusKind::NotFound => Code::NotFound,
            StatusKind::FailedPrecondition => Code::FailedPrecondition,
            StatusKind::DeadlineExceeded => Code::DeadlineExceeded,
            StatusKind::Internal => Code::Internal,
        }
    }

    /// Inverse of [`StatusKind::code`]; codes outside the taxonomy give `None`.
    pub fn from_code(code: Code) -> Option<Self> {
        match code {
            Code::InvalidArgument => Some(StatusKind::InvalidArgument),
            Code::NotFound => Some(StatusKind::NotFound),
            Code::FailedPrecondition => Some(StatusKind::FailedPrecondition),
            Code::DeadlineExceeded => Some(StatusKind::DeadlineExceeded),
            Code::Internal => Some(StatusKind::Internal),
            _ => None,
        }
    }
}

impl From<OrderError> for Status {
    fn from(err: OrderError) -> Self {
        Status::new(err.kind().code(), err.to_string())
    }
}

/// Parse a `grpc-timeout` header value: up to 8 digits and a unit
/// (H, M, S, m, u, n).
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if !value.is_ascii() || value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "H" => Some(Duration::from_secs(amount * 3600)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}
