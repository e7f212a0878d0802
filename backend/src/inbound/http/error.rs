//! HTTP mapping for domain errors.
//!
//! The domain decides the [`ErrorCode`]; this adapter owns the status code,
//! the `trace-id` header, and redaction of internal failures.

use std::borrow::Cow;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The payload a client may see.
///
/// Internal failures are replaced by a generic message that keeps only the
/// trace id; the original is logged so it can be found by that id.
fn public_view(failure: &Error) -> Cow<'_, Error> {
    match failure.code() {
        ErrorCode::InternalError => {
            error!(message = failure.message(), trace_id = ?failure.trace_id(), "internal error");
            let redacted = Error::internal("Internal server error");
            Cow::Owned(match failure.trace_id() {
                Some(id) => redacted.with_trace_id(id),
                None => redacted,
            })
        }
        ErrorCode::ServiceUnavailable => {
            warn!(message = failure.message(), trace_id = ?failure.trace_id(), "dependency unavailable");
            Cow::Borrowed(failure)
        }
        _ => Cow::Borrowed(failure),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        response.json(public_view(self).as_ref())
    }
}
