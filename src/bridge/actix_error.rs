//! Actix Web error adapters for bridge errors.
//!
//! Errors that reach the HTTP layer are answered with a plain-text body.
//! Invocation failures never get here; they travel over the session stream
//! as JSON-RPC errors.

use crate::error::Error;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingCredential | Error::UnknownSession(_) | Error::InvalidMessage(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::SessionBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            // Construction failures and timeouts both fail the connection
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
