//! Credential resolution for new streaming connections.
//!
//! In multi-tenant mode the credential comes from the `apiKey` query
//! parameter, falling back to an `Authorization: Bearer` header. In
//! single-tenant mode the static credential from configuration is used and
//! anything the client sends is ignored. The value is never inspected beyond
//! being present and non-empty.

use crate::capability::Credential;
use crate::config::TenancyMode;
use crate::error::{Error, Result};

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use tracing;

/// Extract a bearer token from the request's Authorization header
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Pick the credential a connection runs under
///
/// # Errors
///
/// [`Error::MissingCredential`] in multi-tenant mode when the client
/// supplied nothing or an empty value.
pub fn resolve_credential(tenancy: &TenancyMode, supplied: Option<&str>) -> Result<Credential> {
    match tenancy {
        TenancyMode::Single { credential } => {
            if supplied.is_some() {
                tracing::debug!("Ignoring client credential in single-tenant mode");
            }
            Ok(Credential::new(credential.as_str()))
        }
        TenancyMode::Multi => match supplied {
            Some(value) if !value.is_empty() => Ok(Credential::new(value)),
            _ => {
                tracing::warn!("Streaming connection rejected: missing API key");
                Err(Error::MissingCredential)
            }
        },
    }
}
