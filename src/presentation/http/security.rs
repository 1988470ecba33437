use poem::{Error as PoemError, Result as PoemResult, http::StatusCode};
use poem_openapi::SecurityScheme;
use poem_openapi::auth::Bearer;

use crate::application::services::jwt::{CallerIdentity, JwtService};

#[derive(SecurityScheme)]
#[oai(ty = "bearer", bearer_format = "JWT")]
pub struct JwtAuth(pub Bearer);

impl JwtAuth {
    pub fn into_caller(self, jwt: &JwtService) -> PoemResult<CallerIdentity> {
        jwt.verify(&self.0.token).map_err(|_| {
            PoemError::from_string("invalid or expired token", StatusCode::UNAUTHORIZED)
        })
    }
}

/// Resolves an optional `Authorization: Bearer <token>` header. A missing,
/// malformed or unverifiable token yields `None` instead of rejecting the
/// request, so the caller can answer with its own structured error.
pub fn caller_from_header(header: Option<&str>, jwt: &JwtService) -> Option<CallerIdentity> {
    let token = header?.trim().strip_prefix("Bearer ")?.trim();
    jwt.verify(token).ok()
}
