//! Access guard
//!
//! Every protected route sits behind [`require_auth`]. A request either
//! leaves the guard AUTHORIZED, with an [`AuthUser`] in its extensions, or
//! is REJECTED with 401 before the handler runs:
//!
//! | Input                              | Outcome                                 |
//! |------------------------------------|-----------------------------------------|
//! | no token header                    | 401 "No token, authorization denied"    |
//! | token present, fails verification  | 401 "Token is not valid"                |
//! | token present, verifies            | identity injected, handler invoked      |
//!
//! The guard trusts the signed token only. It never reads user records and
//! never makes ownership decisions.

use crate::state::AppState;
use axum::{
    extract::{FromRef, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use devconnector_shared::{AuthError, MessageResponse};
use tracing::debug;
use uuid::Uuid;

use super::{TokenVerifier, VerificationError};

/// Header carrying the credential
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Identity resolved from a verified credential.
///
/// Lives in the request extensions for the duration of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Why the guard refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    NoToken,
    InvalidToken(VerificationError),
}

impl AuthRejection {
    /// Message shown to the client. Verification sub-reasons stay internal.
    pub fn client_error(&self) -> AuthError {
        match self {
            Self::NoToken => AuthError::NoToken,
            Self::InvalidToken(_) => AuthError::InvalidToken,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::InvalidToken(e) => e.as_str(),
        }
    }

    fn record(&self) {
        debug!(reason = self.reason(), "Request rejected by access guard");
        metrics::counter!("auth_rejections_total", "reason" => self.reason()).increment(1);
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(MessageResponse::new(self.client_error().to_string()));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Raw credential bytes from `x-auth-token`, falling back to a Bearer
/// `Authorization` header.
///
/// Only a missing header or an empty value counts as absent. Anything else,
/// blank or not even UTF-8, is a present token for the verifier to refuse.
pub fn extract_token(headers: &HeaderMap) -> Option<&[u8]> {
    headers
        .get(TOKEN_HEADER)
        .map(HeaderValue::as_bytes)
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.as_bytes().strip_prefix(b"Bearer "))
                .filter(|value| !value.is_empty())
        })
}

/// Run the guard's decision over a set of request headers
pub fn authenticate(
    verifier: &TokenVerifier,
    headers: &HeaderMap,
) -> Result<AuthUser, AuthRejection> {
    let raw = extract_token(headers).ok_or(AuthRejection::NoToken)?;
    let token = std::str::from_utf8(raw)
        .map_err(|_| AuthRejection::InvalidToken(VerificationError::InvalidSignature))?;
    verifier.verify(token).map_err(AuthRejection::InvalidToken)
}

/// Middleware applied to protected routers via `route_layer`
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    match authenticate(state.verifier(), request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(rejection) => {
            rejection.record();
            Err(rejection)
        }
    }
}

/// Handlers take `AuthUser` as an argument to receive the resolved identity.
///
/// Behind [`require_auth`] this is a plain extension lookup. On a route the
/// guard does not cover, the extractor runs the same decision itself.
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let app_state = AppState::from_ref(state);
        authenticate(app_state.verifier(), &parts.headers).map_err(|rejection| {
            rejection.record();
            rejection
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtKeys, TokenIssuer};
    use rstest::rstest;
    use secrecy::Secret;

    fn pair() -> (TokenIssuer, TokenVerifier) {
        let keys = JwtKeys::new(&Secret::new("guard-secret".to_string())).unwrap();
        (TokenIssuer::new(keys.clone(), 3600), TokenVerifier::new(keys))
    }

    fn headers(entries: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in entries {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[rstest]
    #[case(&[], None)]
    #[case(&[("x-auth-token", "")], None)]
    #[case(&[("x-auth-token", "abc")], Some("abc"))]
    #[case(&[("x-auth-token", "   ")], Some("   "))]
    #[case(&[("authorization", "Bearer abc")], Some("abc"))]
    #[case(&[("authorization", "Basic dXNlcjpwYXNz")], None)]
    #[case(&[("x-auth-token", "first"), ("authorization", "Bearer second")], Some("first"))]
    fn test_extract_token(
        #[case] entries: &[(&'static str, &str)],
        #[case] expected: Option<&str>,
    ) {
        let map = headers(entries);
        assert_eq!(extract_token(&map), expected.map(str::as_bytes));
    }

    #[rstest]
    #[case(HeaderValue::from_static("   "))]
    #[case(HeaderValue::from_bytes(b"abc\xfa.def").unwrap())]
    fn test_present_but_unusable_token_is_invalid(#[case] value: HeaderValue) {
        let (_, verifier) = pair();
        let mut map = HeaderMap::new();
        map.insert(TOKEN_HEADER, value);

        let rejection = authenticate(&verifier, &map).unwrap_err();
        assert!(matches!(rejection, AuthRejection::InvalidToken(_)));
        assert_eq!(rejection.client_error(), AuthError::InvalidToken);
    }

    #[test]
    fn test_no_header_rejected_as_no_token() {
        let (_, verifier) = pair();
        assert_eq!(
            authenticate(&verifier, &HeaderMap::new()),
            Err(AuthRejection::NoToken)
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let (_, verifier) = pair();
        let map = headers(&[("x-auth-token", "invalid.token.here")]);

        let rejection = authenticate(&verifier, &map).unwrap_err();
        assert_eq!(rejection.client_error(), AuthError::InvalidToken);
    }

    #[test]
    fn test_valid_token_resolves_identity() {
        let (issuer, verifier) = pair();
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id).unwrap();
        let map = headers(&[("x-auth-token", &token)]);

        assert_eq!(authenticate(&verifier, &map), Ok(AuthUser { user_id }));
    }

    #[test]
    fn test_rejection_response_is_401() {
        let response = AuthRejection::InvalidToken(VerificationError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_sub_reason_not_exposed() {
        let expired = AuthRejection::InvalidToken(VerificationError::Expired);
        let forged = AuthRejection::InvalidToken(VerificationError::InvalidSignature);
        assert_eq!(expired.client_error(), forged.client_error());
    }
}
