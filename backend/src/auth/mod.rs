//! Authentication module
//!
//! Provides JWT-based authentication with argon2 password hashing, the
//! access guard for protected routes, and resource ownership checks.

mod authorize;
mod jwt;
mod middleware;
mod password;

pub use authorize::{ensure_owner, is_owner, AuthzError, Owned};
pub use jwt::{
    Claims, JwtKeys, SigningError, TokenIssuer, TokenUser, TokenVerifier, VerificationError,
};
pub use middleware::{
    authenticate, extract_token, require_auth, AuthRejection, AuthUser, TOKEN_HEADER,
};
pub use password::PasswordService;
