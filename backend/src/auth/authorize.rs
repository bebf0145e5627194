//! Resource ownership checks
//!
//! - No IO
//! - No panics
//! - Exact owner-id equality, nothing hierarchical

use super::AuthUser;
use crate::error::ApiError;
use devconnector_shared::AuthError;
use thiserror::Error;
use uuid::Uuid;

/// A resource with a single recorded owner
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: resource owned by another user")]
    Forbidden,
}

impl From<AuthzError> for ApiError {
    fn from(_: AuthzError) -> Self {
        ApiError::Forbidden(AuthError::NotAuthorized.to_string())
    }
}

/// Whether `identity` owns `resource`
#[inline]
pub fn is_owner<R: Owned + ?Sized>(identity: &AuthUser, resource: &R) -> bool {
    resource.owner_id() == identity.user_id
}

/// Gate a mutation on ownership. Call before touching the resource.
pub fn ensure_owner<R: Owned + ?Sized>(
    identity: &AuthUser,
    resource: &R,
) -> Result<(), AuthzError> {
    if is_owner(identity, resource) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};

    struct Note {
        author: Uuid,
    }

    impl Owned for Note {
        fn owner_id(&self) -> Uuid {
            self.author
        }
    }

    #[test]
    fn test_owner_passes() {
        let user_id = Uuid::new_v4();
        let note = Note { author: user_id };
        let identity = AuthUser { user_id };

        assert!(is_owner(&identity, &note));
        assert_eq!(ensure_owner(&identity, &note), Ok(()));
    }

    #[test]
    fn test_other_user_rejected() {
        let note = Note {
            author: Uuid::new_v4(),
        };
        let identity = AuthUser {
            user_id: Uuid::new_v4(),
        };

        assert!(!is_owner(&identity, &note));
        assert_eq!(ensure_owner(&identity, &note), Err(AuthzError::Forbidden));
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let response = ApiError::from(AuthzError::Forbidden).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
