//! Error types for the DevConnector application
//!
//! The `Display` text of these variants is part of the wire contract: the
//! front-end matches on the exact strings.

use thiserror::Error;

/// Authentication and authorization failures as seen by a client
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token, authorization denied")]
    NoToken,

    #[error("Token is not valid")]
    InvalidToken,

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("User not authorized")]
    NotAuthorized,
}

/// Resource lookup failures as seen by a client
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("There is no profile for this user")]
    NoProfileForUser,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment does not exist")]
    CommentNotFound,

    #[error("Post already liked")]
    AlreadyLiked,

    #[error("Post has not yet been liked")]
    NotYetLiked,

    #[error("No GitHub profile found")]
    GithubProfileNotFound,

    #[error("User not found")]
    UserNotFound,
}
