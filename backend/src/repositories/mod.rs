//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod post;
pub mod profile;
pub mod user;

pub use post::{CommentRecord, CreatePost, LikeRecord, PostRecord, PostRepository};
pub use profile::{
    CreateEducation, CreateExperience, EducationRecord, ExperienceRecord, ProfileRecord,
    ProfileRepository, UpsertProfile,
};
pub use user::{CreateUser, UserRecord, UserRepository};
