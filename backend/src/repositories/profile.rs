//! Profile repository for database operations
//!
//! Every write is keyed by the owning user's id, so a caller can only ever
//! touch the profile (and experience/education rows) of the identity it
//! passes in.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use devconnector_shared::SocialLinks;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

/// Profile record joined with its owner's public details
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub owner_name: String,
    pub owner_avatar: String,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub github_username: Option<String>,
    pub social: Json<SocialLinks>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExperienceRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EducationRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a profile.
///
/// `None` scalars leave the stored value alone on update; `social` always
/// replaces the stored links.
#[derive(Debug, Clone, Default)]
pub struct UpsertProfile {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub github_username: Option<String>,
    pub skills: Vec<String>,
    pub social: SocialLinks,
}

#[derive(Debug, Clone)]
pub struct CreateExperience {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateEducation {
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

const PROFILE_COLUMNS: &str = r#"
    p.id, p.user_id, u.name AS owner_name, u.avatar AS owner_avatar,
    p.company, p.website, p.location, p.status, p.skills, p.bio,
    p.github_username, p.social, p.created_at, p.updated_at
"#;

/// Profile repository for database operations
pub struct ProfileRepository;

impl ProfileRepository {
    /// Create the user's profile, or update it if one exists
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        input: UpsertProfile,
    ) -> Result<ProfileRecord> {
        let query = format!(
            r#"
            WITH p AS (
                INSERT INTO profiles (
                    user_id, company, website, location, status, skills, bio,
                    github_username, social
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (user_id) DO UPDATE SET
                    company = COALESCE(EXCLUDED.company, profiles.company),
                    website = COALESCE(EXCLUDED.website, profiles.website),
                    location = COALESCE(EXCLUDED.location, profiles.location),
                    status = EXCLUDED.status,
                    skills = EXCLUDED.skills,
                    bio = COALESCE(EXCLUDED.bio, profiles.bio),
                    github_username = COALESCE(EXCLUDED.github_username, profiles.github_username),
                    social = EXCLUDED.social,
                    updated_at = NOW()
                RETURNING *
            )
            SELECT {PROFILE_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.user_id
            "#
        );

        let record = sqlx::query_as::<_, ProfileRecord>(&query)
            .bind(user_id)
            .bind(input.company)
            .bind(input.website)
            .bind(input.location)
            .bind(input.status)
            .bind(input.skills)
            .bind(input.bio)
            .bind(input.github_username)
            .bind(Json(input.social))
            .fetch_one(pool)
            .await?;

        Ok(record)
    }

    /// Find the profile belonging to a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRecord>> {
        let query = format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1
            "#
        );

        let record = sqlx::query_as::<_, ProfileRecord>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(record)
    }

    /// All profiles, most recently created first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ProfileRecord>> {
        let query = format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at DESC
            "#
        );

        let records = sqlx::query_as::<_, ProfileRecord>(&query)
            .fetch_all(pool)
            .await?;

        Ok(records)
    }

    /// Experience rows for a set of profiles, newest first
    pub async fn experience_for(
        pool: &PgPool,
        profile_ids: &[Uuid],
    ) -> Result<Vec<ExperienceRecord>> {
        let records = sqlx::query_as::<_, ExperienceRecord>(
            r#"
            SELECT id, profile_id, title, company, location, from_date, to_date,
                   current, description, created_at
            FROM profile_experience
            WHERE profile_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(profile_ids)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Education rows for a set of profiles, newest first
    pub async fn education_for(
        pool: &PgPool,
        profile_ids: &[Uuid],
    ) -> Result<Vec<EducationRecord>> {
        let records = sqlx::query_as::<_, EducationRecord>(
            r#"
            SELECT id, profile_id, school, degree, field_of_study, from_date, to_date,
                   current, description, created_at
            FROM profile_education
            WHERE profile_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(profile_ids)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Add an experience entry to the user's profile.
    ///
    /// Returns `None` when the user has no profile.
    pub async fn add_experience(
        pool: &PgPool,
        user_id: Uuid,
        input: CreateExperience,
    ) -> Result<Option<ExperienceRecord>> {
        let record = sqlx::query_as::<_, ExperienceRecord>(
            r#"
            INSERT INTO profile_experience (
                profile_id, title, company, location, from_date, to_date, current, description
            )
            SELECT id, $2, $3, $4, $5, $6, $7, $8
            FROM profiles
            WHERE user_id = $1
            RETURNING id, profile_id, title, company, location, from_date, to_date,
                      current, description, created_at
            "#,
        )
        .bind(user_id)
        .bind(input.title)
        .bind(input.company)
        .bind(input.location)
        .bind(input.from_date)
        .bind(input.to_date)
        .bind(input.current)
        .bind(input.description)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Remove an experience entry from the user's own profile
    pub async fn delete_experience(
        pool: &PgPool,
        user_id: Uuid,
        experience_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM profile_experience e
            USING profiles p
            WHERE e.id = $1 AND e.profile_id = p.id AND p.user_id = $2
            "#,
        )
        .bind(experience_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add an education entry to the user's profile.
    ///
    /// Returns `None` when the user has no profile.
    pub async fn add_education(
        pool: &PgPool,
        user_id: Uuid,
        input: CreateEducation,
    ) -> Result<Option<EducationRecord>> {
        let record = sqlx::query_as::<_, EducationRecord>(
            r#"
            INSERT INTO profile_education (
                profile_id, school, degree, field_of_study, from_date, to_date, current,
                description
            )
            SELECT id, $2, $3, $4, $5, $6, $7, $8
            FROM profiles
            WHERE user_id = $1
            RETURNING id, profile_id, school, degree, field_of_study, from_date, to_date,
                      current, description, created_at
            "#,
        )
        .bind(user_id)
        .bind(input.school)
        .bind(input.degree)
        .bind(input.field_of_study)
        .bind(input.from_date)
        .bind(input.to_date)
        .bind(input.current)
        .bind(input.description)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Remove an education entry from the user's own profile
    pub async fn delete_education(
        pool: &PgPool,
        user_id: Uuid,
        education_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM profile_education e
            USING profiles p
            WHERE e.id = $1 AND e.profile_id = p.id AND p.user_id = $2
            "#,
        )
        .bind(education_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require database - see tests/profile_integration_test.rs
}
