//! Profile service - business logic for developer profiles

use crate::error::ApiError;
use crate::repositories::{
    CreateEducation, CreateExperience, EducationRecord, ExperienceRecord, ProfileRecord,
    ProfileRepository, UpsertProfile, UserRepository,
};
use crate::services::GithubClient;
use chrono::NaiveDate;
use devconnector_shared::validation::{non_empty, parse_date, parse_skills};
use devconnector_shared::{
    EducationRequest, EducationResponse, ExperienceRequest, ExperienceResponse, GithubRepo,
    ProfileOwner, ProfileRequest, ProfileResponse, ResourceError, SocialLinks,
};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Profile service for profile operations
pub struct ProfileService;

impl ProfileService {
    /// The caller's own profile
    pub async fn get_mine(pool: &PgPool, user_id: Uuid) -> Result<ProfileResponse, ApiError> {
        let record = ProfileRepository::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| ApiError::BadRequest(ResourceError::NoProfileForUser.to_string()))?;

        Self::assemble_one(pool, record).await
    }

    /// Any user's profile, looked up by their user id
    pub async fn get_by_user(pool: &PgPool, user_id: Uuid) -> Result<ProfileResponse, ApiError> {
        let record = ProfileRepository::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| ApiError::BadRequest(ResourceError::ProfileNotFound.to_string()))?;

        Self::assemble_one(pool, record).await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<ProfileResponse>, ApiError> {
        let records = ProfileRepository::list_all(pool).await?;
        Self::assemble(pool, records).await
    }

    /// Create the caller's profile or update the existing one
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        request: ProfileRequest,
    ) -> Result<ProfileResponse, ApiError> {
        let record = ProfileRepository::upsert(pool, user_id, upsert_input(request)).await?;
        info!(user_id = %user_id, "Profile saved");

        Self::assemble_one(pool, record).await
    }

    /// Delete the caller's account together with everything it owns
    pub async fn delete_account(pool: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
        if !UserRepository::delete(pool, user_id).await? {
            return Err(ApiError::NotFound(ResourceError::UserNotFound.to_string()));
        }

        metrics::counter!("users_deleted_total").increment(1);
        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    pub async fn add_experience(
        pool: &PgPool,
        user_id: Uuid,
        request: ExperienceRequest,
    ) -> Result<ProfileResponse, ApiError> {
        let (from_date, to_date) = entry_dates(request.from.as_deref(), request.to.as_deref())?;

        ProfileRepository::add_experience(
            pool,
            user_id,
            CreateExperience {
                title: request.title.trim().to_string(),
                company: request.company.trim().to_string(),
                location: non_empty(request.location),
                from_date,
                to_date,
                current: request.current,
                description: non_empty(request.description),
            },
        )
        .await?
        .ok_or_else(|| ApiError::BadRequest(ResourceError::NoProfileForUser.to_string()))?;

        Self::get_mine(pool, user_id).await
    }

    /// Remove an experience entry. Unknown ids leave the profile unchanged.
    pub async fn delete_experience(
        pool: &PgPool,
        user_id: Uuid,
        experience_id: Uuid,
    ) -> Result<ProfileResponse, ApiError> {
        ProfileRepository::delete_experience(pool, user_id, experience_id).await?;
        Self::get_mine(pool, user_id).await
    }

    pub async fn add_education(
        pool: &PgPool,
        user_id: Uuid,
        request: EducationRequest,
    ) -> Result<ProfileResponse, ApiError> {
        let (from_date, to_date) = entry_dates(request.from.as_deref(), request.to.as_deref())?;

        ProfileRepository::add_education(
            pool,
            user_id,
            CreateEducation {
                school: request.school.trim().to_string(),
                degree: request.degree.trim().to_string(),
                field_of_study: request.fieldofstudy.trim().to_string(),
                from_date,
                to_date,
                current: request.current,
                description: non_empty(request.description),
            },
        )
        .await?
        .ok_or_else(|| ApiError::BadRequest(ResourceError::NoProfileForUser.to_string()))?;

        Self::get_mine(pool, user_id).await
    }

    /// Remove an education entry. Unknown ids leave the profile unchanged.
    pub async fn delete_education(
        pool: &PgPool,
        user_id: Uuid,
        education_id: Uuid,
    ) -> Result<ProfileResponse, ApiError> {
        ProfileRepository::delete_education(pool, user_id, education_id).await?;
        Self::get_mine(pool, user_id).await
    }

    pub async fn github_repos(
        github: &GithubClient,
        username: &str,
    ) -> Result<Vec<GithubRepo>, ApiError> {
        github
            .recent_repos(username)
            .await?
            .ok_or_else(|| ApiError::NotFound(ResourceError::GithubProfileNotFound.to_string()))
    }

    async fn assemble_one(
        pool: &PgPool,
        record: ProfileRecord,
    ) -> Result<ProfileResponse, ApiError> {
        Self::assemble(pool, vec![record])
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("profile vanished during assembly")))
    }

    /// Attach experience and education with one query each
    async fn assemble(
        pool: &PgPool,
        records: Vec<ProfileRecord>,
    ) -> Result<Vec<ProfileResponse>, ApiError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut experience = group_by(
            ProfileRepository::experience_for(pool, &ids).await?,
            |e| e.profile_id,
        );
        let mut education = group_by(
            ProfileRepository::education_for(pool, &ids).await?,
            |e| e.profile_id,
        );

        Ok(records
            .into_iter()
            .map(|record| {
                let exp = experience.remove(&record.id).unwrap_or_default();
                let edu = education.remove(&record.id).unwrap_or_default();
                to_response(record, exp, edu)
            })
            .collect())
    }
}

fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped
}

fn upsert_input(request: ProfileRequest) -> UpsertProfile {
    UpsertProfile {
        company: non_empty(request.company),
        website: non_empty(request.website),
        location: non_empty(request.location),
        bio: non_empty(request.bio),
        status: request.status.trim().to_string(),
        github_username: non_empty(request.githubusername),
        skills: parse_skills(&request.skills),
        social: SocialLinks {
            youtube: non_empty(request.youtube),
            twitter: non_empty(request.twitter),
            facebook: non_empty(request.facebook),
            linkedin: non_empty(request.linkedin),
            instagram: non_empty(request.instagram),
        },
    }
}

fn to_response(
    record: ProfileRecord,
    experience: Vec<ExperienceRecord>,
    education: Vec<EducationRecord>,
) -> ProfileResponse {
    ProfileResponse {
        id: record.id.to_string(),
        user: ProfileOwner {
            id: record.user_id.to_string(),
            name: record.owner_name,
            avatar: record.owner_avatar,
        },
        company: record.company,
        website: record.website,
        location: record.location,
        status: record.status,
        skills: record.skills,
        bio: record.bio,
        githubusername: record.github_username,
        social: record.social.0,
        experience: experience
            .into_iter()
            .map(|e| ExperienceResponse {
                id: e.id.to_string(),
                title: e.title,
                company: e.company,
                location: e.location,
                from: e.from_date,
                to: e.to_date,
                current: e.current,
                description: e.description,
            })
            .collect(),
        education: education
            .into_iter()
            .map(|e| EducationResponse {
                id: e.id.to_string(),
                school: e.school,
                degree: e.degree,
                fieldofstudy: e.field_of_study,
                from: e.from_date,
                to: e.to_date,
                current: e.current,
                description: e.description,
            })
            .collect(),
        date: record.created_at,
    }
}

/// Start and optional end of an experience or education entry.
///
/// A blank end date means the entry has none.
fn entry_dates(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(NaiveDate, Option<NaiveDate>), ApiError> {
    let from_date = from
        .and_then(parse_date)
        .ok_or_else(|| ApiError::validation("From date is required"))?;

    let to_date = match to.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(
            parse_date(raw).ok_or_else(|| ApiError::validation("To date is not a valid date"))?,
        ),
        None => None,
    };

    Ok((from_date, to_date))
}
