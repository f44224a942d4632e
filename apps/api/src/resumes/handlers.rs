use axum::{
    extract::{Multipart, Path, Query, State},
    http::{Method, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::permissions::{
    authorize, is_active, is_owner_or_staff_read_only, is_safe_method, is_verified, may_write,
    Principal,
};
use crate::resumes::analytics::{build_report, skills_display, AnalyticsReport};
use crate::resumes::errors::ResumeError;
use crate::resumes::upload::{validate_resume_file, FileCheck};
use crate::state::AppState;

/// Multipart field carrying the resume file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct ResumeListQuery {
    pub parsed: Option<String>,
    pub search: Option<String>,
}

impl ResumeListQuery {
    /// `?parsed=true|1` selects parsed resumes; any other value selects
    /// unparsed ones.
    pub fn parsed_filter(&self) -> Option<bool> {
        self.parsed
            .as_deref()
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
    }

    /// Case-insensitive substring pattern for `ILIKE`.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Serialize)]
pub struct ResumeListItem {
    pub id: Uuid,
    pub original_filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub full_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub skills_display: String,
    pub is_parsed: bool,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for ResumeListItem {
    fn from(row: ResumeRow) -> Self {
        ResumeListItem {
            contact_email: row.contact("email").map(String::from),
            contact_phone: row.contact("phone").map(String::from),
            skills_display: skills_display(&row.skills),
            id: row.id,
            original_filename: row.original_filename,
            file_type: row.file_type,
            file_size: row.file_size,
            full_name: row.full_name,
            is_parsed: row.is_parsed,
            uploaded_at: row.uploaded_at,
            updated_at: row.updated_at,
        }
    }
}

async fn owned_resumes(state: &AppState, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
    let rows = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY uploaded_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

async fn find_resume(state: &AppState, resume_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
    let resume = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
        .bind(resume_id)
        .fetch_optional(&state.db)
        .await?;
    Ok(resume)
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ResumeListQuery>,
) -> Result<Json<Vec<ResumeListItem>>, AppError> {
    authorize(&principal, is_active(&principal))?;
    let user_id = principal.user_id()?;

    let rows = sqlx::query_as::<_, ResumeRow>(
        r#"
        SELECT * FROM resumes
        WHERE user_id = $1
          AND ($2::BOOLEAN IS NULL OR is_parsed = $2)
          AND ($3::TEXT IS NULL OR full_name ILIKE $3 OR original_filename ILIKE $3)
        ORDER BY uploaded_at DESC
        "#,
    )
    .bind(user_id)
    .bind(query.parsed_filter())
    .bind(query.search_pattern())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(ResumeListItem::from).collect()))
}

/// GET /api/v1/resumes/analytics
pub async fn handle_resume_analytics(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<AnalyticsReport>, AppError> {
    authorize(&principal, is_active(&principal))?;
    let rows = owned_resumes(&state, principal.user_id()?).await?;
    Ok(Json(build_report(&rows)))
}

/// GET /api/v1/resumes/:id
///
/// Owners and staff can read a resume; anyone else is told it does not exist.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    method: Method,
    principal: Principal,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    authorize(&principal, is_active(&principal))?;
    let not_found = || AppError::NotFound(format!("Resume {resume_id} not found"));

    let resume = find_resume(&state, resume_id).await?.ok_or_else(not_found)?;
    if !is_owner_or_staff_read_only(&principal, &resume, is_safe_method(&method)) {
        warn!("User {:?} denied read of resume {resume_id}", principal.id);
        return Err(not_found());
    }

    Ok(Json(resume))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    method: Method,
    principal: Principal,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    authorize(&principal, is_active(&principal))?;

    let resume = find_resume(&state, resume_id).await?;
    authorize(
        &principal,
        may_write(&principal, resume.as_ref(), is_safe_method(&method)),
    )?;
    let Some(resume) = resume else {
        return Err(AppError::NotFound(format!("Resume {resume_id} not found")));
    };

    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(resume.id)
        .execute(&state.db)
        .await?;

    info!(
        "Resume {} deleted by user {}",
        resume.original_filename, resume.user_id
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/preflight
///
/// Runs the upload checks on a multipart `file` field without storing it.
pub async fn handle_preflight(
    principal: Principal,
    mut multipart: Multipart,
) -> Result<Json<FileCheck>, AppError> {
    authorize(&principal, is_verified(&principal))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ResumeError::file_processing(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ResumeError::file_processing(e.body_text()))?;

        let check = validate_resume_file(&filename, content_type.as_deref(), &bytes)?;
        info!(
            "Preflight accepted {} ({} bytes) for user {}",
            check.original_filename,
            check.file_size,
            principal.user_id()?
        );
        return Ok(Json(check));
    }

    Err(ResumeError::file_processing("No file was submitted.").into())
}
