//! Per-resume completeness figures and the aggregate parse success rate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::resume::ResumeRow;

/// Sections counted towards the completion score.
const SCORED_SECTIONS: u32 = 8;
const SKILLS_SHOWN: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ResumeAnalytics {
    pub id: Uuid,
    pub original_filename: String,
    pub full_name: Option<String>,
    pub is_parsed: bool,
    pub total_skills: usize,
    pub total_experience_entries: usize,
    pub total_education_entries: usize,
    pub total_certifications: usize,
    pub total_projects: usize,
    pub has_contact_info: bool,
    pub completion_score: f64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_resumes: usize,
    pub parsed_resumes: usize,
    pub parsing_success_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub summary: AnalyticsSummary,
    pub resumes: Vec<ResumeAnalytics>,
}

fn entry_count(value: &Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}

fn has_text(value: Option<&String>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

fn has_contact_info(row: &ResumeRow) -> bool {
    row.contact("email").is_some() || row.contact("phone").is_some()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of the eight resume sections present, to one decimal.
/// Unparsed resumes score zero.
pub fn completion_score(row: &ResumeRow) -> f64 {
    if !row.is_parsed {
        return 0.0;
    }
    let present = [
        has_text(row.full_name.as_ref()),
        has_text(row.summary.as_ref()),
        has_contact_info(row),
        !row.skills.is_empty(),
        entry_count(&row.work_experience) > 0,
        entry_count(&row.education) > 0,
        entry_count(&row.certifications) > 0,
        entry_count(&row.projects) > 0,
    ]
    .iter()
    .filter(|&&p| p)
    .count();

    round1(present as f64 / f64::from(SCORED_SECTIONS) * 100.0)
}

pub fn analyze(row: &ResumeRow) -> ResumeAnalytics {
    ResumeAnalytics {
        id: row.id,
        original_filename: row.original_filename.clone(),
        full_name: row.full_name.clone(),
        is_parsed: row.is_parsed,
        total_skills: row.skills.len(),
        total_experience_entries: entry_count(&row.work_experience),
        total_education_entries: entry_count(&row.education),
        total_certifications: entry_count(&row.certifications),
        total_projects: entry_count(&row.projects),
        has_contact_info: has_contact_info(row),
        completion_score: completion_score(row),
        uploaded_at: row.uploaded_at,
    }
}

pub fn summarize(rows: &[ResumeRow]) -> AnalyticsSummary {
    let total_resumes = rows.len();
    let parsed_resumes = rows.iter().filter(|r| r.is_parsed).count();
    let parsing_success_rate = if total_resumes == 0 {
        0.0
    } else {
        round1(parsed_resumes as f64 / total_resumes as f64 * 100.0)
    };
    AnalyticsSummary {
        total_resumes,
        parsed_resumes,
        parsing_success_rate,
    }
}

pub fn build_report(rows: &[ResumeRow]) -> AnalyticsReport {
    AnalyticsReport {
        summary: summarize(rows),
        resumes: rows.iter().map(analyze).collect(),
    }
}

/// First five skills, comma separated, with a count of the rest.
pub fn skills_display(skills: &[String]) -> String {
    let shown = skills
        .iter()
        .take(SKILLS_SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if skills.len() > SKILLS_SHOWN {
        format!("{shown} (+{} more)", skills.len() - SKILLS_SHOWN)
    } else {
        shown
    }
}
