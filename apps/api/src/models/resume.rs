use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::permissions::Owned;

/// A stored resume. Parse columns are written by the external parsing
/// pipeline and only read here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub extracted_text: Option<String>,
    pub full_name: Option<String>,
    pub summary: Option<String>,
    pub contact_info: Option<Value>,
    pub skills: Vec<String>,
    pub work_experience: Value,
    pub education: Value,
    pub certifications: Value,
    pub projects: Value,
    pub is_parsed: bool,
    pub parsing_error: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parsed_at: Option<DateTime<Utc>>,
}

impl ResumeRow {
    /// Non-empty string stored under `key` in `contact_info`.
    pub fn contact(&self, key: &str) -> Option<&str> {
        self.contact_info
            .as_ref()
            .and_then(|c| c.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl Owned for ResumeRow {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_resume(user_id: Uuid) -> ResumeRow {
        let now = Utc::now();
        ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            original_filename: "resume.pdf".to_string(),
            file_type: "pdf".to_string(),
            file_size: 2048,
            extracted_text: None,
            full_name: None,
            summary: None,
            contact_info: None,
            skills: vec![],
            work_experience: json!([]),
            education: json!([]),
            certifications: json!([]),
            projects: json!([]),
            is_parsed: false,
            parsing_error: None,
            uploaded_at: now,
            updated_at: now,
            parsed_at: None,
        }
    }

    #[test]
    fn test_contact_skips_blank_values() {
        let row = ResumeRow {
            contact_info: Some(json!({"email": "a@b.co", "phone": ""})),
            ..sample_resume(Uuid::new_v4())
        };
        assert_eq!(row.contact("email"), Some("a@b.co"));
        assert_eq!(row.contact("phone"), None);
        assert_eq!(row.contact("linkedin"), None);
    }

    #[test]
    fn test_resume_owned_by_uploader() {
        let owner = Uuid::new_v4();
        assert_eq!(sample_resume(owner).owner_id(), owner);
    }
}
