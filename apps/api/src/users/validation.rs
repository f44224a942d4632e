//! Payload checks for account endpoints.
//!
//! Field-level problems are collected first; cross-field checks (password
//! confirmation) only run once every field is individually valid.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;

use crate::validation::ValidationErrors;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_BIO_LENGTH: usize = 500;

const REQUIRED: &str = "This field is required.";

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "qwerty123",
    "iloveyou",
    "letmein1",
    "welcome1",
    "abc12345",
];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?1?\d{9,15}$").expect("static regex"))
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("static regex"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
}

/// Registration data that passed every check. Passwords are dropped; the
/// authentication backend owns credential storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl RegistrationRequest {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = self.email.trim().to_lowercase();
        check_email(&email, &mut errors);
        check_username(&self.username, &mut errors);
        check_name("first_name", &self.first_name, &mut errors);
        check_name("last_name", &self.last_name, &mut errors);
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            check_phone(phone, &mut errors);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        } else {
            for message in password_problems(&self.password, &self.username, &email) {
                errors.add("password", message);
            }
        }
        if self.password_confirm.is_empty() {
            errors.add("password_confirm", REQUIRED);
        }

        if errors.is_empty() && self.password != self.password_confirm {
            errors.add_non_field("Passwords don't match");
        }

        errors.into_result(NewUser {
            email,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone().filter(|p| !p.is_empty()),
        })
    }
}

/// Partial profile update. Absent fields are left unchanged; a blank `phone`
/// clears the stored number. Read-only fields such as `email` or
/// `is_verified` are not accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(username) = &self.username {
            check_username(username, &mut errors);
        }
        if let Some(first_name) = &self.first_name {
            check_name("first_name", first_name, &mut errors);
        }
        if let Some(last_name) = &self.last_name {
            check_name("last_name", last_name, &mut errors);
        }
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            check_phone(phone, &mut errors);
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > MAX_BIO_LENGTH {
                errors.add(
                    "bio",
                    format!("Ensure this field has no more than {MAX_BIO_LENGTH} characters."),
                );
            }
        }

        errors.into_result(self)
    }

    /// `"phone": ""` asks for the number to be removed.
    pub fn clears_phone(&self) -> bool {
        self.phone.as_deref() == Some("")
    }

    /// The phone number to store, if one was given.
    pub fn new_phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.bio.is_none()
            && self.date_of_birth.is_none()
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !email_re().is_match(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_username(username: &str, errors: &mut ValidationErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        );
    } else if !username_re().is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_name(field: &str, value: &str, errors: &mut ValidationErrors) {
    if value.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
    }
}

fn check_phone(phone: &str, errors: &mut ValidationErrors) {
    if !phone_re().is_match(phone) {
        errors.add(
            "phone",
            "Enter a valid phone number: up to 15 digits, optionally prefixed with '+'.",
        );
    }
}

/// Strength problems with `password`, empty when it is acceptable.
pub fn password_problems(password: &str, username: &str, email: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let lower = password.to_lowercase();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    let email_local = email.split('@').next().unwrap_or_default();
    for (label, attr) in [("username", username), ("email address", email_local)] {
        let attr = attr.to_lowercase();
        let close = lower == attr || (lower.contains(&attr) && lower.len() <= attr.len() + 3);
        if attr.chars().count() >= 3 && close {
            problems.push(format!("The password is too similar to the {label}."));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::NON_FIELD_ERRORS;

    fn registration() -> RegistrationRequest {
        RegistrationRequest {
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            password: "strongpass123".to_string(),
            password_confirm: "strongpass123".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_registration_valid_data() {
        let user = registration().validate().unwrap();
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.username, "testuser");
        assert_eq!(user.phone, None);
    }

    #[test]
    fn test_registration_password_mismatch() {
        let req = RegistrationRequest {
            password_confirm: "differentpass".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            ..registration()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.contains(NON_FIELD_ERRORS));
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            &["Passwords don't match".to_string()]
        );
    }

    #[test]
    fn test_field_errors_suppress_mismatch_check() {
        let req = RegistrationRequest {
            email: "not-an-email".to_string(),
            password_confirm: "differentpass".to_string(),
            ..registration()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.contains("email"));
        assert!(!errors.contains(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_required_fields() {
        let req = RegistrationRequest {
            email: String::new(),
            username: String::new(),
            password: String::new(),
            password_confirm: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
        };
        let errors = req.validate().unwrap_err();
        for field in ["email", "username", "password", "password_confirm"] {
            assert_eq!(errors.get(field).unwrap(), &[REQUIRED.to_string()], "{field}");
        }
    }

    #[test]
    fn test_email_normalized() {
        let req = RegistrationRequest {
            email: "  Test@Example.COM ".to_string(),
            ..registration()
        };
        assert_eq!(req.validate().unwrap().email, "test@example.com");
    }

    #[test]
    fn test_short_password_rejected() {
        let req = RegistrationRequest {
            password: "abc12".to_string(),
            password_confirm: "abc12".to_string(),
            ..registration()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.get("password").unwrap()[0].contains("too short"));
    }

    #[test]
    fn test_numeric_and_common_passwords() {
        let problems = password_problems("12345678", "someone", "a@b.co");
        assert!(problems.iter().any(|p| p.contains("entirely numeric")));
        assert!(problems.iter().any(|p| p.contains("too common")));
    }

    #[test]
    fn test_password_similar_to_username() {
        let problems = password_problems("testuser1", "testuser", "x@example.com");
        assert!(problems.iter().any(|p| p.contains("username")));
        assert!(password_problems("strongpass123", "testuser", "test@example.com").is_empty());
    }

    #[test]
    fn test_phone_format() {
        for good in ["+14155552671", "4155552671", "123456789"] {
            let req = RegistrationRequest {
                phone: Some(good.to_string()),
                ..registration()
            };
            assert!(req.validate().is_ok(), "{good}");
        }
        for bad in ["12345", "+1-415-555-2671", "phone"] {
            let req = RegistrationRequest {
                phone: Some(bad.to_string()),
                ..registration()
            };
            assert!(req.validate().unwrap_err().contains("phone"), "{bad}");
        }
    }

    #[test]
    fn test_username_characters() {
        let req = RegistrationRequest {
            username: "test user".to_string(),
            ..registration()
        };
        assert!(req.validate().unwrap_err().contains("username"));
    }

    #[test]
    fn test_profile_update_bio_limit() {
        let update = ProfileUpdate {
            bio: Some("x".repeat(MAX_BIO_LENGTH + 1)),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().unwrap_err().contains("bio"));

        let update = ProfileUpdate {
            bio: Some("x".repeat(MAX_BIO_LENGTH)),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_profile_update_blank_phone_clears() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"phone": ""}"#).unwrap();
        let update = update.validate().unwrap();
        assert!(update.clears_phone());
        assert_eq!(update.new_phone(), None);
        assert!(!update.is_empty());
    }

    #[test]
    fn test_profile_update_phone_checked() {
        let update = ProfileUpdate {
            phone: Some("+14155552671".to_string()),
            ..ProfileUpdate::default()
        };
        let update = update.validate().unwrap();
        assert!(!update.clears_phone());
        assert_eq!(update.new_phone(), Some("+14155552671"));

        let update = ProfileUpdate {
            phone: Some("12345".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().unwrap_err().contains("phone"));
    }

    #[test]
    fn test_profile_update_ignores_read_only_fields() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"email": "new@example.com", "is_verified": true}"#).unwrap();
        assert!(update.is_empty());
    }
}
