//! Failure vocabulary for resume handling.
//!
//! Every variant is a `ResumeError`, so callers can match the enum to catch
//! any resume failure or inspect [`ResumeError::kind`] to catch one category.
//! `Validation` here is a resume-content rule violation and is unrelated to
//! request payload validation in [`crate::validation`].

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeErrorKind {
    Resume,
    FileProcessing,
    Parse,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResumeError {
    /// Resume failure not covered by a narrower category.
    #[error("{0}")]
    Resume(String),

    /// Reading or transforming the uploaded file itself failed.
    #[error("{0}")]
    FileProcessing(String),

    /// A readable file could not be broken into resume structure.
    #[error("{0}")]
    Parse(String),

    /// Resume content broke a domain rule.
    #[error("{0}")]
    Validation(String),
}

impl ResumeError {
    pub fn resume(message: impl Into<String>) -> Self {
        ResumeError::Resume(message.into())
    }

    pub fn file_processing(message: impl Into<String>) -> Self {
        ResumeError::FileProcessing(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        ResumeError::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ResumeError::Validation(message.into())
    }

    pub fn kind(&self) -> ResumeErrorKind {
        match self {
            ResumeError::Resume(_) => ResumeErrorKind::Resume,
            ResumeError::FileProcessing(_) => ResumeErrorKind::FileProcessing,
            ResumeError::Parse(_) => ResumeErrorKind::Parse,
            ResumeError::Validation(_) => ResumeErrorKind::Validation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ResumeError::Resume(msg)
            | ResumeError::FileProcessing(msg)
            | ResumeError::Parse(msg)
            | ResumeError::Validation(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<ResumeError> {
        vec![
            ResumeError::resume("generic"),
            ResumeError::file_processing("corrupt upload"),
            ResumeError::parse("no sections found"),
            ResumeError::validation("missing contact info"),
        ]
    }

    fn raise_parse() -> Result<(), ResumeError> {
        Err(ResumeError::parse("bad header"))
    }

    #[test]
    fn test_each_variant_preserves_message() {
        let messages: Vec<&str> = vec![
            "generic",
            "corrupt upload",
            "no sections found",
            "missing contact info",
        ];
        for (err, expected) in all_variants().iter().zip(messages) {
            assert_eq!(err.message(), expected);
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_kind_matches_variant() {
        let kinds: Vec<ResumeErrorKind> = all_variants().iter().map(ResumeError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResumeErrorKind::Resume,
                ResumeErrorKind::FileProcessing,
                ResumeErrorKind::Parse,
                ResumeErrorKind::Validation,
            ]
        );
    }

    #[test]
    fn test_catch_broad_catches_every_variant() {
        for err in all_variants() {
            let caught: Box<dyn std::error::Error> = Box::new(err.clone());
            let downcast = caught.downcast_ref::<ResumeError>();
            assert_eq!(downcast, Some(&err));
        }
    }

    #[test]
    fn test_parse_failure_caught_as_resume_failure_keeps_message() {
        let caught = match raise_parse() {
            Err(e) => e,
            Ok(()) => panic!("expected a parse failure"),
        };
        assert_eq!(caught.kind(), ResumeErrorKind::Parse);
        assert_eq!(caught.message(), "bad header");
    }

    #[test]
    fn test_narrow_catch_skips_other_kinds() {
        let parse_only: Vec<_> = all_variants()
            .into_iter()
            .filter(|e| e.kind() == ResumeErrorKind::Parse)
            .collect();
        assert_eq!(parse_only.len(), 1);
        assert_eq!(parse_only[0].message(), "no sections found");
    }
}
