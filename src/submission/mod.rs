//! Write side: turning one user action into one classified outcome.

pub mod orchestrator;

pub use orchestrator::Orchestrator;

use thiserror::Error;

use crate::consts::DEFAULT_SCORE;
pub use crate::score::Score;
use crate::store::StoreError;

/// Where the orchestrator is in handling a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    InFlight,
    Reconciled { success: bool },
}

/// The input fields the user edits. Owned by the terminal surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub name: String,
    pub score: Score,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            name: String::new(),
            score: Score::clamped(DEFAULT_SCORE as i64),
        }
    }
}

/// A validated submission: trimmed, non-empty name and an in-range score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub name: String,
    pub score: Score,
}

impl SubmissionRequest {
    pub fn new(name: &str, score: i64) -> Result<Self, SubmitError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SubmitError::Validation);
        }
        Ok(Self {
            name: name.to_string(),
            score: Score::clamped(score),
        })
    }
}

/// Every way a submission can fail, as the user sees it.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Por favor, introduce un nombre.")]
    Validation,
    #[error(
        "Configura store.url y store.key (o SUPABASE_URL y SUPABASE_KEY), o usa el almacén local con --store local."
    )]
    Config,
    #[error("Error al guardar. Verifica las credenciales o si la tabla \"{table}\" existe.")]
    Store { source: StoreError, table: String },
    #[error("Error inesperado: {0}")]
    Unexpected(String),
}

/// The single result of one submission.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Persisted. `form` is the cleared form the caller should adopt.
    Success { comment: String, form: Form },
    Failure(SubmitError),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Comment to display. Only a persisted submission has one.
    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Success { comment, .. } => Some(comment),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(e) => Some(e),
        }
    }

    /// The line shown to the user.
    pub fn message(&self) -> String {
        match self {
            Self::Success { comment, .. } => comment.clone(),
            Self::Failure(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_trims_name() {
        let request = SubmissionRequest::new("  Ana \t", 87).unwrap();
        assert_eq!(request.name, "Ana");
        assert_eq!(request.score.value(), 87);
    }

    #[test]
    fn request_rejects_blank_names() {
        assert!(matches!(
            SubmissionRequest::new("", 50),
            Err(SubmitError::Validation)
        ));
        assert!(matches!(
            SubmissionRequest::new(" \n\t ", 50),
            Err(SubmitError::Validation)
        ));
    }

    #[test]
    fn request_clamps_score() {
        assert_eq!(SubmissionRequest::new("Ana", 150).unwrap().score.value(), 100);
        assert_eq!(SubmissionRequest::new("Ana", -10).unwrap().score.value(), 0);
    }

    #[test]
    fn default_form_is_cleared() {
        let form = Form::default();
        assert!(form.name.is_empty());
        assert_eq!(form.score.value(), 50);
    }

    #[test]
    fn store_error_message_names_table() {
        let err = SubmitError::Store {
            source: StoreError::Status {
                status: 404,
                body: String::new(),
            },
            table: "clasificacion".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error al guardar. Verifica las credenciales o si la tabla \"clasificacion\" existe."
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn outcome_accessors() {
        let ok = SubmissionOutcome::Success {
            comment: "¡Vamos!".to_string(),
            form: Form::default(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.comment(), Some("¡Vamos!"));
        assert_eq!(ok.message(), "¡Vamos!");

        let failed = SubmissionOutcome::Failure(SubmitError::Unexpected("boom".to_string()));
        assert!(!failed.is_success());
        assert!(failed.comment().is_none());
        assert_eq!(failed.message(), "Error inesperado: boom");
    }
}
