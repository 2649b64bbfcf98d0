//! Error types for invoice validation and submission.
//!
//! Two tiers: [`ValidationError`] is raised while constructing an
//! [`OpusConfig`](crate::OpusConfig) or [`InvoiceData`](crate::InvoiceData);
//! [`InvoiceError`] is raised while a submission runs and carries the
//! [`Phase`] it failed in.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error used by the CLI and convenience entry points.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration or invoice input was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The browser-driven submission failed
    #[error(transparent)]
    Submission(#[from] InvoiceError),

    /// Failed to read an input file or start the runtime
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invoice input was not valid JSON, or the result could not be printed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing invoice file argument
    #[error("Missing invoice file argument. Usage: opus-invoice <invoice.json> [--csv-only]")]
    MissingArgument,
}

/// An input key of the configuration or the invoice record.
///
/// [`Field::name`] spells the key exactly as callers supply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    MunicipalityCode,
    Username,
    Password,
    DebetPsp,
    KreditPsp,
    Tekst,
    Reference,
    Bogforingsdato,
    Kommentar,
    DebetArtskonto,
    KreditArtskonto,
    DebetPosteringsTekst,
    KreditPosteringsTekst,
    Kost,
    BilagsFilePath,
    CsvFilename,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::MunicipalityCode => "municipality_code",
            Field::Username => "username",
            Field::Password => "password",
            Field::DebetPsp => "Debet_PSP",
            Field::KreditPsp => "Kredit_PSP",
            Field::Tekst => "Tekst",
            Field::Reference => "Reference",
            Field::Bogforingsdato => "Bogføringsdato",
            Field::Kommentar => "Kommentar",
            Field::DebetArtskonto => "Debet_Artskonto",
            Field::KreditArtskonto => "Kredit_Artskonto",
            Field::DebetPosteringsTekst => "Debet_PosteringsTekst",
            Field::KreditPosteringsTekst => "Kredit_PosteringsTekst",
            Field::Kost => "Kost",
            Field::BilagsFilePath => "BilagsFilePath",
            Field::CsvFilename => "csv_filename",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The rule a field violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    #[error("missing required field")]
    Missing,

    #[error("expected {0}")]
    WrongType(&'static str),

    #[error("must not be empty")]
    Empty,

    #[error("must be empty or a date formatted DD.MM.YYYY, got {0:?}")]
    DateFormat(String),

    #[error("must be exactly 8 digits, got {0:?}")]
    AccountCode(String),

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("must be greater than zero, got {0}")]
    NotPositive(String),

    #[error("outside the supported range (at most 28 digits and 28 decimal places), got {0}")]
    OutOfRange(String),

    #[error("no such file or directory: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Debet_PSP and Kredit_PSP must both be empty or both be set")]
    PspPairing,
}

/// One violated rule on one field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {rule}")]
pub struct FieldError {
    pub field: Field,
    pub rule: Rule,
}

impl FieldError {
    pub fn new(field: Field, rule: Rule) -> Self {
        FieldError { field, rule }
    }
}

/// Construction-time failure. Holds every field-level violation, or the
/// single cross-field violation when all fields were individually valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Returns the first violation recorded for `field`, if any.
    pub fn rule_for(&self, field: Field) -> Option<&Rule> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.rule)
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        ValidationError {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Step of the submission flow an [`InvoiceError`] originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CsvExport,
    Login,
    Navigation,
    FormFill,
    Attachment,
    CsvImport,
    DocumentCheck,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::CsvExport => "csv export",
            Phase::Login => "login",
            Phase::Navigation => "navigation",
            Phase::FormFill => "form fill",
            Phase::Attachment => "attachment",
            Phase::CsvImport => "csv import",
            Phase::DocumentCheck => "document check",
        };
        f.write_str(name)
    }
}

/// Linear progress of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    LoggedIn,
    FormReached,
    FieldsFilled,
    AttachmentHandled,
    CsvHandled,
    Validated,
    Succeeded,
    Failed,
}

/// Errors raised by a [`UiDriver`](crate::UiDriver) implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("browser session has not been launched")]
    NotStarted,

    #[error("could not start WebDriver session: {0}")]
    Session(String),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("WebDriver command failed: {0}")]
    Command(String),
}

/// Cause of a failed phase.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("login failed: {0}")]
    LoginRejected(String),

    #[error("failed to write CSV to {}: {source}", .path.display())]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("timed out waiting for {0}")]
    NotReady(&'static str),

    #[error("no visible file input found in any upload frame")]
    NoFileInput,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Run-time failure of a submission, tagged with where it happened.
#[derive(Error, Debug)]
#[error("{phase} phase failed: {source}")]
pub struct InvoiceError {
    pub phase: Phase,
    /// Last state the flow completed before failing.
    pub reached: FlowState,
    #[source]
    pub source: FlowError,
}

impl InvoiceError {
    pub fn new(phase: Phase, reached: FlowState, source: FlowError) -> Self {
        InvoiceError {
            phase,
            reached,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rule_names_field() {
        let error = ValidationError::from(FieldError::new(Field::Kost, Rule::Missing));
        let text = error.to_string();
        assert!(text.contains("Kost"));
        assert!(text.contains("missing"));
    }

    #[test]
    fn test_validation_error_joins_all_fields() {
        let error = ValidationError {
            errors: vec![
                FieldError::new(Field::Username, Rule::Missing),
                FieldError::new(Field::Password, Rule::Missing),
            ],
        };
        assert_eq!(
            error.to_string(),
            "validation failed: username: missing required field; password: missing required field"
        );
        assert_eq!(error.rule_for(Field::Password), Some(&Rule::Missing));
        assert_eq!(error.rule_for(Field::Url), None);
    }

    #[test]
    fn test_invoice_error_names_phase() {
        let error = InvoiceError::new(
            Phase::Login,
            FlowState::Idle,
            FlowError::LoginRejected("bad credentials".to_string()),
        );
        assert_eq!(
            error.to_string(),
            "login phase failed: login failed: bad credentials"
        );
    }
}
