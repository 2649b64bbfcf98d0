//! Mapping the Opus status text to a submission result.
//!
//! The match is an exact string comparison against one Danish literal.
//! Any change in wording or whitespace on the Opus side turns a valid
//! document into a reported failure.

use crate::selectors::STATUS_DOCUMENT_OK;
use serde::Serialize;

pub const SUCCESS_MESSAGE: &str = "Document created";
pub const FAILURE_MESSAGE: &str = "Document not created";

/// Status text used when Opus showed no message after the check.
pub const NOT_CONTROLLED: &str = "Not controlled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

/// Outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub status: Status,
    pub message: String,
    /// Status text exactly as read from Opus.
    pub raw_status_text: String,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

pub fn classify(raw_status_text: &str) -> SubmissionResult {
    let (status, message) = if raw_status_text == STATUS_DOCUMENT_OK {
        (Status::Success, SUCCESS_MESSAGE)
    } else {
        (Status::Failure, FAILURE_MESSAGE)
    };
    SubmissionResult {
        status,
        message: message.to_string(),
        raw_status_text: raw_status_text.to_string(),
    }
}
