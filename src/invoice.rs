//! Invoice record: raw caller input and the validated posting pair.
//!
//! Validation runs every field-level rule first, collecting one error per
//! offending field, and only then the cross-field PSP pairing rule.

use crate::amount::Amount;
use crate::error::{Field, FieldError, Rule, ValidationError};
use getset::Getters;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

/// A single input value as supplied by the caller.
///
/// Callers build the invoice from loosely typed mappings (JSON in the CLI),
/// so amounts and account codes may arrive as numbers or as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Float(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Integer(n)
    }
}

/// Unvalidated invoice input, keyed exactly like the caller's mapping.
///
/// A key that is absent (or `null`) deserializes to `None` and is reported as
/// missing; unknown keys are rejected by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawInvoice {
    #[serde(rename = "Debet_PSP")]
    pub debet_psp: Option<RawValue>,
    #[serde(rename = "Kredit_PSP")]
    pub kredit_psp: Option<RawValue>,
    #[serde(rename = "Tekst")]
    pub tekst: Option<RawValue>,
    #[serde(rename = "Reference")]
    pub reference: Option<RawValue>,
    #[serde(rename = "Bogføringsdato")]
    pub bogforingsdato: Option<RawValue>,
    #[serde(rename = "Kommentar")]
    pub kommentar: Option<RawValue>,
    #[serde(rename = "Debet_Artskonto")]
    pub debet_artskonto: Option<RawValue>,
    #[serde(rename = "Kredit_Artskonto")]
    pub kredit_artskonto: Option<RawValue>,
    #[serde(rename = "Debet_PosteringsTekst")]
    pub debet_posteringstekst: Option<RawValue>,
    #[serde(rename = "Kredit_PosteringsTekst")]
    pub kredit_posteringstekst: Option<RawValue>,
    #[serde(rename = "Kost")]
    pub kost: Option<RawValue>,
    #[serde(rename = "BilagsFilePath")]
    pub bilags_file_path: Option<RawValue>,
    pub csv_filename: Option<RawValue>,
}

/// An 8-digit account code (Artskonto).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCode(String);

impl AccountCode {
    pub const LEN: usize = 8;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountCode {
    type Err = Rule;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(AccountCode(s.to_string()))
        } else {
            Err(Rule::AccountCode(s.to_string()))
        }
    }
}

impl fmt::Display for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated reallocation posting pair.
///
/// Immutable once constructed. Empty optional texts mean "leave the Opus
/// field untouched".
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct InvoiceData {
    debet_psp: String,
    kredit_psp: String,
    tekst: String,
    reference: String,
    /// `DD.MM.YYYY`, or empty.
    booking_date: String,
    kommentar: String,
    debet_account: AccountCode,
    kredit_account: AccountCode,
    debet_posting_text: String,
    kredit_posting_text: String,
    amount: Amount,
    attachment: Option<PathBuf>,
    csv_filename: PathBuf,
}

impl TryFrom<RawInvoice> for InvoiceData {
    type Error = ValidationError;

    fn try_from(raw: RawInvoice) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let debet_psp = keep(&mut errors, text(Field::DebetPsp, &raw.debet_psp));
        let kredit_psp = keep(&mut errors, text(Field::KreditPsp, &raw.kredit_psp));
        let tekst = keep(&mut errors, non_empty_text(Field::Tekst, &raw.tekst));
        let reference = keep(&mut errors, text(Field::Reference, &raw.reference));
        let booking_date = keep(&mut errors, date_field(&raw.bogforingsdato));
        let kommentar = keep(&mut errors, text(Field::Kommentar, &raw.kommentar));
        let debet_account = keep(
            &mut errors,
            account_code(Field::DebetArtskonto, &raw.debet_artskonto),
        );
        let kredit_account = keep(
            &mut errors,
            account_code(Field::KreditArtskonto, &raw.kredit_artskonto),
        );
        let debet_posting_text = keep(
            &mut errors,
            text(Field::DebetPosteringsTekst, &raw.debet_posteringstekst),
        );
        let kredit_posting_text = keep(
            &mut errors,
            text(Field::KreditPosteringsTekst, &raw.kredit_posteringstekst),
        );
        let amount = keep(&mut errors, amount_field(&raw.kost));
        let attachment = keep(&mut errors, attachment_field(&raw.bilags_file_path));
        let csv_filename = keep(&mut errors, csv_target(&raw.csv_filename));

        let (
            Some(debet_psp),
            Some(kredit_psp),
            Some(tekst),
            Some(reference),
            Some(booking_date),
            Some(kommentar),
            Some(debet_account),
            Some(kredit_account),
            Some(debet_posting_text),
            Some(kredit_posting_text),
            Some(amount),
            Some(attachment),
            Some(csv_filename),
        ) = (
            debet_psp,
            kredit_psp,
            tekst,
            reference,
            booking_date,
            kommentar,
            debet_account,
            kredit_account,
            debet_posting_text,
            kredit_posting_text,
            amount,
            attachment,
            csv_filename,
        )
        else {
            return Err(ValidationError { errors });
        };

        // Cross-field rule, only reached once every field is valid on its own.
        if debet_psp.is_empty() != kredit_psp.is_empty() {
            return Err(FieldError::new(Field::DebetPsp, Rule::PspPairing).into());
        }

        Ok(InvoiceData {
            debet_psp,
            kredit_psp,
            tekst,
            reference,
            booking_date,
            kommentar,
            debet_account,
            kredit_account,
            debet_posting_text,
            kredit_posting_text,
            amount,
            attachment,
            csv_filename,
        })
    }
}

fn keep<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn text(field: Field, raw: &Option<RawValue>) -> Result<String, FieldError> {
    match raw {
        None => Err(FieldError::new(field, Rule::Missing)),
        Some(RawValue::Text(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::new(field, Rule::WrongType("text"))),
    }
}

fn non_empty_text(field: Field, raw: &Option<RawValue>) -> Result<String, FieldError> {
    let value = text(field, raw)?;
    if value.trim().is_empty() {
        return Err(FieldError::new(field, Rule::Empty));
    }
    Ok(value)
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{2}\.[0-9]{2}\.[0-9]{4}$").expect("date pattern compiles")
    })
}

fn date_field(raw: &Option<RawValue>) -> Result<String, FieldError> {
    let value = text(Field::Bogforingsdato, raw)?;
    if value.is_empty() || date_pattern().is_match(&value) {
        Ok(value)
    } else {
        Err(FieldError::new(Field::Bogforingsdato, Rule::DateFormat(value)))
    }
}

fn account_code(field: Field, raw: &Option<RawValue>) -> Result<AccountCode, FieldError> {
    let rendered = match raw {
        None => return Err(FieldError::new(field, Rule::Missing)),
        Some(RawValue::Text(s)) => s.clone(),
        Some(RawValue::Integer(n)) => n.to_string(),
        Some(RawValue::Float(n)) => n.to_string(),
    };
    AccountCode::from_str(&rendered).map_err(|rule| FieldError::new(field, rule))
}

fn amount_field(raw: &Option<RawValue>) -> Result<Amount, FieldError> {
    let parsed = match raw {
        None => Err(Rule::Missing),
        Some(RawValue::Text(s)) => Amount::from_str(s),
        Some(RawValue::Integer(n)) => Amount::new(Decimal::from(*n)),
        Some(RawValue::Float(n)) => Amount::from_f64(*n),
    };
    parsed.map_err(|rule| FieldError::new(Field::Kost, rule))
}

fn attachment_field(raw: &Option<RawValue>) -> Result<Option<PathBuf>, FieldError> {
    let value = text(Field::BilagsFilePath, raw)?;
    if value.is_empty() {
        return Ok(None);
    }
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(FieldError::new(
            Field::BilagsFilePath,
            Rule::FileNotFound(path),
        ));
    }
    Ok(Some(path))
}

fn csv_target(raw: &Option<RawValue>) -> Result<PathBuf, FieldError> {
    let path = PathBuf::from(text(Field::CsvFilename, raw)?);
    if !path.is_file() {
        return Err(FieldError::new(Field::CsvFilename, Rule::FileNotFound(path)));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_code_requires_eight_digits() {
        assert_eq!(
            AccountCode::from_str("40000000").unwrap().as_str(),
            "40000000"
        );
        assert!(AccountCode::from_str("4000").is_err());
        assert!(AccountCode::from_str("").is_err());
        assert!(AccountCode::from_str("4000000a").is_err());
        assert!(AccountCode::from_str("400000000").is_err());
    }

    #[test]
    fn test_booking_date_pattern() {
        let ok = |s: &str| date_field(&Some(RawValue::from(s))).is_ok();
        assert!(ok(""));
        assert!(ok("12.09.2025"));
        assert!(!ok("2025.09.12"));
        assert!(!ok("1.9.2025"));
        assert!(!ok("12-09-2025"));
        assert!(!ok("12.09.2025 "));
    }

    #[test]
    fn test_text_rejects_numbers() {
        let error = text(Field::Reference, &Some(RawValue::Integer(7))).unwrap_err();
        assert_eq!(error.rule, Rule::WrongType("text"));
    }

    #[test]
    fn test_amount_accepts_integer_and_string() {
        assert_eq!(
            amount_field(&Some(RawValue::Integer(10))).unwrap().to_string(),
            "10"
        );
        assert_eq!(
            amount_field(&Some(RawValue::from("10"))).unwrap().to_string(),
            "10"
        );
        assert_eq!(
            amount_field(&Some(RawValue::Float(0.0))).unwrap_err().field,
            Field::Kost
        );
    }

    #[test]
    fn test_integer_account_code() {
        assert!(account_code(Field::DebetArtskonto, &Some(RawValue::Integer(40000000))).is_ok());
        let error =
            account_code(Field::DebetArtskonto, &Some(RawValue::Integer(4000))).unwrap_err();
        assert_eq!(error.rule, Rule::AccountCode("4000".to_string()));
    }

    #[test]
    fn test_empty_attachment_means_none() {
        assert_eq!(attachment_field(&Some(RawValue::from(""))).unwrap(), None);
        let error = attachment_field(&Some(RawValue::from("/nonexistent/bilag.pdf"))).unwrap_err();
        assert!(error.to_string().contains("no such file or directory"));
    }
}
