//! Field-level validation of the raw text collected by a loan form.
//!
//! Every field is always checked, so a single call reports all problems at
//! once. Failures are returned as a [`ValidationResult`] value; nothing here
//! panics or short-circuits.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::MONTHS_PER_YEAR;

/// Plain or scientific decimal notation, e.g. `250000`, `-6.5`, `2.5e5`.
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("Invalid regex pattern")
});

/// The user-editable fields of a loan form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanField {
    /// The borrowed amount.
    Principal,
    /// The yearly interest rate, as a percentage.
    AnnualRatePercent,
    /// The length of the mortgage in whole years.
    TermYears,
}

impl LoanField {
    /// Every field, in form order.
    pub const ALL: [LoanField; 3] = [
        LoanField::Principal,
        LoanField::AnnualRatePercent,
        LoanField::TermYears,
    ];

    /// The field name as the presentation layer knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanField::Principal => "principal",
            LoanField::AnnualRatePercent => "annualRatePercent",
            LoanField::TermYears => "termYears",
        }
    }

    fn message(&self, kind: FieldErrorKind) -> &'static str {
        match (self, kind) {
            (LoanField::Principal, FieldErrorKind::Missing) => "Loan amount is required",
            (LoanField::Principal, _) => "Please enter a valid loan amount",
            (LoanField::AnnualRatePercent, FieldErrorKind::Missing) => "Interest rate is required",
            (LoanField::AnnualRatePercent, _) => "Please enter a valid interest rate",
            (LoanField::TermYears, FieldErrorKind::Missing) => "Mortgage term is required",
            (LoanField::TermYears, _) => "Please enter a valid mortgage term",
        }
    }
}

impl fmt::Display for LoanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldErrorKind {
    /// The text was empty or only whitespace.
    Missing,
    /// The text is not a number.
    NotNumeric,
    /// The text is a number, but it breaks a domain rule or cannot be held
    /// exactly enough to calculate with.
    OutOfRange,
}

/// A rejected field together with the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct FieldError {
    /// The field that failed.
    #[serde(skip)]
    pub field: LoanField,
    /// Which rule it broke.
    pub kind: FieldErrorKind,
    /// The text shown next to the field.
    pub message: &'static str,
}

impl FieldError {
    /// Builds the error and picks the message for `field` and `kind`.
    pub fn new(field: LoanField, kind: FieldErrorKind) -> Self {
        Self {
            field,
            kind,
            message: field.message(kind),
        }
    }
}

/// Errors keyed by field. An empty result means the input is valid; a field
/// without an entry passed its checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("invalid loan input: {}", join_messages(.errors))]
pub struct ValidationResult {
    errors: BTreeMap<LoanField, FieldError>,
}

fn join_messages(errors: &BTreeMap<LoanField, FieldError>) -> String {
    errors
        .values()
        .map(|error| error.message)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationResult {
    /// True when no field was rejected.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of rejected fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The error for `field`, if it was rejected.
    pub fn get(&self, field: LoanField) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    /// The message for `field`, if it was rejected.
    pub fn message(&self, field: LoanField) -> Option<&'static str> {
        self.errors.get(&field).map(|error| error.message)
    }

    /// Rejected fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.values()
    }

    /// Field name to message, the shape a form renders.
    pub fn messages(&self) -> BTreeMap<&'static str, &'static str> {
        self.errors
            .iter()
            .map(|(field, error)| (field.as_str(), error.message))
            .collect()
    }

    fn reject(&mut self, field: LoanField, kind: FieldErrorKind) {
        trace!(field = %field, ?kind, "rejected loan field");
        self.errors.insert(field, FieldError::new(field, kind));
    }
}

/// Validates the three raw form values.
///
/// The principal must be a positive number, the rate a number that is zero or
/// more, and the term a positive whole number of years. All three are checked
/// on every call.
pub fn validate(principal_text: &str, rate_text: &str, term_text: &str) -> ValidationResult {
    CheckedFields::from_text(principal_text, rate_text, term_text).report()
}

/// Per-field outcome of validation, kept around so a valid input can be built
/// without parsing twice.
pub(crate) struct CheckedFields {
    pub principal: Result<Decimal, FieldErrorKind>,
    pub annual_rate_percent: Result<Decimal, FieldErrorKind>,
    pub term_years: Result<u32, FieldErrorKind>,
}

impl CheckedFields {
    pub fn from_text(principal_text: &str, rate_text: &str, term_text: &str) -> Self {
        Self {
            principal: parse_number(principal_text).and_then(check_principal),
            annual_rate_percent: parse_number(rate_text).and_then(check_annual_rate),
            term_years: parse_number(term_text).and_then(check_term_years),
        }
        .check_representable()
    }

    pub fn from_values(principal: Decimal, annual_rate_percent: Decimal, term_years: u32) -> Self {
        Self {
            principal: check_principal(principal),
            annual_rate_percent: check_annual_rate(annual_rate_percent),
            term_years: check_term_years(Decimal::from(term_years)),
        }
        .check_representable()
    }

    /// Rejects the principal when the whole-term figures it leads to would not
    /// fit in a `Decimal`.
    fn check_representable(mut self) -> Self {
        if let (Ok(principal), Ok(rate), Ok(years)) =
            (self.principal, self.annual_rate_percent, self.term_years)
        {
            if !figures_fit(principal, rate, years) {
                self.principal = Err(FieldErrorKind::OutOfRange);
            }
        }
        self
    }

    pub fn report(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        if let Err(kind) = self.principal {
            result.reject(LoanField::Principal, kind);
        }
        if let Err(kind) = self.annual_rate_percent {
            result.reject(LoanField::AnnualRatePercent, kind);
        }
        if let Err(kind) = self.term_years {
            result.reject(LoanField::TermYears, kind);
        }
        debug!(errors = result.len(), "validated loan input");
        result
    }

    pub fn into_values(self) -> Result<(Decimal, Decimal, u32), ValidationResult> {
        match (self.principal, self.annual_rate_percent, self.term_years) {
            (Ok(principal), Ok(rate), Ok(term)) => Ok((principal, rate, term)),
            _ => Err(self.report()),
        }
    }
}

/// Total interest never exceeds `P * rate% * n` (that bound is 1200 times the
/// simple interest on the full principal), and the total payment adds the
/// principal on top. Twice the principal is added to leave room for
/// rounding in the zero-rate case.
fn figures_fit(principal: Decimal, annual_rate_percent: Decimal, term_years: u32) -> bool {
    let payments = Decimal::from(u64::from(term_years) * u64::from(MONTHS_PER_YEAR));
    principal
        .checked_mul(annual_rate_percent)
        .and_then(|interest| interest.checked_mul(payments))
        .and_then(|interest| interest.checked_add(principal))
        .and_then(|total| total.checked_add(principal))
        .is_some()
}

fn parse_number(text: &str) -> Result<Decimal, FieldErrorKind> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FieldErrorKind::Missing);
    }
    if !NUMBER_PATTERN.is_match(text) {
        return Err(FieldErrorKind::NotNumeric);
    }

    // Well-formed from here on, so a failed parse means the magnitude or
    // precision is beyond what a Decimal holds.
    let value = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| FieldErrorKind::OutOfRange)?;

    if value.is_zero() && has_significant_digit(text) {
        return Err(FieldErrorKind::OutOfRange);
    }
    Ok(value)
}

/// Whether the mantissa holds a non-zero digit, i.e. the number is not zero.
fn has_significant_digit(text: &str) -> bool {
    text.split(['e', 'E'])
        .next()
        .is_some_and(|mantissa| mantissa.chars().any(|c| matches!(c, '1'..='9')))
}

fn check_principal(value: Decimal) -> Result<Decimal, FieldErrorKind> {
    if value <= Decimal::ZERO {
        return Err(FieldErrorKind::OutOfRange);
    }
    Ok(value)
}

fn check_annual_rate(value: Decimal) -> Result<Decimal, FieldErrorKind> {
    if value < Decimal::ZERO {
        return Err(FieldErrorKind::OutOfRange);
    }
    Ok(value)
}

/// Whole years only, and few enough that the month count fits in a `u32`.
fn check_term_years(value: Decimal) -> Result<u32, FieldErrorKind> {
    if !value.fract().is_zero() {
        return Err(FieldErrorKind::OutOfRange);
    }
    match value.to_u32() {
        Some(years) if years >= 1 && years.checked_mul(MONTHS_PER_YEAR).is_some() => Ok(years),
        _ => Err(FieldErrorKind::OutOfRange),
    }
}
