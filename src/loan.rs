use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{CheckedFields, ValidationResult};
use crate::{MONTHS_PER_YEAR, PERCENT_PER_MONTH};

/// How the principal is paid back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MortgageType {
    /// Each payment covers interest and part of the principal.
    #[default]
    Repayment,
    /// Payments cover interest only; the principal is due at the end of the term.
    InterestOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mortgage type: {0}")]
pub struct ParseMortgageTypeError(String);

impl FromStr for MortgageType {
    type Err = ParseMortgageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repayment" => Ok(MortgageType::Repayment),
            "interest-only" | "interest_only" | "interestonly" => Ok(MortgageType::InterestOnly),
            _ => Err(ParseMortgageTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for MortgageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MortgageType::Repayment => f.write_str("repayment"),
            MortgageType::InterestOnly => f.write_str("interest-only"),
        }
    }
}

/// Validated loan parameters.
///
/// A `LoanInput` can only be obtained through validation, so anything holding
/// one may be passed straight to [`crate::calculate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanInput {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_years: u32,
    mortgage_type: MortgageType,
}

impl LoanInput {
    /// Builds an input from numbers that have already been parsed.
    ///
    /// # Errors
    ///
    /// Returns the failing fields when any value is out of range.
    pub fn new(
        principal: Decimal,
        annual_rate_percent: Decimal,
        term_years: u32,
        mortgage_type: MortgageType,
    ) -> Result<Self, ValidationResult> {
        CheckedFields::from_values(principal, annual_rate_percent, term_years)
            .into_values()
            .map(|values| Self::from_checked(values, mortgage_type))
    }

    /// Builds an input from raw form text, applying the same rules as
    /// [`crate::validate`].
    ///
    /// # Errors
    ///
    /// Returns the failing fields when any text is missing, non-numeric or out
    /// of range.
    pub fn parse(
        principal_text: &str,
        rate_text: &str,
        term_text: &str,
        mortgage_type: MortgageType,
    ) -> Result<Self, ValidationResult> {
        CheckedFields::from_text(principal_text, rate_text, term_text)
            .into_values()
            .map(|values| Self::from_checked(values, mortgage_type))
    }

    fn from_checked(
        (principal, annual_rate_percent, term_years): (Decimal, Decimal, u32),
        mortgage_type: MortgageType,
    ) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_years,
            mortgage_type,
        }
    }

    /// The borrowed amount.
    pub fn principal(&self) -> Decimal {
        self.principal
    }

    /// The annual interest rate as a percentage (e.g., 6.5 for 6.5%).
    pub fn annual_rate_percent(&self) -> Decimal {
        self.annual_rate_percent
    }

    /// The term in whole years.
    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    /// How the principal is paid back.
    pub fn mortgage_type(&self) -> MortgageType {
        self.mortgage_type
    }

    /// Monthly payments over the whole term.
    pub fn number_of_payments(&self) -> u32 {
        self.term_years * MONTHS_PER_YEAR
    }

    /// Monthly interest rate as a fraction, e.g. 0.005 for 6% a year.
    pub fn monthly_rate(&self) -> Decimal {
        self.annual_rate_percent / PERCENT_PER_MONTH
    }
}

/// Raw form values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanForm {
    /// The loan amount as typed.
    pub principal: String,
    /// The annual interest rate percentage as typed.
    pub annual_rate_percent: String,
    /// The term in years as typed.
    pub term_years: String,
    /// Defaults to a repayment mortgage when absent.
    #[serde(default)]
    pub mortgage_type: MortgageType,
}

impl LoanForm {
    /// Reads a form from its JSON payload.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse loan form JSON")
    }

    /// Checks the form fields without building a [`LoanInput`].
    pub fn validate(&self) -> ValidationResult {
        crate::validate(&self.principal, &self.annual_rate_percent, &self.term_years)
    }

    /// Validates the form and builds the input for [`crate::calculate`].
    pub fn to_input(&self) -> Result<LoanInput, ValidationResult> {
        LoanInput::parse(
            &self.principal,
            &self.annual_rate_percent,
            &self.term_years,
            self.mortgage_type,
        )
    }
}
