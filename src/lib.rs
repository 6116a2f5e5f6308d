//! `mortgage_calc` is a Rust library for calculating mortgage payments.
//!
//! It supports the two common ways of paying back a mortgage:
//! - **Repayment**: a level monthly payment that covers interest and pays the
//!   principal down, so the loan is cleared by the end of the term.
//! - **Interest-only**: the monthly payment covers interest only and the
//!   principal is repaid in full at the end of the term.
//!
//! Raw form text goes through [`validate`], which reports problems per field.
//! Once every field passes, a [`LoanInput`] can be built and handed to
//! [`calculate`], which never fails.
//!
//! ## Usage
//!
//! Add `mortgage_calc` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mortgage_calc = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then validate the form values and calculate:
//!
//! ```rust
//! use mortgage_calc::{calculate, LoanInput, MortgageType};
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     match LoanInput::parse("250000", "6.5", "30", MortgageType::Repayment) {
//!         Ok(input) => {
//!             let result = calculate(&input);
//!             assert_eq!(result.monthly_payment, dec!(1580.17));
//!
//!             println!("Monthly payment: {}", result.monthly_payment);
//!             println!("Total payment:   {}", result.total_payment);
//!             println!("Total interest:  {}", result.total_interest);
//!         }
//!         Err(errors) => {
//!             for (field, message) in errors.messages() {
//!                 eprintln!("{}: {}", field, message);
//!             }
//!         }
//!     }
//! }
//! ```

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub mod calculator;
pub mod loan;
pub mod validation;

pub use calculator::{calculate, round_currency, CalculationResult};
pub use loan::{LoanForm, LoanInput, MortgageType, ParseMortgageTypeError};
pub use validation::{validate, FieldError, FieldErrorKind, LoanField, ValidationResult};

/// Fractional digits kept in every calculated figure.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Monthly payments in one year of term.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Divisor turning an annual percentage into a monthly fraction.
pub(crate) const PERCENT_PER_MONTH: Decimal = dec!(1200);

/// Validates a form and calculates its payments in one step.
///
/// This is the full sequence a form runs on "Calculate".
///
/// # Errors
///
/// Returns an error wrapping the [`ValidationResult`] if any field is invalid.
pub fn quote(form: &LoanForm) -> anyhow::Result<CalculationResult> {
    let input = form
        .to_input()
        .with_context(|| format!("Cannot calculate a {} mortgage", form.mortgage_type))?;

    Ok(calculate(&input))
}
