use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loan::{LoanInput, MortgageType};
use crate::{CURRENCY_DECIMAL_PLACES, PERCENT_PER_MONTH};

/// Payment figures for a loan, each rounded to currency precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// The amount due every month.
    pub monthly_payment: Decimal,
    /// Everything paid over the term, principal included.
    pub total_payment: Decimal,
    /// The part of the total that is interest.
    pub total_interest: Decimal,
}

/// Rounds to cents, halves away from zero. The result always carries two
/// fractional digits, so `1000` becomes `1000.00`.
pub fn round_currency(value: Decimal) -> Decimal {
    let mut rounded = value
        .round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_DECIMAL_PLACES);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Calculates the monthly payment, total payment and total interest of a loan.
///
/// Repayment loans use the annuity formula `PMT = P * r / (1 - (1 + r)^-n)`,
/// which is `P * [r(1 + r)^n] / [(1 + r)^n - 1]` rearranged, or `P / n` when
/// the rate is zero. Interest-only loans pay `P * r` each month and the
/// principal is counted once in the total.
///
/// Figures are rounded only at the end.
pub fn calculate(input: &LoanInput) -> CalculationResult {
    let principal = input.principal();
    let payments = Decimal::from(input.number_of_payments());

    let (monthly_payment, total_payment, total_interest) = match input.mortgage_type() {
        MortgageType::Repayment => {
            let monthly_payment = repayment_monthly_payment(
                principal,
                input.monthly_rate(),
                input.number_of_payments(),
            );
            let total_payment = monthly_payment * payments;
            (monthly_payment, total_payment, total_payment - principal)
        }
        MortgageType::InterestOnly => {
            // Multiply before dividing so whole-term interest stays exact in cents.
            let monthly_payment = principal * input.annual_rate_percent() / PERCENT_PER_MONTH;
            let total_interest = monthly_payment * payments;
            (monthly_payment, principal + total_interest, total_interest)
        }
    };

    let result = CalculationResult {
        monthly_payment: round_currency(monthly_payment),
        total_payment: round_currency(total_payment),
        total_interest: round_currency(total_interest),
    };

    debug!(
        mortgage_type = %input.mortgage_type(),
        payments = input.number_of_payments(),
        monthly_payment = %result.monthly_payment,
        total_payment = %result.total_payment,
        "calculated mortgage payments"
    );

    result
}

fn repayment_monthly_payment(principal: Decimal, monthly_rate: Decimal, payments: u32) -> Decimal {
    let linear = principal / Decimal::from(payments);
    if monthly_rate.is_zero() {
        return linear;
    }

    // Past Decimal's range (1 + r)^-n is indistinguishable from zero.
    let factor = match (Decimal::ONE + monthly_rate).checked_powu(u64::from(payments)) {
        Some(growth) => {
            let discount = Decimal::ONE - Decimal::ONE / growth;
            if discount.is_zero() {
                return linear;
            }
            monthly_rate / discount
        }
        None => monthly_rate,
    };

    principal * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn loan(principal: Decimal, rate: Decimal, years: u32, kind: MortgageType) -> LoanInput {
        LoanInput::new(principal, rate, years, kind).unwrap()
    }

    #[test]
    fn test_zero_rate_repayment() {
        let result = calculate(&loan(dec!(120000), dec!(0), 10, MortgageType::Repayment));

        assert_eq!(result.monthly_payment, dec!(1000.00));
        assert_eq!(result.total_payment, dec!(120000.00));
        assert_eq!(result.total_interest, dec!(0.00));
    }

    #[test]
    fn test_standard_repayment() {
        let result = calculate(&loan(dec!(250000), dec!(6.5), 30, MortgageType::Repayment));

        assert_eq!(result.monthly_payment, dec!(1580.17));
        assert_eq!(result.total_payment, dec!(568861.22));
        assert_eq!(result.total_interest, dec!(318861.22));
        assert_eq!(result.total_interest, result.total_payment - dec!(250000));
        assert_total_matches_monthly(&result, 30);
    }

    #[test]
    fn test_long_term_tends_to_pure_interest() {
        let result = calculate(&loan(dec!(100000), dec!(5), 500, MortgageType::Repayment));

        assert_eq!(result.monthly_payment, dec!(416.67));
        assert_total_matches_monthly(&result, 500);
    }

    fn assert_total_matches_monthly(result: &CalculationResult, years: u32) {
        let payments = Decimal::from(years * 12);
        let drift = (result.monthly_payment * payments - result.total_payment).abs();
        assert!(drift <= dec!(0.005) * payments, "drift {drift} over {payments} payments");
    }

    #[rstest]
    #[case(dec!(250000), dec!(6.5), 30, dec!(1580.17), dec!(568861.22), dec!(318861.22))]
    #[case(dec!(100000), dec!(5), 25, dec!(584.59), dec!(175377.01), dec!(75377.01))]
    #[case(dec!(200000), dec!(3.75), 15, dec!(1454.44), dec!(261800.08), dec!(61800.08))]
    #[case(dec!(12000), dec!(12), 1, dec!(1066.19), dec!(12794.23), dec!(794.23))]
    #[case(dec!(100000), dec!(5), 101, dec!(419.38), dec!(508292.17), dec!(408292.17))]
    #[case(
        dec!(10000000000000000),
        dec!(5),
        25,
        dec!(58459004150797.90),
        dec!(17537701245239371.16),
        dec!(7537701245239371.16)
    )]
    #[case(dec!(100000), dec!(5000), 25, dec!(416666.67), dec!(125000000.00), dec!(124900000.00))]
    fn test_repayment_table(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] years: u32,
        #[case] monthly: Decimal,
        #[case] total: Decimal,
        #[case] interest: Decimal,
    ) {
        let result = calculate(&loan(principal, rate, years, MortgageType::Repayment));

        assert_eq!(result.monthly_payment, monthly);
        assert_eq!(result.total_payment, total);
        assert_eq!(result.total_interest, interest);
        assert_eq!(result.total_interest, result.total_payment - principal);
        assert_total_matches_monthly(&result, years);
    }

    #[test]
    fn test_interest_only() {
        let result = calculate(&loan(dec!(250000), dec!(6.5), 30, MortgageType::InterestOnly));

        assert_eq!(result.monthly_payment, dec!(1354.17));
        assert_eq!(result.total_interest, dec!(487500.00));
        assert_eq!(result.total_payment, dec!(737500.00));
        // Rounded monthly figure times 360 is 487501.20; only the final step rounds.
        let drift = (result.monthly_payment * dec!(360) - result.total_interest).abs();
        assert!(drift <= dec!(0.005) * dec!(360));
    }

    #[test]
    fn test_interest_only_zero_rate() {
        let result = calculate(&loan(dec!(90000), dec!(0), 20, MortgageType::InterestOnly));

        assert_eq!(result.monthly_payment, dec!(0));
        assert_eq!(result.total_interest, dec!(0));
        assert_eq!(result.total_payment, dec!(90000));
    }

    #[rstest]
    #[case(dec!(0.01), dec!(0.001), 1)]
    #[case(dec!(1), dec!(0.0000000001), 100)]
    #[case(dec!(500000), dec!(1000), 100)]
    #[case(dec!(1000000000000000), dec!(1000), 100)]
    #[case(dec!(1000000000000000), dec!(0.5), 1)]
    fn test_results_are_non_negative(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] years: u32,
    ) {
        let repayment = calculate(&loan(principal, rate, years, MortgageType::Repayment));
        assert!(repayment.monthly_payment >= Decimal::ZERO);
        assert!(repayment.total_payment >= Decimal::ZERO);
        assert!(repayment.total_interest >= Decimal::ZERO);

        let interest_only = calculate(&loan(principal, rate, years, MortgageType::InterestOnly));
        assert!(interest_only.monthly_payment >= Decimal::ZERO);
        assert!(interest_only.total_interest >= Decimal::ZERO);
        assert!(interest_only.total_payment >= round_currency(principal));
    }

    #[test]
    fn test_huge_rate_approaches_pure_interest() {
        let result = calculate(&loan(dec!(120000), dec!(1000), 100, MortgageType::Repayment));

        assert_eq!(result.monthly_payment, dec!(100000.00));
    }

    #[rstest]
    #[case(MortgageType::Repayment)]
    #[case(MortgageType::InterestOnly)]
    fn test_rounding_is_idempotent(#[case] kind: MortgageType) {
        let result = calculate(&loan(dec!(333333.33), dec!(7.77), 27, kind));

        assert_eq!(round_currency(result.monthly_payment), result.monthly_payment);
        assert_eq!(round_currency(result.total_payment), result.total_payment);
        assert_eq!(round_currency(result.total_interest), result.total_interest);
    }

    #[rstest]
    #[case(MortgageType::Repayment)]
    #[case(MortgageType::InterestOnly)]
    fn test_monthly_payment_increases_with_principal(#[case] kind: MortgageType) {
        let payments: Vec<Decimal> = [dec!(50000), dec!(100000), dec!(150000), dec!(400000)]
            .into_iter()
            .map(|principal| calculate(&loan(principal, dec!(4.25), 20, kind)).monthly_payment)
            .collect();

        assert!(payments.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[rstest]
    #[case(dec!(1.005), dec!(1.01))]
    #[case(dec!(-1.005), dec!(-1.01))]
    #[case(dec!(2.004), dec!(2.00))]
    fn test_round_currency_half_away_from_zero(#[case] value: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_currency(value), expected);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = calculate(&loan(dec!(120000), dec!(0), 10, MortgageType::Repayment));

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["monthlyPayment"], "1000.00");
        assert_eq!(json["totalPayment"], "120000.00");
        assert_eq!(json["totalInterest"], "0.00");
    }
}
