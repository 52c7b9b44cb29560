//! Weighted-average cost of capital.
//!
//! Cost of equity comes from CAPM, cost of debt from TTM interest expense
//! over total debt (or an explicit override), and the weights from the
//! observed capital structure unless target weights are supplied.

use tracing::debug;
use valuation_core::{
    DataQualityWarning, Result, ValuationAssumptions, ValuationError, WaccBreakdown,
};

/// Capital-structure and market facts the WACC calculation reads.
///
/// Assembled by the orchestrator from the reconstructed series and the
/// latest market observation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CapitalStructure {
    /// Latest market capitalization.
    pub market_cap: Option<f64>,
    /// Latest total debt.
    pub total_debt: Option<f64>,
    /// Trailing-twelve-month interest expense.
    pub ttm_interest_expense: Option<f64>,
}

/// Computes the WACC with every intermediate retained.
///
/// Zero total debt is an explicit branch: the debt weight collapses to
/// zero and the WACC equals the cost of equity exactly, with no division
/// that could yield NaN.
///
/// # Errors
///
/// - [`ValuationError::MissingInput`] when beta is absent and no default
///   policy is configured, or when a nonzero debt weight needs a cost of
///   debt that neither the override nor interest expense can supply.
/// - [`ValuationError::MissingMarketData`] when weights must be derived
///   but no market capitalization is known.
pub fn compute_wacc(
    capital: &CapitalStructure,
    assumptions: &ValuationAssumptions,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<WaccBreakdown> {
    let (beta, beta_defaulted) = match (assumptions.beta, assumptions.default_beta) {
        (Some(beta), _) => (beta, false),
        (None, Some(default)) => {
            // Never a silent fallback: applying the default is recorded.
            warnings.push(DataQualityWarning::DefaultBetaApplied { beta: default });
            (default, true)
        }
        (None, None) => return Err(ValuationError::MissingInput("beta".to_string())),
    };
    let cost_of_equity = assumptions.risk_free_rate + beta * assumptions.equity_risk_premium;

    let (weight_equity, weight_debt) = match assumptions.capital_weights {
        Some(weights) => (weights.equity, weights.debt),
        None => {
            let debt = capital.total_debt.unwrap_or(0.0);
            if debt == 0.0 {
                (1.0, 0.0)
            } else {
                let market_cap = capital
                    .market_cap
                    .ok_or(ValuationError::MissingMarketData)?;
                let total = market_cap + debt;
                (market_cap / total, debt / total)
            }
        }
    };

    if weight_debt == 0.0 {
        // All-equity structure: the blended rate is the cost of equity.
        debug!(cost_of_equity, "zero debt weight, WACC is cost of equity");
        return Ok(WaccBreakdown {
            cost_of_equity,
            cost_of_debt_after_tax: 0.0,
            weight_equity,
            weight_debt: 0.0,
            wacc: cost_of_equity,
            beta_used: beta,
            beta_defaulted,
        });
    }

    let cost_of_debt = match assumptions.cost_of_debt_override {
        Some(rate) => rate,
        None => match (capital.ttm_interest_expense, capital.total_debt) {
            (Some(interest), Some(debt)) if debt > 0.0 => interest / debt,
            _ => return Err(ValuationError::MissingInput("cost_of_debt".to_string())),
        },
    };
    let cost_of_debt_after_tax = cost_of_debt * (1.0 - assumptions.tax_rate);
    let wacc = weight_equity * cost_of_equity + weight_debt * cost_of_debt_after_tax;

    debug!(
        cost_of_equity,
        cost_of_debt_after_tax, weight_equity, weight_debt, wacc, "computed WACC"
    );
    Ok(WaccBreakdown {
        cost_of_equity,
        cost_of_debt_after_tax,
        weight_equity,
        weight_debt,
        wacc,
        beta_used: beta,
        beta_defaulted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::CapitalWeights;

    fn assumptions() -> ValuationAssumptions {
        ValuationAssumptions {
            risk_free_rate: 0.03,
            beta: Some(1.2),
            equity_risk_premium: 0.05,
            cost_of_debt_override: Some(0.04),
            tax_rate: 0.25,
            capital_weights: Some(CapitalWeights {
                equity: 0.7,
                debt: 0.3,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_wacc_worked_example() {
        let mut warnings = Vec::new();
        let breakdown =
            compute_wacc(&CapitalStructure::default(), &assumptions(), &mut warnings).unwrap();
        assert!((breakdown.cost_of_equity - 0.09).abs() < 1e-12);
        assert!((breakdown.cost_of_debt_after_tax - 0.03).abs() < 1e-12);
        assert!((breakdown.wacc - 0.072).abs() < 1e-12);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_zero_debt_wacc_is_cost_of_equity_exactly() {
        let capital = CapitalStructure {
            market_cap: Some(1_000.0),
            total_debt: Some(0.0),
            ttm_interest_expense: None,
        };
        let assumptions = ValuationAssumptions {
            capital_weights: None,
            ..assumptions()
        };
        let mut warnings = Vec::new();
        let breakdown = compute_wacc(&capital, &assumptions, &mut warnings).unwrap();
        assert_eq!(breakdown.wacc, breakdown.cost_of_equity);
        assert_eq!(breakdown.weight_debt, 0.0);
        assert_eq!(breakdown.weight_equity, 1.0);
    }

    #[test]
    fn test_weights_derived_from_capital_structure() {
        let capital = CapitalStructure {
            market_cap: Some(700.0),
            total_debt: Some(300.0),
            ttm_interest_expense: Some(12.0),
        };
        let assumptions = ValuationAssumptions {
            capital_weights: None,
            cost_of_debt_override: None,
            ..assumptions()
        };
        let mut warnings = Vec::new();
        let breakdown = compute_wacc(&capital, &assumptions, &mut warnings).unwrap();
        assert!((breakdown.weight_equity - 0.7).abs() < 1e-12);
        assert!((breakdown.weight_debt - 0.3).abs() < 1e-12);
        // Rd = 12/300 = 4%, after tax 3%.
        assert!((breakdown.cost_of_debt_after_tax - 0.03).abs() < 1e-12);
        assert!((breakdown.wacc - 0.072).abs() < 1e-12);
    }

    #[test]
    fn test_missing_beta_without_policy_fails() {
        let assumptions = ValuationAssumptions {
            beta: None,
            default_beta: None,
            ..assumptions()
        };
        let mut warnings = Vec::new();
        let err = compute_wacc(&CapitalStructure::default(), &assumptions, &mut warnings)
            .unwrap_err();
        assert!(matches!(err, ValuationError::MissingInput(field) if field == "beta"));
    }

    #[test]
    fn test_default_beta_is_recorded() {
        let assumptions = ValuationAssumptions {
            beta: None,
            default_beta: Some(1.0),
            ..assumptions()
        };
        let mut warnings = Vec::new();
        let breakdown =
            compute_wacc(&CapitalStructure::default(), &assumptions, &mut warnings).unwrap();
        assert!(breakdown.beta_defaulted);
        assert_eq!(
            warnings,
            vec![DataQualityWarning::DefaultBetaApplied { beta: 1.0 }]
        );
    }
}
