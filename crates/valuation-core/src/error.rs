//! Error types for valuation operations.
//!
//! This module defines [`ValuationError`] which covers all error cases that can
//! occur when validating, transforming, or valuing financial data.

use thiserror::Error;

use crate::outcome::UnavailableReason;

/// Errors that can occur during valuation operations.
#[derive(Error, Debug)]
pub enum ValuationError {
    /// A reported fact is malformed (quarter out of range, negative share
    /// count, basis/quarter mismatch). Aborts processing of that fact only.
    #[error("Invalid input fact: {0}")]
    Validation(String),

    /// A required input is absent and no default policy is configured.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Too few valid quarters to ground a computation.
    #[error("Insufficient history: need {required} quarters, have {available}")]
    InsufficientHistory {
        /// Number of consecutive valid quarters required.
        required: usize,
        /// Number of valid quarters actually available.
        available: usize,
    },

    /// The terminal-value formula is undefined for these rates.
    #[error("Discount rate {discount_rate} must exceed terminal growth {terminal_growth}")]
    Domain {
        /// The discount rate (WACC) supplied.
        discount_rate: f64,
        /// The terminal growth rate supplied.
        terminal_growth: f64,
    },

    /// Trailing twelve-month earnings are zero or negative, so a PE ratio
    /// is undefined.
    #[error("Trailing twelve-month earnings are not positive")]
    NonPositiveEarnings,

    /// No market observation could be matched to the computation.
    #[error("No market observations available")]
    MissingMarketData,

    /// An external collaborator timed out or returned nothing for this
    /// entity. Scoped to a single entity's run.
    #[error("Data unavailable for {entity}: {reason}")]
    DataUnavailable {
        /// The entity whose run was affected.
        entity: String,
        /// What the collaborator reported.
        reason: String,
    },

    /// Error interacting with the period store.
    #[error("Store error: {0}")]
    Store(String),
}

impl ValuationError {
    /// Maps recoverable error kinds onto the [`UnavailableReason`] carried by
    /// an `Unavailable` result field.
    ///
    /// Returns `None` for kinds that must abort the entity's run instead of
    /// degrading a single sub-computation.
    #[must_use]
    pub fn as_unavailable(&self) -> Option<UnavailableReason> {
        match self {
            Self::InsufficientHistory {
                required,
                available,
            } => Some(UnavailableReason::InsufficientHistory {
                required: *required,
                available: *available,
            }),
            Self::Domain {
                discount_rate,
                terminal_growth,
            } => Some(UnavailableReason::DiscountNotAboveGrowth {
                discount_rate: *discount_rate,
                terminal_growth: *terminal_growth,
            }),
            Self::NonPositiveEarnings => Some(UnavailableReason::NonPositiveEarnings),
            Self::MissingMarketData => Some(UnavailableReason::MissingMarketData),
            Self::MissingInput(field) => Some(UnavailableReason::MissingInput {
                field: field.clone(),
            }),
            _ => None,
        }
    }
}

/// Result type alias using [`ValuationError`].
pub type Result<T> = std::result::Result<T, ValuationError>;
