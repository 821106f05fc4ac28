use std::collections::HashSet;

use crate::model::{CountryOverride, PayoutFields, PayoutTerms, PayoutType};

/// Payout validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayoutError {
    #[error("{} payout requires a valid {field}", type_label(.payout_type))]
    MissingAmount {
        payout_type: PayoutType,
        field: &'static str,
    },

    #[error("{} payout should not have {field}", type_label(.payout_type))]
    UnexpectedAmount {
        payout_type: PayoutType,
        field: &'static str,
    },

    #[error("Invalid country code: {0:?} (expected two letters)")]
    InvalidCountryCode(String),

    #[error("Country override for {0} requires a positive cpa_amount")]
    InvalidOverrideAmount(String),

    #[error("Duplicate country override for {0}")]
    DuplicateCountry(String),
}

fn type_label(payout_type: &PayoutType) -> &'static str {
    match payout_type {
        PayoutType::Cpa => "CPA",
        PayoutType::Fixed => "Fixed",
        PayoutType::CpaAndFixed => "CPA+Fixed",
    }
}

/// Largest accepted amount; sums of two amounts stay finite
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0 && amount <= MAX_AMOUNT
}

fn required(
    payout_type: PayoutType,
    field: &'static str,
    amount: Option<f64>,
) -> Result<f64, PayoutError> {
    match amount {
        Some(value) if is_valid_amount(value) => Ok(value),
        _ => Err(PayoutError::MissingAmount { payout_type, field }),
    }
}

fn forbidden(
    payout_type: PayoutType,
    field: &'static str,
    amount: Option<f64>,
) -> Result<(), PayoutError> {
    match amount {
        Some(_) => Err(PayoutError::UnexpectedAmount { payout_type, field }),
        None => Ok(()),
    }
}

/// Check the amounts against the payout type and build validated terms.
///
/// | type          | cpa_amount     | fixed_amount   |
/// |---------------|----------------|----------------|
/// | CPA           | required, > 0  | absent         |
/// | FIXED         | absent         | required, > 0  |
/// | CPA_AND_FIXED | required, > 0  | required, > 0  |
pub fn validate_payout(fields: PayoutFields) -> Result<PayoutTerms, PayoutError> {
    let PayoutFields {
        payout_type,
        cpa_amount,
        fixed_amount,
    } = fields;

    match payout_type {
        PayoutType::Cpa => {
            let cpa = required(payout_type, "cpa_amount", cpa_amount)?;
            forbidden(payout_type, "fixed_amount", fixed_amount)?;
            Ok(PayoutTerms::Cpa { cpa })
        }
        PayoutType::Fixed => {
            let fixed = required(payout_type, "fixed_amount", fixed_amount)?;
            forbidden(payout_type, "cpa_amount", cpa_amount)?;
            Ok(PayoutTerms::Fixed { fixed })
        }
        PayoutType::CpaAndFixed => {
            let cpa = required(payout_type, "cpa_amount", cpa_amount)?;
            let fixed = required(payout_type, "fixed_amount", fixed_amount)?;
            Ok(PayoutTerms::CpaAndFixed { cpa, fixed })
        }
    }
}

/// Normalize and check a full override list.
///
/// Codes are upper-cased; the same country may appear only once per list.
pub fn validate_overrides(
    overrides: Vec<CountryOverride>,
) -> Result<Vec<CountryOverride>, PayoutError> {
    let mut seen = HashSet::with_capacity(overrides.len());
    let mut normalized = Vec::with_capacity(overrides.len());

    for item in overrides {
        let code = item.country_code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PayoutError::InvalidCountryCode(item.country_code));
        }
        let code = code.to_ascii_uppercase();

        if !is_valid_amount(item.cpa_amount) {
            return Err(PayoutError::InvalidOverrideAmount(code));
        }
        if !seen.insert(code.clone()) {
            return Err(PayoutError::DuplicateCountry(code));
        }

        normalized.push(CountryOverride::new(code, item.cpa_amount));
    }

    Ok(normalized)
}
