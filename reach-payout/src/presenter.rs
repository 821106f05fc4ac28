use crate::model::{EffectivePayout, PayoutSource, PayoutSummary, PayoutTerms};

/// Render an amount as dollars with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Formats resolved payouts for display
pub struct PayoutPresenter;

impl PayoutPresenter {
    /// Lowest and highest CPA across the base amount and every override.
    ///
    /// The base amount always takes part, even when overrides cover every
    /// country the offer runs in.
    pub fn cpa_bounds(base_cpa: f64, payout: &EffectivePayout<'_>) -> (f64, f64) {
        payout
            .country_overrides
            .iter()
            .map(|o| o.cpa_amount)
            .fold((base_cpa, base_cpa), |(min, max), amount| {
                (min.min(amount), max.max(amount))
            })
    }

    fn cpa_range_text(min: f64, max: f64) -> String {
        if min == max {
            format!("{} CPA", format_amount(min))
        } else {
            format!("{} - {} CPA", format_amount(min), format_amount(max))
        }
    }

    pub fn present(payout: &EffectivePayout<'_>) -> PayoutSummary {
        let is_custom = payout.source == PayoutSource::Custom;

        match *payout.terms {
            PayoutTerms::Fixed { fixed } => PayoutSummary {
                label: "Fixed".to_string(),
                display_text: format!("{} Fixed", format_amount(fixed)),
                min_amount: fixed,
                max_amount: fixed,
                is_custom,
            },
            PayoutTerms::Cpa { cpa } => {
                let (min, max) = Self::cpa_bounds(cpa, payout);
                PayoutSummary {
                    label: "CPA".to_string(),
                    display_text: Self::cpa_range_text(min, max),
                    min_amount: min,
                    max_amount: max,
                    is_custom,
                }
            }
            PayoutTerms::CpaAndFixed { cpa, fixed } => {
                let (min_cpa, max_cpa) = Self::cpa_bounds(cpa, payout);
                PayoutSummary {
                    label: "CPA + Fixed".to_string(),
                    display_text: format!(
                        "{} + {} Fixed",
                        Self::cpa_range_text(min_cpa, max_cpa),
                        format_amount(fixed)
                    ),
                    min_amount: min_cpa + fixed,
                    max_amount: max_cpa + fixed,
                    is_custom,
                }
            }
        }
    }
}
