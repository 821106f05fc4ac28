use crate::model::{BasePayout, CustomPayout, EffectivePayout, PayoutSource};

/// Pick the payout configuration an influencer sees.
///
/// A custom payout wins outright and never carries the base payout's
/// country overrides.
pub fn resolve<'a>(base: &'a BasePayout, custom: Option<&'a CustomPayout>) -> EffectivePayout<'a> {
    match custom {
        Some(custom) => EffectivePayout {
            terms: &custom.terms,
            country_overrides: &[],
            source: PayoutSource::Custom,
        },
        None => EffectivePayout {
            terms: &base.terms,
            country_overrides: &base.country_overrides,
            source: PayoutSource::Base,
        },
    }
}
