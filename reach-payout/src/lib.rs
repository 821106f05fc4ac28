pub mod model;
pub mod validator;
pub mod resolver;
pub mod presenter;

pub use model::{
    BasePayout, CountryOverride, CustomPayout, EffectivePayout, PayoutFields, PayoutSource,
    PayoutSummary, PayoutTerms, PayoutType,
};
pub use presenter::PayoutPresenter;
pub use resolver::resolve;
pub use validator::{validate_overrides, validate_payout, PayoutError, MAX_AMOUNT};
