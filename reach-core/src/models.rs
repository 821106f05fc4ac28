use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use reach_payout::{BasePayout, CountryOverride, PayoutFields, PayoutSummary, PayoutTerms, PayoutType};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{CoreError, CoreResult};

/// Closed set of offer categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Gaming,
    Tech,
    Health,
    Nutrition,
    Fashion,
    Finance,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Gaming,
        Category::Tech,
        Category::Health,
        Category::Nutrition,
        Category::Fashion,
        Category::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gaming => "Gaming",
            Category::Tech => "Tech",
            Category::Health => "Health",
            Category::Nutrition => "Nutrition",
            Category::Fashion => "Fashion",
            Category::Finance => "Finance",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Non-repeating categories of an offer, kept in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CategorySet(BTreeSet<Category>);

impl CategorySet {
    /// Build a set, rejecting an empty selection
    pub fn non_empty(categories: impl IntoIterator<Item = Category>) -> CoreResult<Self> {
        let set: BTreeSet<Category> = categories.into_iter().collect();
        if set.is_empty() {
            return Err(CoreError::validation("At least one category is required"));
        }
        Ok(Self(set))
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A marketing campaign with its base payout
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Offer {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub categories: CategorySet,
    pub payout: BasePayout,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Influencer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PayoutDraft {
    pub payout_type: PayoutType,
    #[serde(default)]
    pub cpa_amount: Option<f64>,
    #[serde(default)]
    pub fixed_amount: Option<f64>,
    #[serde(default)]
    pub country_overrides: Vec<CountryOverride>,
}

impl PayoutDraft {
    pub fn fields(&self) -> PayoutFields {
        PayoutFields {
            payout_type: self.payout_type,
            cpa_amount: self.cpa_amount,
            fixed_amount: self.fixed_amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferDraft {
    pub title: String,
    pub description: String,
    pub categories: Vec<Category>,
    pub payout: PayoutDraft,
}

/// Distinguishes an absent field from an explicit `null`
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial payout update.
///
/// Amounts are tri-state: `None` keeps the stored value, `Some(None)` clears
/// it and `Some(Some(x))` sets it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayoutPatch {
    #[serde(default)]
    pub payout_type: Option<PayoutType>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub cpa_amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub fixed_amount: Option<Option<f64>>,
    #[serde(default)]
    pub country_overrides: Option<Vec<CountryOverride>>,
}

impl PayoutPatch {
    /// Overlay this patch on the stored terms, ready for validation
    pub fn merge_onto(&self, current: &PayoutTerms) -> PayoutFields {
        PayoutFields {
            payout_type: self.payout_type.unwrap_or_else(|| current.payout_type()),
            cpa_amount: self.cpa_amount.unwrap_or_else(|| current.cpa_amount()),
            fixed_amount: self.fixed_amount.unwrap_or_else(|| current.fixed_amount()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub payout: Option<PayoutPatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfluencerDraft {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfluencerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// Validated writes handed to a repository
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub title: String,
    pub description: String,
    pub categories: CategorySet,
    pub payout: PayoutTerms,
    pub country_overrides: Vec<CountryOverride>,
}

/// Fields to overwrite on an offer; `None` leaves the stored value alone.
/// `country_overrides` replaces the whole list when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub categories: Option<CategorySet>,
    pub payout: Option<PayoutTerms>,
    pub country_overrides: Option<Vec<CountryOverride>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInfluencer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfluencerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

// ============================================================================
// Pagination and listings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(skip: Option<i64>, limit: Option<i64>, limits: PageLimits) -> CoreResult<Self> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(limits.default_limit);

        if skip < 0 {
            return Err(CoreError::validation("skip must be greater than or equal to 0"));
        }
        if limit < 1 || limit > limits.max_limit {
            return Err(CoreError::validation(format!(
                "limit must be between 1 and {}",
                limits.max_limit
            )));
        }

        Ok(Self { skip, limit })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferPage {
    pub offers: Vec<Offer>,
    pub total: i64,
}

/// An offer as one influencer sees it
#[derive(Debug, Clone, Serialize)]
pub struct InfluencerOffer {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub categories: CategorySet,
    pub payout_info: PayoutSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfluencerOfferPage {
    pub offers: Vec<InfluencerOffer>,
    pub total: i64,
}

impl InfluencerOfferPage {
    pub fn empty() -> Self {
        Self {
            offers: Vec::new(),
            total: 0,
        }
    }
}
