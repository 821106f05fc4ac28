use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an offer pays the influencer promoting it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PayoutType {
    #[serde(rename = "CPA")]
    Cpa,
    #[serde(rename = "FIXED")]
    Fixed,
    #[serde(rename = "CPA_AND_FIXED", alias = "CPA_FIXED")]
    CpaAndFixed,
}

impl PayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutType::Cpa => "CPA",
            PayoutType::Fixed => "FIXED",
            PayoutType::CpaAndFixed => "CPA_AND_FIXED",
        }
    }
}

impl std::fmt::Display for PayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PayoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CPA" => Ok(PayoutType::Cpa),
            "FIXED" => Ok(PayoutType::Fixed),
            "CPA_AND_FIXED" | "CPA_FIXED" => Ok(PayoutType::CpaAndFixed),
            other => Err(format!("unknown payout type: {}", other)),
        }
    }
}

/// Unvalidated payout triple as it arrives on the wire or leaves a database row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PayoutFields {
    pub payout_type: PayoutType,
    #[serde(default)]
    pub cpa_amount: Option<f64>,
    #[serde(default)]
    pub fixed_amount: Option<f64>,
}

/// Validated payout amounts.
///
/// Only [`crate::validator::validate_payout`] produces these, so every
/// variant carries exactly the amounts its type requires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "PayoutFields")]
pub enum PayoutTerms {
    Cpa { cpa: f64 },
    Fixed { fixed: f64 },
    CpaAndFixed { cpa: f64, fixed: f64 },
}

impl PayoutTerms {
    pub fn payout_type(&self) -> PayoutType {
        match self {
            PayoutTerms::Cpa { .. } => PayoutType::Cpa,
            PayoutTerms::Fixed { .. } => PayoutType::Fixed,
            PayoutTerms::CpaAndFixed { .. } => PayoutType::CpaAndFixed,
        }
    }

    pub fn cpa_amount(&self) -> Option<f64> {
        match self {
            PayoutTerms::Cpa { cpa } | PayoutTerms::CpaAndFixed { cpa, .. } => Some(*cpa),
            PayoutTerms::Fixed { .. } => None,
        }
    }

    pub fn fixed_amount(&self) -> Option<f64> {
        match self {
            PayoutTerms::Fixed { fixed } | PayoutTerms::CpaAndFixed { fixed, .. } => Some(*fixed),
            PayoutTerms::Cpa { .. } => None,
        }
    }

    pub fn fields(&self) -> PayoutFields {
        PayoutFields {
            payout_type: self.payout_type(),
            cpa_amount: self.cpa_amount(),
            fixed_amount: self.fixed_amount(),
        }
    }
}

impl From<PayoutTerms> for PayoutFields {
    fn from(terms: PayoutTerms) -> Self {
        terms.fields()
    }
}

/// Per-country CPA amount attached to a base payout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryOverride {
    pub country_code: String,
    pub cpa_amount: f64,
}

impl CountryOverride {
    pub fn new(country_code: impl Into<String>, cpa_amount: f64) -> Self {
        Self {
            country_code: country_code.into(),
            cpa_amount,
        }
    }
}

/// Default payout configuration of an offer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BasePayout {
    pub id: i64,
    #[serde(flatten)]
    pub terms: PayoutTerms,
    pub country_overrides: Vec<CountryOverride>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Influencer-specific payout that replaces the base payout of one offer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomPayout {
    pub id: i64,
    pub offer_id: i64,
    pub influencer_id: i64,
    #[serde(flatten)]
    pub terms: PayoutTerms,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where an effective payout was taken from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutSource {
    Base,
    Custom,
}

/// The payout configuration one influencer actually sees for an offer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectivePayout<'a> {
    pub terms: &'a PayoutTerms,
    pub country_overrides: &'a [CountryOverride],
    pub source: PayoutSource,
}

/// Human-readable payout with its numeric bounds
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayoutSummary {
    #[serde(rename = "payout_type")]
    pub label: String,
    pub display_text: String,
    pub min_amount: f64,
    pub max_amount: f64,
    pub is_custom: bool,
}
