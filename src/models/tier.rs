//! Payment tier types
//!
//! The five spending segments every record is assigned to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of payment tiers, declared in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaymentTier {
    Whale,
    BigSpender,
    MidSpender,
    SmallSpender,
    FreeUser,
}

impl PaymentTier {
    /// All tiers in fixed display order (Whale first)
    pub const ALL: [PaymentTier; 5] = [
        PaymentTier::Whale,
        PaymentTier::BigSpender,
        PaymentTier::MidSpender,
        PaymentTier::SmallSpender,
        PaymentTier::FreeUser,
    ];

    /// Label used by the source export
    pub fn source_label(&self) -> &'static str {
        match self {
            Self::Whale => "土豪",
            Self::BigSpender => "大R",
            Self::MidSpender => "中R",
            Self::SmallSpender => "小R",
            Self::FreeUser => "平民",
        }
    }

    /// English display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Whale => "Whale",
            Self::BigSpender => "BigSpender",
            Self::MidSpender => "MidSpender",
            Self::SmallSpender => "SmallSpender",
            Self::FreeUser => "FreeUser",
        }
    }

    /// Chart colour for this tier
    pub fn color(&self) -> &'static str {
        match self {
            Self::Whale => "#F43F5E",
            Self::BigSpender => "#F97316",
            Self::MidSpender => "#FBBF24",
            Self::SmallSpender => "#10B981",
            Self::FreeUser => "#3B82F6",
        }
    }

    /// Match a literal tier label (source label or English name)
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.source_label() == label || tier.display_name() == label)
    }
}

impl fmt::Display for PaymentTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Grouping key for the tier field. Labels outside the fixed set keep their own bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBucket {
    Known(PaymentTier),
    Unrecognized(String),
}

impl TierBucket {
    /// Bucket for a literal tier label
    pub fn from_label(label: &str) -> Self {
        match PaymentTier::from_label(label) {
            Some(tier) => TierBucket::Known(tier),
            None => TierBucket::Unrecognized(label.to_string()),
        }
    }

    /// The recognised tier, if any
    pub fn tier(&self) -> Option<PaymentTier> {
        match self {
            TierBucket::Known(tier) => Some(*tier),
            TierBucket::Unrecognized(_) => None,
        }
    }
}
