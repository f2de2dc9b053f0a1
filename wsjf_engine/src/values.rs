// ********* Value model ***********

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The closed estimation scale. Every recorded sub-value must be drawn
/// from this set; anything else is rejected at the boundary.
pub const VALUE_SCALE: [u8; 7] = [1, 2, 3, 5, 8, 13, 21];

/// Membership predicate for the estimation scale.
pub fn is_scale_value(v: u8) -> bool {
    VALUE_SCALE.contains(&v)
}

/// The closed set of team tags an item can contribute to.
///
/// Team membership is derived from the role sub-values on every read and is
/// never stored.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Team {
    Dev,
    #[serde(rename = "AI")]
    Ai,
    Ops,
    Support,
}

impl Team {
    pub const ALL: [Team; 4] = [Team::Dev, Team::Ai, Team::Ops, Team::Support];

    pub fn label(&self) -> &'static str {
        match self {
            Team::Dev => "Dev",
            Team::Ai => "AI",
            Team::Ops => "Ops",
            Team::Support => "Support",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The 12-role sub-value mapping used for Business Value, Time Criticality
/// and Risk Reduction. An absent role simply has not assessed the item yet.
///
/// The role set is a closed enumeration: duplicate roles are structurally
/// impossible and the set is not user-extensible.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentValues {
    // Product management & ownership
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_mgmt_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_owners_business: Option<u8>,

    // Business leadership
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_owners_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabinet_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultants_business: Option<u8>,

    // Development team
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_technical: Option<u8>,

    // Information architecture / AI team
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_technical: Option<u8>,

    // Operations & infrastructure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_business: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_technical: Option<u8>,

    // Support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_business: Option<u8>,
}

impl AssessmentValues {
    /// All roles with their recorded values, in declaration order.
    pub fn entries(&self) -> [(&'static str, Option<u8>); 12] {
        [
            ("product_mgmt_business", self.product_mgmt_business),
            ("product_owners_business", self.product_owners_business),
            ("business_owners_business", self.business_owners_business),
            ("cabinet_business", self.cabinet_business),
            ("consultants_business", self.consultants_business),
            ("dev_business", self.dev_business),
            ("dev_technical", self.dev_technical),
            ("ai_business", self.ai_business),
            ("ai_technical", self.ai_technical),
            ("ops_business", self.ops_business),
            ("ops_technical", self.ops_technical),
            ("support_business", self.support_business),
        ]
    }

    /// Aggregates the mapping into a single dimension value: the maximum of
    /// all present sub-values, or 0 when no role has assessed the dimension.
    ///
    /// The dimension is driven by whichever role perceives the strongest
    /// signal; averaging would understate a legitimate outlier assessment.
    pub fn max_value(&self) -> u32 {
        self.entries()
            .iter()
            .filter_map(|(_, v)| *v)
            .map(u32::from)
            .max()
            .unwrap_or(0)
    }

    /// Checks every present sub-value against the estimation scale.
    /// `dimension` prefixes the field path reported on rejection.
    pub fn validate(&self, dimension: &str) -> Result<(), EngineError> {
        for (role, value) in self.entries() {
            if let Some(v) = value {
                if !is_scale_value(v) {
                    return Err(EngineError::InvalidValue {
                        field: format!("{}.{}", dimension, role),
                        value: v,
                    });
                }
            }
        }
        Ok(())
    }

    /// True when any role belonging to the given team carries a value.
    pub fn has_team_value(&self, team: Team) -> bool {
        match team {
            Team::Dev => self.dev_business.is_some() || self.dev_technical.is_some(),
            Team::Ai => self.ai_business.is_some() || self.ai_technical.is_some(),
            Team::Ops => self.ops_business.is_some() || self.ops_technical.is_some(),
            Team::Support => self.support_business.is_some(),
        }
    }
}

/// The 4-role sub-value mapping used for Job Size: one sizing per sub-team.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support: Option<u8>,
}

impl SizeValues {
    pub fn entries(&self) -> [(&'static str, Option<u8>); 4] {
        [
            ("dev", self.dev),
            ("ai", self.ai),
            ("ops", self.ops),
            ("support", self.support),
        ]
    }

    /// Maximum of the present sub-team sizings, 0 when the item is unsized.
    ///
    /// The job size is the largest individual sub-team effort, not the sum:
    /// sub-teams work in parallel within a planning period.
    pub fn max_value(&self) -> u32 {
        self.entries()
            .iter()
            .filter_map(|(_, v)| *v)
            .map(u32::from)
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self, dimension: &str) -> Result<(), EngineError> {
        for (role, value) in self.entries() {
            if let Some(v) = value {
                if !is_scale_value(v) {
                    return Err(EngineError::InvalidValue {
                        field: format!("{}.{}", dimension, role),
                        value: v,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn has_team_value(&self, team: Team) -> bool {
        match team {
            Team::Dev => self.dev.is_some(),
            Team::Ai => self.ai.is_some(),
            Team::Ops => self.ops.is_some(),
            Team::Support => self.support.is_some(),
        }
    }
}
