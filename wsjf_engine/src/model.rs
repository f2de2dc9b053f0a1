// ********* Input data structures ***********

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::values::{AssessmentValues, SizeValues, Team};

/// Decision status of a prioritization item.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ItemStatus {
    New,
    Go,
    #[serde(rename = "No-Go")]
    NoGo,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::New, ItemStatus::Go, ItemStatus::NoGo];

    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::New => "New",
            ItemStatus::Go => "Go",
            ItemStatus::NoGo => "No-Go",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lifecycle status of a planning period.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PeriodStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl PeriodStatus {
    pub const ALL: [PeriodStatus; 4] = [
        PeriodStatus::Planning,
        PeriodStatus::Active,
        PeriodStatus::Completed,
        PeriodStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PeriodStatus::Planning => "Planning",
            PeriodStatus::Active => "Active",
            PeriodStatus::Completed => "Completed",
            PeriodStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A prioritization item.
///
/// Score, rank, incompleteness and contributing teams are derived values,
/// recomputed on every read. They are deliberately not fields of this struct
/// so that stale derived state cannot exist.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub business_value: AssessmentValues,
    #[serde(default)]
    pub time_criticality: AssessmentValues,
    #[serde(default)]
    pub risk_reduction: AssessmentValues,
    #[serde(default)]
    pub job_size: SizeValues,
    pub status: ItemStatus,
    #[serde(default)]
    pub owner: Option<String>,
    /// Every item belongs to exactly one planning period.
    pub period_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Checks all four dimensions against the closed estimation scale.
    pub fn validate_values(&self) -> Result<(), EngineError> {
        self.business_value.validate("business_value")?;
        self.time_criticality.validate("time_criticality")?;
        self.risk_reduction.validate("risk_reduction")?;
        self.job_size.validate("job_size")?;
        Ok(())
    }
}

/// A time-boxed container that groups items for ranking and export.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PlanningPeriod {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    /// Invariant: strictly after `start_date`.
    pub end_date: DateTime<Utc>,
    pub status: PeriodStatus,
    pub created_at: DateTime<Utc>,
}

// ******** Output data structures *********

/// The scoring breakdown of one item: the four aggregated dimension values,
/// the rounded WSJF score and the incompleteness flag.
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
pub struct Score {
    pub business_value: u32,
    pub time_criticality: u32,
    pub risk_reduction: u32,
    pub job_size: u32,
    /// `(BV + TC + RR) / JS` rounded to 2 decimal places; 0 when `JS = 0`.
    pub value: f64,
    /// True when at least one dimension has no role assessment yet.
    /// Informational only; never blocks scoring or export.
    pub incomplete: bool,
}

/// One item of a ranked view, with its dense 1-based priority rank.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct RankedItem {
    pub item: Item,
    pub score: Score,
    pub rank: u32,
}

/// Summary statistics for one period's item collection.
///
/// Both distributions always carry every enumerated key, with zero counts
/// for absent statuses and teams, so the output shape does not depend on
/// the data.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub total_items: usize,
    /// Arithmetic mean of the item scores, rounded to 2 decimal places.
    /// 0 for an empty collection.
    pub average_score: f64,
    pub status_distribution: BTreeMap<ItemStatus, usize>,
    pub team_distribution: BTreeMap<Team, usize>,
}
