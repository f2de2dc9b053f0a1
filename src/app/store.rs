use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use uuid::Uuid;

use wsjf_engine::{AssessmentValues, Item, ItemStatus, PeriodStatus, PlanningPeriod, SizeValues};

use crate::app::{
    AppResult, BatchSizeSnafu, DeletionBlockedSnafu, DuplicatePeriodNameSnafu, EmptyPeriodNameSnafu,
    EmptySubjectSnafu, InvalidPeriodDatesSnafu, ItemNotFoundSnafu, MissingReferenceSnafu,
    OpeningStoreSnafu, ParsingStoreSnafu, PeriodNotFoundSnafu, SerializingOutputSnafu,
    ValidationSnafu, WritingStoreSnafu,
};

const MAX_BATCH_ITEMS: usize = 100;

/// An item as submitted by the user. The owning period is referenced by
/// name or id; identity and timestamps are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDraft {
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
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(default)]
    pub owner: Option<String>,
    pub period: String,
}

/// A partial item update. Absent fields are left unchanged; a present
/// dimension mapping replaces the stored one wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemPatch {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub business_value: Option<AssessmentValues>,
    pub time_criticality: Option<AssessmentValues>,
    pub risk_reduction: Option<AssessmentValues>,
    pub job_size: Option<SizeValues>,
    pub status: Option<ItemStatus>,
    pub owner: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PeriodDraft {
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<PeriodStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct PeriodPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<PeriodStatus>,
}

/// A period listing entry with its attached item count.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodOverview {
    #[serde(flatten)]
    pub period: PlanningPeriod,
    pub item_count: usize,
}

/// The full persisted state: all planning periods and all items.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub periods: Vec<PlanningPeriod>,
    pub items: Vec<Item>,
}

impl Store {
    fn find_period(&self, key: &str) -> Option<&PlanningPeriod> {
        if let Ok(id) = Uuid::parse_str(key) {
            if let Some(p) = self.periods.iter().find(|p| p.id == id) {
                return Some(p);
            }
        }
        self.periods.iter().find(|p| p.name == key)
    }

    /// Looks a period up by id first, then by exact name.
    pub fn resolve_period(&self, key: &str) -> AppResult<&PlanningPeriod> {
        self.find_period(key)
            .context(PeriodNotFoundSnafu { key })
    }

    pub fn create_period(&mut self, draft: PeriodDraft) -> AppResult<PlanningPeriod> {
        ensure!(!draft.name.trim().is_empty(), EmptyPeriodNameSnafu);
        ensure!(draft.end_date > draft.start_date, InvalidPeriodDatesSnafu);
        ensure!(
            !self.periods.iter().any(|p| p.name == draft.name),
            DuplicatePeriodNameSnafu { name: draft.name }
        );

        let period = PlanningPeriod {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status.unwrap_or(PeriodStatus::Planning),
            created_at: Utc::now(),
        };
        debug!("created period {} ({})", period.name, period.id);
        self.periods.push(period.clone());
        Ok(period)
    }

    pub fn update_period(&mut self, id: Uuid, patch: PeriodPatch) -> AppResult<PlanningPeriod> {
        if let Some(name) = &patch.name {
            ensure!(!name.trim().is_empty(), EmptyPeriodNameSnafu);
            ensure!(
                !self.periods.iter().any(|p| p.id != id && &p.name == name),
                DuplicatePeriodNameSnafu { name: name.clone() }
            );
        }
        let idx = self
            .periods
            .iter()
            .position(|p| p.id == id)
            .context(PeriodNotFoundSnafu {
                key: id.to_string(),
            })?;

        let mut period = self.periods[idx].clone();
        if let Some(name) = patch.name {
            period.name = name;
        }
        if let Some(description) = patch.description {
            period.description = description;
        }
        if let Some(start_date) = patch.start_date {
            period.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            period.end_date = end_date;
        }
        if let Some(status) = patch.status {
            period.status = status;
        }
        ensure!(period.end_date > period.start_date, InvalidPeriodDatesSnafu);

        self.periods[idx] = period.clone();
        Ok(period)
    }

    /// Deletes a period. Refused while any item still references it, so
    /// that items can never be left pointing at a period that is gone.
    pub fn delete_period(&mut self, id: Uuid) -> AppResult<PlanningPeriod> {
        let idx = self
            .periods
            .iter()
            .position(|p| p.id == id)
            .context(PeriodNotFoundSnafu {
                key: id.to_string(),
            })?;
        let count = self.items.iter().filter(|it| it.period_id == id).count();
        ensure!(
            count == 0,
            DeletionBlockedSnafu {
                name: self.periods[idx].name.clone(),
                count,
            }
        );
        Ok(self.periods.remove(idx))
    }

    /// All periods with their item counts, newest first.
    pub fn period_overviews(&self) -> Vec<PeriodOverview> {
        let mut overviews: Vec<PeriodOverview> = self
            .periods
            .iter()
            .map(|p| PeriodOverview {
                period: p.clone(),
                item_count: self.items.iter().filter(|it| it.period_id == p.id).count(),
            })
            .collect();
        overviews.sort_by(|a, b| b.period.created_at.cmp(&a.period.created_at));
        overviews
    }

    pub fn items_in_period(&self, id: Uuid) -> Vec<Item> {
        self.items
            .iter()
            .filter(|it| it.period_id == id)
            .cloned()
            .collect()
    }

    fn validated_item(&self, draft: ItemDraft) -> AppResult<Item> {
        ensure!(!draft.subject.trim().is_empty(), EmptySubjectSnafu);
        let period_id = self
            .find_period(&draft.period)
            .context(MissingReferenceSnafu { key: draft.period })?
            .id;

        let item = Item {
            id: Uuid::new_v4(),
            subject: draft.subject,
            description: draft.description,
            business_value: draft.business_value,
            time_criticality: draft.time_criticality,
            risk_reduction: draft.risk_reduction,
            job_size: draft.job_size,
            status: draft.status.unwrap_or(ItemStatus::New),
            owner: draft.owner,
            period_id,
            created_at: Utc::now(),
        };
        item.validate_values().context(ValidationSnafu)?;
        Ok(item)
    }

    pub fn create_item(&mut self, draft: ItemDraft) -> AppResult<Item> {
        let item = self.validated_item(draft)?;
        debug!("created item {} ({})", item.subject, item.id);
        self.items.push(item.clone());
        Ok(item)
    }

    /// Creates up to 100 items in one call. All drafts are validated before
    /// any is stored: either every item is created or none is.
    pub fn create_batch(&mut self, drafts: Vec<ItemDraft>) -> AppResult<Vec<Item>> {
        ensure!(
            (1..=MAX_BATCH_ITEMS).contains(&drafts.len()),
            BatchSizeSnafu {
                count: drafts.len(),
            }
        );
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(self.validated_item(draft)?);
        }
        self.items.extend(created.iter().cloned());
        Ok(created)
    }

    pub fn get_item(&self, id: Uuid) -> AppResult<&Item> {
        self.items
            .iter()
            .find(|it| it.id == id)
            .context(ItemNotFoundSnafu { id })
    }

    /// Applies a partial update. The patched item is re-validated as a
    /// whole; on rejection the stored item is left untouched.
    pub fn update_item(&mut self, id: Uuid, patch: ItemPatch) -> AppResult<Item> {
        let idx = self
            .items
            .iter()
            .position(|it| it.id == id)
            .context(ItemNotFoundSnafu { id })?;

        let mut item = self.items[idx].clone();
        if let Some(subject) = patch.subject {
            ensure!(!subject.trim().is_empty(), EmptySubjectSnafu);
            item.subject = subject;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(business_value) = patch.business_value {
            item.business_value = business_value;
        }
        if let Some(time_criticality) = patch.time_criticality {
            item.time_criticality = time_criticality;
        }
        if let Some(risk_reduction) = patch.risk_reduction {
            item.risk_reduction = risk_reduction;
        }
        if let Some(job_size) = patch.job_size {
            item.job_size = job_size;
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(owner) = patch.owner {
            item.owner = Some(owner);
        }
        if let Some(period) = patch.period {
            item.period_id = self
                .find_period(&period)
                .context(MissingReferenceSnafu { key: period })?
                .id;
        }
        item.validate_values().context(ValidationSnafu)?;

        self.items[idx] = item.clone();
        Ok(item)
    }

    pub fn delete_item(&mut self, id: Uuid) -> AppResult<Item> {
        let idx = self
            .items
            .iter()
            .position(|it| it.id == id)
            .context(ItemNotFoundSnafu { id })?;
        Ok(self.items.remove(idx))
    }
}

/// On-disk JSON snapshot of a [Store].
///
/// Saves go through a temporary file followed by a rename, so a crash
/// mid-write cannot truncate the previous snapshot.
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: impl Into<PathBuf>) -> StoreFile {
        StoreFile { path: path.into() }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// A missing file is an empty store, not an error.
    pub fn load(&self) -> AppResult<Store> {
        if !self.path.exists() {
            debug!("store file {} not found, starting empty", self.display_path());
            return Ok(Store::default());
        }
        let contents = fs::read_to_string(&self.path).context(OpeningStoreSnafu {
            path: self.display_path(),
        })?;
        serde_json::from_str(&contents).context(ParsingStoreSnafu {
            path: self.display_path(),
        })
    }

    pub fn save(&self, store: &Store) -> AppResult<()> {
        let contents =
            serde_json::to_string_pretty(store).context(SerializingOutputSnafu {})?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).context(WritingStoreSnafu {
            path: tmp.display().to_string(),
        })?;
        fs::rename(&tmp, &self.path).context(WritingStoreSnafu {
            path: self.display_path(),
        })?;
        debug!(
            "saved {} periods and {} items to {}",
            store.periods.len(),
            store.items.len(),
            self.display_path()
        );
        Ok(())
    }
}
