use chrono::{Duration, Utc};
use log::info;
use serde_json::json;
use snafu::prelude::*;

use wsjf_engine::{Item, PlanningPeriod};

use crate::app::store::{ItemDraft, PeriodDraft, Store};
use crate::app::{AppResult, ParsingInputSnafu};

const SAMPLE_PERIOD_NAME: &str = "PI18";

fn sample_drafts() -> AppResult<Vec<ItemDraft>> {
    let docs = json!([
        {
            "subject": "User Authentication System",
            "description": "Single sign-on with multi-factor authentication",
            "business_value": { "product_mgmt_business": 21, "dev_technical": 13, "ai_business": 8 },
            "time_criticality": { "consultants_business": 13, "support_business": 5 },
            "risk_reduction": { "dev_business": 8, "ops_technical": 3 },
            "job_size": { "dev": 5, "ai": 3, "ops": 2, "support": 1 },
            "owner": "Alice Johnson",
            "period": SAMPLE_PERIOD_NAME,
        },
        {
            "subject": "Mobile App Dashboard",
            "description": "Responsive dashboard for the mobile companion app",
            "business_value": { "product_owners_business": 8, "dev_business": 5 },
            "time_criticality": { "ai_technical": 5, "ops_business": 3 },
            "risk_reduction": { "consultants_business": 3, "support_business": 2 },
            "job_size": { "dev": 8, "ai": 5, "ops": 3, "support": 2 },
            "owner": "Bob Smith",
            "period": SAMPLE_PERIOD_NAME,
        },
        {
            "subject": "Payment Gateway Integration",
            "description": "Connect the billing flow to the external payment provider",
            "business_value": { "business_owners_business": 21, "product_mgmt_business": 13 },
            "time_criticality": { "cabinet_business": 13, "consultants_business": 8 },
            "risk_reduction": { "dev_technical": 8, "support_business": 5 },
            "job_size": { "dev": 8, "ai": 5, "ops": 3, "support": 1 },
            "owner": "Carol Davis",
            "period": SAMPLE_PERIOD_NAME,
        },
    ]);
    serde_json::from_value(docs).context(ParsingInputSnafu {})
}

/// Loads a demonstration planning period with three assessed items.
///
/// Reuses the period if it already exists and replaces its items, so the
/// command can be run repeatedly without piling up duplicates.
pub fn seed(store: &mut Store) -> AppResult<(PlanningPeriod, Vec<Item>)> {
    let period = match store.resolve_period(SAMPLE_PERIOD_NAME) {
        Ok(p) => p.clone(),
        Err(_) => {
            let now = Utc::now();
            store.create_period(PeriodDraft {
                name: SAMPLE_PERIOD_NAME.to_string(),
                description: "Sample planning period for demonstration".to_string(),
                start_date: now,
                end_date: now + Duration::days(90),
                status: None,
            })?
        }
    };

    let before = store.items.len();
    store.items.retain(|it| it.period_id != period.id);
    if before > store.items.len() {
        info!("replaced {} existing sample items", before - store.items.len());
    }

    let items = store.create_batch(sample_drafts()?)?;
    Ok((period, items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_loads_three_items() {
        let mut store = Store::default();
        let (period, items) = seed(&mut store).unwrap();
        assert_eq!(period.name, SAMPLE_PERIOD_NAME);
        assert_eq!(items.len(), 3);
        assert_eq!(store.items_in_period(period.id).len(), 3);

        // The flagship sample item scores (21 + 13 + 8) / 5 = 8.4.
        let auth = store
            .items
            .iter()
            .find(|it| it.subject == "User Authentication System")
            .unwrap();
        let score = wsjf_engine::score(auth);
        assert_eq!(score.value, 8.4);
        assert!(!score.incomplete);
    }

    #[test]
    fn seed_is_repeatable() {
        let mut store = Store::default();
        seed(&mut store).unwrap();
        let (period, _) = seed(&mut store).unwrap();
        assert_eq!(store.periods.len(), 1);
        assert_eq!(store.items_in_period(period.id).len(), 3);
    }
}
