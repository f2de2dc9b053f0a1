mod error;
mod model;
mod values;

use log::debug;

use std::collections::{BTreeMap, BTreeSet};

pub use crate::error::EngineError;
pub use crate::model::*;
pub use crate::values::*;

// The engine is a pure function from an item snapshot to derived values.
// It never mutates stored state and never performs I/O, so it is safe to
// recompute on every read and to call concurrently without locking.

fn round2(x: f64) -> f64 {
    // f64::round is round-half-away-from-zero, which is the rounding mode
    // the score contract specifies.
    (x * 100.0).round() / 100.0
}

/// Computes the WSJF scoring breakdown for one item.
///
/// Business Value, Time Criticality and Risk Reduction aggregate over the
/// 12-role set, Job Size over the 4-role set. The score is
/// `(BV + TC + RR) / JS` rounded to 2 decimal places.
///
/// An unsized item (`JS = 0`) scores 0 rather than dividing by zero: it must
/// not appear as highest priority merely because the denominator is missing.
pub fn score(item: &Item) -> Score {
    let business_value = item.business_value.max_value();
    let time_criticality = item.time_criticality.max_value();
    let risk_reduction = item.risk_reduction.max_value();
    let job_size = item.job_size.max_value();

    let incomplete =
        business_value == 0 || time_criticality == 0 || risk_reduction == 0 || job_size == 0;

    let value = if job_size == 0 {
        0.0
    } else {
        round2((business_value + time_criticality + risk_reduction) as f64 / job_size as f64)
    };

    Score {
        business_value,
        time_criticality,
        risk_reduction,
        job_size,
        value,
        incomplete,
    }
}

/// Assigns a dense, 1-based priority rank to a collection of items.
///
/// Items are ordered by score descending. Ties are broken by creation
/// timestamp ascending (an earlier-created item outranks a later one at
/// equal score), then by item id so the ordering stays deterministic even
/// for identical timestamps. Ranks are positional: a bijection onto
/// `1..=N` with no gaps and no shared ranks.
///
/// The ranking is relative to the slice it is given. Any filtering (by
/// period, status or team) must happen before calling this function.
pub fn rank(items: &[Item]) -> Vec<RankedItem> {
    let mut scored: Vec<(Item, Score)> = items.iter().map(|it| (it.clone(), score(it))).collect();
    scored.sort_by(|(a, sa), (b, sb)| {
        sb.value
            .total_cmp(&sa.value)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    debug!("rank: ordered {} items", scored.len());
    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (item, score))| RankedItem {
            item,
            score,
            rank: (idx + 1) as u32,
        })
        .collect()
}

/// The teams an item contributes to: every team whose role subset carries a
/// value in any of the four dimensions.
pub fn active_teams(item: &Item) -> BTreeSet<Team> {
    Team::ALL
        .iter()
        .copied()
        .filter(|t| {
            item.business_value.has_team_value(*t)
                || item.time_criticality.has_team_value(*t)
                || item.risk_reduction.has_team_value(*t)
                || item.job_size.has_team_value(*t)
        })
        .collect()
}

/// Computes summary statistics over one period's item collection.
///
/// An empty collection yields a count of 0 and an average score of 0,
/// never a division error.
pub fn summarize(items: &[Item]) -> PeriodSummary {
    let mut status_distribution: BTreeMap<ItemStatus, usize> =
        ItemStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut team_distribution: BTreeMap<Team, usize> =
        Team::ALL.iter().map(|t| (*t, 0)).collect();

    let mut score_sum = 0.0;
    for item in items {
        score_sum += score(item).value;
        *status_distribution.entry(item.status).or_insert(0) += 1;
        for team in active_teams(item) {
            *team_distribution.entry(team).or_insert(0) += 1;
        }
    }

    let average_score = if items.is_empty() {
        0.0
    } else {
        round2(score_sum / items.len() as f64)
    };
    debug!(
        "summarize: {} items, average score {}",
        items.len(),
        average_score
    );

    PeriodSummary {
        total_items: items.len(),
        average_score,
        status_distribution,
        team_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn blank_item(created: DateTime<Utc>) -> Item {
        Item {
            id: Uuid::new_v4(),
            subject: "Feature".to_string(),
            description: String::new(),
            business_value: AssessmentValues::default(),
            time_criticality: AssessmentValues::default(),
            risk_reduction: AssessmentValues::default(),
            job_size: SizeValues::default(),
            status: ItemStatus::New,
            owner: None,
            period_id: Uuid::new_v4(),
            created_at: created,
        }
    }

    fn item_with(bv: u8, tc: u8, rr: u8, js: u8, created: DateTime<Utc>) -> Item {
        let mut item = blank_item(created);
        item.business_value.dev_business = Some(bv);
        item.time_criticality.ops_technical = Some(tc);
        item.risk_reduction.consultants_business = Some(rr);
        item.job_size.dev = Some(js);
        item
    }

    #[test]
    fn aggregate_is_max_of_present_values() {
        let values = AssessmentValues {
            dev_business: Some(5),
            ai_technical: Some(13),
            support_business: Some(2),
            ..AssessmentValues::default()
        };
        assert_eq!(values.max_value(), 13);
    }

    #[test]
    fn aggregate_of_all_absent_is_zero() {
        assert_eq!(AssessmentValues::default().max_value(), 0);
        assert_eq!(SizeValues::default().max_value(), 0);
    }

    #[test]
    fn validate_reports_dotted_field_path() {
        let mut item = blank_item(ts(0));
        item.business_value.dev_technical = Some(4);
        let err = item.validate_values().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidValue {
                field: "business_value.dev_technical".to_string(),
                value: 4,
            }
        );
    }

    #[test]
    fn validate_accepts_scale_values() {
        let mut item = blank_item(ts(0));
        for v in VALUE_SCALE {
            item.business_value.cabinet_business = Some(v);
            item.job_size.support = Some(v);
            assert!(item.validate_values().is_ok());
        }
    }

    #[test]
    fn score_uses_max_aggregates_per_dimension() {
        // BV={dev_business:5}, TC={ops_technical:8}, RR={}, JS={dev:3}
        // -> (5 + 8 + 0) / 3 = 4.33, incomplete because RR is unassessed.
        let mut item = blank_item(ts(0));
        item.business_value.dev_business = Some(5);
        item.time_criticality.ops_technical = Some(8);
        item.job_size.dev = Some(3);
        let s = score(&item);
        assert_eq!(s.business_value, 5);
        assert_eq!(s.time_criticality, 8);
        assert_eq!(s.risk_reduction, 0);
        assert_eq!(s.job_size, 3);
        assert_eq!(s.value, 4.33);
        assert!(s.incomplete);
    }

    #[test]
    fn score_rounds_half_away_from_zero() {
        // (21 + 21 + 21) / 8 = 7.875 -> 7.88
        let item = item_with(21, 21, 21, 8, ts(0));
        assert_eq!(score(&item).value, 7.88);
    }

    #[test]
    fn fully_assessed_item_is_complete() {
        let item = item_with(5, 8, 3, 2, ts(0));
        let s = score(&item);
        assert!(!s.incomplete);
        assert_eq!(s.value, 8.0);
    }

    #[test]
    fn zero_job_size_scores_zero() {
        // Fully scored on the numerator but unsized: score must be 0, not
        // an error and not infinity.
        let mut item = blank_item(ts(0));
        item.business_value.dev_business = Some(5);
        item.time_criticality.dev_business = Some(5);
        item.risk_reduction.dev_business = Some(5);
        let s = score(&item);
        assert_eq!(s.value, 0.0);
        assert!(s.incomplete);
    }

    #[test]
    fn rank_is_dense_with_creation_time_tie_break() {
        // Scores [4.33, 4.33, 2.0, 0] created in order a, b, c, d.
        let a = item_with(5, 8, 13, 6, ts(0)); // 26/6 = 4.33
        let b = item_with(5, 8, 13, 6, ts(10)); // same score, later
        let c = item_with(3, 2, 3, 4, ts(20)); // 8/4 = 2.0
        let d = blank_item(ts(30)); // unscored
        let ranked = rank(&[d.clone(), c.clone(), b.clone(), a.clone()]);

        let order: Vec<Uuid> = ranked.iter().map(|r| r.item.id).collect();
        assert_eq!(order, vec![a.id, b.id, c.id, d.id]);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unsized_item_sorts_to_the_bottom() {
        let mut unsized_item = blank_item(ts(0));
        unsized_item.business_value.dev_business = Some(21);
        unsized_item.time_criticality.dev_business = Some(21);
        unsized_item.risk_reduction.dev_business = Some(21);
        let small = item_with(1, 1, 1, 21, ts(10)); // 3/21 = 0.14
        let ranked = rank(&[unsized_item.clone(), small.clone()]);
        assert_eq!(ranked[0].item.id, small.id);
        assert_eq!(ranked[1].item.id, unsized_item.id);
        assert_eq!(ranked[1].score.value, 0.0);
    }

    #[test]
    fn rank_of_empty_slice_is_empty() {
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn active_teams_follow_role_subsets() {
        let mut item = blank_item(ts(0));
        item.business_value.ai_business = Some(8);
        item.job_size.dev = Some(3);
        let teams = active_teams(&item);
        assert!(teams.contains(&Team::Dev));
        assert!(teams.contains(&Team::Ai));
        assert!(!teams.contains(&Team::Ops));
        assert!(!teams.contains(&Team::Support));

        // Roles outside every team subset contribute to no team.
        let mut leadership_only = blank_item(ts(0));
        leadership_only.business_value.cabinet_business = Some(13);
        assert!(active_teams(&leadership_only).is_empty());
    }

    #[test]
    fn summarize_empty_collection() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.average_score, 0.0);
        // All enumerated keys are present with zero counts.
        assert_eq!(summary.status_distribution.len(), ItemStatus::ALL.len());
        assert_eq!(summary.team_distribution.len(), Team::ALL.len());
        assert!(summary.status_distribution.values().all(|c| *c == 0));
        assert!(summary.team_distribution.values().all(|c| *c == 0));
    }

    #[test]
    fn summarize_counts_statuses_and_teams() {
        let mut a = item_with(13, 5, 3, 3, ts(0)); // 21/3 = 7.0
        a.status = ItemStatus::Go;
        let mut b = item_with(2, 2, 2, 2, ts(10)); // 6/2 = 3.0
        b.status = ItemStatus::Go;
        b.job_size.support = Some(1);

        let summary = summarize(&[a, b]);
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.average_score, 5.0);
        assert_eq!(summary.status_distribution[&ItemStatus::Go], 2);
        assert_eq!(summary.status_distribution[&ItemStatus::New], 0);
        // Both items touch Dev and Ops roles; one also touches Support.
        assert_eq!(summary.team_distribution[&Team::Dev], 2);
        assert_eq!(summary.team_distribution[&Team::Ops], 2);
        assert_eq!(summary.team_distribution[&Team::Support], 1);
        assert_eq!(summary.team_distribution[&Team::Ai], 0);
    }
}
