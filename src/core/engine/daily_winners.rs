//! Daily Winner Resolution
//!
//! Marks, for every readable day, the single page with the highest daily
//! engagement. Equal engagement goes to the lowest page identifier so the
//! result does not depend on row order.

use super::daily_aggregation::DailyRecord;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// True when `candidate` should replace `incumbent` as the day's winner
fn beats(candidate: &DailyRecord, incumbent: &DailyRecord) -> bool {
    match candidate.total_engagement.total_cmp(&incumbent.total_engagement) {
        Ordering::Greater => true,
        Ordering::Equal => candidate.page < incumbent.page,
        Ordering::Less => false,
    }
}

/// Flag exactly one winner per day
///
/// Records in the `None` day bucket are never winners. Any `day_won` flags
/// already set on the input are recomputed.
pub fn resolve_daily_winners(mut records: Vec<DailyRecord>) -> Vec<DailyRecord> {
    let mut winners: HashMap<NaiveDate, usize> = HashMap::new();

    for (idx, record) in records.iter().enumerate() {
        let Some(day) = record.date else {
            continue;
        };
        match winners.get(&day) {
            Some(&current) if !beats(record, &records[current]) => {}
            _ => {
                winners.insert(day, idx);
            }
        }
    }

    for record in records.iter_mut() {
        record.day_won = false;
    }
    for &idx in winners.values() {
        records[idx].day_won = true;
    }

    debug!("Resolved winners for {} days", winners.len());
    records
}
