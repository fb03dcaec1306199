//! Sequential identifier allocation, `NNNN-YYYY`.

use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::RequisitionTable;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("valid regex"));

/// Computes the next identifier from a table snapshot.
///
/// Every id matching `NNNN-YYYY` contributes its sequence prefix; values
/// that fail to parse are ignored rather than aborting allocation. The
/// sequence counter is global across years, not scoped per year, and the
/// year suffix always comes from `now`.
///
/// Pure function of the snapshot: call it with a freshly loaded table
/// immediately before appending to narrow the race window with writers in
/// other processes.
pub fn next_id(table: &RequisitionTable, now: DateTime<Utc>) -> String {
    let max_sequence = table
        .rows
        .iter()
        .filter_map(|r| ID_PATTERN.captures(r.id.trim()))
        .filter_map(|captures| captures[1].parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{:04}-{}", max_sequence + 1, now.year())
}
