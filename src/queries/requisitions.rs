//! Read-side filtering over a table snapshot. Pure: no mutation, safe to
//! re-run against a fresh load at any time.

use serde::{Deserialize, Serialize};

use crate::models::{Requisition, RequisitionStatus, RequisitionTable};

/// Filters are conjunctive; an unset field matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequisitionFilters {
    /// Exact status match
    pub status: Option<RequisitionStatus>,
    /// Case-insensitive substring match on the requester
    pub requester: Option<String>,
    /// Case-insensitive substring match on the id
    pub id: Option<String>,
}

pub fn search(table: &RequisitionTable, filters: &RequisitionFilters) -> Vec<Requisition> {
    table
        .rows
        .iter()
        .filter(|r| {
            filters.status.map_or(true, |status| r.status == status)
                && matches_fragment(&r.requester, filters.requester.as_deref())
                && matches_fragment(&r.id, filters.id.as_deref())
        })
        .cloned()
        .collect()
}

fn matches_fragment(value: &str, fragment: Option<&str>) -> bool {
    match fragment {
        Some(fragment) if !fragment.trim().is_empty() => value
            .to_lowercase()
            .contains(&fragment.trim().to_lowercase()),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Requisition;

    fn row(id: &str, requester: &str, status: RequisitionStatus) -> Requisition {
        Requisition {
            id: id.to_string(),
            status,
            requested_at: String::new(),
            requester: requester.to_string(),
            cost_center: String::new(),
            justification: String::new(),
            delivery_location: String::new(),
            approver: String::new(),
            items: Vec::new(),
            buyer: String::new(),
            quotes: Vec::new(),
        }
    }

    fn sample_table() -> RequisitionTable {
        RequisitionTable {
            rows: vec![
                row("0001-2025", "Ana Souza", RequisitionStatus::Pending),
                row("0002-2025", "Bruno Lima", RequisitionStatus::Completed),
                row("0003-2025", "ANA CLARA", RequisitionStatus::Pending),
            ],
        }
    }

    #[test]
    fn empty_filters_match_everything() {
        let table = sample_table();
        assert_eq!(search(&table, &RequisitionFilters::default()).len(), 3);
    }

    #[test]
    fn status_filter_is_exact() {
        let table = sample_table();
        let filters = RequisitionFilters {
            status: Some(RequisitionStatus::Completed),
            ..Default::default()
        };
        let found = search(&table, &filters);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "0002-2025");
    }

    #[test]
    fn requester_match_is_case_insensitive_substring() {
        let table = sample_table();
        let filters = RequisitionFilters {
            requester: Some("ana".to_string()),
            ..Default::default()
        };
        let found = search(&table, &filters);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn filters_are_conjunctive() {
        let table = sample_table();
        let filters = RequisitionFilters {
            status: Some(RequisitionStatus::Pending),
            requester: Some("ana".to_string()),
            id: Some("0003".to_string()),
        };
        let found = search(&table, &filters);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "0003-2025");
    }

    #[test]
    fn search_does_not_mutate_and_is_restartable() {
        let table = sample_table();
        let filters = RequisitionFilters::default();
        let first = search(&table, &filters);
        let second = search(&table, &filters);
        assert_eq!(first, second);
        assert_eq!(table.len(), 3);
    }
}
