use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::errors::ServiceError;

/// Workflow state of a requisition. The only transition is
/// Pending → Completed; completed records are terminal.
///
/// Wire forms follow the Portuguese table header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum RequisitionStatus {
    #[strum(serialize = "Pendente")]
    Pending,
    #[strum(serialize = "Concluído")]
    Completed,
}

/// One requested item. Quantity stays a decimal-as-string and is parsed at
/// validation boundaries only, so the stored text round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLine {
    pub description: String,
    pub quantity: String,
}

/// One supplier quote, recorded at completion time.
/// `total_price = unit_price × Σ item quantities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub supplier: String,
    pub unit_price: String,
    pub total_price: String,
}

/// A purchase requisition: one row of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requisition {
    /// `NNNN-YYYY`, unique across the table, immutable once assigned.
    pub id: String,
    pub status: RequisitionStatus,
    /// Creation timestamp text, immutable.
    pub requested_at: String,
    pub requester: String,
    pub cost_center: String,
    pub justification: String,
    pub delivery_location: String,
    pub approver: String,
    /// Set at creation, at least one line, immutable afterwards.
    pub items: Vec<ItemLine>,
    /// Empty until completion.
    pub buyer: String,
    /// Empty until completion, at least one line afterwards.
    pub quotes: Vec<QuoteLine>,
}

impl Requisition {
    /// Sum of the item quantities, used to price supplier quotes.
    pub fn total_quantity(&self) -> Result<Decimal, ServiceError> {
        let mut total = Decimal::ZERO;
        for item in &self.items {
            let quantity = Decimal::from_str(item.quantity.trim()).map_err(|_| {
                ServiceError::ValidationError(format!(
                    "item '{}' has a non-numeric quantity '{}'",
                    item.description, item.quantity
                ))
            })?;
            total += quantity;
        }
        Ok(total)
    }

    pub fn is_completed(&self) -> bool {
        self.status == RequisitionStatus::Completed
    }
}

/// The full in-memory collection of requisition rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequisitionTable {
    pub rows: Vec<Requisition>,
}

impl RequisitionTable {
    pub fn find(&self, id: &str) -> Option<&Requisition> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Requisition> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Removes the row with the given id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<Requisition> {
        let index = self.rows.iter().position(|r| r.id == id)?;
        Some(self.rows.remove(index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn requisition_with_items(items: Vec<ItemLine>) -> Requisition {
        Requisition {
            id: "0001-2025".to_string(),
            status: RequisitionStatus::Pending,
            requested_at: "01/06/2025 09:00".to_string(),
            requester: "Ana".to_string(),
            cost_center: "CC1".to_string(),
            justification: "reposição".to_string(),
            delivery_location: "Matriz".to_string(),
            approver: "Bob".to_string(),
            items,
            buyer: String::new(),
            quotes: Vec::new(),
        }
    }

    #[test]
    fn status_wire_forms_round_trip() {
        assert_eq!(RequisitionStatus::Pending.to_string(), "Pendente");
        assert_eq!(RequisitionStatus::Completed.to_string(), "Concluído");
        assert_eq!(
            RequisitionStatus::from_str("Concluído").unwrap(),
            RequisitionStatus::Completed
        );
    }

    #[test]
    fn total_quantity_sums_decimal_strings() {
        let requisition = requisition_with_items(vec![
            ItemLine {
                description: "Papel".to_string(),
                quantity: "10".to_string(),
            },
            ItemLine {
                description: "Toner".to_string(),
                quantity: "2.5".to_string(),
            },
        ]);
        assert_eq!(requisition.total_quantity().unwrap(), dec!(12.5));
    }

    #[test]
    fn total_quantity_rejects_non_numeric() {
        let requisition = requisition_with_items(vec![ItemLine {
            description: "Papel".to_string(),
            quantity: "dez".to_string(),
        }]);
        assert_matches!(
            requisition.total_quantity(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn remove_returns_the_row() {
        let mut table = RequisitionTable {
            rows: vec![requisition_with_items(vec![])],
        };
        assert!(table.remove("0001-2025").is_some());
        assert!(table.is_empty());
        assert!(table.remove("0001-2025").is_none());
    }
}
