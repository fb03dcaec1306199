pub mod requisition;

pub use requisition::{ItemLine, QuoteLine, Requisition, RequisitionStatus, RequisitionTable};
