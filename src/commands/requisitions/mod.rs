pub mod complete_requisition_command;
pub mod create_requisition_command;
pub mod delete_requisition_command;

pub use complete_requisition_command::{
    CompleteRequisitionCommand, CompleteRequisitionResult, SupplierQuoteRequest,
};
pub use create_requisition_command::{
    CreateRequisitionCommand, CreateRequisitionResult, RequisitionItemRequest,
};
pub use delete_requisition_command::DeleteRequisitionCommand;
