pub mod requisitions;

pub use requisitions::RequisitionService;
