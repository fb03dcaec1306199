pub mod requisitions;
