pub mod backup;
pub mod codec;
pub mod id_allocator;
pub mod local;

pub use backup::BackupManager;
pub use local::LocalStore;
