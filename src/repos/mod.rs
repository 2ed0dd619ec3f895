pub mod entry_repo;
pub mod error;
