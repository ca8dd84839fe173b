//! Per-machine storage.

pub mod btree;

pub use btree::FileIndex;
pub use btree::FileRecord;
pub use btree::InsertOutcome;
