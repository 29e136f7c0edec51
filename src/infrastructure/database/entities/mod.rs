//! Database entities module

pub mod kv_entry;
pub mod sequence;

pub use kv_entry::Entity as KvEntry;
pub use sequence::Entity as Sequence;
