//! Entity module - Contains the SeaORM entity definitions for the database.
//! The storefront persists everything through a single key-value table.

pub mod storage_entry;

pub use storage_entry::{
    Column as StorageEntryColumn, Entity as StorageEntry, Model as StorageEntryModel,
};
