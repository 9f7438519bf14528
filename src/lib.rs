//! Dynamically typed fields for parent records, persisted as facts in a datom store.
//!
//! [`custom_attribute::CustomAttributeDefinition`] is the entry point. It is saved through a
//! [`db::Db`], which turns each save into one all-or-nothing transaction over a
//! [`storage::Storage`] backend (in memory or RocksDB).

pub mod clock;
pub mod custom_attribute;
pub mod datom;
pub mod db;
pub mod schema;
pub mod storage;
pub mod tx;
