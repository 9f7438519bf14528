pub mod attribute_builder;
pub mod attribute_resolver;
pub mod disk;
pub mod iter;
pub mod memory;
pub mod restricts;
pub mod serde;

use crate::datom::*;
use crate::storage::restricts::*;

/// A datom store. Only the current state of each fact is visible to readers.
pub trait Storage {
    type Error: std::error::Error + 'static;

    /// Writes all `datoms` or none of them.
    fn save(&mut self, datoms: &[Datom]) -> Result<(), Self::Error>;

    /// Live datoms matching `restricts`, in index order.
    fn find(&self, restricts: Restricts) -> impl Iterator<Item = Result<Datom, Self::Error>> + '_;

    /// Highest entity ID present in storage, including transaction entities.
    fn latest_entity_id(&self) -> Result<u64, Self::Error>;
}
