use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::Bound;

use thiserror::Error;

use crate::storage::iter::LiveDatoms;
use crate::storage::serde::*;
use crate::storage::*;

/// Keeps the EAVT, AEVT and AVET indexes in one ordered set of encoded keys.
#[derive(Default)]
pub struct InMemoryStorage {
    index: BTreeSet<Vec<u8>>,
    latest_entity_id: u64,
}

impl Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for datom_bytes in &self.index {
            if datom_bytes.first() != Some(&index::TAG_EAVT) {
                continue;
            }
            let datom = datom::deserialize(datom_bytes).or(Err(std::fmt::Error))?;
            list.entry(&format!(
                "EAVT {{ e: {:?}, a: {:?}, v: {:?}, t: {:?}, op: {:?} }}",
                datom.entity, datom.attribute, datom.value, datom.tx, datom.op
            ));
        }
        list.finish()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum InMemoryStorageError {
    #[error("read error")]
    ReadError(#[from] ReadError),
}

impl Storage for InMemoryStorage {
    type Error = InMemoryStorageError;

    fn save(&mut self, datoms: &[Datom]) -> Result<(), Self::Error> {
        for datom in datoms {
            self.index.insert(datom::serialize::eavt(datom));
            self.index.insert(datom::serialize::aevt(datom));
            self.index.insert(datom::serialize::avet(datom));
            self.latest_entity_id = self.latest_entity_id.max(datom.entity);
        }
        Ok(())
    }

    fn find(&self, restricts: Restricts) -> impl Iterator<Item = Result<Datom, Self::Error>> + '_ {
        let start = index::key(&restricts);
        let end = match index::next_prefix(&start) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let range = self
            .index
            .range::<Vec<u8>, _>((Bound::Included(start), end))
            .map(|bytes| datom::deserialize(bytes).map_err(InMemoryStorageError::from));
        LiveDatoms::new(range, restricts)
    }

    fn latest_entity_id(&self) -> Result<u64, Self::Error> {
        Ok(self.latest_entity_id)
    }
}
