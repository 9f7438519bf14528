use std::path::Path;

use rocksdb::{Direction, IteratorMode, Options, PrefixRange, ReadOptions, WriteBatch, DB};
use thiserror::Error;

use crate::storage::iter::LiveDatoms;
use crate::storage::serde::*;
use crate::storage::*;

pub struct DiskStorage {
    db: DB,
}

#[derive(Debug, Error)]
pub enum DiskStorageError {
    #[error("rocksdb error")]
    DbError(#[from] rocksdb::Error),
    #[error("read error")]
    ReadError(#[from] ReadError),
}

impl DiskStorage {
    pub fn new(db: DB) -> Self {
        Self { db }
    }

    /// Opens (or creates) a database directory with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DiskStorageError> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path)?;
        Ok(Self::new(db))
    }

    fn read_options(restricts: &Restricts) -> ReadOptions {
        let mut read_options = ReadOptions::default();
        read_options.set_iterate_range(PrefixRange(index::key(restricts)));
        read_options
    }
}

impl Storage for DiskStorage {
    type Error = DiskStorageError;

    fn save(&mut self, datoms: &[Datom]) -> Result<(), Self::Error> {
        let mut batch = WriteBatch::default();
        for datom in datoms {
            batch.put(datom::serialize::eavt(datom), "");
            batch.put(datom::serialize::aevt(datom), "");
            batch.put(datom::serialize::avet(datom), "");
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn find(&self, restricts: Restricts) -> impl Iterator<Item = Result<Datom, Self::Error>> + '_ {
        let read_options = Self::read_options(&restricts);
        let datoms = self
            .db
            .iterator_opt(IteratorMode::Start, read_options)
            .map(|item| -> Result<Datom, DiskStorageError> {
                let (key, _) = item?;
                Ok(datom::deserialize(&key)?)
            });
        LiveDatoms::new(datoms, restricts)
    }

    fn latest_entity_id(&self) -> Result<u64, Self::Error> {
        // Every key of the AEVT index is greater than its bare tag, so seeking backwards from it
        // lands on the last EAVT key, which holds the highest entity.
        let mut iter = self
            .db
            .iterator(IteratorMode::From(&[index::TAG_AEVT], Direction::Reverse));
        match iter.next() {
            Some(item) => {
                let (key, _) = item?;
                if key.first() != Some(&index::TAG_EAVT) {
                    return Ok(0);
                }
                Ok(datom::deserialize(&key)?.entity)
            }
            None => Ok(0),
        }
    }
}
