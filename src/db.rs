use tracing::debug;

use crate::clock::Clock;
use crate::datom::Value;
use crate::schema::default::default_datoms;
use crate::schema::*;
use crate::storage::restricts::Restricts;
use crate::storage::Storage;
use crate::tx::transactor::Transactor;
use crate::tx::*;

/// A storage together with the transactor that writes to it.
pub struct Db<S: Storage, C: Clock> {
    storage: S,
    transactor: Transactor,
    clock: C,
}

impl<S: Storage, C: Clock> Db<S, C> {
    /// Wraps `storage`, installing the default schema if it is not there yet.
    pub fn open(mut storage: S, clock: C) -> Result<Self, S::Error> {
        if !has_schema(&storage)? {
            debug!("installing default schema");
            storage.save(&default_datoms())?;
        }
        Ok(Self {
            storage,
            transactor: Transactor::new(),
            clock,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Runs `transaction` and writes its datoms with a single save.
    pub fn transact(
        &mut self,
        transaction: Transaction,
    ) -> Result<TransactionResult, TransactionError<S::Error>> {
        let result = self
            .transactor
            .transact(&self.storage, self.clock.now(), transaction)?;
        self.storage.save(&result.tx_data)?;
        debug!(tx = result.tx_id, datoms = result.tx_data.len(), "transaction committed");
        Ok(result)
    }
}

fn has_schema<S: Storage>(storage: &S) -> Result<bool, S::Error> {
    let restricts = Restricts::new()
        .with_attribute(DB_ATTR_IDENT_ID)
        .with_value(Value::str(CUSTOM_ATTRIBUTE_NAME_IDENT));
    match storage.find(restricts).next() {
        Some(datom) => datom.map(|_| true),
        None => Ok(false),
    }
}
