use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::custom_attribute::ValueColumn;
use crate::datom::Value;
use crate::db::Db;
use crate::schema::*;
use crate::storage::restricts::Restricts;
use crate::storage::Storage;
use crate::tx::*;

/// The value one parent record holds for a custom attribute.
///
/// Exactly one of the value columns is populated, picked by the definition's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttributeValue {
    pub id: Option<u64>,
    pub definition_id: u64,
    pub record_id: u64,
    pub string_value: Option<String>,
    pub integer_value: Option<i64>,
    pub double_value: Option<Decimal>,
}

impl CustomAttributeValue {
    pub fn new(definition_id: u64, record_id: u64) -> Self {
        Self {
            id: None,
            definition_id,
            record_id,
            string_value: None,
            integer_value: None,
            double_value: None,
        }
    }

    pub fn with_string(self, value: &str) -> Self {
        Self {
            string_value: Some(value.to_string()),
            ..self.cleared()
        }
    }

    pub fn with_integer(self, value: i64) -> Self {
        Self {
            integer_value: Some(value),
            ..self.cleared()
        }
    }

    pub fn with_double(self, value: Decimal) -> Self {
        Self {
            double_value: Some(value),
            ..self.cleared()
        }
    }

    fn cleared(self) -> Self {
        Self {
            string_value: None,
            integer_value: None,
            double_value: None,
            ..self
        }
    }

    /// The populated column and its value, if any.
    pub fn value(&self) -> Option<(ValueColumn, Value)> {
        if let Some(value) = &self.string_value {
            return Some((ValueColumn::StringValue, Value::str(value)));
        }
        if let Some(value) = self.integer_value {
            return Some((ValueColumn::IntegerValue, Value::I64(value)));
        }
        self.double_value
            .map(|value| (ValueColumn::DoubleValue, Value::decimal(value)))
    }

    pub fn save<S: Storage, C: Clock>(
        &mut self,
        db: &mut Db<S, C>,
    ) -> Result<(), TransactionError<S::Error>> {
        const TEMP_ID: &str = "custom-attribute-value";
        let mut operation = match self.id {
            Some(id) => Operation::on_id(id),
            None => Operation::on_temp_id(TEMP_ID),
        }
        .set(VALUE_DEFINITION_IDENT, Value::Ref(self.definition_id))
        .set(VALUE_RECORD_IDENT, self.record_id);

        let populated = self.value();
        for column in ValueColumn::ALL {
            operation = match &populated {
                Some((populated_column, value)) if *populated_column == column => {
                    operation.set(column.ident(), value.clone())
                }
                _ => operation.unset(column.ident()),
            };
        }

        let result = db.transact(Transaction::new().with(operation))?;
        if self.id.is_none() {
            self.id = result.temp_ids.get(TEMP_ID).copied();
        }
        Ok(())
    }

    pub fn for_definition<S: Storage, C: Clock>(
        db: &Db<S, C>,
        definition_id: u64,
    ) -> Result<Vec<Self>, S::Error> {
        let storage = db.storage();
        let mut values = Vec::new();
        for id in value_ids(storage, definition_id)? {
            values.push(Self::load(storage, id, definition_id)?);
        }
        Ok(values)
    }

    fn load<S: Storage>(storage: &S, id: u64, definition_id: u64) -> Result<Self, S::Error> {
        let mut value = Self {
            id: Some(id),
            ..Self::new(definition_id, 0)
        };
        for datom in storage.find(Restricts::new().with_entity(id)) {
            let datom = datom?;
            match (datom.attribute, datom.value) {
                (VALUE_RECORD_ID, Value::U64(record_id)) => value.record_id = record_id,
                (VALUE_STRING_ID, Value::Str(string)) => value.string_value = Some(string.to_string()),
                (VALUE_INTEGER_ID, Value::I64(integer)) => value.integer_value = Some(integer),
                (VALUE_DOUBLE_ID, Value::Decimal(double)) => value.double_value = Some(double),
                _ => (),
            }
        }
        Ok(value)
    }

    /// Counts the non null values of `column` among the values of a definition, grouped by
    /// value. The most repeated values come first.
    pub fn counts_by_column<S: Storage>(
        storage: &S,
        definition_id: u64,
        column: ValueColumn,
    ) -> Result<Vec<(Value, u64)>, S::Error> {
        let mut counts: HashMap<Value, u64> = HashMap::new();
        for id in value_ids(storage, definition_id)? {
            let restricts = Restricts::new()
                .with_entity(id)
                .with_attribute(column.attribute_id());
            for datom in storage.find(restricts) {
                *counts.entry(datom?.value).or_default() += 1;
            }
        }
        let mut counts: Vec<(Value, u64)> = counts.into_iter().collect();
        counts.sort_by(|(value1, count1), (value2, count2)| {
            count2.cmp(count1).then_with(|| value1.cmp(value2))
        });
        Ok(counts)
    }
}

pub(crate) fn value_ids<S: Storage>(storage: &S, definition_id: u64) -> Result<Vec<u64>, S::Error> {
    let restricts = Restricts::new()
        .with_attribute(VALUE_DEFINITION_ID)
        .with_value(Value::Ref(definition_id));
    storage
        .find(restricts)
        .map(|datom| datom.map(|datom| datom.entity))
        .collect()
}
