pub mod transactor;

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::datom::Datom;
use crate::datom::Value;
use crate::schema::attribute::ValueType;

pub enum OperatedEntity {
    New,             // Create a new entity and assign ID automatically.
    Id(u64),         // Update existing entity by ID.
    TempId(Rc<str>), // Use a temp ID within transaction.
}

pub enum AttributeValue {
    Value(Value),
    TempId(Rc<str>), // Reference to an entity created in the same transaction.
}

pub enum AttributeOperation {
    /// Assert a value. For cardinality one attributes the previous value is retracted.
    Set {
        attribute: Rc<str>,
        value: AttributeValue,
    },
    /// Retract whatever the attribute currently holds.
    Unset { attribute: Rc<str> },
}

pub struct Operation {
    pub entity: OperatedEntity,
    pub attributes: Vec<AttributeOperation>,
    pub retract_entity: bool,
}

impl Operation {
    pub fn new(entity: OperatedEntity) -> Self {
        Self {
            entity,
            attributes: Vec::new(),
            retract_entity: false,
        }
    }

    pub fn on_new() -> Self {
        Self::new(OperatedEntity::New)
    }

    pub fn on_id(entity_id: u64) -> Self {
        Self::new(OperatedEntity::Id(entity_id))
    }

    pub fn on_temp_id(temp_id: &str) -> Self {
        Self::new(OperatedEntity::TempId(Rc::from(temp_id)))
    }

    /// Retracts every current fact about an existing entity.
    pub fn retract(entity_id: u64) -> Self {
        Self {
            retract_entity: true,
            ..Self::on_id(entity_id)
        }
    }

    pub fn set<V: Into<Value>>(mut self, attribute: &str, value: V) -> Self {
        self.set_mut(attribute, value);
        self
    }

    pub fn set_mut<V: Into<Value>>(&mut self, attribute: &str, value: V) {
        self.attributes.push(AttributeOperation::Set {
            attribute: Rc::from(attribute),
            value: AttributeValue::Value(value.into()),
        });
    }

    pub fn set_reference(mut self, attribute: &str, temp_id: &str) -> Self {
        self.attributes.push(AttributeOperation::Set {
            attribute: Rc::from(attribute),
            value: AttributeValue::TempId(Rc::from(temp_id)),
        });
        self
    }

    pub fn unset(mut self, attribute: &str) -> Self {
        self.attributes.push(AttributeOperation::Unset {
            attribute: Rc::from(attribute),
        });
        self
    }
}

#[derive(Default)]
pub struct Transaction {
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    fn total_attribute_operations(&self) -> usize {
        self.operations
            .iter()
            .map(|operation| operation.attributes.len())
            .sum()
    }
}

#[derive(Debug)]
pub struct TransactionResult {
    pub tx_id: u64,
    pub tx_data: Vec<Datom>,
    pub temp_ids: HashMap<Rc<str>, u64>,
}

#[derive(Debug, Error)]
pub enum TransactionError<E: std::error::Error + 'static> {
    #[error("storage error")]
    StorageError(#[from] E),
    #[error("attribute `{0}` not found")]
    UnknownAttribute(Rc<str>),
    #[error("invalid value type for attribute {attribute_id}, expected {attribute_type:?} got {value:?}")]
    InvalidAttributeType {
        attribute_id: u64,
        attribute_type: ValueType,
        value: Value,
    },
    #[error("value of attribute {attribute} is too long ({length} bytes)")]
    ValueTooLong { attribute: u64, length: usize },
    #[error("duplicate value {value:?} for unique attribute {attribute}")]
    DuplicateUniqueValue { attribute: u64, value: Value },
    #[error("duplicate temp ID `{0}`")]
    DuplicateTempId(Rc<str>),
    #[error("temp ID `{0}` not found")]
    TempIdNotFound(Rc<str>),
}
