use std::rc::Rc;

use thiserror::Error;

use crate::datom::{Datom, Value};
use crate::schema::*;
use crate::tx::Operation;

/// Type tag stored under `db/attr/type`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ValueType {
    I64 = 1,
    U64 = 2,
    Decimal = 3,
    Str = 4,
    Ref = 5,
}

/// Stored under `db/attr/cardinality`. Setting a `One` attribute replaces its previous value.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Cardinality {
    One = 0,
    Many = 1,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid schema code {0}")]
pub struct InvalidValue(pub u64);

impl TryFrom<u64> for ValueType {
    type Error = InvalidValue;

    /// ```
    /// use custom_attributes::schema::attribute::ValueType;
    ///
    /// assert_eq!(Ok(ValueType::Ref), ValueType::try_from(ValueType::Ref as u64));
    /// assert!(ValueType::try_from(42).is_err());
    /// ```
    fn try_from(code: u64) -> Result<Self, Self::Error> {
        [Self::I64, Self::U64, Self::Decimal, Self::Str, Self::Ref]
            .into_iter()
            .find(|value_type| *value_type as u64 == code)
            .ok_or(InvalidValue(code))
    }
}

impl From<&Value> for ValueType {
    /// ```
    /// use custom_attributes::datom::Value;
    /// use custom_attributes::schema::attribute::ValueType;
    ///
    /// assert_eq!(ValueType::Decimal, ValueType::from(&Value::Decimal(42.into())));
    /// assert_eq!(ValueType::Ref, ValueType::from(&Value::Ref(42)));
    /// ```
    fn from(value: &Value) -> Self {
        match value {
            Value::I64(_) => Self::I64,
            Value::U64(_) => Self::U64,
            Value::Decimal(_) => Self::Decimal,
            Value::Str(_) => Self::Str,
            Value::Ref(_) => Self::Ref,
        }
    }
}

impl TryFrom<u64> for Cardinality {
    type Error = InvalidValue;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::One),
            1 => Ok(Self::Many),
            _ => Err(InvalidValue(code)),
        }
    }
}

/// An installed attribute, as read back from storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub id: u64,
    pub definition: AttributeDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    pub ident: Rc<str>,
    pub value_type: ValueType,
    pub cardinality: Cardinality,
    pub doc: Option<Rc<str>>,
    pub unique: bool,
}

impl AttributeDefinition {
    pub fn new(ident: &str, value_type: ValueType) -> Self {
        Self {
            ident: Rc::from(ident),
            value_type,
            cardinality: Cardinality::One,
            doc: None,
            unique: false,
        }
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(Rc::from(doc));
        self
    }

    /// Built-in attributes are all cardinality one. Installed schema may declare many.
    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Facts describing this attribute as entity `id`, for installing it without a transactor.
    pub fn datoms(&self, id: u64, tx: u64) -> Vec<Datom> {
        self.facts()
            .into_iter()
            .map(|(attribute, _, value)| Datom::add(id, attribute, value, tx))
            .collect()
    }

    fn facts(&self) -> Vec<(u64, &'static str, Value)> {
        let mut facts = vec![
            (DB_ATTR_IDENT_ID, DB_ATTR_IDENT_IDENT, Value::Str(Rc::clone(&self.ident))),
            (DB_ATTR_TYPE_ID, DB_ATTR_TYPE_IDENT, Value::U64(self.value_type as u64)),
            (DB_ATTR_CARDINALITY_ID, DB_ATTR_CARDINALITY_IDENT, Value::U64(self.cardinality as u64)),
        ];
        if let Some(doc) = &self.doc {
            facts.push((DB_ATTR_DOC_ID, DB_ATTR_DOC_IDENT, Value::Str(Rc::clone(doc))));
        }
        if self.unique {
            facts.push((DB_ATTR_UNIQUE_ID, DB_ATTR_UNIQUE_IDENT, Value::U64(1)));
        }
        facts
    }
}

impl From<AttributeDefinition> for Operation {
    fn from(definition: AttributeDefinition) -> Self {
        let mut operation = Operation::on_new();
        for (_, ident, value) in definition.facts() {
            operation.set_mut(ident, value);
        }
        operation
    }
}
