use rust_decimal::prelude::*;
use std::rc::Rc;

/// A datom is an immutable atomic fact that represents the addition or retraction of a relation
/// between an entity, an attribute, a value, and a transaction.
#[derive(Hash, Eq, PartialEq, Debug, Clone)]
pub struct Datom {
    pub entity: u64,
    pub attribute: u64,
    pub value: Value,
    pub tx: u64,
    pub op: Op,
}

impl Datom {
    pub fn add(entity: u64, attribute: u64, value: impl Into<Value>, tx: u64) -> Self {
        Self {
            entity,
            attribute,
            value: value.into(),
            tx,
            op: Op::Assert,
        }
    }

    pub fn retract(entity: u64, attribute: u64, value: impl Into<Value>, tx: u64) -> Self {
        Self {
            entity,
            attribute,
            value: value.into(),
            tx,
            op: Op::Retract,
        }
    }
}

#[derive(Hash, Eq, PartialEq, Debug, Clone, PartialOrd, Ord)]
pub enum Value {
    I64(i64),
    U64(u64),
    Decimal(Decimal),
    Str(Rc<str>),
    Ref(u64),
}

impl Value {
    pub fn str(str: &str) -> Self {
        Self::Str(Rc::from(str))
    }

    /// Decimals are stored normalized so that `1.0` and `1.00` share an index key.
    ///
    /// ```
    /// use custom_attributes::datom::Value;
    /// use rust_decimal::prelude::*;
    ///
    /// let value = Value::decimal(Decimal::from_str("1.50").unwrap());
    /// assert_eq!(value, Value::Decimal(Decimal::from_str("1.5").unwrap()));
    /// ```
    pub fn decimal(value: Decimal) -> Self {
        Self::Decimal(value.normalize())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Self::I64(val.into())
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Self::I64(val)
    }
}

impl From<u64> for Value {
    fn from(val: u64) -> Self {
        Self::U64(val)
    }
}

// Flags are stored as 0 or 1.
impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Self::U64(val.into())
    }
}

impl From<Decimal> for Value {
    fn from(val: Decimal) -> Self {
        Self::decimal(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Self::str(val)
    }
}

impl From<Rc<str>> for Value {
    fn from(val: Rc<str>) -> Self {
        Self::Str(val)
    }
}

#[derive(Hash, Eq, PartialEq, Debug, Clone, Copy)]
pub enum Op {
    Assert,
    Retract,
}
