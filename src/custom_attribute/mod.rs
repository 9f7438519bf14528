//! User defined fields attached to parent records.
//!
//! A [`CustomAttributeDefinition`] describes one field: its [`AttrType`], whether its values
//! must be unique, its default value and, for dropdowns, the selectable
//! [`CustomAttributeOption`]s. Stored values live in [`CustomAttributeValue`]s.

pub mod definition;
pub mod errors;
pub mod option;
pub mod value;

pub use definition::*;
pub use errors::*;
pub use option::*;
pub use value::*;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::schema::*;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum AttrType {
    Text = 1,
    Number = 2,
    Decimal = 3,
    Boolean = 4,
    Dropdown = 5,
    MultilineText = 6,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown attribute type `{0}`")]
pub struct UnknownAttrType(pub String);

impl AttrType {
    /// ```
    /// use custom_attributes::custom_attribute::AttrType;
    ///
    /// for attr_type in AttrType::ALL {
    ///     assert_eq!(Some(attr_type), AttrType::from(attr_type as u64));
    /// }
    /// assert_eq!(None, AttrType::from(0));
    /// ```
    pub fn from(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Text),
            2 => Some(Self::Number),
            3 => Some(Self::Decimal),
            4 => Some(Self::Boolean),
            5 => Some(Self::Dropdown),
            6 => Some(Self::MultilineText),
            _ => None,
        }
    }

    pub const ALL: [AttrType; 6] = [
        Self::Text,
        Self::Number,
        Self::Decimal,
        Self::Boolean,
        Self::Dropdown,
        Self::MultilineText,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Dropdown => "dropdown",
            Self::MultilineText => "multiline_text",
        }
    }
}

impl TryFrom<u64> for AttrType {
    type Error = UnknownAttrType;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        AttrType::from(value).ok_or_else(|| UnknownAttrType(value.to_string()))
    }
}

impl FromStr for AttrType {
    type Err = UnknownAttrType;

    /// ```
    /// use custom_attributes::custom_attribute::AttrType;
    ///
    /// assert_eq!(Ok(AttrType::MultilineText), "multiline_text".parse());
    /// assert!("paragraph".parse::<AttrType>().is_err());
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attr_type| attr_type.name() == name)
            .ok_or_else(|| UnknownAttrType(name.to_string()))
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column of [`CustomAttributeValue`] holding the values of a given [`AttrType`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ValueColumn {
    StringValue,
    IntegerValue,
    DoubleValue,
}

impl ValueColumn {
    /// Only text, number and decimal values are checked for duplicates.
    pub fn for_type(attr_type: AttrType) -> Option<Self> {
        match attr_type {
            AttrType::Text => Some(Self::StringValue),
            AttrType::Number => Some(Self::IntegerValue),
            AttrType::Decimal => Some(Self::DoubleValue),
            AttrType::Boolean | AttrType::Dropdown | AttrType::MultilineText => None,
        }
    }

    pub fn attribute_id(self) -> u64 {
        match self {
            Self::StringValue => VALUE_STRING_ID,
            Self::IntegerValue => VALUE_INTEGER_ID,
            Self::DoubleValue => VALUE_DOUBLE_ID,
        }
    }

    pub fn ident(self) -> &'static str {
        match self {
            Self::StringValue => VALUE_STRING_IDENT,
            Self::IntegerValue => VALUE_INTEGER_IDENT,
            Self::DoubleValue => VALUE_DOUBLE_IDENT,
        }
    }

    pub const ALL: [ValueColumn; 3] = [Self::StringValue, Self::IntegerValue, Self::DoubleValue];
}
