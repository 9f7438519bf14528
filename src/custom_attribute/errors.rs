use std::fmt;

pub const BLANK: &str = "can't be blank";
pub const SPECIAL_CHARACTERS: &str = "cannot contain special characters.";
pub const NOT_A_NUMBER: &str = "should be a number.";
pub const CANNOT_BE_UNIQUE: &str = "Can not be made as unique!";
pub const HAS_DUPLICATES: &str = "Remove duplicate values first to make is unique.";

/// Where a validation message is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Base,
    AttrName,
    DefaultValue,
}

impl Field {
    fn human_name(self) -> Option<&'static str> {
        match self {
            Self::Base => None,
            Self::AttrName => Some("Attr name"),
            Self::DefaultValue => Some("Default value"),
        }
    }
}

/// Validation messages collected for a record, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    messages: Vec<(Field, String)>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.messages.push((field, message.into()));
    }

    pub fn on(&self, field: Field) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn extend(&mut self, other: Errors) {
        self.messages.extend(other.messages);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.messages
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    /// Messages prefixed with the field they belong to, e.g. "Attr name can't be blank".
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .map(|(field, message)| match field.human_name() {
                Some(name) => format!("{name} {message}"),
                None => message.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}
