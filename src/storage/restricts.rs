use crate::datom::*;

/// Narrows a storage scan. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restricts {
    pub entity: Option<u64>,
    pub attribute: Option<u64>,
    pub value: Option<Value>,
}

impl Restricts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: u64) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_attribute(mut self, attribute: u64) -> Self {
        self.attribute = Some(attribute);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn test(&self, datom: &Datom) -> bool {
        self.entity.map_or(true, |e| datom.entity == e)
            && self.attribute.map_or(true, |a| datom.attribute == a)
            && self.value.as_ref().map_or(true, |v| &datom.value == v)
    }
}
