use std::rc::Rc;

use crate::datom::*;
use crate::schema::attribute::*;
use crate::schema::*;

pub struct AttributeBuilder {
    id: u64,
    ident: Option<Rc<str>>,
    value_type: Option<ValueType>,
    cardinality: Option<Cardinality>,
    doc: Option<Rc<str>>,
    unique: bool,
}

impl AttributeBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ident: None,
            value_type: None,
            cardinality: None,
            doc: None,
            unique: false,
        }
    }

    /// Folds one live datom of the attribute entity into the builder.
    pub fn consume(&mut self, datom: Datom) {
        match (datom.attribute, datom.value) {
            (DB_ATTR_IDENT_ID, Value::Str(ident)) => self.ident = Some(ident),
            (DB_ATTR_TYPE_ID, Value::U64(code)) => self.value_type = ValueType::try_from(code).ok(),
            (DB_ATTR_CARDINALITY_ID, Value::U64(code)) => {
                self.cardinality = Cardinality::try_from(code).ok()
            }
            (DB_ATTR_DOC_ID, Value::Str(doc)) => self.doc = Some(doc),
            (DB_ATTR_UNIQUE_ID, Value::U64(flag)) => self.unique = flag == 1,
            _ => (),
        }
    }

    /// `None` unless ident, type and cardinality were all seen.
    pub fn build(self) -> Option<Attribute> {
        let ident = self.ident?;
        let value_type = self.value_type?;
        let cardinality = self.cardinality?;
        Some(Attribute {
            id: self.id,
            definition: AttributeDefinition {
                ident,
                value_type,
                cardinality,
                doc: self.doc,
                unique: self.unique,
            },
        })
    }
}
