use std::collections::HashMap;
use std::rc::Rc;

use crate::datom::Value;
use crate::schema::attribute::Attribute;
use crate::schema::DB_ATTR_IDENT_ID;
use crate::storage::attribute_builder::AttributeBuilder;
use crate::storage::restricts::Restricts;
use crate::storage::Storage;

#[derive(Default)]
pub struct CachingAttributeResolver {
    by_ident: HashMap<Rc<str>, Attribute>,
    by_id: HashMap<u64, Attribute>,
}

impl CachingAttributeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_ident<S: Storage>(
        &mut self,
        storage: &S,
        ident: &str,
    ) -> Result<Option<Attribute>, S::Error> {
        if let Some(attribute) = self.by_ident.get(ident) {
            return Ok(Some(attribute.clone()));
        }
        let restricts = Restricts::new()
            .with_attribute(DB_ATTR_IDENT_ID)
            .with_value(Value::str(ident));
        let attribute_id = match storage.find(restricts).next() {
            Some(datom) => datom?.entity,
            None => return Ok(None),
        };
        self.resolve_id(storage, attribute_id)
    }

    pub fn resolve_id<S: Storage>(
        &mut self,
        storage: &S,
        attribute_id: u64,
    ) -> Result<Option<Attribute>, S::Error> {
        if let Some(attribute) = self.by_id.get(&attribute_id) {
            return Ok(Some(attribute.clone()));
        }
        let mut builder = AttributeBuilder::new(attribute_id);
        for datom in storage.find(Restricts::new().with_entity(attribute_id)) {
            builder.consume(datom?);
        }
        match builder.build() {
            Some(attribute) => {
                self.update_cache(&attribute);
                Ok(Some(attribute))
            }
            None => Ok(None),
        }
    }

    fn update_cache(&mut self, attribute: &Attribute) {
        self.by_ident
            .insert(attribute.definition.ident.clone(), attribute.clone());
        self.by_id.insert(attribute.id, attribute.clone());
    }
}
