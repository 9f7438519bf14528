use crate::datom::Value;
use crate::schema::*;
use crate::storage::restricts::Restricts;
use crate::storage::Storage;

/// A selectable choice of a dropdown custom attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttributeOption {
    /// `None` until the owning definition is saved.
    pub id: Option<u64>,
    pub label: String,
}

impl CustomAttributeOption {
    pub fn new(label: &str) -> Self {
        Self {
            id: None,
            label: label.to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }

    /// Options of a definition, in creation order.
    pub fn for_definition<S: Storage>(
        storage: &S,
        definition_id: u64,
    ) -> Result<Vec<Self>, S::Error> {
        let restricts = Restricts::new()
            .with_attribute(OPTION_DEFINITION_ID)
            .with_value(Value::Ref(definition_id));
        let mut options = Vec::new();
        for datom in storage.find(restricts) {
            let id = datom?.entity;
            let label = Self::label_of(storage, id)?.unwrap_or_default();
            options.push(Self {
                id: Some(id),
                label,
            });
        }
        options.sort_by_key(|option| option.id);
        Ok(options)
    }

    fn label_of<S: Storage>(storage: &S, id: u64) -> Result<Option<String>, S::Error> {
        let restricts = Restricts::new()
            .with_entity(id)
            .with_attribute(OPTION_LABEL_ID);
        match storage.find(restricts).next() {
            Some(datom) => Ok(datom?.value.as_str().map(str::to_string)),
            None => Ok(None),
        }
    }
}
