use std::mem;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::custom_attribute::value::value_ids;
use crate::custom_attribute::*;
use crate::datom::Value;
use crate::db::Db;
use crate::schema::*;
use crate::storage::restricts::Restricts;
use crate::storage::Storage;
use crate::tx::*;

lazy_static! {
    static ref ATTR_NAME_FORMAT: Regex =
        Regex::new(r"^[A-Za-z_ \t\n\x0B\x0C\r]+$").expect("attribute name pattern");
    static ref NUMBER_FORMAT: Regex =
        Regex::new(r"^[+\-]?[0-9]*\.?[0-9]*$").expect("number pattern");
}

const DEFINITION_TEMP_ID: &str = "custom-attribute";

fn option_temp_id(index: usize) -> String {
    format!("custom-attribute-option-{index}")
}

#[derive(Debug, Error)]
pub enum SaveError<E: std::error::Error + 'static> {
    #[error("validation failed: {0}")]
    RecordInvalid(Errors),
    #[error("transaction failed")]
    Transaction(#[from] TransactionError<E>),
}

/// Changes applied by [`CustomAttributeDefinition::update_custom_attribute`]. Unset fields keep
/// their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomAttributeParams {
    pub attr_name: Option<String>,
    pub attr_type: Option<AttrType>,
    pub default_value: Option<String>,
    pub unique: Option<bool>,
    pub sort_order: Option<i64>,
}

impl CustomAttributeParams {
    fn apply_to(self, definition: &mut CustomAttributeDefinition) {
        if let Some(attr_name) = self.attr_name {
            definition.attr_name = attr_name;
        }
        if let Some(attr_type) = self.attr_type {
            definition.attr_type = attr_type;
        }
        if let Some(default_value) = self.default_value {
            definition.default_value = default_value;
        }
        if let Some(unique) = self.unique {
            definition.unique = unique;
        }
        if let Some(sort_order) = self.sort_order {
            definition.sort_order = sort_order;
        }
    }
}

/// A dynamically typed field users attach to a parent record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttributeDefinition {
    pub id: Option<u64>,
    pub attr_name: String,
    pub attr_type: AttrType,
    /// For dropdowns, the id of the default option in decimal, or empty.
    pub default_value: String,
    pub unique: bool,
    pub sort_order: i64,
    pub custom_attribute_options: Vec<CustomAttributeOption>,
    errors: Errors,
}

impl CustomAttributeDefinition {
    pub fn new(attr_name: &str, attr_type: AttrType) -> Self {
        Self {
            id: None,
            attr_name: attr_name.to_string(),
            attr_type,
            default_value: String::new(),
            unique: false,
            sort_order: 0,
            custom_attribute_options: Vec::new(),
            errors: Errors::new(),
        }
    }

    pub fn with_default_value(mut self, default_value: &str) -> Self {
        self.default_value = default_value.to_string();
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Adds a pending option, saved together with the definition.
    pub fn with_option(mut self, label: &str) -> Self {
        self.custom_attribute_options
            .push(CustomAttributeOption::new(label));
        self
    }

    /// Messages of the last validation run.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    // Type predicates ---------------------------------------------------------------------------

    pub fn number_type(&self) -> bool {
        matches!(self.attr_type, AttrType::Number | AttrType::Decimal)
    }

    pub fn text_type(&self) -> bool {
        self.attr_type == AttrType::Text
    }

    pub fn boolean_type(&self) -> bool {
        self.attr_type == AttrType::Boolean
    }

    pub fn dropdown_type(&self) -> bool {
        self.attr_type == AttrType::Dropdown
    }

    pub fn paragraph_type(&self) -> bool {
        self.attr_type == AttrType::MultilineText
    }

    pub fn has_options(&self) -> bool {
        self.dropdown_type()
    }

    pub fn can_be_unique(&self) -> bool {
        self.text_type() || self.number_type()
    }

    // Validation --------------------------------------------------------------------------------

    /// Runs every validation rule and returns the messages, leaving the record untouched.
    pub fn validate<S: Storage>(&self, storage: &S) -> Result<Errors, S::Error> {
        let mut errors = Errors::new();
        if self.attr_name.trim().is_empty() {
            errors.add(Field::AttrName, BLANK);
        }
        if !ATTR_NAME_FORMAT.is_match(&self.attr_name) {
            errors.add(Field::AttrName, SPECIAL_CHARACTERS);
        }
        if self.number_type() && !NUMBER_FORMAT.is_match(&self.default_value) {
            errors.add(Field::DefaultValue, NOT_A_NUMBER);
        }
        self.check_uniqueness(storage, &mut errors)?;
        Ok(errors)
    }

    /// Validates and keeps the messages on the record.
    pub fn is_valid<S: Storage>(&mut self, storage: &S) -> Result<bool, S::Error> {
        self.errors = self.validate(storage)?;
        Ok(self.errors.is_empty())
    }

    /// Adds the uniqueness messages to the record. True iff the record has no errors at all.
    pub fn can_be_marked_as_unique<S: Storage>(&mut self, storage: &S) -> Result<bool, S::Error> {
        let mut errors = Errors::new();
        self.check_uniqueness(storage, &mut errors)?;
        self.errors.extend(errors);
        Ok(self.errors.is_empty())
    }

    fn check_uniqueness<S: Storage>(&self, storage: &S, errors: &mut Errors) -> Result<(), S::Error> {
        if self.unique {
            if !self.can_be_unique() {
                errors.add(Field::Base, CANNOT_BE_UNIQUE);
            } else if self.has_duplicate_values(storage)? {
                errors.add(Field::Base, HAS_DUPLICATES);
            }
        }
        Ok(())
    }

    /// Whether two stored values of this definition are equal in the column of its type.
    pub fn has_duplicate_values<S: Storage>(&self, storage: &S) -> Result<bool, S::Error> {
        let (Some(column), Some(id)) = (ValueColumn::for_type(self.attr_type), self.id) else {
            return Ok(false);
        };
        let counts = CustomAttributeValue::counts_by_column(storage, id, column)?;
        Ok(counts.iter().any(|(_, count)| *count > 1))
    }

    // Lifecycle ---------------------------------------------------------------------------------

    /// Saves the definition with its options, selecting the option labelled
    /// `selected_option_label` as default for dropdowns.
    ///
    /// Returns false when validation or storage fails. Nothing is written then, and the record
    /// keeps its previous state apart from [`errors`](Self::errors).
    pub fn save_custom_attribute<S: Storage, C: Clock>(
        &mut self,
        db: &mut Db<S, C>,
        selected_option_label: &str,
    ) -> bool {
        match self.try_save_custom_attribute(db, selected_option_label) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, attr_name = %self.attr_name, "custom attribute not saved");
                false
            }
        }
    }

    pub fn try_save_custom_attribute<S: Storage, C: Clock>(
        &mut self,
        db: &mut Db<S, C>,
        selected_option_label: &str,
    ) -> Result<(), SaveError<S::Error>> {
        let snapshot = self.clone();
        let mut transaction = Transaction::new();
        if !self.has_options() {
            for option in self.custom_attribute_options.drain(..) {
                if let Some(id) = option.id {
                    transaction.push(Operation::retract(id));
                }
            }
        }
        if self.unique {
            self.default_value.clear();
        }
        let result = self.commit(db, transaction, selected_option_label);
        self.restore_on_error(snapshot, result)
    }

    /// Applies `params` and saves, with the same rules as
    /// [`save_custom_attribute`](Self::save_custom_attribute) except that options are kept
    /// whatever the type.
    pub fn update_custom_attribute<S: Storage, C: Clock>(
        &mut self,
        db: &mut Db<S, C>,
        params: CustomAttributeParams,
        selected_option_label: &str,
    ) -> bool {
        match self.try_update_custom_attribute(db, params, selected_option_label) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, id = ?self.id, "custom attribute not updated");
                false
            }
        }
    }

    pub fn try_update_custom_attribute<S: Storage, C: Clock>(
        &mut self,
        db: &mut Db<S, C>,
        params: CustomAttributeParams,
        selected_option_label: &str,
    ) -> Result<(), SaveError<S::Error>> {
        let snapshot = self.clone();
        params.apply_to(self);
        if self.unique {
            self.default_value.clear();
        }
        let result = self.commit(db, Transaction::new(), selected_option_label);
        self.restore_on_error(snapshot, result)
    }

    fn restore_on_error<E: std::error::Error + 'static>(
        &mut self,
        snapshot: Self,
        result: Result<(), SaveError<E>>,
    ) -> Result<(), SaveError<E>> {
        if result.is_err() {
            let errors = mem::take(&mut self.errors);
            *self = snapshot;
            self.errors = errors;
        }
        result
    }

    fn commit<S: Storage, C: Clock>(
        &mut self,
        db: &mut Db<S, C>,
        mut transaction: Transaction,
        selected_option_label: &str,
    ) -> Result<(), SaveError<S::Error>> {
        if !self
            .is_valid(db.storage())
            .map_err(TransactionError::StorageError)?
        {
            return Err(SaveError::RecordInvalid(self.errors.clone()));
        }

        let selected = if self.has_options() {
            self.custom_attribute_options
                .iter()
                .position(|option| option.label == selected_option_label)
        } else {
            None
        };

        transaction.push(self.definition_operation(selected));
        for (index, option) in self.custom_attribute_options.iter().enumerate() {
            let operation = match option.id {
                Some(id) => Operation::on_id(id),
                None => Operation::on_temp_id(&option_temp_id(index)),
            }
            .set(OPTION_LABEL_IDENT, option.label.as_str());
            transaction.push(match self.id {
                Some(id) => operation.set(OPTION_DEFINITION_IDENT, Value::Ref(id)),
                None => operation.set_reference(OPTION_DEFINITION_IDENT, DEFINITION_TEMP_ID),
            });
        }

        let result = db.transact(transaction)?;

        if self.id.is_none() {
            self.id = result.temp_ids.get(DEFINITION_TEMP_ID).copied();
        }
        for (index, option) in self.custom_attribute_options.iter_mut().enumerate() {
            if option.id.is_none() {
                option.id = result.temp_ids.get(option_temp_id(index).as_str()).copied();
            }
        }
        if self.has_options() {
            self.default_value = selected
                .and_then(|index| self.custom_attribute_options[index].id)
                .map(|id| id.to_string())
                .unwrap_or_default();
        }
        Ok(())
    }

    fn definition_operation(&self, selected: Option<usize>) -> Operation {
        let operation = match self.id {
            Some(id) => Operation::on_id(id),
            None => Operation::on_temp_id(DEFINITION_TEMP_ID),
        }
        .set(CUSTOM_ATTRIBUTE_NAME_IDENT, self.attr_name.as_str())
        .set(CUSTOM_ATTRIBUTE_TYPE_IDENT, self.attr_type as u64)
        .set(CUSTOM_ATTRIBUTE_UNIQUE_IDENT, self.unique)
        .set(CUSTOM_ATTRIBUTE_SORT_ORDER_IDENT, self.sort_order);

        if !self.has_options() {
            return operation
                .set(CUSTOM_ATTRIBUTE_DEFAULT_VALUE_IDENT, self.default_value.as_str())
                .unset(CUSTOM_ATTRIBUTE_DEFAULT_OPTION_IDENT);
        }
        // Dropdowns keep their default as a reference to the option entity.
        let operation = operation.unset(CUSTOM_ATTRIBUTE_DEFAULT_VALUE_IDENT);
        match selected.map(|index| (index, &self.custom_attribute_options[index])) {
            Some((_, CustomAttributeOption { id: Some(id), .. })) => {
                operation.set(CUSTOM_ATTRIBUTE_DEFAULT_OPTION_IDENT, Value::Ref(*id))
            }
            Some((index, _)) => {
                operation.set_reference(CUSTOM_ATTRIBUTE_DEFAULT_OPTION_IDENT, &option_temp_id(index))
            }
            None => operation.unset(CUSTOM_ATTRIBUTE_DEFAULT_OPTION_IDENT),
        }
    }

    /// The option selected as default, if `default_value` names one of ours.
    pub fn default_option(&self) -> Option<&CustomAttributeOption> {
        let id: u64 = self.default_value.parse().ok()?;
        self.custom_attribute_options
            .iter()
            .find(|option| option.id == Some(id))
    }

    /// Retracts the definition together with its options and values.
    pub fn destroy<S: Storage, C: Clock>(
        self,
        db: &mut Db<S, C>,
    ) -> Result<(), TransactionError<S::Error>> {
        let Some(id) = self.id else {
            return Ok(());
        };
        let mut transaction = Transaction::new().with(Operation::retract(id));
        for option in CustomAttributeOption::for_definition(db.storage(), id)? {
            if let Some(option_id) = option.id {
                transaction.push(Operation::retract(option_id));
            }
        }
        for value_id in value_ids(db.storage(), id)? {
            transaction.push(Operation::retract(value_id));
        }
        db.transact(transaction)?;
        Ok(())
    }

    // Queries -----------------------------------------------------------------------------------

    pub fn find<S: Storage, C: Clock>(db: &Db<S, C>, id: u64) -> Result<Option<Self>, S::Error> {
        let storage = db.storage();
        let mut attr_name = None;
        let mut attr_type = None;
        let mut default_value = None;
        let mut default_option = None;
        let mut unique = false;
        let mut sort_order = 0;
        for datom in storage.find(Restricts::new().with_entity(id)) {
            let datom = datom?;
            match (datom.attribute, datom.value) {
                (CUSTOM_ATTRIBUTE_NAME_ID, Value::Str(name)) => attr_name = Some(name.to_string()),
                (CUSTOM_ATTRIBUTE_TYPE_ID, Value::U64(code)) => attr_type = AttrType::from(code),
                (CUSTOM_ATTRIBUTE_DEFAULT_VALUE_ID, Value::Str(value)) => {
                    default_value = Some(value.to_string())
                }
                (CUSTOM_ATTRIBUTE_DEFAULT_OPTION_ID, Value::Ref(option)) => {
                    default_option = Some(option)
                }
                (CUSTOM_ATTRIBUTE_UNIQUE_ID, Value::U64(flag)) => unique = flag == 1,
                (CUSTOM_ATTRIBUTE_SORT_ORDER_ID, Value::I64(order)) => sort_order = order,
                _ => (),
            }
        }
        let (Some(attr_name), Some(attr_type)) = (attr_name, attr_type) else {
            return Ok(None);
        };

        let mut definition = Self::new(&attr_name, attr_type);
        definition.id = Some(id);
        definition.unique = unique;
        definition.sort_order = sort_order;
        definition.custom_attribute_options = CustomAttributeOption::for_definition(storage, id)?;
        definition.default_value = if definition.has_options() {
            default_option.map(|id| id.to_string()).unwrap_or_default()
        } else {
            default_value.unwrap_or_default()
        };
        Ok(Some(definition))
    }

    /// Every definition, ordered by `sort_order` and then by creation.
    pub fn all_by_sort_order<S: Storage, C: Clock>(db: &Db<S, C>) -> Result<Vec<Self>, S::Error> {
        let ids: Vec<u64> = db
            .storage()
            .find(Restricts::new().with_attribute(CUSTOM_ATTRIBUTE_NAME_ID))
            .map(|datom| datom.map(|datom| datom.entity))
            .collect::<Result<_, _>>()?;
        let mut definitions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(definition) = Self::find(db, id)? {
                definitions.push(definition);
            }
        }
        definitions.sort_by_key(|definition| (definition.sort_order, definition.id));
        Ok(definitions)
    }
}
