use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use crate::clock::Instant;
use crate::datom::*;
use crate::schema::attribute::*;
use crate::schema::*;
use crate::storage::attribute_resolver::*;
use crate::storage::restricts::*;
use crate::storage::serde::MAX_STR_LEN;
use crate::storage::*;
use crate::tx::*;

type TempId = Rc<str>;
type EntityId = u64;

/// Turns a [`Transaction`] into datoms against the current state of storage.
///
/// Nothing is written here: the caller saves `tx_data` in one go, which is what makes a
/// transaction all-or-nothing.
#[derive(Default)]
pub struct Transactor {
    attribute_resolver: CachingAttributeResolver,
}

impl Transactor {
    pub fn new() -> Self {
        Self {
            attribute_resolver: CachingAttributeResolver::new(),
        }
    }

    pub fn transact<S: Storage>(
        &mut self,
        storage: &S,
        now: Instant,
        transaction: Transaction,
    ) -> Result<TransactionResult, TransactionError<S::Error>> {
        let latest_entity_id = storage.latest_entity_id()?;
        let mut id_allocator = IdAllocator(latest_entity_id.max(RESERVED_ENTITY_IDS));
        let temp_ids = generate_temp_ids(&transaction, &mut id_allocator)?;
        let tx = id_allocator.next();
        let datoms = self.transaction_datoms(storage, now, tx, transaction, &temp_ids, &mut id_allocator)?;
        trace!(tx, datoms = datoms.len(), "transaction datoms ready");

        Ok(TransactionResult {
            tx_id: tx,
            tx_data: datoms,
            temp_ids: temp_ids.0,
        })
    }

    fn transaction_datoms<S: Storage>(
        &mut self,
        storage: &S,
        now: Instant,
        tx: u64,
        transaction: Transaction,
        temp_ids: &TempIds,
        id_allocator: &mut IdAllocator,
    ) -> Result<Vec<Datom>, TransactionError<S::Error>> {
        let mut datoms = Vec::with_capacity(transaction.total_attribute_operations() + 1);
        let mut unique_values = HashSet::new();
        for operation in transaction.operations {
            self.operation_datoms(
                storage,
                tx,
                operation,
                temp_ids,
                &mut datoms,
                &mut unique_values,
                id_allocator,
            )?;
        }
        datoms.push(Datom::add(tx, DB_TX_TIME_ID, now.0, tx));
        Ok(datoms)
    }

    #[allow(clippy::too_many_arguments)]
    fn operation_datoms<S: Storage>(
        &mut self,
        storage: &S,
        tx: u64,
        operation: Operation,
        temp_ids: &TempIds,
        datoms: &mut Vec<Datom>,
        unique_values: &mut HashSet<(u64, Value)>,
        id_allocator: &mut IdAllocator,
    ) -> Result<(), TransactionError<S::Error>> {
        let entity = resolve_entity(operation.entity, temp_ids, id_allocator)?;
        if operation.retract_entity {
            for datom in storage.find(Restricts::new().with_entity(entity)) {
                let datom = datom?;
                datoms.push(Datom::retract(entity, datom.attribute, datom.value, tx));
            }
        }

        // Latest value per cardinality one attribute, so a later `set` overrides an earlier one.
        let mut single_values: BTreeMap<u64, Datom> = BTreeMap::new();
        let mut multi_values = Vec::new();
        let mut retract_attributes = BTreeSet::new();
        for attribute_operation in operation.attributes {
            match attribute_operation {
                AttributeOperation::Set { attribute, value } => {
                    let attribute = self.resolve_attribute(storage, attribute)?;
                    let value = resolve_value(value, temp_ids)?;
                    verify_type(&attribute, &value)?;
                    verify_length(&attribute, &value)?;
                    if attribute.definition.unique {
                        verify_uniqueness_tx(&attribute, &value, unique_values)?;
                        verify_uniqueness_db(&attribute, entity, &value, storage)?;
                    }
                    let datom = Datom::add(entity, attribute.id, value, tx);
                    match attribute.definition.cardinality {
                        Cardinality::One => {
                            // Values of attributes with cardinality `Cardinality::One` should be
                            // retracted before asserting new values.
                            retract_attributes.insert(attribute.id);
                            single_values.insert(attribute.id, datom);
                        }
                        Cardinality::Many => multi_values.push(datom),
                    }
                }
                AttributeOperation::Unset { attribute } => {
                    let attribute = self.resolve_attribute(storage, attribute)?;
                    retract_attributes.insert(attribute.id);
                    single_values.remove(&attribute.id);
                    multi_values.retain(|datom: &Datom| datom.attribute != attribute.id);
                }
            }
        }

        for attribute_id in retract_attributes {
            let kept = single_values.get(&attribute_id).map(|datom| &datom.value);
            retract_old_values(storage, entity, attribute_id, kept, tx, datoms)?;
        }
        datoms.extend(single_values.into_values());
        datoms.extend(multi_values);

        Ok(())
    }

    fn resolve_attribute<S: Storage>(
        &mut self,
        storage: &S,
        ident: Rc<str>,
    ) -> Result<Attribute, TransactionError<S::Error>> {
        self.attribute_resolver
            .resolve_ident(storage, &ident)?
            .ok_or(TransactionError::UnknownAttribute(ident))
    }
}

struct IdAllocator(EntityId);

impl IdAllocator {
    fn next(&mut self) -> EntityId {
        self.0 += 1;
        self.0
    }
}

fn generate_temp_ids<E: std::error::Error + 'static>(
    transaction: &Transaction,
    id_allocator: &mut IdAllocator,
) -> Result<TempIds, TransactionError<E>> {
    let mut temp_ids = HashMap::new();
    for operation in &transaction.operations {
        if let OperatedEntity::TempId(temp_id) = &operation.entity {
            let entity_id = id_allocator.next();
            if temp_ids.insert(Rc::clone(temp_id), entity_id).is_some() {
                return Err(TransactionError::DuplicateTempId(Rc::clone(temp_id)));
            }
        };
    }
    Ok(TempIds(temp_ids))
}

fn resolve_entity<E: std::error::Error + 'static>(
    entity: OperatedEntity,
    temp_ids: &TempIds,
    id_allocator: &mut IdAllocator,
) -> Result<EntityId, TransactionError<E>> {
    match entity {
        OperatedEntity::New => Ok(id_allocator.next()),
        OperatedEntity::Id(id) => Ok(id),
        OperatedEntity::TempId(temp_id) => temp_ids.get(&temp_id),
    }
}

fn resolve_value<E: std::error::Error + 'static>(
    attribute_value: AttributeValue,
    temp_ids: &TempIds,
) -> Result<Value, TransactionError<E>> {
    match attribute_value {
        AttributeValue::Value(value) => Ok(value),
        AttributeValue::TempId(temp_id) => temp_ids.get(&temp_id).map(Value::Ref),
    }
}

fn verify_type<E: std::error::Error + 'static>(
    attribute: &Attribute,
    value: &Value,
) -> Result<(), TransactionError<E>> {
    if attribute.definition.value_type != ValueType::from(value) {
        // Value type is incompatible with attribute, reject transaction.
        return Err(TransactionError::InvalidAttributeType {
            attribute_id: attribute.id,
            attribute_type: attribute.definition.value_type,
            value: value.clone(),
        });
    }
    Ok(())
}

fn verify_length<E: std::error::Error + 'static>(
    attribute: &Attribute,
    value: &Value,
) -> Result<(), TransactionError<E>> {
    match value {
        Value::Str(str) if str.len() > MAX_STR_LEN => Err(TransactionError::ValueTooLong {
            attribute: attribute.id,
            length: str.len(),
        }),
        _ => Ok(()),
    }
}

fn verify_uniqueness_tx<E: std::error::Error + 'static>(
    attribute: &Attribute,
    value: &Value,
    unique_values: &mut HashSet<(u64, Value)>,
) -> Result<(), TransactionError<E>> {
    // Find duplicate values within transaction.
    if !unique_values.insert((attribute.id, value.clone())) {
        return Err(TransactionError::DuplicateUniqueValue {
            attribute: attribute.id,
            value: value.clone(),
        });
    }
    Ok(())
}

fn verify_uniqueness_db<S: Storage>(
    attribute: &Attribute,
    entity: EntityId,
    value: &Value,
    storage: &S,
) -> Result<(), TransactionError<S::Error>> {
    // Find duplicate values previously saved on other entities.
    let restricts = Restricts::new()
        .with_attribute(attribute.id)
        .with_value(value.clone());
    for datom in storage.find(restricts) {
        if datom?.entity != entity {
            return Err(TransactionError::DuplicateUniqueValue {
                attribute: attribute.id,
                value: value.clone(),
            });
        }
    }
    Ok(())
}

fn retract_old_values<S: Storage>(
    storage: &S,
    entity: EntityId,
    attribute: u64,
    kept: Option<&Value>,
    tx: u64,
    datoms: &mut Vec<Datom>,
) -> Result<(), TransactionError<S::Error>> {
    let restricts = Restricts::new()
        .with_entity(entity)
        .with_attribute(attribute);
    for datom in storage.find(restricts) {
        let datom = datom?;
        if kept != Some(&datom.value) {
            datoms.push(Datom::retract(entity, attribute, datom.value, tx));
        }
    }
    Ok(())
}

struct TempIds(HashMap<TempId, EntityId>);

impl TempIds {
    fn get<E: std::error::Error + 'static>(&self, temp_id: &Rc<str>) -> Result<EntityId, TransactionError<E>> {
        self.0
            .get(temp_id)
            .copied()
            .ok_or_else(|| TransactionError::TempIdNotFound(Rc::clone(temp_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryStorage;

    fn create_storage() -> InMemoryStorage {
        let mut storage = InMemoryStorage::new();
        storage
            .save(&crate::schema::default::default_datoms())
            .expect("in memory save");
        storage
    }

    fn transact(storage: &mut InMemoryStorage, transaction: Transaction) -> TransactionResult {
        let result = Transactor::new()
            .transact(&*storage, Instant(0), transaction)
            .expect("transaction should succeed");
        storage.save(&result.tx_data).expect("in memory save");
        result
    }

    fn current(storage: &InMemoryStorage, entity: u64, attribute: u64) -> Vec<Value> {
        storage
            .find(Restricts::new().with_entity(entity).with_attribute(attribute))
            .map(|datom| datom.expect("valid datom").value)
            .collect()
    }

    #[test]
    fn allocate_ids_after_reserved_range() {
        let mut storage = create_storage();
        let result = transact(
            &mut storage,
            Transaction::new().with(Operation::on_temp_id("red").set(OPTION_LABEL_IDENT, "Red")),
        );
        let red = result.temp_ids["red"];
        assert!(red > RESERVED_ENTITY_IDS);
        assert!(result.tx_id > red);
    }

    #[test]
    fn replace_cardinality_one_value() {
        let mut storage = create_storage();
        let result = transact(
            &mut storage,
            Transaction::new().with(Operation::on_temp_id("red").set(OPTION_LABEL_IDENT, "Red")),
        );
        let red = result.temp_ids["red"];
        transact(
            &mut storage,
            Transaction::new().with(Operation::on_id(red).set(OPTION_LABEL_IDENT, "Crimson")),
        );

        assert_eq!(vec![Value::str("Crimson")], current(&storage, red, OPTION_LABEL_ID));
    }

    #[test]
    fn setting_same_value_keeps_it_live() {
        let mut storage = create_storage();
        let result = transact(
            &mut storage,
            Transaction::new().with(Operation::on_temp_id("red").set(OPTION_LABEL_IDENT, "Red")),
        );
        let red = result.temp_ids["red"];
        let again = transact(
            &mut storage,
            Transaction::new().with(Operation::on_id(red).set(OPTION_LABEL_IDENT, "Red")),
        );

        assert!(again.tx_data.iter().all(|datom| datom.op == Op::Assert));
        assert_eq!(vec![Value::str("Red")], current(&storage, red, OPTION_LABEL_ID));
    }

    #[test]
    fn unset_retracts_current_value() {
        let mut storage = create_storage();
        let result = transact(
            &mut storage,
            Transaction::new().with(Operation::on_temp_id("red").set(OPTION_LABEL_IDENT, "Red")),
        );
        let red = result.temp_ids["red"];
        transact(
            &mut storage,
            Transaction::new().with(Operation::on_id(red).unset(OPTION_LABEL_IDENT)),
        );

        assert!(current(&storage, red, OPTION_LABEL_ID).is_empty());
    }

    #[test]
    fn retract_whole_entity() {
        let mut storage = create_storage();
        let result = transact(
            &mut storage,
            Transaction::new().with(
                Operation::on_temp_id("red")
                    .set(OPTION_LABEL_IDENT, "Red")
                    .set(OPTION_DEFINITION_IDENT, Value::Ref(7)),
            ),
        );
        let red = result.temp_ids["red"];
        transact(&mut storage, Transaction::new().with(Operation::retract(red)));

        let remaining = storage
            .find(Restricts::new().with_entity(red))
            .count();
        assert_eq!(0, remaining);
    }

    #[test]
    fn resolve_temp_id_references() {
        let mut storage = create_storage();
        let result = transact(
            &mut storage,
            Transaction::new()
                .with(Operation::on_temp_id("definition").set(CUSTOM_ATTRIBUTE_NAME_IDENT, "Color"))
                .with(
                    Operation::on_temp_id("red")
                        .set(OPTION_LABEL_IDENT, "Red")
                        .set_reference(OPTION_DEFINITION_IDENT, "definition"),
                ),
        );
        let definition = result.temp_ids["definition"];
        let red = result.temp_ids["red"];

        assert_eq!(
            vec![Value::Ref(definition)],
            current(&storage, red, OPTION_DEFINITION_ID)
        );
    }

    #[test]
    fn reject_unknown_attribute() {
        let storage = create_storage();
        let result = Transactor::new().transact(
            &storage,
            Instant(0),
            Transaction::new().with(Operation::on_new().set("person/name", "Joe")),
        );
        assert!(matches!(result, Err(TransactionError::UnknownAttribute(_))));
    }

    #[test]
    fn reject_invalid_attribute_type() {
        let storage = create_storage();
        let result = Transactor::new().transact(
            &storage,
            Instant(0),
            Transaction::new().with(Operation::on_new().set(OPTION_LABEL_IDENT, 42)),
        );
        assert!(matches!(
            result,
            Err(TransactionError::InvalidAttributeType { .. })
        ));
    }

    #[test]
    fn reject_duplicate_temp_ids() {
        let storage = create_storage();
        let result = Transactor::new().transact(
            &storage,
            Instant(0),
            Transaction::new()
                .with(Operation::on_temp_id("red").set(OPTION_LABEL_IDENT, "Red"))
                .with(Operation::on_temp_id("red").set(OPTION_LABEL_IDENT, "Blue")),
        );
        assert!(matches!(result, Err(TransactionError::DuplicateTempId(_))));
    }

    #[test]
    fn reject_duplicate_values_of_unique_attribute() {
        let mut storage = create_storage();
        transact(
            &mut storage,
            Transaction::new().with(AttributeDefinition::new("person/email", ValueType::Str).unique().into()),
        );
        transact(
            &mut storage,
            Transaction::new().with(Operation::on_new().set("person/email", "joe@example.com")),
        );

        let result = Transactor::new().transact(
            &storage,
            Instant(0),
            Transaction::new().with(Operation::on_new().set("person/email", "joe@example.com")),
        );
        assert!(matches!(
            result,
            Err(TransactionError::DuplicateUniqueValue { .. })
        ));
    }

    #[test]
    fn keep_every_value_of_cardinality_many_attribute() {
        let mut storage = create_storage();
        transact(
            &mut storage,
            Transaction::new().with(AttributeDefinition::new("person/tag", ValueType::Str).many().into()),
        );
        let result = transact(
            &mut storage,
            Transaction::new().with(
                Operation::on_temp_id("joe")
                    .set("person/tag", "admin")
                    .set("person/tag", "staff"),
            ),
        );
        let joe = result.temp_ids["joe"];
        transact(
            &mut storage,
            Transaction::new().with(Operation::on_id(joe).set("person/tag", "oncall")),
        );

        let tags = |storage: &InMemoryStorage| -> Vec<Value> {
            storage
                .find(Restricts::new().with_entity(joe))
                .map(|datom| datom.expect("valid datom").value)
                .collect()
        };
        let current_tags = tags(&storage);
        assert_eq!(3, current_tags.len());
        for tag in ["admin", "staff", "oncall"] {
            assert!(current_tags.contains(&Value::str(tag)));
        }

        transact(
            &mut storage,
            Transaction::new().with(Operation::on_id(joe).unset("person/tag")),
        );
        assert!(tags(&storage).is_empty());
    }

    #[test]
    fn reject_strings_too_long_for_index() {
        let storage = create_storage();
        let label = "x".repeat(MAX_STR_LEN + 1);
        let result = Transactor::new().transact(
            &storage,
            Instant(0),
            Transaction::new().with(Operation::on_new().set(OPTION_LABEL_IDENT, label.as_str())),
        );
        assert!(matches!(result, Err(TransactionError::ValueTooLong { .. })));
    }
}
