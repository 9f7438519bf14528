mod serde;

use custom_attributes::datom::*;
use custom_attributes::storage::restricts::*;

trait Storage {
    fn create() -> Self;
    fn save(&mut self, datoms: &[Datom]);
    fn find(&self, restricts: Restricts) -> Vec<Datom>;
    fn latest_entity_id(&self) -> u64;
}

mod memory {
    use super::*;
    use custom_attributes::storage::memory::*;
    use custom_attributes::storage::Storage as _;

    struct InMemory(InMemoryStorage);

    impl Storage for InMemory {
        fn create() -> Self {
            Self(InMemoryStorage::new())
        }

        fn save(&mut self, datoms: &[Datom]) {
            self.0.save(datoms).expect("should succeed")
        }

        fn find(&self, restricts: Restricts) -> Vec<Datom> {
            self.0
                .find(restricts)
                .map(|result| result.expect("should be valid"))
                .collect()
        }

        fn latest_entity_id(&self) -> u64 {
            self.0.latest_entity_id().expect("should succeed")
        }
    }

    #[test]
    fn return_empty_result_if_no_datoms_match_search_criteria() {
        return_empty_result_if_no_datoms_match_search_criteria_impl::<InMemory>();
    }

    #[test]
    fn find_single_datom_by_entity_attribute_and_value() {
        find_single_datom_by_entity_attribute_and_value_impl::<InMemory>();
    }

    #[test]
    fn find_multiple_datoms_by_entity() {
        find_multiple_datoms_by_entity_impl::<InMemory>();
    }

    #[test]
    fn find_multiple_datoms_by_attribute_for_different_entity() {
        find_multiple_datoms_by_attribute_for_different_entity_impl::<InMemory>();
    }

    #[test]
    fn find_entities_by_attribute_and_value() {
        find_entities_by_attribute_and_value_impl::<InMemory>();
    }

    #[test]
    fn ignore_datoms_of_other_entities() {
        ignore_datoms_of_other_entities_impl::<InMemory>();
    }

    #[test]
    fn ignore_retracted_values() {
        ignore_retracted_values_impl::<InMemory>();
    }

    #[test]
    fn fetch_only_latest_value_for_attribute() {
        fetch_only_latest_value_for_attribute_impl::<InMemory>();
    }

    #[test]
    fn track_latest_entity_id() {
        track_latest_entity_id_impl::<InMemory>();
    }
}

mod disk {
    use super::*;
    use custom_attributes::storage::disk::*;
    use custom_attributes::storage::Storage as _;
    use tempdir::TempDir;

    // The directory is removed when `TempDir` drops, so it lives as long as the storage.
    struct Disk(DiskStorage, TempDir);

    impl Storage for Disk {
        fn create() -> Self {
            let dir = TempDir::new("custom-attributes").expect("Unable to create temp dir");
            let storage = DiskStorage::open(dir.path()).expect("Unable to open DB");
            Self(storage, dir)
        }

        fn save(&mut self, datoms: &[Datom]) {
            self.0.save(datoms).expect("should succeed")
        }

        fn find(&self, restricts: Restricts) -> Vec<Datom> {
            self.0
                .find(restricts)
                .map(|result| result.expect("should be valid"))
                .collect()
        }

        fn latest_entity_id(&self) -> u64 {
            self.0.latest_entity_id().expect("should succeed")
        }
    }

    #[test]
    fn return_empty_result_if_no_datoms_match_search_criteria() {
        return_empty_result_if_no_datoms_match_search_criteria_impl::<Disk>();
    }

    #[test]
    fn find_single_datom_by_entity_attribute_and_value() {
        find_single_datom_by_entity_attribute_and_value_impl::<Disk>();
    }

    #[test]
    fn find_multiple_datoms_by_entity() {
        find_multiple_datoms_by_entity_impl::<Disk>();
    }

    #[test]
    fn find_multiple_datoms_by_attribute_for_different_entity() {
        find_multiple_datoms_by_attribute_for_different_entity_impl::<Disk>();
    }

    #[test]
    fn find_entities_by_attribute_and_value() {
        find_entities_by_attribute_and_value_impl::<Disk>();
    }

    #[test]
    fn ignore_datoms_of_other_entities() {
        ignore_datoms_of_other_entities_impl::<Disk>();
    }

    #[test]
    fn ignore_retracted_values() {
        ignore_retracted_values_impl::<Disk>();
    }

    #[test]
    fn fetch_only_latest_value_for_attribute() {
        fetch_only_latest_value_for_attribute_impl::<Disk>();
    }

    #[test]
    fn track_latest_entity_id() {
        track_latest_entity_id_impl::<Disk>();
    }
}

fn return_empty_result_if_no_datoms_match_search_criteria_impl<S: Storage>() {
    let storage = S::create();

    let read_result = storage.find(Restricts::new().with_entity(100));

    assert!(read_result.is_empty());
}

fn find_single_datom_by_entity_attribute_and_value_impl<S: Storage>() {
    let mut storage = S::create();

    let entity = 100;
    let attribute = 101;
    let value = 102u64;
    let tx = 103;

    let datoms = vec![Datom::add(entity, attribute, value, tx)];
    storage.save(&datoms);

    let read_result = storage.find(
        Restricts::new()
            .with_entity(entity)
            .with_attribute(attribute)
            .with_value(Value::U64(value)),
    );

    assert_eq!(datoms, read_result);
}

fn find_multiple_datoms_by_entity_impl<S: Storage>() {
    let mut storage = S::create();

    let entity = 100;
    let tx = 1000;
    let datoms = vec![
        Datom::add(entity, 101, 1u64, tx),
        Datom::add(entity, 102, "Shirt size", tx),
        Datom::add(entity, 103, Value::Ref(7), tx),
    ];
    storage.save(&datoms);

    let read_result = storage.find(Restricts::new().with_entity(entity));

    assert_eq!(datoms, read_result);
}

fn find_multiple_datoms_by_attribute_for_different_entity_impl<S: Storage>() {
    let mut storage = S::create();

    let entity1 = 100;
    let entity2 = 101;
    let attribute1 = 102;
    let attribute2 = 103;
    let datoms = vec![
        Datom::add(entity1, attribute1, 1u64, 1000),
        Datom::retract(entity1, attribute1, 1u64, 1001),
        Datom::add(entity1, attribute1, 2u64, 1001),
        Datom::add(entity2, attribute1, 1u64, 1002),
        Datom::add(entity2, attribute2, 2u64, 1002),
        Datom::add(entity2, attribute2, 3u64, 1002),
    ];
    storage.save(&datoms);

    let read_result = storage.find(Restricts::new().with_attribute(attribute1));

    let expected = vec![
        Datom::add(entity1, attribute1, 2u64, 1001),
        Datom::add(entity2, attribute1, 1u64, 1002),
    ];
    assert_eq!(2, read_result.len());
    assert!(expected.iter().all(|datom| read_result.contains(datom)));
}

fn find_entities_by_attribute_and_value_impl<S: Storage>() {
    let mut storage = S::create();

    let definition = 100;
    let attribute = 101;
    storage.save(&[
        Datom::add(200, attribute, Value::Ref(definition), 1000),
        Datom::add(201, attribute, Value::Ref(definition + 1), 1000),
        Datom::add(202, attribute, Value::Ref(definition), 1000),
    ]);
    // Moved to the other definition
    storage.save(&[
        Datom::retract(202, attribute, Value::Ref(definition), 1001),
        Datom::add(202, attribute, Value::Ref(definition + 1), 1001),
    ]);

    let entities: Vec<u64> = storage
        .find(
            Restricts::new()
                .with_attribute(attribute)
                .with_value(Value::Ref(definition)),
        )
        .into_iter()
        .map(|datom| datom.entity)
        .collect();

    assert_eq!(vec![200], entities);
}

fn ignore_datoms_of_other_entities_impl<S: Storage>() {
    let mut storage = S::create();

    let entity1 = 100;
    let entity2 = 101;
    let attribute = 102;
    let tx = 1000;
    let datoms = vec![
        Datom::add(entity1, attribute, 1u64, tx),
        Datom::add(entity2, attribute, 2u64, tx),
    ];
    storage.save(&datoms);

    let read_result = storage.find(Restricts::new().with_entity(entity1));

    assert_eq!(datoms[0..1], read_result);
}

fn ignore_retracted_values_impl<S: Storage>() {
    let mut storage = S::create();

    let entity = 100;
    let attribute = 101;
    let datoms = vec![
        // Add value 1 in tx 1000
        Datom::add(entity, attribute, 1u64, 1000),
        // Retract value 1 in tx 1001
        Datom::retract(entity, attribute, 1u64, 1001),
    ];
    storage.save(&datoms);

    let read_result = storage.find(
        Restricts::new()
            .with_entity(entity)
            .with_attribute(attribute),
    );

    assert!(read_result.is_empty());
}

fn fetch_only_latest_value_for_attribute_impl<S: Storage>() {
    let mut storage = S::create();

    let entity = 100;
    let attribute = 101;
    let datoms = vec![
        // Add value 1 in tx 1000
        Datom::add(entity, attribute, 1u64, 1000),
        // Replace value 1 with 2 in tx 1001
        Datom::retract(entity, attribute, 1u64, 1001),
        Datom::add(entity, attribute, 2u64, 1001),
    ];
    storage.save(&datoms);

    let read_result = storage.find(
        Restricts::new()
            .with_entity(entity)
            .with_attribute(attribute),
    );

    assert_eq!(datoms[2..], read_result);
}

fn track_latest_entity_id_impl<S: Storage>() {
    let mut storage = S::create();
    assert_eq!(0, storage.latest_entity_id());

    storage.save(&[
        Datom::add(150, 101, 1u64, 120),
        Datom::add(130, 101, 2u64, 120),
    ]);

    assert_eq!(150, storage.latest_entity_id());
}
