use phonebook_core::db::open_db_in_memory;
use phonebook_core::{
    MemoryPersonStore, Person, PersonStore, PersonValidationError, SqlitePersonStore, StoreError,
};

fn sqlite_store() -> SqlitePersonStore {
    SqlitePersonStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn check_insert_assigns_fresh_ids(store: &impl PersonStore) {
    let first = store.upsert(&Person::new("Ana", "111")).unwrap();
    let second = store.upsert(&Person::new("Ana", "111")).unwrap();
    assert!(second > first);

    let people = store.list_all().unwrap();
    assert_eq!(
        people,
        vec![
            Person::with_id(first, "Ana", "111"),
            Person::with_id(second, "Ana", "111"),
        ]
    );
}

fn check_upsert_with_id_replaces_fields(store: &impl PersonStore) {
    let id = store.upsert(&Person::new("Ana", "111")).unwrap();
    let other = store.upsert(&Person::new("Bob", "222")).unwrap();

    let returned = store.upsert(&Person::with_id(id, "Ana Maria", "999")).unwrap();
    assert_eq!(returned, id);
    assert_eq!(
        store.list_all().unwrap(),
        vec![
            Person::with_id(id, "Ana Maria", "999"),
            Person::with_id(other, "Bob", "222"),
        ]
    );
}

fn check_upsert_unknown_id_is_not_found(store: &impl PersonStore) {
    let err = store.upsert(&Person::with_id(42, "Ghost", "000")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(42)));
    assert!(store.list_all().unwrap().is_empty());
}

fn check_validation_blocks_writes(store: &impl PersonStore) {
    let err = store.upsert(&Person::new(" ", "111")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(PersonValidationError::EmptyName)
    ));
    let err = store.upsert(&Person::new("Ana", "")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(PersonValidationError::EmptyPhone)
    ));
    assert!(store.list_all().unwrap().is_empty());
}

fn check_delete_requires_full_record_match(store: &impl PersonStore) {
    let id = store.upsert(&Person::new("Ana", "111")).unwrap();

    assert!(!store.delete(&Person::with_id(id, "Ana", "000")).unwrap());
    assert!(!store.delete(&Person::with_id(id + 1, "Ana", "111")).unwrap());
    assert_eq!(store.list_all().unwrap().len(), 1);

    assert!(store.delete(&Person::with_id(id, "Ana", "111")).unwrap());
    assert!(store.list_all().unwrap().is_empty());
}

fn check_delete_without_id_removes_oldest_duplicate_only(store: &impl PersonStore) {
    let oldest = store.upsert(&Person::new("Ana", "111")).unwrap();
    let newest = store.upsert(&Person::new("Ana", "111")).unwrap();

    assert!(store.delete(&Person::new("Ana", "111")).unwrap());
    assert_eq!(
        store.list_all().unwrap(),
        vec![Person::with_id(newest, "Ana", "111")]
    );
    assert_ne!(oldest, newest);
}

fn check_delete_missing_is_noop(store: &impl PersonStore) {
    let id = store.upsert(&Person::new("Bob", "222")).unwrap();
    let before = store.list_all().unwrap();

    assert!(!store.delete(&Person::new("Nobody", "000")).unwrap());
    assert_eq!(store.list_all().unwrap(), before);
    assert_eq!(before, vec![Person::with_id(id, "Bob", "222")]);
}

fn check_ids_are_not_reused_after_delete(store: &impl PersonStore) {
    let first = store.upsert(&Person::new("Ana", "111")).unwrap();
    let second = store.upsert(&Person::new("Bob", "222")).unwrap();
    assert!(store.delete(&Person::with_id(second, "Bob", "222")).unwrap());

    let third = store.upsert(&Person::new("Cid", "333")).unwrap();
    assert!(third > second);
    assert!(second > first);
}

macro_rules! store_contract_tests {
    ($module:ident, $factory:expr) => {
        mod $module {
            use super::*;

            #[test]
            fn insert_assigns_fresh_ids() {
                check_insert_assigns_fresh_ids(&$factory);
            }

            #[test]
            fn upsert_with_id_replaces_fields() {
                check_upsert_with_id_replaces_fields(&$factory);
            }

            #[test]
            fn upsert_unknown_id_is_not_found() {
                check_upsert_unknown_id_is_not_found(&$factory);
            }

            #[test]
            fn validation_blocks_writes() {
                check_validation_blocks_writes(&$factory);
            }

            #[test]
            fn delete_requires_full_record_match() {
                check_delete_requires_full_record_match(&$factory);
            }

            #[test]
            fn delete_without_id_removes_oldest_duplicate_only() {
                check_delete_without_id_removes_oldest_duplicate_only(&$factory);
            }

            #[test]
            fn delete_missing_is_noop() {
                check_delete_missing_is_noop(&$factory);
            }

            #[test]
            fn ids_are_not_reused_after_delete() {
                check_ids_are_not_reused_after_delete(&$factory);
            }
        }
    };
}

store_contract_tests!(sqlite, sqlite_store());
store_contract_tests!(memory, MemoryPersonStore::new());

#[test]
fn sqlite_rows_with_null_fields_are_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    // Bypass the NOT NULL schema to simulate a corrupted legacy table.
    conn.execute_batch(
        "DROP TABLE person;
         CREATE TABLE person (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT,
             phone TEXT
         );
         INSERT INTO person (name, phone) VALUES (NULL, '111');",
    )
    .unwrap();

    let store = SqlitePersonStore::try_new(conn).unwrap();
    let err = store.list_all().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
    assert!(err.is_storage_failure());
}
