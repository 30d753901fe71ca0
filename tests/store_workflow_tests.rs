/// Save workflow tests
///
/// Routing committed work from an EditableSet to persistence actions
/// Run with: cargo test --test store_workflow_tests

use editable_collections::{
    AccessorRegistry, ActionCallbacks, ChangeSet, CommitMode, DataType, EditConfig, EditError,
    EditableSet, Entity, EntityHandle, InMemoryRepository, PersistenceActions, PropertySpec,
    Value,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default, Clone, PartialEq, Entity)]
struct Customer {
    first_name: String,
    last_name: String,
    age: i64,
}

fn customer(first_name: &str, last_name: &str, age: i64) -> Customer {
    Customer {
        first_name: first_name.into(),
        last_name: last_name.into(),
        age,
    }
}

fn repository() -> InMemoryRepository<Customer> {
    InMemoryRepository::from_entities(vec![
        customer("Angela", "Adams", 29),
        customer("Benny", "Bernanke", 34),
        customer("Charlie", "Chaplin", 19),
        customer("Darryl", "Donkey Kong", 11),
    ])
}

fn stored_names(repository: &InMemoryRepository<Customer>) -> Vec<String> {
    repository
        .items()
        .iter()
        .map(|item| item.borrow().first_name.clone())
        .collect()
}

#[test]
fn test_save_routes_to_repository() {
    let mut repository = repository();
    let mut set = repository.editable_set().unwrap();
    let source = set.all_items().iter().map(|item| item.id()).collect::<Vec<_>>();

    set.item_mut(source[0])
        .unwrap()
        .write_by_name("age", 30i64)
        .unwrap();
    set.delete_item(source[1]).unwrap();
    let edgar = set.add_new_item(customer("Edgar", "Eucalyptus", 20));

    let changes = set.save(&mut repository).unwrap();

    assert_eq!(
        changes,
        ChangeSet {
            deleted: 1,
            edited: 1,
            added: 1
        }
    );
    assert_eq!(
        stored_names(&repository),
        vec!["Angela", "Charlie", "Darryl", "Edgar"]
    );
    assert_eq!(repository.items()[0].borrow().age, 30);

    // The set now mirrors the repository and is clean.
    assert_eq!(set.len(), 4);
    assert!(!set.has_changes());
    assert!(set.get(edgar).is_none());
    let tracked = set.find_by_original(&repository.items()[3]).unwrap();
    assert!(!tracked.is_new());
}

#[test]
fn test_second_save_is_empty() {
    let mut repository = repository();
    let mut set = repository.editable_set().unwrap();
    set.add_new();

    assert_eq!(set.save(&mut repository).unwrap().added, 1);
    let changes = set.save(&mut repository).unwrap();
    assert!(changes.is_empty());
    assert_eq!(repository.len(), 5);
}

#[test]
fn test_callbacks_receive_each_group() {
    let mut set = EditableSet::from_entities(vec![
        customer("Angela", "Adams", 29),
        customer("Benny", "Bernanke", 34),
    ])
    .unwrap();
    let source = set.all_items().iter().map(|item| item.id()).collect::<Vec<_>>();
    set.item_mut(source[1])
        .unwrap()
        .write_by_name("last_name", "Smith")
        .unwrap();
    set.delete_item(source[0]).unwrap();
    set.add_new();

    let log = Rc::new(RefCell::new(Vec::new()));
    let (edits, adds, deletes) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
    let mut actions = ActionCallbacks::new()
        .on_edit(move |entity: &EntityHandle<Customer>| {
            edits
                .borrow_mut()
                .push(format!("edit {}", entity.borrow().last_name))
        })
        .on_add(move |_: &EntityHandle<Customer>| adds.borrow_mut().push("add".to_string()))
        .on_delete(move |entity: &EntityHandle<Customer>| {
            deletes
                .borrow_mut()
                .push(format!("delete {}", entity.borrow().first_name))
        });

    let changes = set.save(&mut actions).unwrap();

    assert_eq!(changes.total(), 3);
    assert_eq!(
        *log.borrow(),
        vec!["delete Angela", "edit Smith", "add"]
    );
}

#[test]
fn test_missing_callbacks_are_no_ops() {
    let mut set = EditableSet::from_entities(vec![customer("Angela", "Adams", 29)]).unwrap();
    let id = set.all_items()[0].id();
    set.delete_item(id).unwrap();

    let mut actions = ActionCallbacks::<Customer>::new();
    let changes = set.save(&mut actions).unwrap();
    assert_eq!(changes.deleted, 1);
    assert!(set.is_empty());
}

/// Store that records calls instead of keeping rows.
#[derive(Default)]
struct Recorder {
    calls: Vec<&'static str>,
}

impl PersistenceActions<Customer> for Recorder {
    fn on_edit(&mut self, _: &EntityHandle<Customer>) {
        self.calls.push("edit");
    }

    fn on_add(&mut self, _: &EntityHandle<Customer>) {
        self.calls.push("add");
    }

    fn on_delete(&mut self, _: &EntityHandle<Customer>) {
        self.calls.push("delete");
    }
}

#[test]
fn test_custom_actions_see_deletes_before_commit() {
    let mut set = EditableSet::from_entities(vec![
        customer("Angela", "Adams", 29),
        customer("Benny", "Bernanke", 34),
    ])
    .unwrap();
    let source = set.all_items().iter().map(|item| item.id()).collect::<Vec<_>>();
    set.add_new();
    set.item_mut(source[0])
        .unwrap()
        .write_by_name("age", 40i64)
        .unwrap();
    set.delete_item(source[1]).unwrap();

    let mut recorder = Recorder::default();
    set.save(&mut recorder).unwrap();

    assert_eq!(recorder.calls, vec!["delete", "edit", "add"]);
}

#[derive(Debug, Default)]
struct Tank {
    level: i64,
}

impl Entity for Tank {
    fn properties() -> Vec<PropertySpec<Self>> {
        vec![PropertySpec::read_write(
            "level",
            DataType::Integer,
            |t: &Tank| Value::Integer(t.level),
            |t: &mut Tank, value| {
                let level = value.as_i64().unwrap_or_default();
                if level > 100 {
                    return Err(EditError::ConstraintViolation("tank overflow".into()));
                }
                t.level = level;
                Ok(())
            },
        )]
    }
}

fn tank_store() -> InMemoryRepository<Tank> {
    InMemoryRepository::from_entities(vec![Tank { level: 10 }, Tank { level: 20 }])
}

fn stage_overflow_and_delete(
    store: &InMemoryRepository<Tank>,
    mode: CommitMode,
) -> EditableSet<Tank> {
    let mut set = EditableSet::with_registry(
        store.items().iter().cloned(),
        &AccessorRegistry::new(),
        EditConfig::new().commit_mode(mode),
    )
    .unwrap();
    let source = set.all_items().iter().map(|item| item.id()).collect::<Vec<_>>();
    set.item_mut(source[0])
        .unwrap()
        .write_by_name("level", 500i64)
        .unwrap();
    set.delete_item(source[1]).unwrap();
    set
}

#[test]
fn test_validate_first_save_failure_routes_nothing() {
    let mut store = tank_store();
    let mut set = stage_overflow_and_delete(&store, CommitMode::ValidateFirst);

    let deletes = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&deletes);
    let mut actions =
        ActionCallbacks::new().on_delete(move |_: &EntityHandle<Tank>| *seen.borrow_mut() += 1);

    let err = set.save(&mut actions).unwrap_err();
    assert!(matches!(err, EditError::CommitFailed { .. }));
    assert_eq!(*deletes.borrow(), 0);
    assert_eq!(set.len(), 2);
    assert_eq!(set.deleted_items().len(), 1);
    assert_eq!(set.original_items()[0].borrow().level, 10);

    let err = set.save(&mut store).unwrap_err();
    assert!(matches!(err, EditError::CommitFailed { .. }));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_sequential_save_failure_keeps_routed_deletes() {
    let mut store = tank_store();
    let mut set = stage_overflow_and_delete(&store, CommitMode::Sequential);

    assert!(set.save(&mut store).is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(set.len(), 1);
}
