/// Derive macro tests
///
/// Property introspection generated by #[derive(Entity)]
/// Run with: cargo test --test derive_entity_tests

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use editable_collections::{
    AccessorRegistry, DataType, EditError, EditableEntity, Entity, Value,
};
use uuid::Uuid;

#[derive(Debug, Default, Clone, Entity)]
#[entity(name = "Contact")]
struct Contact {
    #[entity(readonly)]
    id: Uuid,
    #[entity(rename = "display_name")]
    name: String,
    email: Option<String>,
    visits: u32,
    score: f64,
    active: bool,
    born: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
    #[entity(skip)]
    cache: Vec<u8>,
}

#[derive(Debug, Default, Entity)]
struct Marker;

fn contact() -> Contact {
    Contact {
        id: Uuid::new_v4(),
        name: "Angela Adams".into(),
        email: None,
        visits: 3,
        score: 4.5,
        active: true,
        born: NaiveDate::from_ymd_opt(1995, 4, 12),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        cache: vec![1, 2, 3],
    }
}

#[test]
fn test_derived_property_list() {
    let table = AccessorRegistry::new().table::<Contact>().unwrap();

    assert_eq!(Contact::type_name(), "Contact");
    assert_eq!(table.type_name(), "Contact");
    let described = table
        .descriptors()
        .map(|d| (d.name(), d.data_type(), d.is_nullable(), d.is_writable()))
        .collect::<Vec<_>>();

    assert_eq!(
        described,
        vec![
            ("id", DataType::Uuid, false, false),
            ("display_name", DataType::Text, false, true),
            ("email", DataType::Text, true, true),
            ("visits", DataType::Integer, false, true),
            ("score", DataType::Float, false, true),
            ("active", DataType::Boolean, false, true),
            ("born", DataType::Date, true, true),
            ("updated_at", DataType::Timestamp, false, true),
        ]
    );
    assert!(table.find("cache").is_none());
    assert!(table.find("name").is_none());
}

#[test]
fn test_unit_struct_has_no_properties() {
    let table = AccessorRegistry::new().table::<Marker>().unwrap();
    assert!(table.is_empty());
    assert!(Marker::type_name().ends_with("Marker"));
}

#[test]
fn test_derived_accessors_round_trip_through_commit() {
    let mut wrapper = EditableEntity::new(contact()).unwrap();
    let stamp = Utc.with_ymd_and_hms(2025, 6, 30, 8, 15, 0).unwrap();

    wrapper.write_by_name("display_name", "Angie").unwrap();
    wrapper.write_by_name("email", "angie@example.com").unwrap();
    wrapper.write_by_name("visits", 4i64).unwrap();
    wrapper.write_by_name("score", 5).unwrap();
    wrapper.write_by_name("active", false).unwrap();
    wrapper.write_by_name("born", Value::Null).unwrap();
    wrapper.write_by_name("updated_at", stamp).unwrap();
    assert_eq!(wrapper.pending_count(), 7);

    wrapper.commit().unwrap();

    let committed = wrapper.original().borrow();
    assert_eq!(committed.name, "Angie");
    assert_eq!(committed.email.as_deref(), Some("angie@example.com"));
    assert_eq!(committed.visits, 4);
    assert_eq!(committed.score, 5.0);
    assert!(!committed.active);
    assert_eq!(committed.born, None);
    assert_eq!(committed.updated_at, stamp);
    assert_eq!(committed.cache, vec![1, 2, 3]);
}

#[test]
fn test_readonly_field_is_exposed_but_not_written() {
    let original = contact();
    let id = original.id;
    let mut wrapper = EditableEntity::new(original).unwrap();

    assert_eq!(wrapper.read_by_name("id"), Some(Value::Uuid(id)));
    wrapper.write_by_name("id", Uuid::new_v4()).unwrap();
    assert!(!wrapper.has_changes());
}

#[test]
fn test_out_of_range_value_is_rejected_at_write() {
    let mut wrapper = EditableEntity::new(contact()).unwrap();

    let err = wrapper.write_by_name("visits", -1i64).unwrap_err();
    assert!(matches!(err, EditError::TypeMismatch(_)));
    assert!(!wrapper.has_changes());
}

#[test]
fn test_null_is_only_accepted_for_option_fields() {
    let mut wrapper = EditableEntity::new(contact()).unwrap();

    wrapper.write_by_name("email", Value::Null).unwrap();
    assert!(!wrapper.has_changes());

    let err = wrapper.write_by_name("display_name", Value::Null).unwrap_err();
    assert!(matches!(err, EditError::ConstraintViolation(_)));
}
