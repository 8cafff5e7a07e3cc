mod common;

use common::{Event, Post, User, orm};
use joinery::prelude::*;
use joinery::{Hydrator, StaticSchema, UuidWrapper, group_item};

const UID: &str = "0190a6a4-3b6e-7c3a-9f4e-2a1b3c4d5e6f";

fn joined_row(user: Option<(i64, &str)>) -> Row {
    let (user_id, name) = match user {
        Some((id, name)) => (Value::BigInt(id), Value::from(name)),
        None => (Value::Null, Value::Null),
    };
    Row::new(
        vec![
            "id".into(),
            "uid".into(),
            "user_id".into(),
            "title".into(),
            "u.id".into(),
            "u.name".into(),
        ],
        vec![
            Value::BigInt(1),
            Value::from(UID),
            user_id.clone(),
            Value::from("Hello"),
            user_id,
            name,
        ],
    )
}

#[test]
fn test_grouping_nests_prefixed_keys() {
    let mut row = GroupedRow::new();
    row.insert("a.b", 1i64);
    row.insert("a.c", 2i64);
    row.insert("d", 3i64);

    let grouped = group_item(Some(row), ".").unwrap();
    assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["d", "a"]);
    let a = grouped.nested("a").unwrap();
    assert_eq!(a.value("b"), Some(&Value::BigInt(1)));
    assert_eq!(a.value("c"), Some(&Value::BigInt(2)));
    assert_eq!(grouped.value("d"), Some(&Value::BigInt(3)));

    assert_eq!(
        grouped.to_json(),
        serde_json::json!({ "d": 3, "a": { "b": 1, "c": 2 } })
    );
}

#[test]
fn test_grouping_nothing_is_nothing() {
    assert!(group_item(None, ".").is_none());
}

#[cfg(feature = "uuid")]
#[test]
fn test_group_by_joins_hydrates_relations() {
    let query = select!(orm(), Post)
        .left_join::<User>(None)
        .group_by_joins(".")
        .unwrap();

    let posts: Vec<Post> = query
        .process_rows_as(vec![joined_row(Some((9, "Ann"))), joined_row(None)])
        .unwrap();

    assert_eq!(posts.len(), 2);
    let first = &posts[0];
    assert_eq!(first.id, Some(1));
    assert_eq!(first.title, "Hello");
    assert_eq!(first.uid, UuidWrapper::wrap(&Value::from(UID)).unwrap());
    assert_eq!(
        first.author,
        Some(User {
            id: Some(9),
            name: "Ann".into()
        })
    );

    // A LEFT JOIN miss yields an all-NULL group, which is not attached.
    assert!(posts[1].author.is_none());
}

#[test]
fn test_grouped_rows_without_hydration() {
    let query = select!(orm(), Post)
        .left_join::<User>(None)
        .group_by_joins(".")
        .unwrap();
    let rows: Vec<GroupedRow> = query.process_rows(vec![joined_row(Some((9, "Ann")))]).unwrap();
    let user = rows[0].nested("u").unwrap();
    assert_eq!(user.value("name"), Some(&Value::from("Ann")));
    assert!(!rows[0].contains_key("u.id"));
}

#[cfg(feature = "uuid")]
#[test]
fn test_custom_stage_runs_after_grouping() {
    let query = select!(orm(), Post)
        .left_join::<User>(None)
        .group_by_joins(".")
        .unwrap()
        .with_stage(Arc::new(
            |row: Option<GroupedRow>| -> Result<Option<GroupedRow>> {
                Ok(row.filter(|r| r.nested("u").is_some_and(|u| !u.value("id").is_some_and(Value::is_null))))
            },
        ));
    let posts: Vec<Post> = query
        .process_rows_as(vec![joined_row(None), joined_row(Some((2, "Bo")))])
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author.as_ref().map(|u| u.name.as_str()), Some("Bo"));
}

#[test]
fn test_hydrator_fills_existing_entity() {
    let hydrator = Hydrator::<User>::new(orm());
    let mut row = GroupedRow::new();
    row.insert("name", "Cy");
    let user = hydrator
        .hydrate_into(
            Some(row),
            User {
                id: Some(5),
                name: String::new(),
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Cy");
    assert_eq!(hydrator.hydrate(None).unwrap(), None);
}

#[cfg(feature = "uuid")]
#[test]
fn test_created_time_stamps_only_when_inserting() {
    let orm = orm();

    let stored = Post {
        id: Some(1),
        uid: Value::from(UID),
        ..Post::default()
    };
    let values = orm.extract_for_save(&stored, false).unwrap();
    assert_eq!(column(&values, "created"), &Value::Null);

    let values = orm.extract_for_save(&stored, true).unwrap();
    assert!(matches!(column(&values, "created"), Value::TimestampTz(_)));

    // Keyless entities are always stamped.
    let event = Event::default();
    let values = orm.extract_for_save(&event, false).unwrap();
    assert!(matches!(column(&values, "created"), Value::TimestampTz(_)));
}

#[test]
fn test_created_time_replaces_null_date() {
    let orm = Orm::new(Arc::new(StaticSchema::new().with_null_date("1000-01-01 00:00:00")));
    let event = Event {
        created: Value::from("1000-01-01"),
        ..Event::default()
    };
    let values = orm.extract_for_save(&event, false).unwrap();
    assert!(matches!(column(&values, "created"), Value::TimestampTz(_)));

    let kept = Event {
        created: Value::from("2024-05-01 10:00:00"),
        ..Event::default()
    };
    let values = orm.extract_for_save(&kept, false).unwrap();
    assert_eq!(column(&values, "created"), &Value::from("2024-05-01 10:00:00"));
}

#[test]
fn test_created_time_filter_ignores_input() {
    let cast = CreatedTime::at("+1 day");
    let Value::TimestampTz(tomorrow) = cast.filter(&Value::from("anything")).unwrap() else {
        panic!("expected a timestamp");
    };
    let Value::TimestampTz(now) = CreatedTime::now().current().unwrap() else {
        panic!("expected a timestamp");
    };
    assert!(tomorrow > now);
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid_bin_generates_or_stays_null() {
    let generated = UuidBinCast::new().cast_for_save(&Value::Null).unwrap();
    let Value::Bytes(bytes) = &generated else {
        panic!("expected binary uuid, got {generated:?}");
    };
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[6] >> 4, 7);

    let v4 = UuidBinCast::new()
        .version(UuidVersion::V4)
        .cast_for_save(&Value::from(""))
        .unwrap();
    let Value::Bytes(bytes) = &v4 else {
        panic!("expected binary uuid, got {v4:?}");
    };
    assert_eq!(bytes[6] >> 4, 4);

    assert_eq!(
        UuidBinCast::new().nullable().cast_for_save(&Value::Null).unwrap(),
        Value::Null
    );
    assert_eq!(
        UuidBinCast::new()
            .options(joinery::NULLABLE)
            .cast_for_save(&Value::from(""))
            .unwrap(),
        Value::Null
    );
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid_save_through_entity() {
    let orm = orm();
    let values = orm.extract_for_save(&Post::default(), true).unwrap();
    let Value::Bytes(bytes) = column(&values, "uid") else {
        panic!("expected generated binary uuid");
    };
    assert_eq!(bytes.len(), 16);

    let text = UuidCast::new().cast_for_save(&Value::from(UID)).unwrap();
    assert_eq!(text, Value::from(UID));
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid_hydrate_extract_commute() {
    let binary = UuidWrapper::to_binary(&Value::from(UID)).unwrap();
    for input in [Value::from(UID), binary] {
        for cast in [UuidCast::new().hydrate(&input), UuidBinCast::new().hydrate(&input)] {
            let hydrated = cast.unwrap();
            let extracted = UuidBinCast::new().extract(&input).unwrap();
            assert_eq!(
                UuidBinCast::new().extract(&hydrated).unwrap(),
                UuidBinCast::new().hydrate(&extracted).unwrap()
            );
            assert_eq!(
                UuidCast::new().extract(&hydrated).unwrap(),
                UuidCast::new().hydrate(&UuidCast::new().extract(&input).unwrap()).unwrap()
            );
        }
    }
}

fn column<'a>(values: &'a [(&'static str, Value)], name: &str) -> &'a Value {
    values
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, value)| value)
        .unwrap()
}
