#![allow(dead_code)]

use joinery::prelude::*;
use joinery::{RelationRegistry, StaticSchema};
use std::sync::Mutex;

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

fn read<T: FromValue + Default>(row: &GroupedRow, column: &str) -> Result<T> {
    match row.value(column) {
        Some(value) => Option::<T>::from_value(value).map(Option::unwrap_or_default),
        None => Ok(T::default()),
    }
}

const UID_CASTERS: &[FieldCaster] = &[
    FieldCaster::Value(ValueCast::UuidBin(UuidBinCast::new())),
    FieldCaster::Save(SaveCast::UuidBin(UuidBinCast::new())),
];

const CREATED_CASTERS: &[FieldCaster] =
    &[FieldCaster::Save(SaveCast::CreatedTime(CreatedTime::now()))];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TABLE_ALIAS: &'static str = "u";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[FieldInfo::new("id").primary_key(true), FieldInfo::new("name")];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.id = read(row, "id")?;
        self.name = read(row, "name")?;
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("name", self.name.clone().into())]
    }

    fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tag {
    pub id: Option<i64>,
    pub title: String,
}

impl Entity for Tag {
    const TABLE_NAME: &'static str = "tags";
    const TABLE_ALIAS: &'static str = "t";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[FieldInfo::new("id").primary_key(true), FieldInfo::new("title")];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.id = read(row, "id")?;
        self.title = read(row, "title")?;
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("title", self.title.clone().into())]
    }

    fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Map table shared by several owner types, told apart by `type`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TagMap {
    pub owner_id: i64,
    pub tag_id: i64,
    pub kind: String,
}

impl Entity for TagMap {
    const TABLE_NAME: &'static str = "tag_maps";
    const TABLE_ALIAS: &'static str = "tm";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("owner_id"),
            FieldInfo::new("tag_id"),
            FieldInfo::new("kind").column("type"),
        ];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.owner_id = read(row, "owner_id")?;
        self.tag_id = read(row, "tag_id")?;
        self.kind = read(row, "type")?;
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("owner_id", self.owner_id.into()),
            ("tag_id", self.tag_id.into()),
            ("type", self.kind.clone().into()),
        ]
    }

    fn is_new(&self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Photo {
    pub id: Option<i64>,
    pub target_id: i64,
}

impl Entity for Photo {
    const TABLE_NAME: &'static str = "photos";
    const TABLE_ALIAS: &'static str = "ph";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[FieldInfo::new("id").primary_key(true), FieldInfo::new("target_id")];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.id = read(row, "id")?;
        self.target_id = read(row, "target_id")?;
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("target_id", self.target_id.into())]
    }

    fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub uid: Value,
    pub user_id: Option<i64>,
    pub title: String,
    pub created: Value,
    pub author: Option<User>,
    pub tags: Vec<Tag>,
}

impl Entity for Post {
    const TABLE_NAME: &'static str = "posts";
    const TABLE_ALIAS: &'static str = "p";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id").primary_key(true),
            FieldInfo::new("uid").casters(UID_CASTERS),
            FieldInfo::new("user_id"),
            FieldInfo::new("title"),
            FieldInfo::new("created").casters(CREATED_CASTERS),
        ];
        FIELDS
    }

    fn relations(registry: &mut RelationRegistry) {
        registry
            .register(Relation::many_to_one::<Post, User>("author").foreign_key("user_id", "id"))
            .register(Relation::many_to_one::<Post, User>("editor").foreign_key("editor_id", "id"))
            .register(
                Relation::many_to_many::<Post, TagMap, Tag>("tags")
                    .map_foreign_key("id", "owner_id")
                    .map_morph("type", "post")
                    .foreign_key("tag_id", "id")
                    .morph("state", 1),
            )
            .register(
                Relation::one_to_many::<Post, Photo>("photos")
                    .foreign_key("id", "target_id")
                    .morph("target_type", "post"),
            );
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.id = read(row, "id")?;
        self.uid = row.value("uid").cloned().unwrap_or(Value::Null);
        self.user_id = read(row, "user_id")?;
        self.title = read(row, "title")?;
        self.created = row.value("created").cloned().unwrap_or(Value::Null);
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("uid", self.uid.clone()),
            ("user_id", self.user_id.into()),
            ("title", self.title.clone().into()),
            ("created", self.created.clone()),
        ]
    }

    fn is_new(&self) -> bool {
        self.id.is_none()
    }

    fn attach_relation(&mut self, relation: &Relation, data: &GroupedRow) -> Result<()> {
        match relation.name.as_str() {
            "author" => {
                let mut user = User::default();
                user.hydrate(data)?;
                self.author = Some(user);
            }
            "tags" => {
                let mut tag = Tag::default();
                tag.hydrate(data)?;
                self.tags.push(tag);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Keyless audit row.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Event {
    pub message: String,
    pub created: Value,
}

impl Entity for Event {
    const TABLE_NAME: &'static str = "events";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("message"),
            FieldInfo::new("created").casters(CREATED_CASTERS),
        ];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.message = read(row, "message")?;
        self.created = row.value("created").cloned().unwrap_or(Value::Null);
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![("message", self.message.clone().into()), ("created", self.created.clone())]
    }

    fn is_new(&self) -> bool {
        true
    }
}

pub fn schema() -> StaticSchema {
    StaticSchema::new()
        .table("posts", ["id", "uid", "user_id", "title"])
        .table("users", ["id", "name"])
        .table("tags", ["id", "title"])
        .table("tag_maps", ["owner_id", "tag_id", "type"])
}

pub fn orm() -> Arc<Orm> {
    let orm = Orm::new(Arc::new(schema()));
    orm.register::<Post>();
    orm.register::<User>();
    orm.register::<Tag>();
    orm.register::<TagMap>();
    Arc::new(orm)
}

/// Connection returning canned rows and recording every statement.
#[derive(Debug, Default)]
pub struct MockConnection {
    rows: Vec<Row>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockConnection {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.log.lock().unwrap().push((sql.to_string(), params.to_vec()));
    }
}

#[allow(clippy::manual_async_fn)]
impl Connection for MockConnection {
    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Outcome<Vec<Row>, Error>> + Send {
        self.record(sql, params);
        let rows = self.rows.clone();
        async move { Outcome::Ok(rows) }
    }

    fn query_one(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Outcome<Option<Row>, Error>> + Send {
        self.record(sql, params);
        let row = self.rows.first().cloned();
        async move { Outcome::Ok(row) }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Outcome<u64, Error>> + Send {
        self.record(sql, params);
        async { Outcome::Ok(0) }
    }
}
