//! Entities shared by the unit tests.

use crate::Result;
use crate::cast::{CreatedTime, FieldCaster, SaveCast, UuidBinCast, UuidCast, ValueCast};
use crate::entity::Entity;
use crate::field::FieldInfo;
use crate::grouped::GroupedRow;
use crate::relation::{Relation, RelationRegistry};
use crate::row::FromValue;
use crate::value::Value;

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

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PostTag {
    pub post_id: i64,
    pub tag_id: i64,
}

impl Entity for PostTag {
    const TABLE_NAME: &'static str = "post_tags";
    const TABLE_ALIAS: &'static str = "pt";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[FieldInfo::new("post_id"), FieldInfo::new("tag_id")];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.post_id = read(row, "post_id")?;
        self.tag_id = read(row, "tag_id")?;
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![("post_id", self.post_id.into()), ("tag_id", self.tag_id.into())]
    }

    fn is_new(&self) -> bool {
        true
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
                Relation::many_to_many::<Post, PostTag, Tag>("tags")
                    .map_foreign_key("id", "post_id")
                    .map_morph("type", "post")
                    .foreign_key("tag_id", "id"),
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

/// A keyless table without an explicit alias.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Log {
    pub message: String,
    pub created: Value,
}

impl Entity for Log {
    const TABLE_NAME: &'static str = "logs";

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

const CODE_CASTERS: &[FieldCaster] = &[
    FieldCaster::Value(ValueCast::Uuid(UuidCast::new())),
    FieldCaster::Save(SaveCast::Uuid(UuidCast::new())),
];

/// Keyed by a text UUID.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    pub code: Value,
    pub body: String,
}

impl Entity for Document {
    const TABLE_NAME: &'static str = "documents";
    const TABLE_ALIAS: &'static str = "d";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("code").primary_key(true).casters(CODE_CASTERS),
            FieldInfo::new("body"),
        ];
        FIELDS
    }

    fn hydrate(&mut self, row: &GroupedRow) -> Result<()> {
        self.code = row.value("code").cloned().unwrap_or(Value::Null);
        self.body = read(row, "body")?;
        Ok(())
    }

    fn extract(&self) -> Vec<(&'static str, Value)> {
        vec![("code", self.code.clone()), ("body", self.body.clone().into())]
    }

    fn is_new(&self) -> bool {
        self.code.is_falsy()
    }
}
