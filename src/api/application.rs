use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use crate::db::application::{Id, StatusId, TypeId};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Label<I> {
    pub id: I,
    pub name: String,
    pub description: Option<String>,
}

pub type Type = Label<TypeId>;

pub type Status = Label<StatusId>;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Id,
    pub full_name: String,
    pub phone_number: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}
