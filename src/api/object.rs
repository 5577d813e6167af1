use serde::{Deserialize, Serialize};

pub use crate::db::object::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Object {
    pub id: Id,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
}
