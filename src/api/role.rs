use serde::{Deserialize, Serialize};

pub use crate::db::{right, role::Id};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Role {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Right {
    pub id: right::Id,
    pub action: String,
}
