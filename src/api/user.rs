use serde::{Deserialize, Serialize};

pub use crate::db::user::Id;

/// User as seen by clients. The password hash never leaves the server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: Id,
    pub login: String,
    /// Name of the assigned role.
    pub role: Option<String>,
}
