use serde::{Deserialize, Serialize};

pub use crate::db::employee::Id;

/// Employee with its references resolved to their natural keys.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Id,
    pub full_name: String,
    pub personnel_number: String,
    pub phone_number: String,
    pub email: String,
    pub bank_details: String,
    pub passport: String,
    /// Job title name.
    pub job_title: Option<String>,
    /// Object name.
    pub object: Option<String>,
    /// Login of the linked user.
    pub user: Option<String>,
}
