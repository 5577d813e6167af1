use serde::{Deserialize, Serialize};

pub use crate::db::job_title::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JobTitle {
    pub id: Id,
    pub name: String,
}
