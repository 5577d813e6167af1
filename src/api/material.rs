use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api;

pub use crate::db::material::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Id,
    pub name: String,
    pub amount: Decimal,
    /// Name of the object the material is stored at.
    pub object: String,
    pub object_data: api::Object,
}
