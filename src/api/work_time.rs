use serde::{Deserialize, Serialize};
use time::{Date, Time};

use crate::{api, db::format};

pub use crate::db::work_time::Id;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkTime {
    pub id: Id,
    pub employee: api::Employee,
    #[serde(with = "format::date")]
    pub date: Date,
    #[serde(with = "format::clock")]
    pub start_time: Time,
    #[serde(with = "format::clock::option")]
    pub end_time: Option<Time>,
}
