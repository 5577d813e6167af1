use axum::{extract::State, http::StatusCode, Extension};
use serde::{Deserialize, Deserializer};
use time::{Date, Time};

use crate::{
    api,
    auth::Identity,
    db::{format, work_time, Employee, Store, WorkTime},
    wtt::{self, Changes, Filter},
};

use super::{
    employee::Directory, Error, FieldErrors, Json, Query, SharedAppState,
};

/// Depth of the caller's own history.
const MY_DAYS: i64 = 30;

fn view(
    directory: &Directory,
    record: WorkTime,
    employee: Employee,
) -> api::WorkTime {
    api::WorkTime {
        id: record.id,
        employee: directory.view(employee),
        date: record.date,
        start_time: record.start_time,
        end_time: record.end_time,
    }
}

async fn view_one(
    store: &dyn Store,
    record: WorkTime,
) -> Result<api::WorkTime, Error> {
    let employee = store
        .get_employee_by_id(record.employee)
        .await?
        .ok_or_else(Error::not_found)?;
    let directory = Directory::load(store).await?;
    Ok(view(&directory, record, employee))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInput {
    personnel_number: String,
}

pub async fn start(
    State(state): State<SharedAppState>,
    Json(ClockInput { personnel_number }): Json<ClockInput>,
) -> Result<(StatusCode, Json<api::WorkTime>), Error> {
    let (today, now) = state.clock.today();
    let record =
        wtt::start_work(&*state.store, &personnel_number, today, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(view_one(&*state.store, record).await?),
    ))
}

pub async fn stop(
    State(state): State<SharedAppState>,
    Json(ClockInput { personnel_number }): Json<ClockInput>,
) -> Result<Json<api::WorkTime>, Error> {
    let (today, now) = state.clock.today();
    let record =
        wtt::end_work(&*state.store, &personnel_number, today, now).await?;
    Ok(Json(view_one(&*state.store, record).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    id: Option<work_time::Id>,
    personnel_number: Option<String>,
    #[serde(default, with = "format::date::option")]
    date: Option<Date>,
    #[serde(default, with = "format::clock::option")]
    start_time: Option<Time>,
    #[serde(default, deserialize_with = "nullable_clock")]
    end_time: Option<Option<Time>>,
}

fn nullable_clock<'de, D>(
    deserializer: D,
) -> Result<Option<Option<Time>>, D::Error>
where
    D: Deserializer<'de>,
{
    format::clock::option::deserialize(deserializer).map(Some)
}

/// Corrects the times of a record found by `id`, or by `personnelNumber`
/// and `date` when no `id` is given. The owning employee never changes.
pub async fn update(
    State(state): State<SharedAppState>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<api::WorkTime>, Error> {
    let store = &*state.store;

    let id = match (input.id, input.personnel_number.as_deref(), input.date) {
        (Some(id), _, _) => id,
        (None, Some(personnel_number), Some(date)) => {
            wtt::find(store, personnel_number, date).await?.id
        }
        _ => {
            return Err(FieldErrors::single(
                "id",
                "Укажите id записи либо personnelNumber и date",
            )
            .into())
        }
    };

    let changes = Changes {
        date: input.date,
        start_time: input.start_time,
        end_time: input.end_time,
    };
    let record = wtt::update(store, id, changes).await?;
    Ok(Json(view_one(store, record).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteInput {
    personnel_number: String,
    #[serde(with = "format::date")]
    date: Date,
}

pub async fn delete(
    State(state): State<SharedAppState>,
    Json(DeleteInput {
        personnel_number,
        date,
    }): Json<DeleteInput>,
) -> Result<StatusCode, Error> {
    wtt::delete(&*state.store, &personnel_number, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    personnel_number: Option<String>,
    full_name: Option<String>,
}

pub async fn list(
    State(state): State<SharedAppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<api::WorkTime>>, Error> {
    let store = &*state.store;
    let filter = Filter {
        personnel_number: query.personnel_number.filter(|s| !s.is_empty()),
        full_name: query.full_name.filter(|s| !s.is_empty()),
    };

    let (records, directory) =
        tokio::try_join!(wtt::list(store, &filter), async {
            Directory::load(store).await.map_err(wtt::Error::from)
        })?;
    Ok(Json(
        records
            .into_iter()
            .map(|(record, employee)| view(&directory, record, employee))
            .collect(),
    ))
}

/// Recent records of the employee linked to the caller.
pub async fn my(
    State(state): State<SharedAppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<api::WorkTime>>, Error> {
    let store = &*state.store;
    let employee = store
        .get_employee_by_user(identity.user.id)
        .await?
        .ok_or_else(|| {
            Error::Rejected("User is not linked to any employee".to_owned())
        })?;

    let (today, _) = state.clock.today();
    let records = wtt::recent(store, &employee, today, MY_DAYS).await?;
    let directory = Directory::load(store).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| view(&directory, record, employee.clone()))
            .collect(),
    ))
}
