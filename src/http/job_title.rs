use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    api,
    db::{job_title, JobTitle, Store},
};

use super::{Error, FieldErrors, Json, Path, SharedAppState};

const NAME_LEN: usize = 100;

fn view(job_title: JobTitle) -> api::JobTitle {
    api::JobTitle {
        id: job_title.id,
        name: job_title.name,
    }
}

pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::JobTitle>>, Error> {
    let job_titles = state.store.list_job_titles().await?;
    Ok(Json(job_titles.into_iter().map(view).collect()))
}

#[derive(Deserialize)]
pub struct Input {
    name: String,
}

pub async fn create(
    State(state): State<SharedAppState>,
    Json(Input { name }): Json<Input>,
) -> Result<(StatusCode, Json<api::JobTitle>), Error> {
    check_name(&*state.store, &name, None).await?;

    let job_title = JobTitle {
        id: job_title::Id::new(),
        name,
    };
    state.store.write_job_title(&job_title).await?;

    Ok((StatusCode::CREATED, Json(view(job_title))))
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<job_title::Id>,
    Json(Input { name }): Json<Input>,
) -> Result<Json<api::JobTitle>, Error> {
    let mut job_title = state
        .store
        .get_job_title_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    check_name(&*state.store, &name, Some(id)).await?;
    job_title.name = name;
    state.store.write_job_title(&job_title).await?;

    Ok(Json(view(job_title)))
}

pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<job_title::Id>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_job_title(id).await? {
        return Err(Error::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn check_name(
    store: &dyn Store,
    name: &str,
    this: Option<job_title::Id>,
) -> Result<(), Error> {
    let mut errors = FieldErrors::new();
    errors.check_len("name", name, NAME_LEN);
    if name.trim().is_empty() {
        errors.add("name", "Обязательное поле.");
    } else if store
        .get_job_title_by_name(name)
        .await?
        .is_some_and(|other| Some(other.id) != this)
    {
        errors.add("name", "Должность с таким названием уже существует.");
    }
    errors.check()
}
