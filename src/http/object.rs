use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::{
    api,
    db::{object, Object, Store},
};

use super::{nullable, Error, FieldErrors, Json, Path, SharedAppState};

const NAME_LEN: usize = 100;

pub(super) fn view(object: Object) -> api::Object {
    api::Object {
        id: object.id,
        name: object.name,
        address: object.address,
        description: object.description,
    }
}

pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::Object>>, Error> {
    let objects = state.store.list_objects().await?;
    Ok(Json(objects.into_iter().map(view).collect()))
}

#[derive(Deserialize)]
pub struct CreateInput {
    name: String,
    address: String,
    #[serde(default)]
    description: Option<String>,
}

pub async fn create(
    State(state): State<SharedAppState>,
    Json(CreateInput {
        name,
        address,
        description,
    }): Json<CreateInput>,
) -> Result<(StatusCode, Json<api::Object>), Error> {
    let mut errors = FieldErrors::new();
    check_name(&*state.store, &name, None, &mut errors).await?;
    if address.trim().is_empty() {
        errors.add("address", "Обязательное поле.");
    }
    errors.check()?;

    let object = Object {
        id: object::Id::new(),
        name,
        address,
        description,
    };
    state.store.write_object(&object).await?;
    info!(name = %object.name, "object created");

    Ok((StatusCode::CREATED, Json(view(object))))
}

#[derive(Deserialize)]
pub struct UpdateInput {
    name: Option<String>,
    address: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<object::Id>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<api::Object>, Error> {
    let mut object = state
        .store
        .get_object_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    let mut errors = FieldErrors::new();
    if let Some(name) = &input.name {
        check_name(&*state.store, name, Some(id), &mut errors).await?;
    }
    if input.address.as_deref().is_some_and(|a| a.trim().is_empty()) {
        errors.add("address", "Обязательное поле.");
    }
    errors.check()?;

    if let Some(name) = input.name {
        object.name = name;
    }
    if let Some(address) = input.address {
        object.address = address;
    }
    if let Some(description) = input.description {
        object.description = description;
    }
    state.store.write_object(&object).await?;

    Ok(Json(view(object)))
}

/// Removes the object along with every material stored at it.
pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<object::Id>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_object(id).await? {
        return Err(Error::not_found());
    }
    info!(%id, "object deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn check_name(
    store: &dyn Store,
    name: &str,
    this: Option<object::Id>,
    errors: &mut FieldErrors,
) -> Result<(), Error> {
    errors.check_len("name", name, NAME_LEN);
    if name.trim().is_empty() {
        errors.add("name", "Обязательное поле.");
    } else if store
        .get_object_by_name(name)
        .await?
        .is_some_and(|other| Some(other.id) != this)
    {
        errors.add("name", "Объект с таким названием уже существует.");
    }
    Ok(())
}
