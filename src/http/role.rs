use axum::{extract::State, http::StatusCode};
use itertools::Itertools as _;
use serde::Deserialize;
use tracing::info;

use crate::{
    api,
    db::{self, role, Role, Store},
};

use super::{nullable, Error, FieldErrors, Json, Path, SharedAppState};

const NAME_LEN: usize = 100;

fn view(role: Role) -> api::Role {
    api::Role {
        id: role.id,
        name: role.name,
        description: role.description,
    }
}

fn view_right(right: db::Right) -> api::role::Right {
    api::role::Right {
        id: right.id,
        action: right.action,
    }
}

pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::Role>>, Error> {
    let roles = state.store.list_roles().await?;
    Ok(Json(roles.into_iter().map(view).collect()))
}

#[derive(Deserialize)]
pub struct CreateInput {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

pub async fn create(
    State(state): State<SharedAppState>,
    Json(CreateInput { name, description }): Json<CreateInput>,
) -> Result<(StatusCode, Json<api::Role>), Error> {
    check_name(&*state.store, &name, None).await?;

    let role = Role {
        id: role::Id::new(),
        name,
        description,
    };
    state.store.write_role(&role).await?;
    info!(name = %role.name, "role created");

    Ok((StatusCode::CREATED, Json(view(role))))
}

#[derive(Deserialize)]
pub struct UpdateInput {
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<role::Id>,
    Json(UpdateInput { name, description }): Json<UpdateInput>,
) -> Result<Json<api::Role>, Error> {
    let mut role = state
        .store
        .get_role_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    if let Some(name) = name {
        check_name(&*state.store, &name, Some(id)).await?;
        role.name = name;
    }
    if let Some(description) = description {
        role.description = description;
    }
    state.store.write_role(&role).await?;

    Ok(Json(view(role)))
}

pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<role::Id>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_role(id).await? {
        return Err(Error::not_found());
    }
    info!(%id, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Whole catalogue of rights a role may be granted.
pub async fn list_rights(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::role::Right>>, Error> {
    let rights = state.store.list_rights().await?;
    Ok(Json(rights.into_iter().map(view_right).collect()))
}

pub async fn list_granted(
    State(state): State<SharedAppState>,
    Path(id): Path<role::Id>,
) -> Result<Json<Vec<api::role::Right>>, Error> {
    state
        .store
        .get_role_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;
    let rights = state.store.list_role_rights(id).await?;
    Ok(Json(rights.into_iter().map(view_right).collect()))
}

#[derive(Deserialize)]
pub struct GrantInput {
    /// Actions the role should hold from now on.
    rights: Vec<String>,
}

pub async fn replace_granted(
    State(state): State<SharedAppState>,
    Path(id): Path<role::Id>,
    Json(GrantInput { rights }): Json<GrantInput>,
) -> Result<Json<Vec<api::role::Right>>, Error> {
    let store = &*state.store;
    let role = store
        .get_role_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    let known = store.list_rights().await?;
    let mut errors = FieldErrors::new();
    let mut granted = Vec::with_capacity(rights.len());
    for action in rights.iter().unique() {
        match known.iter().find(|r| &r.action == action) {
            Some(right) => granted.push(right.id),
            None => {
                errors.add("rights", format!("Неизвестное право: {action}"))
            }
        }
    }
    errors.check()?;

    store.set_role_rights(role.id, &granted).await?;
    info!(role = %role.name, ?rights, "role rights replaced");

    let rights = store.list_role_rights(role.id).await?;
    Ok(Json(rights.into_iter().map(view_right).collect()))
}

async fn check_name(
    store: &dyn Store,
    name: &str,
    this: Option<role::Id>,
) -> Result<(), Error> {
    let mut errors = FieldErrors::new();
    errors.check_len("name", name, NAME_LEN);
    if name.trim().is_empty() {
        errors.add("name", "Обязательное поле.");
    } else if store
        .get_role_by_name(name)
        .await?
        .is_some_and(|other| Some(other.id) != this)
    {
        errors.add("name", "Роль с таким названием уже существует.");
    }
    errors.check()
}
