use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::{
    api,
    db::{
        self,
        role,
        user::{self, PasswordHash},
        Store, User,
    },
};

use super::{nullable, Error, FieldErrors, Json, Path, SharedAppState};

const LOGIN_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;

pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::User>>, Error> {
    let (users, roles) =
        tokio::try_join!(state.store.list_users(), state.store.list_roles())?;
    let roles = roles
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect::<HashMap<_, _>>();

    Ok(Json(
        users
            .into_iter()
            .map(|u| api::User {
                role: u.role.and_then(|id| roles.get(&id).cloned()),
                id: u.id,
                login: u.login,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct CreateInput {
    login: String,
    password: String,
    #[serde(default)]
    role: Option<String>,
}

pub async fn create(
    State(state): State<SharedAppState>,
    Json(CreateInput {
        login,
        password,
        role,
    }): Json<CreateInput>,
) -> Result<(StatusCode, Json<api::User>), Error> {
    let store = &*state.store;

    let mut errors = FieldErrors::new();
    check_login(store, &login, None, &mut errors).await?;
    check_password(&password, &mut errors);
    let role = resolve_role(store, role.as_deref(), &mut errors).await?;
    errors.check()?;

    let user = User {
        id: user::Id::new(),
        login,
        password_hash: PasswordHash::new(&password)?,
        role: role.as_ref().map(|r| r.id),
    };
    store.write_user(&user).await?;
    info!(login = %user.login, "user created");

    Ok((
        StatusCode::CREATED,
        Json(api::User {
            id: user.id,
            login: user.login,
            role: role.map(|r| r.name),
        }),
    ))
}

#[derive(Deserialize)]
pub struct UpdateInput {
    login: Option<String>,
    password: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    role: Option<Option<String>>,
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<user::Id>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<api::User>, Error> {
    let store = &*state.store;
    let mut user = store
        .get_user_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    let mut errors = FieldErrors::new();
    if let Some(login) = &input.login {
        check_login(store, login, Some(id), &mut errors).await?;
    }
    if let Some(password) = &input.password {
        check_password(password, &mut errors);
    }
    let role = match &input.role {
        Some(name) => {
            Some(resolve_role(store, name.as_deref(), &mut errors).await?)
        }
        None => None,
    };
    errors.check()?;

    if let Some(login) = input.login {
        user.login = login;
    }
    if let Some(password) = &input.password {
        user.password_hash = PasswordHash::new(password)?;
    }
    if let Some(role) = &role {
        user.role = role.as_ref().map(|r| r.id);
    }
    store.write_user(&user).await?;

    let role = match role {
        Some(role) => role.map(|r| r.name),
        None => role_name(store, user.role).await?,
    };
    Ok(Json(api::User {
        id: user.id,
        login: user.login,
        role,
    }))
}

pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<user::Id>,
) -> Result<StatusCode, Error> {
    let store = &*state.store;

    if let Some(employee) = store.get_employee_by_user(id).await? {
        return Err(Error::Conflict(format!(
            "Невозможно удалить пользователя: он связан с сотрудником {} ({})",
            employee.full_name, employee.personnel_number,
        )));
    }
    if !store.delete_user(id).await? {
        return Err(Error::not_found());
    }
    info!(%id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn check_login(
    store: &dyn Store,
    login: &str,
    this: Option<user::Id>,
    errors: &mut FieldErrors,
) -> Result<(), db::Error> {
    if login.trim().is_empty() {
        errors.add("login", "Обязательное поле.");
        return Ok(());
    }
    errors.check_len("login", login, LOGIN_LEN);
    let taken = store
        .get_user_by_login(login)
        .await?
        .is_some_and(|other| Some(other.id) != this);
    if taken {
        errors.add("login", "Пользователь с таким логином уже существует.");
    }
    Ok(())
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Пароль должен содержать минимум 8 символов");
    }
}

/// Looks up the role by name, recording an error if there is none.
async fn resolve_role(
    store: &dyn Store,
    name: Option<&str>,
    errors: &mut FieldErrors,
) -> Result<Option<db::Role>, db::Error> {
    let Some(name) = name else {
        return Ok(None);
    };
    let role = store.get_role_by_name(name).await?;
    if role.is_none() {
        errors.add("role", "Роль с таким названием не существует");
    }
    Ok(role)
}

async fn role_name(
    store: &dyn Store,
    role: Option<role::Id>,
) -> Result<Option<String>, db::Error> {
    Ok(match role {
        Some(id) => store.get_role_by_id(id).await?.map(|r| r.name),
        None => None,
    })
}
