use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::{
    api,
    db::{
        self,
        application::{
            self, Label, Status, StatusId, Type, TypeId, DEFAULT_STATUS,
            DEFAULT_TYPE,
        },
        Application, Store,
    },
};

use super::{nullable, Error, FieldErrors, Json, Path, SharedAppState};

const NAME_LEN: usize = 100;
const FULL_NAME_LEN: usize = 200;
const PHONE_NUMBER_LEN: usize = 20;

fn view_label<I>(label: Label<I>) -> api::application::Label<I> {
    api::application::Label {
        id: label.id,
        name: label.name,
        description: label.description,
    }
}

pub async fn list_types(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::application::Type>>, Error> {
    let types = state.store.list_application_types().await?;
    Ok(Json(types.into_iter().map(view_label).collect()))
}

pub async fn list_statuses(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::application::Status>>, Error> {
    let statuses = state.store.list_application_statuses().await?;
    Ok(Json(statuses.into_iter().map(view_label).collect()))
}

#[derive(Deserialize)]
pub struct CreateLabelInput {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLabelInput {
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
}

fn check_label_name(name: &str, taken: bool) -> Result<(), Error> {
    let mut errors = FieldErrors::new();
    errors.check_len("name", name, NAME_LEN);
    if name.trim().is_empty() {
        errors.add("name", "Обязательное поле.");
    } else if taken {
        errors.add("name", "Запись с таким названием уже существует.");
    }
    errors.check()
}

pub async fn create_type(
    State(state): State<SharedAppState>,
    Json(CreateLabelInput { name, description }): Json<CreateLabelInput>,
) -> Result<(StatusCode, Json<api::application::Type>), Error> {
    let taken = state.store.get_application_type_by_name(&name).await?;
    check_label_name(&name, taken.is_some())?;

    let kind = Type {
        id: TypeId::new(),
        name,
        description,
    };
    state.store.write_application_type(&kind).await?;
    Ok((StatusCode::CREATED, Json(view_label(kind))))
}

pub async fn update_type(
    State(state): State<SharedAppState>,
    Path(id): Path<TypeId>,
    Json(UpdateLabelInput { name, description }): Json<UpdateLabelInput>,
) -> Result<Json<api::application::Type>, Error> {
    let store = &*state.store;
    let mut kind = store
        .get_application_type_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    if let Some(name) = name {
        let taken = store.get_application_type_by_name(&name).await?;
        check_label_name(&name, taken.is_some_and(|t| t.id != id))?;
        kind.name = name;
    }
    if let Some(description) = description {
        kind.description = description;
    }
    store.write_application_type(&kind).await?;
    Ok(Json(view_label(kind)))
}

pub async fn delete_type(
    State(state): State<SharedAppState>,
    Path(id): Path<TypeId>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_application_type(id).await? {
        return Err(Error::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_status(
    State(state): State<SharedAppState>,
    Json(CreateLabelInput { name, description }): Json<CreateLabelInput>,
) -> Result<(StatusCode, Json<api::application::Status>), Error> {
    let taken = state.store.get_application_status_by_name(&name).await?;
    check_label_name(&name, taken.is_some())?;

    let status = Status {
        id: StatusId::new(),
        name,
        description,
    };
    state.store.write_application_status(&status).await?;
    Ok((StatusCode::CREATED, Json(view_label(status))))
}

pub async fn update_status(
    State(state): State<SharedAppState>,
    Path(id): Path<StatusId>,
    Json(UpdateLabelInput { name, description }): Json<UpdateLabelInput>,
) -> Result<Json<api::application::Status>, Error> {
    let store = &*state.store;
    let mut status = store
        .get_application_status_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    if let Some(name) = name {
        let taken = store.get_application_status_by_name(&name).await?;
        check_label_name(&name, taken.is_some_and(|s| s.id != id))?;
        status.name = name;
    }
    if let Some(description) = description {
        status.description = description;
    }
    store.write_application_status(&status).await?;
    Ok(Json(view_label(status)))
}

pub async fn delete_status(
    State(state): State<SharedAppState>,
    Path(id): Path<StatusId>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_application_status(id).await? {
        return Err(Error::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Names of every type and status, for rendering applications.
struct Labels {
    types: HashMap<TypeId, String>,
    statuses: HashMap<StatusId, String>,
}

impl Labels {
    async fn load(store: &dyn Store) -> Result<Self, db::Error> {
        let (types, statuses) = tokio::try_join!(
            store.list_application_types(),
            store.list_application_statuses(),
        )?;
        Ok(Self {
            types: types.into_iter().map(|t| (t.id, t.name)).collect(),
            statuses: statuses.into_iter().map(|s| (s.id, s.name)).collect(),
        })
    }

    fn view(&self, application: Application) -> api::Application {
        api::Application {
            id: application.id,
            full_name: application.full_name,
            phone_number: application.phone_number,
            description: application.description,
            kind: application
                .kind
                .and_then(|id| self.types.get(&id).cloned()),
            status: application
                .status
                .and_then(|id| self.statuses.get(&id).cloned()),
            date: application.created_at,
        }
    }
}

/// Newest applications first.
pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::Application>>, Error> {
    let store = &*state.store;
    let (applications, labels) =
        tokio::try_join!(store.list_applications(), Labels::load(store))?;
    Ok(Json(
        applications.into_iter().map(|a| labels.view(a)).collect(),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInput {
    full_name: String,
    phone_number: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "type", alias = "type_name")]
    type_name: Option<String>,
    #[serde(default, alias = "status", alias = "status_name")]
    status_name: Option<String>,
}

/// Accepts an application from the public form.
///
/// Missing type and status fall back to the preconfigured defaults, which
/// must exist.
pub async fn create(
    State(state): State<SharedAppState>,
    Json(input): Json<CreateInput>,
) -> Result<(StatusCode, Json<api::Application>), Error> {
    let store = &*state.store;

    let mut errors = FieldErrors::new();
    errors.check_text("fullName", &input.full_name, FULL_NAME_LEN);
    errors.check_text("phoneNumber", &input.phone_number, PHONE_NUMBER_LEN);
    errors.check()?;

    let kind = match input.type_name.as_deref() {
        Some(name) => store
            .get_application_type_by_name(name)
            .await?
            .ok_or_else(|| {
                FieldErrors::single("type", "Тип заявки не найден")
            })?,
        None => store
            .get_application_type_by_name(DEFAULT_TYPE)
            .await?
            .ok_or_else(|| misconfigured("тип", DEFAULT_TYPE))?,
    };
    let status = match input.status_name.as_deref() {
        Some(name) => store
            .get_application_status_by_name(name)
            .await?
            .ok_or_else(|| {
                FieldErrors::single("status", "Статус заявки не найден")
            })?,
        None => store
            .get_application_status_by_name(DEFAULT_STATUS)
            .await?
            .ok_or_else(|| misconfigured("статус", DEFAULT_STATUS))?,
    };

    let application = Application {
        id: application::Id::new(),
        full_name: input.full_name,
        phone_number: input.phone_number,
        description: input.description,
        kind: Some(kind.id),
        status: Some(status.id),
        created_at: OffsetDateTime::now_utc(),
    };
    store.write_application(&application).await?;
    info!(id = %application.id, "application received");

    Ok((
        StatusCode::CREATED,
        Json(api::Application {
            id: application.id,
            full_name: application.full_name,
            phone_number: application.phone_number,
            description: application.description,
            kind: Some(kind.name),
            status: Some(status.name),
            date: application.created_at,
        }),
    ))
}

fn misconfigured(what: &str, name: &str) -> Error {
    error!(name, "default application {what} is missing");
    Error::Rejected(format!(
        "ConfigurationError: {what} заявки \"{name}\" не настроен"
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    full_name: Option<String>,
    phone_number: Option<String>,
    description: Option<String>,
    #[serde(default, alias = "type", deserialize_with = "nullable")]
    type_name: Option<Option<String>>,
    #[serde(default, alias = "status", deserialize_with = "nullable")]
    status_name: Option<Option<String>>,
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<application::Id>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<api::Application>, Error> {
    let store = &*state.store;
    let mut application = store
        .get_application_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    let mut errors = FieldErrors::new();
    if let Some(full_name) = input.full_name {
        errors.check_text("fullName", &full_name, FULL_NAME_LEN);
        application.full_name = full_name;
    }
    if let Some(phone_number) = input.phone_number {
        errors.check_text("phoneNumber", &phone_number, PHONE_NUMBER_LEN);
        application.phone_number = phone_number;
    }
    if let Some(description) = input.description {
        application.description = description;
    }
    match input.type_name {
        Some(Some(name)) => {
            match store.get_application_type_by_name(&name).await? {
                Some(kind) => application.kind = Some(kind.id),
                None => errors.add("type", "Тип заявки не найден"),
            }
        }
        Some(None) => application.kind = None,
        None => {}
    }
    match input.status_name {
        Some(Some(name)) => {
            match store.get_application_status_by_name(&name).await? {
                Some(status) => application.status = Some(status.id),
                None => errors.add("status", "Статус заявки не найден"),
            }
        }
        Some(None) => application.status = None,
        None => {}
    }
    errors.check()?;

    store.write_application(&application).await?;

    let labels = Labels::load(store).await?;
    Ok(Json(labels.view(application)))
}

pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<application::Id>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_application(id).await? {
        return Err(Error::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
