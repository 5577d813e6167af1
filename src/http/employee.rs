use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;
use validator::ValidateEmail as _;

use crate::{
    api,
    db::{self, employee, job_title, object, user, Employee, Store},
};

use super::{nullable, Error, FieldErrors, Json, Path, SharedAppState};

const FULL_NAME_LEN: usize = 200;
const PERSONNEL_NUMBER_LEN: usize = 50;
const PHONE_NUMBER_LEN: usize = 20;
const EMAIL_LEN: usize = 254;

/// Natural keys of everything an employee may reference.
pub(super) struct Directory {
    job_titles: HashMap<job_title::Id, String>,
    objects: HashMap<object::Id, String>,
    users: HashMap<user::Id, String>,
}

impl Directory {
    pub(super) async fn load(store: &dyn Store) -> Result<Self, db::Error> {
        let (job_titles, objects, users) = tokio::try_join!(
            store.list_job_titles(),
            store.list_objects(),
            store.list_users(),
        )?;
        Ok(Self {
            job_titles: job_titles
                .into_iter()
                .map(|j| (j.id, j.name))
                .collect(),
            objects: objects.into_iter().map(|o| (o.id, o.name)).collect(),
            users: users.into_iter().map(|u| (u.id, u.login)).collect(),
        })
    }

    pub(super) fn view(&self, employee: Employee) -> api::Employee {
        api::Employee {
            id: employee.id,
            full_name: employee.full_name,
            personnel_number: employee.personnel_number,
            phone_number: employee.phone_number,
            email: employee.email,
            bank_details: employee.bank_details,
            passport: employee.passport,
            job_title: employee
                .job_title
                .and_then(|id| self.job_titles.get(&id).cloned()),
            object: employee
                .object
                .and_then(|id| self.objects.get(&id).cloned()),
            user: employee.user.and_then(|id| self.users.get(&id).cloned()),
        }
    }
}

pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::Employee>>, Error> {
    let store = &*state.store;
    let (employees, directory) =
        tokio::try_join!(store.list_employees(), Directory::load(store))?;
    Ok(Json(
        employees.into_iter().map(|e| directory.view(e)).collect(),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInput {
    full_name: String,
    personnel_number: String,
    phone_number: String,
    email: String,
    #[serde(default)]
    bank_details: String,
    #[serde(default)]
    passport: String,
    /// Job title name.
    #[serde(default)]
    job_title: Option<String>,
    /// Object name.
    #[serde(default)]
    object: Option<String>,
    /// Login of the user to link.
    #[serde(default)]
    user: Option<String>,
}

pub async fn create(
    State(state): State<SharedAppState>,
    Json(input): Json<CreateInput>,
) -> Result<(StatusCode, Json<api::Employee>), Error> {
    let store = &*state.store;

    let mut errors = FieldErrors::new();
    errors.check_text("fullName", &input.full_name, FULL_NAME_LEN);
    errors.check_text("phoneNumber", &input.phone_number, PHONE_NUMBER_LEN);
    check_email(&input.email, &mut errors);
    check_personnel_number(store, &input.personnel_number, None, &mut errors)
        .await?;
    let refs = References::resolve(
        store,
        None,
        input.job_title.as_deref(),
        input.object.as_deref(),
        input.user.as_deref(),
        &mut errors,
    )
    .await?;
    errors.check()?;

    let employee = Employee {
        id: employee::Id::new(),
        full_name: input.full_name,
        personnel_number: input.personnel_number,
        phone_number: input.phone_number,
        email: input.email,
        bank_details: input.bank_details,
        passport: input.passport,
        job_title: refs.job_title,
        object: refs.object,
        user: refs.user,
    };
    store.write_employee(&employee).await?;
    info!(personnel_number = %employee.personnel_number, "employee created");

    let directory = Directory::load(store).await?;
    Ok((StatusCode::CREATED, Json(directory.view(employee))))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    full_name: Option<String>,
    personnel_number: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
    bank_details: Option<String>,
    passport: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    object: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    user: Option<Option<String>>,
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<employee::Id>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<api::Employee>, Error> {
    let store = &*state.store;
    let mut employee = store
        .get_employee_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    let mut errors = FieldErrors::new();
    if let Some(full_name) = &input.full_name {
        errors.check_text("fullName", full_name, FULL_NAME_LEN);
    }
    if let Some(phone_number) = &input.phone_number {
        errors.check_text("phoneNumber", phone_number, PHONE_NUMBER_LEN);
    }
    if let Some(email) = &input.email {
        check_email(email, &mut errors);
    }
    if let Some(personnel_number) = &input.personnel_number {
        check_personnel_number(store, personnel_number, Some(id), &mut errors)
            .await?;
    }
    let refs = References::resolve(
        store,
        Some(id),
        input.job_title.clone().flatten().as_deref(),
        input.object.clone().flatten().as_deref(),
        input.user.clone().flatten().as_deref(),
        &mut errors,
    )
    .await?;
    errors.check()?;

    let UpdateInput {
        full_name,
        personnel_number,
        phone_number,
        email,
        bank_details,
        passport,
        job_title,
        object,
        user,
    } = input;
    if let Some(v) = full_name {
        employee.full_name = v;
    }
    if let Some(v) = personnel_number {
        employee.personnel_number = v;
    }
    if let Some(v) = phone_number {
        employee.phone_number = v;
    }
    if let Some(v) = email {
        employee.email = v;
    }
    if let Some(v) = bank_details {
        employee.bank_details = v;
    }
    if let Some(v) = passport {
        employee.passport = v;
    }
    if job_title.is_some() {
        employee.job_title = refs.job_title;
    }
    if object.is_some() {
        employee.object = refs.object;
    }
    if user.is_some() {
        employee.user = refs.user;
    }
    store.write_employee(&employee).await?;

    let directory = Directory::load(store).await?;
    Ok(Json(directory.view(employee)))
}

/// Removes the employee together with its work-time records.
pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<employee::Id>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_employee(id).await? {
        return Err(Error::not_found());
    }
    info!(%id, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if !email.validate_email() {
        errors.add("email", "Введите правильный адрес электронной почты.");
    } else {
        errors.check_len("email", email, EMAIL_LEN);
    }
}

async fn check_personnel_number(
    store: &dyn Store,
    personnel_number: &str,
    this: Option<employee::Id>,
    errors: &mut FieldErrors,
) -> Result<(), db::Error> {
    if personnel_number.trim().is_empty() {
        errors.add("personnelNumber", "Обязательное поле.");
        return Ok(());
    }
    errors.check_len(
        "personnelNumber",
        personnel_number,
        PERSONNEL_NUMBER_LEN,
    );
    let taken = store
        .get_employee_by_personnel_number(personnel_number)
        .await?
        .is_some_and(|other| Some(other.id) != this);
    if taken {
        errors.add(
            "personnelNumber",
            "Сотрудник с таким табельным номером уже существует.",
        );
    }
    Ok(())
}

/// Blank keys stand for "no reference".
fn given(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.trim().is_empty())
}

/// References named by natural key, resolved to ids.
#[derive(Default)]
struct References {
    job_title: Option<job_title::Id>,
    object: Option<object::Id>,
    user: Option<user::Id>,
}

impl References {
    async fn resolve(
        store: &dyn Store,
        this: Option<employee::Id>,
        job_title: Option<&str>,
        object: Option<&str>,
        user: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Result<Self, db::Error> {
        let mut refs = Self::default();

        if let Some(name) = given(job_title) {
            match store.get_job_title_by_name(name).await? {
                Some(j) => refs.job_title = Some(j.id),
                None => errors.add(
                    "jobTitle",
                    "Должность с таким названием не существует",
                ),
            }
        }
        if let Some(name) = given(object) {
            match store.get_object_by_name(name).await? {
                Some(o) => refs.object = Some(o.id),
                None => errors
                    .add("object", "Объект с таким названием не существует"),
            }
        }
        if let Some(login) = given(user) {
            match store.get_user_by_login(login).await? {
                Some(u) => {
                    let linked = store
                        .get_employee_by_user(u.id)
                        .await?
                        .is_some_and(|other| Some(other.id) != this);
                    if linked {
                        errors.add(
                            "user",
                            "Пользователь уже связан с другим сотрудником",
                        );
                    }
                    refs.user = Some(u.id);
                }
                None => errors
                    .add("user", "Пользователь с таким логином не существует"),
            }
        }

        Ok(refs)
    }
}
