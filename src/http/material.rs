use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    api,
    db::{self, material, Material, Object, Store},
};

use super::{object, Error, FieldErrors, Json, Path, SharedAppState};

const NAME_LEN: usize = 100;

/// Upper bound of the amount, as in `NUMERIC(10, 2)`.
const AMOUNT_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

fn view(material: Material, object: Object) -> api::Material {
    api::Material {
        id: material.id,
        name: material.name,
        amount: material.amount,
        object: object.name.clone(),
        object_data: object::view(object),
    }
}

pub async fn list(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<api::Material>>, Error> {
    let (materials, objects) = tokio::try_join!(
        state.store.list_materials(),
        state.store.list_objects(),
    )?;
    let objects = objects
        .into_iter()
        .map(|o| (o.id, o))
        .collect::<HashMap<_, _>>();

    Ok(Json(
        materials
            .into_iter()
            .filter_map(|m| {
                let object = objects.get(&m.object)?.clone();
                Some(view(m, object))
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct CreateInput {
    name: String,
    amount: Decimal,
    /// Object name.
    object: String,
}

pub async fn create(
    State(state): State<SharedAppState>,
    Json(CreateInput {
        name,
        amount,
        object,
    }): Json<CreateInput>,
) -> Result<(StatusCode, Json<api::Material>), Error> {
    let mut errors = FieldErrors::new();
    errors.check_text("name", &name, NAME_LEN);
    check_amount(amount, &mut errors);
    let object = resolve_object(&*state.store, &object, &mut errors).await?;
    errors.check()?;
    let Some(object) = object else {
        return Err(Error::not_found());
    };

    let material = Material {
        id: material::Id::new(),
        name,
        amount: amount.round_dp(2),
        object: object.id,
    };
    state.store.write_material(&material).await?;

    Ok((StatusCode::CREATED, Json(view(material, object))))
}

#[derive(Deserialize)]
pub struct UpdateInput {
    name: Option<String>,
    amount: Option<Decimal>,
    object: Option<String>,
}

pub async fn update(
    State(state): State<SharedAppState>,
    Path(id): Path<material::Id>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<api::Material>, Error> {
    let store = &*state.store;
    let mut material = store
        .get_material_by_id(id)
        .await?
        .ok_or_else(Error::not_found)?;

    let mut errors = FieldErrors::new();
    if let Some(name) = &input.name {
        errors.check_text("name", name, NAME_LEN);
    }
    if let Some(amount) = input.amount {
        check_amount(amount, &mut errors);
    }
    let moved_to = match &input.object {
        Some(name) => resolve_object(store, name, &mut errors).await?,
        None => None,
    };
    errors.check()?;

    if let Some(name) = input.name {
        material.name = name;
    }
    if let Some(amount) = input.amount {
        material.amount = amount.round_dp(2);
    }
    let object = match moved_to {
        Some(object) => object,
        None => store
            .get_object_by_id(material.object)
            .await?
            .ok_or_else(Error::not_found)?,
    };
    material.object = object.id;
    store.write_material(&material).await?;

    Ok(Json(view(material, object)))
}

pub async fn delete(
    State(state): State<SharedAppState>,
    Path(id): Path<material::Id>,
) -> Result<StatusCode, Error> {
    if !state.store.delete_material(id).await? {
        return Err(Error::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

fn check_amount(amount: Decimal, errors: &mut FieldErrors) {
    if amount.is_sign_negative() && !amount.is_zero() {
        errors.add("amount", "Количество не может быть отрицательным.");
    } else if amount.round_dp(2) >= AMOUNT_LIMIT {
        errors.add(
            "amount",
            "Убедитесь, что в числе не больше 8 знаков перед запятой.",
        );
    }
}

async fn resolve_object(
    store: &dyn Store,
    name: &str,
    errors: &mut FieldErrors,
) -> Result<Option<Object>, db::Error> {
    let object = store.get_object_by_name(name).await?;
    if object.is_none() {
        errors.add("object", "Объект с таким названием не существует");
    }
    Ok(object)
}
