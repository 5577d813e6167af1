pub mod common;

use axum::http::{Method, StatusCode};
use brigade::api;
use serde_json::json;

#[tokio::test]
async fn resolves_references_by_name() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    admin
        .post::<api::JobTitle>(
            "/api/job-titles/",
            json!({ "name": "Каменщик" }),
        )
        .await
        .unwrap();
    admin
        .post::<api::Object>(
            "/api/objects/",
            json!({ "name": "Склад №1", "address": "ул. Мира, 5" }),
        )
        .await
        .unwrap();

    let employee = admin
        .post::<api::Employee>(
            "/api/employees/",
            json!({
                "fullName": "Смирнов Алексей Викторович",
                "personnelNumber": "E700",
                "phoneNumber": "+7 900 765-43-21",
                "email": "smirnov@example.com",
                "jobTitle": "Каменщик",
                "object": "Склад №1",
            }),
        )
        .await
        .unwrap();
    assert_eq!(employee.job_title.as_deref(), Some("Каменщик"));
    assert_eq!(employee.object.as_deref(), Some("Склад №1"));
    assert_eq!(employee.user, None);
}

#[tokio::test]
async fn treats_blank_references_as_absent() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    admin
        .post::<api::JobTitle>(
            "/api/job-titles/",
            json!({ "name": "Каменщик" }),
        )
        .await
        .unwrap();

    let employee = admin
        .post::<api::Employee>(
            "/api/employees/",
            json!({
                "fullName": "Кузнецов Олег Ильич",
                "personnelNumber": "E710",
                "phoneNumber": "+7 900 111-00-11",
                "email": "kuznetsov@example.com",
                "jobTitle": "Каменщик",
                "object": " ",
                "user": "",
            }),
        )
        .await
        .unwrap();
    assert_eq!(employee.job_title.as_deref(), Some("Каменщик"));
    assert_eq!(employee.object, None);
    assert_eq!(employee.user, None);

    let updated = admin
        .call::<api::Employee>(
            Method::PATCH,
            &format!("/api/employees/{}/", employee.id),
            Some(json!({ "jobTitle": "", "user": "" })),
        )
        .await
        .unwrap();
    assert_eq!(updated.job_title, None);
    assert_eq!(updated.user, None);
}

#[tokio::test]
async fn validates_new_employee() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    admin.add_employee("Первый", "E100", None).await.unwrap();

    let (status, body) = admin
        .send(
            Method::POST,
            "/api/employees/",
            Some(json!({
                "fullName": "Второй",
                "personnelNumber": "E100",
                "phoneNumber": "+7 900 000-00-00",
                "email": "not-an-email",
                "jobTitle": "Космонавт",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "email": ["Введите правильный адрес электронной почты."],
            "jobTitle": ["Должность с таким названием не существует"],
            "personnelNumber": [
                "Сотрудник с таким табельным номером уже существует.",
            ],
        }),
    );
}

#[tokio::test]
async fn links_user_to_one_employee_only() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    admin
        .add_user("shared", "password123", Some("basic"))
        .await
        .unwrap();
    admin
        .add_employee("Первый", "E100", Some("shared"))
        .await
        .unwrap();

    let (status, body) = admin
        .send(
            Method::POST,
            "/api/employees/",
            Some(json!({
                "fullName": "Второй",
                "personnelNumber": "E200",
                "phoneNumber": "+7 900 000-00-00",
                "email": "second@example.com",
                "user": "shared",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "user": ["Пользователь уже связан с другим сотрудником"] }),
    );
}

#[tokio::test]
async fn updates_and_keeps_own_personnel_number() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    let employee = admin.add_employee("Первый", "E100", None).await.unwrap();

    let updated = admin
        .call::<api::Employee>(
            Method::PATCH,
            &format!("/api/employees/{}/", employee.id),
            Some(json!({
                "personnelNumber": "E100",
                "fullName": "Первый Исправленный",
            })),
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Первый Исправленный");
    assert_eq!(updated.personnel_number, "E100");
}

#[tokio::test]
async fn deleting_job_title_clears_it_from_employees() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    let job_title = admin
        .post::<api::JobTitle>("/api/job-titles/", json!({ "name": "Сварщик" }))
        .await
        .unwrap();
    let employee = admin.add_employee("Первый", "E100", None).await.unwrap();
    admin
        .call::<api::Employee>(
            Method::PATCH,
            &format!("/api/employees/{}/", employee.id),
            Some(json!({ "jobTitle": "Сварщик" })),
        )
        .await
        .unwrap();

    assert_eq!(
        admin
            .delete(&format!("/api/job-titles/{}/", job_title.id))
            .await,
        StatusCode::NO_CONTENT,
    );

    let employees = admin
        .get::<Vec<api::Employee>>("/api/employees/")
        .await
        .unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].job_title, None);
}

#[tokio::test]
async fn deleting_employee_drops_work_time() {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    let employee = admin.add_employee("Первый", "E100", None).await.unwrap();
    admin.start_work("E100").await;

    assert_eq!(
        admin.delete(&format!("/api/employees/{}/", employee.id)).await,
        StatusCode::NO_CONTENT,
    );
    assert!(admin.list_work_time("").await.unwrap().is_empty());
}
