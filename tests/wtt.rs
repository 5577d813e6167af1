pub mod common;

use axum::http::{Method, StatusCode};
use brigade::api;
use serde_json::json;
use time::macros::time;

async fn with_employee(
    personnel_number: &str,
) -> (axum::Router, common::Client) {
    let app = common::app().await;
    let mut admin = common::Client::admin(&app).await;
    admin
        .add_employee("Иванов Иван Иванович", personnel_number, None)
        .await
        .unwrap();
    (app, admin)
}

#[tokio::test]
async fn opens_and_closes_the_day() {
    let (_app, mut admin) = with_employee("E100").await;

    let (status, body) = admin.start_work("E100").await;
    assert_eq!(status, StatusCode::CREATED);
    let open = serde_json::from_value::<api::WorkTime>(body).unwrap();
    assert_eq!(open.employee.personnel_number, "E100");
    assert_eq!(open.end_time, None);

    let (status, body) = admin.stop_work("E100").await;
    assert_eq!(status, StatusCode::OK);
    let closed = serde_json::from_value::<api::WorkTime>(body).unwrap();
    assert_eq!(closed.id, open.id);
    assert_eq!(closed.start_time, open.start_time);
    assert!(closed.end_time.is_some_and(|end| end >= open.start_time));
}

#[tokio::test]
async fn refuses_to_start_twice() {
    let (_app, mut admin) = with_employee("E100").await;

    admin.start_work("E100").await;
    let (status, body) = admin.start_work("E100").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Рабочий день уже начат" }));
}

#[tokio::test]
async fn refuses_to_stop_unopened_or_closed_day() {
    let (_app, mut admin) = with_employee("E100").await;

    let (status, body) = admin.stop_work("E100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Рабочий день ещё не начат" }));

    admin.start_work("E100").await;
    admin.stop_work("E100").await;
    let (status, body) = admin.stop_work("E100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Рабочий день уже завершён" }));
}

#[tokio::test]
async fn reports_unknown_personnel_number() {
    let (_app, mut admin) = with_employee("E100").await;

    let (status, body) = admin.start_work("E404").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "personnelNumber": [
                "Сотрудник с таким табельным номером не найден",
            ],
        }),
    );
}

#[tokio::test]
async fn corrects_times_but_not_the_date() {
    let (_app, mut admin) = with_employee("E100").await;
    let (_, body) = admin.start_work("E100").await;
    let open = serde_json::from_value::<api::WorkTime>(body).unwrap();

    let (status, body) = admin
        .send(
            Method::PUT,
            "/api/wtt/updateWTT/",
            Some(json!({ "id": open.id, "date": "2000-01-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "date": ["Изменение даты не разрешено"] }));

    let (status, body) = admin
        .send(
            Method::PUT,
            "/api/wtt/updateWTT/",
            Some(json!({
                "id": open.id,
                "startTime": "18:00:00",
                "endTime": "09:00:00",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "endTime": ["startTime не может быть позже endTime"] }),
    );

    let fixed = admin
        .call::<api::WorkTime>(
            Method::PUT,
            "/api/wtt/updateWTT/",
            Some(json!({
                "personnelNumber": "E100",
                "date": open.date.to_string(),
                "startTime": "08:00:00",
                "endTime": "17:00:00",
            })),
        )
        .await
        .unwrap();
    assert_eq!(fixed.id, open.id);
    assert_eq!(fixed.start_time, time!(8:00));
    assert_eq!(fixed.end_time, Some(time!(17:00)));
}

#[tokio::test]
async fn accepts_times_without_seconds() {
    let (_app, mut admin) = with_employee("E100").await;
    let (_, body) = admin.start_work("E100").await;
    let open = serde_json::from_value::<api::WorkTime>(body).unwrap();

    let (status, body) = admin
        .send(
            Method::PUT,
            "/api/wtt/updateWTT/",
            Some(json!({
                "id": open.id,
                "startTime": "08:00",
                "endTime": "17:30",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["startTime"], "08:00:00");
    assert_eq!(body["endTime"], "17:30:00");
}

#[tokio::test]
async fn corrections_are_for_admins_only() {
    let (app, mut admin) = with_employee("E100").await;
    let (_, body) = admin.start_work("E100").await;
    let open = serde_json::from_value::<api::WorkTime>(body).unwrap();

    let mut foreman = common::member(&app, "foreman1", "foreman").await;
    let (status, _) = foreman
        .send(
            Method::PUT,
            "/api/wtt/updateWTT/",
            Some(json!({ "id": open.id, "startTime": "08:00:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = foreman.stop_work("E100").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deletes_record_by_personnel_number_and_date() {
    let (_app, mut admin) = with_employee("E100").await;
    let (_, body) = admin.start_work("E100").await;
    let open = serde_json::from_value::<api::WorkTime>(body).unwrap();
    let date = open.date.to_string();

    let delete = json!({ "personnelNumber": "E100", "date": date });
    let (status, _) = admin
        .send(Method::DELETE, "/api/wtt/deleteWTT/", Some(delete.clone()))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = admin
        .send(Method::DELETE, "/api/wtt/deleteWTT/", Some(delete))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = admin.start_work("E100").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn lists_records_by_employee() {
    let (_app, mut admin) = with_employee("E100").await;
    admin
        .add_employee("Сидорова Анна Павловна", "E200", None)
        .await
        .unwrap();
    admin.start_work("E100").await;
    admin.start_work("E200").await;

    let all = admin.list_work_time("").await.unwrap();
    assert_eq!(all.len(), 2);

    let by_number = admin
        .list_work_time("?personnelNumber=E200")
        .await
        .unwrap();
    assert_eq!(by_number.len(), 1);
    assert_eq!(by_number[0].employee.full_name, "Сидорова Анна Павловна");

    let by_name = admin
        .list_work_time("?fullName=%D0%B8%D0%B2%D0%B0%D0%BD%D0%BE%D0%B2")
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].employee.personnel_number, "E100");
}

#[tokio::test]
async fn shows_own_recent_records() {
    let (app, mut admin) = with_employee("E100").await;
    admin
        .add_user("ivanov", "password123", Some("basic"))
        .await
        .unwrap();
    admin
        .add_employee("Петров Пётр Петрович", "E300", Some("ivanov"))
        .await
        .unwrap();
    let mut worker =
        common::Client::new(&app).login("ivanov", "password123").await;

    let (status, _) = worker.start_work("E300").await;
    assert_eq!(status, StatusCode::CREATED);

    let mine = worker
        .get::<Vec<api::WorkTime>>("/api/wtt/my/")
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].employee.user.as_deref(), Some("ivanov"));

    let (status, body) = admin.send(Method::GET, "/api/wtt/my/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "User is not linked to any employee" }));
}
