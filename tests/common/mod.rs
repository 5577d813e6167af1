#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use brigade::{
    api, config,
    db::{self, seed},
    http::{self, AppState},
    wtt,
};
use constcat::concat;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt as _;

pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

const COOKIE_NAME: &str = "sessionid";

const USERS_URL: &str = "/api/users/";
const EMPLOYEES_URL: &str = "/api/employees/";
const WTT_URL: &str = "/api/wtt";

/// Application over a freshly seeded in-memory store.
pub async fn app() -> Router {
    let store = Arc::new(db::Memory::new());
    seed::run(
        &*store,
        Some(&config::Bootstrap {
            admin_login: ADMIN_LOGIN.to_owned(),
            admin_password: ADMIN_PASSWORD.to_owned(),
        }),
    )
    .await
    .expect("failed to seed the store");

    http::router(Arc::new(AppState {
        store,
        session: config::Session {
            cookie_name: COOKIE_NAME.to_owned(),
            lifetime: Duration::from_secs(3600),
            secure: false,
        },
        clock: wtt::Clock::new(config::Clock::default())
            .expect("invalid default clock"),
    }))
}

/// Browser-like client keeping the session cookie between requests.
pub struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    pub fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    pub async fn admin(app: &Router) -> Self {
        Self::new(app).login(ADMIN_LOGIN, ADMIN_PASSWORD).await
    }

    pub async fn login(mut self, login: &str, password: &str) -> Self {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/login/",
                Some(json!({
                    "login": login,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "failed to log in as {login}");
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.cookie.is_some()
    }

    /// Sends a request, returning the status and the JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            req = req.header(header::COOKIE, format!("{COOKIE_NAME}={cookie}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("failed to build a request");

        let res = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("failed to send a request");

        for set_cookie in res.headers().get_all(header::SET_COOKIE) {
            let set_cookie =
                set_cookie.to_str().expect("non-ASCII Set-Cookie header");
            let pair = set_cookie.split(';').next().unwrap_or_default();
            if let Some(value) =
                pair.strip_prefix(concat!(COOKIE_NAME, "="))
            {
                self.cookie =
                    (!value.is_empty()).then(|| value.to_owned());
            }
        }

        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("failed to get a response");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response is not JSON")
        };
        (status, body)
    }

    /// Like [`Client::send`], but decodes successful responses.
    pub async fn call<T: DeserializeOwned>(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<T, StatusCode> {
        let (status, body) = self.send(method, uri, body).await;
        if !status.is_success() {
            return Err(status);
        }
        Ok(serde_json::from_value(body).expect("unexpected response shape"))
    }

    pub async fn get<T: DeserializeOwned>(
        &mut self,
        uri: &str,
    ) -> Result<T, StatusCode> {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &mut self,
        uri: &str,
        body: Value,
    ) -> Result<T, StatusCode> {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> StatusCode {
        self.send(Method::DELETE, uri, None).await.0
    }

    pub async fn add_user(
        &mut self,
        login: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<api::User, StatusCode> {
        self.post(
            USERS_URL,
            json!({
                "login": login,
                "password": password,
                "role": role,
            }),
        )
        .await
    }

    pub async fn users(&mut self) -> Result<Vec<api::User>, StatusCode> {
        self.get(USERS_URL).await
    }

    pub async fn add_employee(
        &mut self,
        full_name: &str,
        personnel_number: &str,
        user: Option<&str>,
    ) -> Result<api::Employee, StatusCode> {
        self.post(
            EMPLOYEES_URL,
            json!({
                "fullName": full_name,
                "personnelNumber": personnel_number,
                "phoneNumber": "+7 900 123-45-67",
                "email": "worker@example.com",
                "user": user,
            }),
        )
        .await
    }

    pub async fn start_work(
        &mut self,
        personnel_number: &str,
    ) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            concat!(WTT_URL, "/start/"),
            Some(json!({ "personnelNumber": personnel_number })),
        )
        .await
    }

    pub async fn stop_work(
        &mut self,
        personnel_number: &str,
    ) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            concat!(WTT_URL, "/stop/"),
            Some(json!({ "personnelNumber": personnel_number })),
        )
        .await
    }

    pub async fn list_work_time(
        &mut self,
        query: &str,
    ) -> Result<Vec<api::WorkTime>, StatusCode> {
        self.get(&format!("{}{query}", concat!(WTT_URL, "/listWTT/")))
            .await
    }
}

/// Logs in as a fresh user holding `role`.
pub async fn member(app: &Router, login: &str, role: &str) -> Client {
    const PASSWORD: &str = "password123";

    Client::admin(app)
        .await
        .add_user(login, PASSWORD, Some(role))
        .await
        .expect("failed to create a user");
    Client::new(app).login(login, PASSWORD).await
}
