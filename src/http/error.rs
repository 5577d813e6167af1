use std::{borrow::Cow, collections::BTreeMap};

use argon2::password_hash;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::{Display, From};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::{auth, db, guard, wtt};

/// Failure of a request, rendered as a JSON body with a matching status.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display("database error: {_0}")]
    #[from]
    Db(db::Error),

    #[display("password hashing failed: {_0}")]
    #[from]
    Crypto(password_hash::Error),

    #[display("{_0}")]
    Unauthenticated(String),

    #[display("invalid credentials")]
    InvalidCredentials,

    #[display("{_0}")]
    Forbidden(String),

    #[display("{_0}")]
    NotFound(String),

    #[display("invalid input")]
    #[from]
    Validation(FieldErrors),

    /// Request is well-formed but not acceptable in the current state.
    #[display("{_0}")]
    Rejected(String),

    #[display("{_0}")]
    Conflict(String),

    /// Body or query string that could not be read at all.
    #[display("{_0}")]
    Malformed(String),
}

impl Error {
    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_owned())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Db(e) => {
                error!(%e, "database failure");
                internal()
            }
            Self::Crypto(e) => {
                error!(%e, "password hashing failure");
                internal()
            }
            Self::Unauthenticated(detail) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail })))
            }
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Неверный логин или пароль" })),
            ),
            Self::Forbidden(detail) => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": detail })))
            }
            Self::NotFound(detail) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": detail })))
            }
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!(errors)))
            }
            Self::Rejected(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
            }
            Self::Conflict(detail) => {
                (StatusCode::CONFLICT, Json(json!({ "detail": detail })))
            }
            Self::Malformed(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail })))
            }
        }
        .into_response()
    }
}

fn internal() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
}

impl From<JsonRejection> for Error {
    fn from(e: JsonRejection) -> Self {
        match e {
            JsonRejection::JsonDataError(e) => {
                Self::Validation(FieldErrors::from_data_error(&e.body_text()))
            }
            e => Self::Malformed(e.body_text()),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(_: PathRejection) -> Self {
        FieldErrors::single("id", "Некорректный идентификатор.").into()
    }
}

impl From<QueryRejection> for Error {
    fn from(e: QueryRejection) -> Self {
        Self::Malformed(e.body_text())
    }
}

impl From<auth::Error> for Error {
    fn from(e: auth::Error) -> Self {
        use auth::Error as E;

        match e {
            E::Db(e) => Self::Db(e),
            E::Crypto(e) => Self::Crypto(e),
            E::InvalidCredentials => Self::InvalidCredentials,
            E::Unauthenticated => Self::Unauthenticated(
                guard::Denial::Unauthenticated.to_string(),
            ),
        }
    }
}

impl From<guard::Error> for Error {
    fn from(e: guard::Error) -> Self {
        use guard::{Denial, Error as E};

        match e {
            E::Db(e) => Self::Db(e),
            E::Denied(d @ Denial::Unauthenticated) => {
                Self::Unauthenticated(d.to_string())
            }
            E::Denied(d) => Self::Forbidden(d.to_string()),
        }
    }
}

impl From<wtt::Error> for Error {
    fn from(e: wtt::Error) -> Self {
        use wtt::Error as E;

        match e {
            E::Db(e) => Self::Db(e),
            E::UnknownEmployee => {
                FieldErrors::single("personnelNumber", e.to_string()).into()
            }
            E::DateChanged => FieldErrors::single("date", e.to_string()).into(),
            E::InvalidRange => {
                FieldErrors::single("endTime", e.to_string()).into()
            }
            E::AlreadyStarted | E::NotStarted | E::AlreadyEnded => {
                Self::Rejected(e.to_string())
            }
            E::NotFound => Self::NotFound(e.to_string()),
        }
    }
}

/// Per-field validation messages, serialized as `{"field": ["msg", ...]}`.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Cow<'static, str>, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(
        &mut self,
        field: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Records an error if `value` is longer than `max` characters.
    pub fn check_len(&mut self, field: &'static str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!(
                    "Убедитесь, что это значение содержит не более {max} \
                     символов."
                ),
            );
        }
    }

    /// Records an error if `value` is blank or longer than `max` characters.
    pub fn check_text(&mut self, field: &'static str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.add(field, "Обязательное поле.");
        } else {
            self.check_len(field, value, max);
        }
    }

    /// Attributes a body deserialization failure to the offending field.
    ///
    /// `detail` reads like `<context>: <path>: <message> at line L column C`,
    /// where the path is absent for errors at the top level.
    fn from_data_error(detail: &str) -> Self {
        let detail = detail.split_once(": ").map_or(detail, |(_, d)| d);
        let detail = detail.rsplit_once(" at line ").map_or(detail, |(d, _)| d);

        if let Some(field) = detail
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            return Self::single(field.to_owned(), "Обязательное поле.");
        }
        match detail.split_once(": ") {
            Some((path, _)) if !path.contains(char::is_whitespace) => {
                let field = path.split(['.', '[']).next().unwrap_or(path);
                Self::single(field.to_owned(), "Некорректное значение.")
            }
            _ => Self::single("non_field_errors", detail.to_owned()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fails with [`Error::Validation`] if anything was recorded.
    pub fn check(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}
