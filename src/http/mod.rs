//! HTTP surface: routing table, shared state and handlers.

mod application;
mod employee;
mod error;
mod extract;
mod job_title;
mod material;
mod object;
mod role;
mod session;
mod user;
mod work_time;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Deserializer};

use crate::{
    config,
    db::{session::Handle, Store},
    guard::{self, rights, Permission},
    wtt,
};

pub use self::error::{Error, FieldErrors};

use self::extract::{Json, Path, Query};

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub session: config::Session,
    pub clock: wtt::Clock,
}

/// Roles allowed to work with client applications.
const SALES: &[&str] = &[guard::ADMIN, guard::MARKETER];

const ADMIN: &[&str] = &[guard::ADMIN];

pub fn router(state: SharedAppState) -> Router {
    use Permission::{AnyRole, Authenticated, Right};

    let gate = |permission: Permission, route: MethodRouter<SharedAppState>| {
        route.route_layer(middleware::from_fn_with_state(
            (state.clone(), permission),
            guard::enforce,
        ))
    };

    Router::<SharedAppState>::new()
        .slashed("/api/login", post(session::login))
        .slashed("/api/logout", post(session::logout))
        .slashed("/api/check-login", get(session::check_login))
        .slashed(
            "/api/users",
            gate(Right(rights::VIEW_USERS), get(user::list))
                .merge(gate(Right(rights::MANAGE_USERS), post(user::create))),
        )
        .slashed(
            "/api/users/:id",
            gate(
                Right(rights::MANAGE_USERS),
                put(user::update).patch(user::update).delete(user::delete),
            ),
        )
        .slashed(
            "/api/roles",
            gate(Right(rights::VIEW_ROLES), get(role::list))
                .merge(gate(Right(rights::MANAGE_ROLES), post(role::create))),
        )
        .slashed(
            "/api/roles/:id",
            gate(
                Right(rights::MANAGE_ROLES),
                put(role::update).patch(role::update).delete(role::delete),
            ),
        )
        .slashed(
            "/api/roles/:id/rights",
            gate(Right(rights::VIEW_ROLES), get(role::list_granted)).merge(
                gate(Right(rights::MANAGE_ROLES), put(role::replace_granted)),
            ),
        )
        .slashed(
            "/api/rights",
            gate(Right(rights::VIEW_ROLES), get(role::list_rights)),
        )
        .slashed(
            "/api/job-titles",
            gate(Right(rights::VIEW_JOB_TITLES), get(job_title::list)).merge(
                gate(Right(rights::MANAGE_JOB_TITLES), post(job_title::create)),
            ),
        )
        .slashed(
            "/api/job-titles/:id",
            gate(
                Right(rights::MANAGE_JOB_TITLES),
                put(job_title::update)
                    .patch(job_title::update)
                    .delete(job_title::delete),
            ),
        )
        .slashed(
            "/api/objects",
            gate(Right(rights::VIEW_OBJECTS), get(object::list))
                .merge(gate(Right(rights::ADD_OBJECT), post(object::create))),
        )
        .slashed(
            "/api/objects/:id",
            gate(
                Right(rights::EDIT_OBJECT),
                put(object::update).patch(object::update),
            )
            .merge(gate(Right(rights::DELETE_OBJECT), delete(object::delete))),
        )
        .slashed(
            "/api/materials",
            gate(Right(rights::VIEW_MATERIALS), get(material::list)).merge(
                gate(Right(rights::ADD_MATERIAL), post(material::create)),
            ),
        )
        .slashed(
            "/api/materials/:id",
            gate(
                Right(rights::EDIT_MATERIAL),
                put(material::update).patch(material::update),
            )
            .merge(gate(
                Right(rights::DELETE_MATERIAL),
                delete(material::delete),
            )),
        )
        .slashed(
            "/api/employees",
            gate(Right(rights::VIEW_EMPLOYEES), get(employee::list)).merge(
                gate(Right(rights::ADD_EMPLOYEE), post(employee::create)),
            ),
        )
        .slashed(
            "/api/employees/:id",
            gate(
                Right(rights::EDIT_EMPLOYEE),
                put(employee::update).patch(employee::update),
            )
            .merge(gate(
                Right(rights::DELETE_EMPLOYEE),
                delete(employee::delete),
            )),
        )
        .slashed(
            "/api/application-types",
            gate(Authenticated, get(application::list_types)).merge(gate(
                Right(rights::MANAGE_APP_TYPES),
                post(application::create_type),
            )),
        )
        .slashed(
            "/api/application-types/:id",
            gate(
                Right(rights::MANAGE_APP_TYPES),
                put(application::update_type)
                    .patch(application::update_type)
                    .delete(application::delete_type),
            ),
        )
        .slashed(
            "/api/application-statuses",
            gate(Authenticated, get(application::list_statuses)).merge(gate(
                Right(rights::MANAGE_APP_STATUSES),
                post(application::create_status),
            )),
        )
        .slashed(
            "/api/application-statuses/:id",
            gate(
                Right(rights::MANAGE_APP_STATUSES),
                put(application::update_status)
                    .patch(application::update_status)
                    .delete(application::delete_status),
            ),
        )
        .slashed(
            "/api/applications",
            gate(AnyRole(SALES), get(application::list))
                .merge(post(application::create)),
        )
        .slashed(
            "/api/applications/:id",
            gate(
                AnyRole(SALES),
                put(application::update)
                    .patch(application::update)
                    .delete(application::delete),
            ),
        )
        .slashed(
            "/api/wtt/start",
            gate(Right(rights::TRACK_TIME), post(work_time::start)),
        )
        .slashed(
            "/api/wtt/stop",
            gate(Right(rights::TRACK_TIME), post(work_time::stop)),
        )
        .slashed(
            "/api/wtt/updateWTT",
            gate(
                AnyRole(ADMIN),
                put(work_time::update).patch(work_time::update),
            ),
        )
        .slashed(
            "/api/wtt/deleteWTT",
            gate(AnyRole(ADMIN), delete(work_time::delete)),
        )
        .slashed(
            "/api/wtt/listWTT",
            gate(Right(rights::VIEW_WTT), get(work_time::list)),
        )
        .slashed("/api/wtt/my", gate(Authenticated, get(work_time::my)))
        .with_state(state)
}

trait Slashed {
    /// Registers `route` at `path` both with and without a trailing slash.
    fn slashed(self, path: &str, route: MethodRouter<SharedAppState>) -> Self;
}

impl Slashed for Router<SharedAppState> {
    fn slashed(self, path: &str, route: MethodRouter<SharedAppState>) -> Self {
        self.route(path, route.clone())
            .route(&format!("{path}/"), route)
    }
}

/// Extracts the session handle from the configured cookie, if well-formed.
pub fn session_handle(
    jar: &CookieJar,
    config: &config::Session,
) -> Option<Handle> {
    jar.get(&config.cookie_name)?
        .value()
        .parse::<uuid::Uuid>()
        .ok()
        .map(Handle::from)
}

/// Tells an explicit `null` (`Some(None)`) from an absent field (`None`)
/// when paired with `#[serde(default)]`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
