//! Authorization guard.
//!
//! Every route declares a [`Permission`]; [`enforce`] resolves the caller's
//! session, checks the permission against the role/right table and hands the
//! resolved [`Identity`] to the handler as a request extension.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use derive_more::{Display, From};
use tracing::warn;

use crate::{
    auth::{self, Identity},
    db::{self, Store},
    http::{self, SharedAppState},
};

/// Catalogue of rights known to the system.
pub mod rights {
    pub const TRACK_TIME: &str = "track_time";
    pub const VIEW_WTT: &str = "view_wtt";

    pub const VIEW_EMPLOYEES: &str = "view_employees";
    pub const ADD_EMPLOYEE: &str = "add_employee";
    pub const EDIT_EMPLOYEE: &str = "edit_employee";
    pub const DELETE_EMPLOYEE: &str = "delete_employee";

    pub const VIEW_OBJECTS: &str = "view_objects";
    pub const ADD_OBJECT: &str = "add_object";
    pub const EDIT_OBJECT: &str = "edit_object";
    pub const DELETE_OBJECT: &str = "delete_object";

    pub const VIEW_MATERIALS: &str = "view_materials";
    pub const ADD_MATERIAL: &str = "add_material";
    pub const EDIT_MATERIAL: &str = "edit_material";
    pub const DELETE_MATERIAL: &str = "delete_material";

    pub const VIEW_JOB_TITLES: &str = "view_job_titles";
    pub const MANAGE_JOB_TITLES: &str = "manage_job_titles";

    pub const MANAGE_APP_TYPES: &str = "manage_app_types";
    pub const MANAGE_APP_STATUSES: &str = "manage_app_statuses";

    pub const VIEW_USERS: &str = "view_users";
    pub const MANAGE_USERS: &str = "manage_users";

    pub const VIEW_ROLES: &str = "view_roles";
    pub const MANAGE_ROLES: &str = "manage_roles";

    pub const ALL: &[&str] = &[
        TRACK_TIME,
        VIEW_WTT,
        VIEW_EMPLOYEES,
        ADD_EMPLOYEE,
        EDIT_EMPLOYEE,
        DELETE_EMPLOYEE,
        VIEW_OBJECTS,
        ADD_OBJECT,
        EDIT_OBJECT,
        DELETE_OBJECT,
        VIEW_MATERIALS,
        ADD_MATERIAL,
        EDIT_MATERIAL,
        DELETE_MATERIAL,
        VIEW_JOB_TITLES,
        MANAGE_JOB_TITLES,
        MANAGE_APP_TYPES,
        MANAGE_APP_STATUSES,
        VIEW_USERS,
        MANAGE_USERS,
        VIEW_ROLES,
        MANAGE_ROLES,
    ];
}

pub const ADMIN: &str = "admin";
pub const MARKETER: &str = "marketer";

/// What a route demands from its caller.
#[derive(Clone, Copy, Debug)]
pub enum Permission {
    Authenticated,

    /// The caller's role must hold this right.
    Right(&'static str),

    /// The caller's role must be one of these.
    AnyRole(&'static [&'static str]),
}

#[derive(Debug, Display, Eq, PartialEq)]
pub enum Denial {
    #[display("Authentication credentials were not provided.")]
    Unauthenticated,

    #[display("User has no assigned role.")]
    NoRole,

    #[display("{_0}")]
    Forbidden(String),
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("database error: {_0}")]
    #[from]
    Db(db::Error),

    #[display("{_0}")]
    #[from]
    Denied(Denial),
}

/// Allows iff a role/right row exists for the caller's role and `right`.
pub async fn authorize(
    store: &dyn Store,
    identity: Option<&Identity>,
    right: &str,
) -> Result<(), Error> {
    let identity = identity.ok_or(Denial::Unauthenticated)?;
    let role = identity.role.as_ref().ok_or(Denial::NoRole)?;
    if !store.role_has_right(role.id, right).await? {
        return Err(Denial::Forbidden(format!(
            "Access denied: missing '{right}' permission."
        ))
        .into());
    }
    Ok(())
}

pub fn has_any_role(identity: &Identity, roles: &[&str]) -> bool {
    identity.role_name().is_some_and(|name| roles.contains(&name))
}

pub async fn check(
    store: &dyn Store,
    identity: Option<&Identity>,
    permission: Permission,
) -> Result<(), Error> {
    match permission {
        Permission::Authenticated => {
            identity.ok_or(Denial::Unauthenticated)?;
            Ok(())
        }
        Permission::Right(right) => authorize(store, identity, right).await,
        Permission::AnyRole(roles) => {
            let identity = identity.ok_or(Denial::Unauthenticated)?;
            if identity.role.is_none() {
                return Err(Denial::NoRole.into());
            }
            if !has_any_role(identity, roles) {
                return Err(Denial::Forbidden(format!(
                    "Access denied: one of roles {roles:?} is required."
                ))
                .into());
            }
            Ok(())
        }
    }
}

/// Middleware gating a route behind `permission`.
pub async fn enforce(
    State((state, permission)): State<(SharedAppState, Permission)>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, http::Error> {
    let handle = http::session_handle(&jar, &state.session);
    let identity = match auth::resolve(&*state.store, handle).await {
        Ok(identity) => Some(identity),
        Err(auth::Error::Unauthenticated) => None,
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = check(&*state.store, identity.as_ref(), permission).await {
        if let Error::Denied(denial) = &e {
            warn!(
                uri = %req.uri(),
                login = identity.as_ref().map(|i| i.user.login.as_str()),
                %denial,
                "access denied"
            );
        }
        return Err(e.into());
    }

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use crate::db::{
        right, role, user, user::PasswordHash, Memory, Right, RightStore as _,
        Role, RoleStore as _, User,
    };

    use super::*;

    async fn foreman() -> (Memory, Identity) {
        let store = Memory::new();
        let role = Role {
            id: role::Id::new(),
            name: "foreman".to_owned(),
            description: None,
        };
        store.write_role(&role).await.unwrap();
        for action in [rights::ADD_OBJECT, rights::DELETE_OBJECT] {
            store
                .write_right(&Right {
                    id: right::Id::new(),
                    action: action.to_owned(),
                })
                .await
                .unwrap();
        }
        let add_object = store
            .get_right_by_action(rights::ADD_OBJECT)
            .await
            .unwrap()
            .unwrap();
        store.grant_right(role.id, add_object.id).await.unwrap();

        let identity = Identity {
            user: User {
                id: user::Id::new(),
                login: "u".to_owned(),
                password_hash: PasswordHash::from_stored(""),
                role: Some(role.id),
            },
            role: Some(role),
        };
        (store, identity)
    }

    #[tokio::test]
    async fn allows_only_granted_rights() {
        let (store, u) = foreman().await;

        authorize(&store, Some(&u), rights::ADD_OBJECT).await.unwrap();

        let denied = authorize(&store, Some(&u), rights::DELETE_OBJECT).await;
        assert!(matches!(
            denied,
            Err(Error::Denied(Denial::Forbidden(_)))
        ));
    }

    #[tokio::test]
    async fn denies_anonymous_and_roleless_callers() {
        let (store, mut u) = foreman().await;

        let anonymous = authorize(&store, None, rights::ADD_OBJECT).await;
        assert!(matches!(
            anonymous,
            Err(Error::Denied(Denial::Unauthenticated))
        ));

        u.role = None;
        let roleless = authorize(&store, Some(&u), rights::ADD_OBJECT).await;
        assert!(matches!(roleless, Err(Error::Denied(Denial::NoRole))));
    }

    #[tokio::test]
    async fn matches_roles_by_name() {
        let (store, u) = foreman().await;

        assert!(has_any_role(&u, &["admin", "foreman"]));
        assert!(!has_any_role(&u, &[ADMIN, MARKETER]));

        let denied =
            check(&store, Some(&u), Permission::AnyRole(&[ADMIN])).await;
        assert!(matches!(
            denied,
            Err(Error::Denied(Denial::Forbidden(_)))
        ));
        check(&store, Some(&u), Permission::Authenticated)
            .await
            .unwrap();
    }
}
