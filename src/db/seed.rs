//! Idempotent bootstrap of the reference rows the system relies upon.

use argon2::password_hash;
use derive_more::{Display, From};
use tracing::info;

use crate::{
    config,
    guard::{self, rights},
};

use super::{
    application::{self, Label, DEFAULT_STATUS, DEFAULT_TYPE},
    right, role,
    user::{self, PasswordHash},
    Error as DbError, Right, Role, Store, User,
};

/// Built-in roles with the rights they receive when first created.
///
/// The administrator role is topped up with every known right on each run.
pub const ROLES: &[(&str, &str, &[&str])] = &[
    (guard::ADMIN, "Администратор", rights::ALL),
    (
        "hr",
        "Отдел кадров",
        &[
            rights::VIEW_EMPLOYEES,
            rights::ADD_EMPLOYEE,
            rights::EDIT_EMPLOYEE,
            rights::DELETE_EMPLOYEE,
            rights::VIEW_JOB_TITLES,
            rights::VIEW_OBJECTS,
            rights::VIEW_USERS,
            rights::TRACK_TIME,
            rights::VIEW_WTT,
        ],
    ),
    (guard::MARKETER, "Маркетолог", &[]),
    (
        "foreman",
        "Прораб",
        &[
            rights::VIEW_OBJECTS,
            rights::ADD_OBJECT,
            rights::EDIT_OBJECT,
            rights::DELETE_OBJECT,
            rights::VIEW_MATERIALS,
            rights::VIEW_EMPLOYEES,
            rights::TRACK_TIME,
            rights::VIEW_WTT,
        ],
    ),
    (
        "storekeeper",
        "Кладовщик",
        &[
            rights::VIEW_MATERIALS,
            rights::ADD_MATERIAL,
            rights::EDIT_MATERIAL,
            rights::DELETE_MATERIAL,
            rights::VIEW_OBJECTS,
        ],
    ),
    ("basic", "Базовый пользователь", &[rights::TRACK_TIME]),
];

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("database error: {_0}")]
    #[from]
    Db(DbError),

    #[display("cannot hash bootstrap password: {_0}")]
    #[from]
    Crypto(password_hash::Error),
}

impl std::error::Error for Error {}

pub async fn run(
    store: &dyn Store,
    bootstrap: Option<&config::Bootstrap>,
) -> Result<(), Error> {
    for action in rights::ALL {
        store
            .write_right(&Right {
                id: right::Id::new(),
                action: (*action).to_owned(),
            })
            .await?;
    }

    for (name, description, grants) in ROLES {
        let (role, created) = match store.get_role_by_name(name).await? {
            Some(role) => (role, false),
            None => {
                let role = Role {
                    id: role::Id::new(),
                    name: (*name).to_owned(),
                    description: Some((*description).to_owned()),
                };
                store.write_role(&role).await?;
                info!(role = name, "role created");
                (role, true)
            }
        };
        if created || *name == guard::ADMIN {
            grant(store, &role, grants).await?;
        }
    }

    if store.get_application_type_by_name(DEFAULT_TYPE).await?.is_none() {
        store
            .write_application_type(&Label {
                id: application::TypeId::new(),
                name: DEFAULT_TYPE.to_owned(),
                description: None,
            })
            .await?;
    }
    if store
        .get_application_status_by_name(DEFAULT_STATUS)
        .await?
        .is_none()
    {
        store
            .write_application_status(&Label {
                id: application::StatusId::new(),
                name: DEFAULT_STATUS.to_owned(),
                description: None,
            })
            .await?;
    }

    if let Some(bootstrap) = bootstrap {
        if store
            .get_user_by_login(&bootstrap.admin_login)
            .await?
            .is_none()
        {
            let admin = store.get_role_by_name(guard::ADMIN).await?;
            let password_hash = PasswordHash::new(&bootstrap.admin_password)?;
            store
                .write_user(&User {
                    id: user::Id::new(),
                    login: bootstrap.admin_login.clone(),
                    password_hash,
                    role: admin.map(|r| r.id),
                })
                .await?;
            info!(login = %bootstrap.admin_login, "administrator created");
        }
    }

    Ok(())
}

async fn grant(
    store: &dyn Store,
    role: &Role,
    actions: &[&str],
) -> Result<(), DbError> {
    for action in actions {
        if let Some(right) = store.get_right_by_action(action).await? {
            store.grant_right(role.id, right.id).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::{Memory, RightStore as _, RoleStore as _};

    use super::*;

    #[tokio::test]
    async fn seeds_roles_rights_and_sentinels_once() {
        let store = Memory::new();
        run(&store, None).await.unwrap();
        run(&store, None).await.unwrap();

        assert_eq!(store.list_roles().await.unwrap().len(), ROLES.len());
        assert_eq!(store.list_rights().await.unwrap().len(), rights::ALL.len());

        let admin = store.get_role_by_name("admin").await.unwrap().unwrap();
        let granted = store.list_role_rights(admin.id).await.unwrap();
        assert_eq!(granted.len(), rights::ALL.len());

        let basic = store.get_role_by_name("basic").await.unwrap().unwrap();
        assert!(store
            .role_has_right(basic.id, rights::TRACK_TIME)
            .await
            .unwrap());
        assert!(!store
            .role_has_right(basic.id, rights::ADD_OBJECT)
            .await
            .unwrap());
    }
}
