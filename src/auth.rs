//! Session-based authentication.
//!
//! A successful [`login`] stores a [`Session`] keyed by a random opaque
//! handle; the handle travels back to the client in a cookie and is turned
//! into an [`Identity`] by [`resolve`] on every request.

use std::time::Duration;

use argon2::password_hash;
use derive_more::{Display, From};
use futures::future::OptionFuture;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::db::{
    self,
    session::{self, Session},
    user::PasswordHash,
    Role, Store, User,
};

/// Caller resolved from a live session.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user: User,
    pub role: Option<Role>,
}

impl Identity {
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.name.as_str())
    }
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("database error: {_0}")]
    #[from]
    Db(db::Error),

    #[display("password verification failed: {_0}")]
    #[from]
    Crypto(password_hash::Error),

    /// Unknown login or wrong password. Both look the same to the caller.
    #[display("invalid credentials")]
    InvalidCredentials,

    #[display("authentication credentials were not provided")]
    Unauthenticated,
}

/// Well-formed digest that matches no password, verified for unknown logins
/// so they cost as much as a wrong password.
const DECOY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1\
                          $c29tZXNhbHRzb21lc2FsdA\
                          $AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub async fn login(
    store: &dyn Store,
    login: &str,
    password: &str,
    lifetime: Duration,
) -> Result<Session, Error> {
    let Some(user) = store.get_user_by_login(login).await? else {
        let _ = PasswordHash::from_stored(DECOY_HASH).verify(password);
        warn!(login, "login attempt for unknown user");
        return Err(Error::InvalidCredentials);
    };

    if !user.password_hash.verify(password)? {
        warn!(login, "login attempt with wrong password");
        return Err(Error::InvalidCredentials);
    }

    let now = OffsetDateTime::now_utc();
    let swept = store.delete_expired_sessions(now).await?;
    if swept > 0 {
        debug!(swept, "expired sessions removed");
    }

    let session = Session {
        handle: session::Handle::new(),
        user: user.id,
        expires_at: now + lifetime,
    };
    store.write_session(&session).await?;

    info!(login, "user logged in");
    Ok(session)
}

pub async fn resolve(
    store: &dyn Store,
    handle: Option<session::Handle>,
) -> Result<Identity, Error> {
    use Error as E;

    let handle = handle.ok_or(E::Unauthenticated)?;
    let session = store.get_session(handle).await?.ok_or(E::Unauthenticated)?;
    if session.is_expired(OffsetDateTime::now_utc()) {
        store.delete_session(handle).await?;
        return Err(E::Unauthenticated);
    }

    let user = store
        .get_user_by_id(session.user)
        .await?
        .ok_or(E::Unauthenticated)?;
    let role = OptionFuture::from(user.role.map(|id| store.get_role_by_id(id)))
        .await
        .transpose()?
        .flatten();

    Ok(Identity { user, role })
}

/// Forgets the session. Unknown or missing handles are not an error.
pub async fn logout(
    store: &dyn Store,
    handle: Option<session::Handle>,
) -> Result<(), Error> {
    if let Some(handle) = handle {
        if store.delete_session(handle).await? {
            info!(%handle, "session closed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::db::{user, Memory, SessionStore as _, UserStore as _};

    use super::*;

    const LIFETIME: Duration = Duration::from_secs(60);

    async fn store_with_user() -> Memory {
        let store = Memory::new();
        store
            .write_user(&User {
                id: user::Id::from(1),
                login: "alice".to_owned(),
                password_hash: PasswordHash::new("password").unwrap(),
                role: None,
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn decoy_hash_is_well_formed() {
        let verified = PasswordHash::from_stored(DECOY_HASH).verify("password");
        assert!(!verified.unwrap());
    }

    #[tokio::test]
    async fn issues_session_that_resolves_to_user() {
        let store = store_with_user().await;
        let session = login(&store, "alice", "password", LIFETIME)
            .await
            .unwrap();

        let identity = resolve(&store, Some(session.handle)).await.unwrap();
        assert_eq!(identity.user.id, user::Id::from(1));
        assert_eq!(identity.role_name(), None);
    }

    #[tokio::test]
    async fn hides_which_credential_was_wrong() {
        let store = store_with_user().await;

        let wrong_password =
            login(&store, "alice", "passw0rd", LIFETIME).await;
        let unknown_login =
            login(&store, "mallory", "password", LIFETIME).await;

        assert!(matches!(wrong_password, Err(Error::InvalidCredentials)));
        assert!(matches!(unknown_login, Err(Error::InvalidCredentials)));
    }

    #[tokio::test]
    async fn rejects_missing_and_unknown_handles() {
        let store = store_with_user().await;

        let missing = resolve(&store, None).await;
        let unknown = resolve(&store, Some(session::Handle::new())).await;

        assert!(matches!(missing, Err(Error::Unauthenticated)));
        assert!(matches!(unknown, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn rejects_expired_session() {
        let store = store_with_user().await;
        let session = login(&store, "alice", "password", Duration::ZERO)
            .await
            .unwrap();

        let resolved = resolve(&store, Some(session.handle)).await;
        assert!(matches!(resolved, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn login_sweeps_expired_sessions() {
        let store = store_with_user().await;
        let stale = login(&store, "alice", "password", Duration::ZERO)
            .await
            .unwrap();
        let fresh = login(&store, "alice", "password", LIFETIME)
            .await
            .unwrap();

        assert!(store.get_session(stale.handle).await.unwrap().is_none());
        assert!(store.get_session(fresh.handle).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let store = store_with_user().await;
        let session = login(&store, "alice", "password", LIFETIME)
            .await
            .unwrap();

        logout(&store, Some(session.handle)).await.unwrap();
        logout(&store, Some(session.handle)).await.unwrap();
        logout(&store, None).await.unwrap();

        let resolved = resolve(&store, Some(session.handle)).await;
        assert!(matches!(resolved, Err(Error::Unauthenticated)));
    }
}
