use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_postgres::{Error, Row};

use super::{user, Client};

/// Server-side state behind an opaque session cookie.
#[derive(Clone, Debug)]
pub struct Session {
    pub handle: Handle,
    pub user: user::Id,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

define_id!(
    /// Random opaque token carried by the client.
    Handle
);

#[async_trait]
pub trait SessionStore {
    async fn get_session(
        &self,
        handle: Handle,
    ) -> Result<Option<Session>, Error>;

    async fn write_session(&self, session: &Session) -> Result<(), Error>;

    async fn delete_session(&self, handle: Handle) -> Result<bool, Error>;

    /// Drops every session expired by `now`, returning how many.
    async fn delete_expired_sessions(
        &self,
        now: OffsetDateTime,
    ) -> Result<u64, Error>;
}

fn from_row(row: &Row) -> Session {
    Session {
        handle: row.get("handle"),
        user: row.get("user_id"),
        expires_at: row.get("expires_at"),
    }
}

#[async_trait]
impl SessionStore for Client {
    async fn get_session(
        &self,
        handle: Handle,
    ) -> Result<Option<Session>, Error> {
        const SQL: &str = "SELECT handle, user_id, expires_at \
                           FROM sessions \
                           WHERE handle = $1";
        Ok(self.0.query_opt(SQL, &[&handle]).await?.as_ref().map(from_row))
    }

    async fn write_session(&self, session: &Session) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO sessions (handle, user_id, expires_at) \
            VALUES ($1, $2, $3) \
            ON CONFLICT (handle) DO UPDATE \
            SET expires_at = EXCLUDED.expires_at";
        self.0
            .execute(
                SQL,
                &[&session.handle, &session.user, &session.expires_at],
            )
            .await
            .map(drop)
    }

    async fn delete_session(&self, handle: Handle) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM sessions WHERE handle = $1";
        Ok(self.0.execute(SQL, &[&handle]).await? > 0)
    }

    async fn delete_expired_sessions(
        &self,
        now: OffsetDateTime,
    ) -> Result<u64, Error> {
        const SQL: &str = "DELETE FROM sessions WHERE expires_at <= $1";
        self.0.execute(SQL, &[&now]).await
    }
}
