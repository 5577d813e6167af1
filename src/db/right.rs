use async_trait::async_trait;
use tokio_postgres::{Error, Row};

use super::{role, Client};

/// Named permission atom such as `add_employee`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Right {
    pub id: Id,
    pub action: String,
}

define_id!(Id);

#[async_trait]
pub trait RightStore {
    async fn get_right_by_action(
        &self,
        action: &str,
    ) -> Result<Option<Right>, Error>;

    async fn list_rights(&self) -> Result<Vec<Right>, Error>;

    /// Inserts the right unless its action is already known.
    async fn write_right(&self, right: &Right) -> Result<(), Error>;

    async fn list_role_rights(
        &self,
        role: role::Id,
    ) -> Result<Vec<Right>, Error>;

    /// Idempotently links the pair.
    async fn grant_right(
        &self,
        role: role::Id,
        right: Id,
    ) -> Result<(), Error>;

    /// Replaces every right the role holds.
    async fn set_role_rights(
        &self,
        role: role::Id,
        rights: &[Id],
    ) -> Result<(), Error>;

    async fn role_has_right(
        &self,
        role: role::Id,
        action: &str,
    ) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> Right {
    Right {
        id: row.get("id"),
        action: row.get("action"),
    }
}

#[async_trait]
impl RightStore for Client {
    async fn get_right_by_action(
        &self,
        action: &str,
    ) -> Result<Option<Right>, Error> {
        const SQL: &str = "SELECT id, action FROM rights WHERE action = $1";
        Ok(self.0.query_opt(SQL, &[&action]).await?.as_ref().map(from_row))
    }

    async fn list_rights(&self) -> Result<Vec<Right>, Error> {
        const SQL: &str = "SELECT id, action FROM rights ORDER BY action";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_right(&self, right: &Right) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO rights (id, action) \
            VALUES ($1, $2) \
            ON CONFLICT (action) DO NOTHING";
        self.0
            .execute(SQL, &[&right.id, &right.action])
            .await
            .map(drop)
    }

    async fn list_role_rights(
        &self,
        role: role::Id,
    ) -> Result<Vec<Right>, Error> {
        const SQL: &str = "\
            SELECT r.id, r.action \
            FROM rights r \
            JOIN role_rights rr ON rr.right_id = r.id \
            WHERE rr.role_id = $1 \
            ORDER BY r.action";
        Ok(self.0.query(SQL, &[&role]).await?.iter().map(from_row).collect())
    }

    async fn grant_right(
        &self,
        role: role::Id,
        right: Id,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO role_rights (role_id, right_id) \
            VALUES ($1, $2) \
            ON CONFLICT (role_id, right_id) DO NOTHING";
        self.0.execute(SQL, &[&role, &right]).await.map(drop)
    }

    async fn set_role_rights(
        &self,
        role: role::Id,
        rights: &[Id],
    ) -> Result<(), Error> {
        const SQL: &str = "\
            WITH removed AS ( \
                DELETE FROM role_rights \
                WHERE role_id = $1 AND NOT (right_id = ANY($2::UUID[])) \
            ) \
            INSERT INTO role_rights (role_id, right_id) \
            SELECT $1, unnest($2::UUID[]) \
            ON CONFLICT (role_id, right_id) DO NOTHING";
        self.0.execute(SQL, &[&role, &rights]).await.map(drop)
    }

    async fn role_has_right(
        &self,
        role: role::Id,
        action: &str,
    ) -> Result<bool, Error> {
        const SQL: &str = "\
            SELECT EXISTS ( \
                SELECT 1 \
                FROM role_rights rr \
                JOIN rights r ON r.id = rr.right_id \
                WHERE rr.role_id = $1 AND r.action = $2 \
            )";
        Ok(self.0.query_one(SQL, &[&role, &action]).await?.get(0))
    }
}
