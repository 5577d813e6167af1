use async_trait::async_trait;
use tokio_postgres::{Error, Row};

use super::Client;

/// Named bundle of rights assigned to users.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Role {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}

define_id!(Id);

#[async_trait]
pub trait RoleStore {
    async fn get_role_by_id(&self, id: Id) -> Result<Option<Role>, Error>;

    async fn get_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Role>, Error>;

    async fn list_roles(&self) -> Result<Vec<Role>, Error>;

    async fn write_role(&self, role: &Role) -> Result<(), Error>;

    /// Drops the role's grants and clears it from its users.
    async fn delete_role(&self, id: Id) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    }
}

#[async_trait]
impl RoleStore for Client {
    async fn get_role_by_id(&self, id: Id) -> Result<Option<Role>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM roles \
                           WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Role>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM roles \
                           WHERE name = $1";
        Ok(self.0.query_opt(SQL, &[&name]).await?.as_ref().map(from_row))
    }

    async fn list_roles(&self) -> Result<Vec<Role>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM roles \
                           ORDER BY name";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_role(&self, role: &Role) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO roles (id, name, description) \
            VALUES ($1, $2, $3) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                description = EXCLUDED.description";
        self.0
            .execute(SQL, &[&role.id, &role.name, &role.description])
            .await
            .map(drop)
    }

    async fn delete_role(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM roles WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
