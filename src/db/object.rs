use async_trait::async_trait;
use tokio_postgres::{Error, Row};

use super::Client;

/// Job site where employees are assigned and materials are stored.
#[derive(Clone, Debug)]
pub struct Object {
    pub id: Id,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
}

define_id!(Id);

#[async_trait]
pub trait ObjectStore {
    async fn get_object_by_id(&self, id: Id) -> Result<Option<Object>, Error>;

    async fn get_object_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Object>, Error>;

    async fn list_objects(&self) -> Result<Vec<Object>, Error>;

    async fn write_object(&self, object: &Object) -> Result<(), Error>;

    /// Deletes the site's materials and unassigns its employees.
    async fn delete_object(&self, id: Id) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> Object {
    Object {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        description: row.get("description"),
    }
}

#[async_trait]
impl ObjectStore for Client {
    async fn get_object_by_id(&self, id: Id) -> Result<Option<Object>, Error> {
        const SQL: &str = "SELECT id, name, address, description \
                           FROM objects \
                           WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_object_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Object>, Error> {
        const SQL: &str = "SELECT id, name, address, description \
                           FROM objects \
                           WHERE name = $1";
        Ok(self.0.query_opt(SQL, &[&name]).await?.as_ref().map(from_row))
    }

    async fn list_objects(&self) -> Result<Vec<Object>, Error> {
        const SQL: &str = "SELECT id, name, address, description \
                           FROM objects \
                           ORDER BY name";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_object(&self, object: &Object) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO objects (id, name, address, description) \
            VALUES ($1, $2, $3, $4) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                address = EXCLUDED.address, \
                description = EXCLUDED.description";
        self.0
            .execute(
                SQL,
                &[
                    &object.id,
                    &object.name,
                    &object.address,
                    &object.description,
                ],
            )
            .await
            .map(drop)
    }

    async fn delete_object(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM objects WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
