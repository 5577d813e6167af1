use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_postgres::{Error, Row};

use super::{object, Client};

#[derive(Clone, Debug)]
pub struct Material {
    pub id: Id,
    pub name: String,
    pub amount: Decimal,
    pub object: object::Id,
}

define_id!(Id);

#[async_trait]
pub trait MaterialStore {
    async fn get_material_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Material>, Error>;

    async fn list_materials(&self) -> Result<Vec<Material>, Error>;

    async fn write_material(&self, material: &Material) -> Result<(), Error>;

    async fn delete_material(&self, id: Id) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> Material {
    Material {
        id: row.get("id"),
        name: row.get("name"),
        amount: row.get("amount"),
        object: row.get("object_id"),
    }
}

#[async_trait]
impl MaterialStore for Client {
    async fn get_material_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Material>, Error> {
        const SQL: &str = "SELECT id, name, amount, object_id \
                           FROM materials \
                           WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn list_materials(&self) -> Result<Vec<Material>, Error> {
        const SQL: &str = "SELECT id, name, amount, object_id \
                           FROM materials \
                           ORDER BY name";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_material(&self, material: &Material) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO materials (id, name, amount, object_id) \
            VALUES ($1, $2, $3, $4) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                amount = EXCLUDED.amount, \
                object_id = EXCLUDED.object_id";
        self.0
            .execute(
                SQL,
                &[
                    &material.id,
                    &material.name,
                    &material.amount,
                    &material.object,
                ],
            )
            .await
            .map(drop)
    }

    async fn delete_material(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM materials WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
