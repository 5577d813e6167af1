use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_postgres::{Error, Row};

use super::Client;

/// Client lead captured from the public form.
#[derive(Clone, Debug)]
pub struct Application {
    pub id: Id,
    pub full_name: String,
    pub phone_number: String,
    pub description: String,
    pub kind: Option<TypeId>,
    pub status: Option<StatusId>,
    pub created_at: OffsetDateTime,
}

/// Classification entry shared by application types and statuses.
#[derive(Clone, Debug)]
pub struct Label<I> {
    pub id: I,
    pub name: String,
    pub description: Option<String>,
}

pub type Type = Label<TypeId>;

pub type Status = Label<StatusId>;

define_id!(Id);

define_id!(TypeId);

define_id!(StatusId);

/// Type assigned to applications submitted without one.
pub const DEFAULT_TYPE: &str = "Обратный звонок";

/// Status assigned to applications submitted without one.
pub const DEFAULT_STATUS: &str = "Новая";

#[async_trait]
pub trait ApplicationStore {
    async fn get_application_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Application>, Error>;

    /// Newest first.
    async fn list_applications(&self) -> Result<Vec<Application>, Error>;

    async fn write_application(
        &self,
        application: &Application,
    ) -> Result<(), Error>;

    async fn delete_application(&self, id: Id) -> Result<bool, Error>;

    async fn get_application_type_by_id(
        &self,
        id: TypeId,
    ) -> Result<Option<Type>, Error>;

    async fn get_application_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Type>, Error>;

    async fn list_application_types(&self) -> Result<Vec<Type>, Error>;

    async fn write_application_type(&self, kind: &Type) -> Result<(), Error>;

    /// Applications of this type keep existing without one.
    async fn delete_application_type(&self, id: TypeId)
        -> Result<bool, Error>;

    async fn get_application_status_by_id(
        &self,
        id: StatusId,
    ) -> Result<Option<Status>, Error>;

    async fn get_application_status_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Status>, Error>;

    async fn list_application_statuses(&self) -> Result<Vec<Status>, Error>;

    async fn write_application_status(
        &self,
        status: &Status,
    ) -> Result<(), Error>;

    /// Applications in this status keep existing without one.
    async fn delete_application_status(
        &self,
        id: StatusId,
    ) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> Application {
    Application {
        id: row.get("id"),
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        description: row.get("description"),
        kind: row.get("type_id"),
        status: row.get("status_id"),
        created_at: row.get("created_at"),
    }
}

fn label_from_row<I>(row: &Row) -> Label<I>
where
    I: for<'a> tokio_postgres::types::FromSql<'a>,
{
    Label {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    }
}

#[async_trait]
impl ApplicationStore for Client {
    async fn get_application_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Application>, Error> {
        const SQL: &str = "\
            SELECT id, full_name, phone_number, description, \
                   type_id, status_id, created_at \
            FROM applications \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn list_applications(&self) -> Result<Vec<Application>, Error> {
        const SQL: &str = "\
            SELECT id, full_name, phone_number, description, \
                   type_id, status_id, created_at \
            FROM applications \
            ORDER BY created_at DESC, \
                     id DESC";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_application(
        &self,
        application: &Application,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO applications (id, full_name, phone_number, \
                                      description, type_id, status_id, \
                                      created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7) \
            ON CONFLICT (id) DO UPDATE \
            SET full_name = EXCLUDED.full_name, \
                phone_number = EXCLUDED.phone_number, \
                description = EXCLUDED.description, \
                type_id = EXCLUDED.type_id, \
                status_id = EXCLUDED.status_id";

        self.0
            .execute(
                SQL,
                &[
                    &application.id,
                    &application.full_name,
                    &application.phone_number,
                    &application.description,
                    &application.kind,
                    &application.status,
                    &application.created_at,
                ],
            )
            .await
            .map(drop)
    }

    async fn delete_application(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM applications WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }

    async fn get_application_type_by_id(
        &self,
        id: TypeId,
    ) -> Result<Option<Type>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM application_types \
                           WHERE id = $1";
        Ok(self
            .0
            .query_opt(SQL, &[&id])
            .await?
            .as_ref()
            .map(label_from_row))
    }

    async fn get_application_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Type>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM application_types \
                           WHERE name = $1";
        Ok(self
            .0
            .query_opt(SQL, &[&name])
            .await?
            .as_ref()
            .map(label_from_row))
    }

    async fn list_application_types(&self) -> Result<Vec<Type>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM application_types \
                           ORDER BY name";
        Ok(self
            .0
            .query(SQL, &[])
            .await?
            .iter()
            .map(label_from_row)
            .collect())
    }

    async fn write_application_type(&self, kind: &Type) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO application_types (id, name, description) \
            VALUES ($1, $2, $3) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                description = EXCLUDED.description";
        self.0
            .execute(SQL, &[&kind.id, &kind.name, &kind.description])
            .await
            .map(drop)
    }

    async fn delete_application_type(
        &self,
        id: TypeId,
    ) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM application_types WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }

    async fn get_application_status_by_id(
        &self,
        id: StatusId,
    ) -> Result<Option<Status>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM application_statuses \
                           WHERE id = $1";
        Ok(self
            .0
            .query_opt(SQL, &[&id])
            .await?
            .as_ref()
            .map(label_from_row))
    }

    async fn get_application_status_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Status>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM application_statuses \
                           WHERE name = $1";
        Ok(self
            .0
            .query_opt(SQL, &[&name])
            .await?
            .as_ref()
            .map(label_from_row))
    }

    async fn list_application_statuses(&self) -> Result<Vec<Status>, Error> {
        const SQL: &str = "SELECT id, name, description \
                           FROM application_statuses \
                           ORDER BY name";
        Ok(self
            .0
            .query(SQL, &[])
            .await?
            .iter()
            .map(label_from_row)
            .collect())
    }

    async fn write_application_status(
        &self,
        status: &Status,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO application_statuses (id, name, description) \
            VALUES ($1, $2, $3) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                description = EXCLUDED.description";
        self.0
            .execute(SQL, &[&status.id, &status.name, &status.description])
            .await
            .map(drop)
    }

    async fn delete_application_status(
        &self,
        id: StatusId,
    ) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM application_statuses WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
