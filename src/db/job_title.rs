use async_trait::async_trait;
use tokio_postgres::{Error, Row};

use super::Client;

#[derive(Clone, Debug)]
pub struct JobTitle {
    pub id: Id,
    pub name: String,
}

define_id!(Id);

#[async_trait]
pub trait JobTitleStore {
    async fn get_job_title_by_id(
        &self,
        id: Id,
    ) -> Result<Option<JobTitle>, Error>;

    async fn get_job_title_by_name(
        &self,
        name: &str,
    ) -> Result<Option<JobTitle>, Error>;

    async fn list_job_titles(&self) -> Result<Vec<JobTitle>, Error>;

    async fn write_job_title(&self, job_title: &JobTitle) -> Result<(), Error>;

    /// Employees holding the title keep existing without one.
    async fn delete_job_title(&self, id: Id) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> JobTitle {
    JobTitle {
        id: row.get("id"),
        name: row.get("name"),
    }
}

#[async_trait]
impl JobTitleStore for Client {
    async fn get_job_title_by_id(
        &self,
        id: Id,
    ) -> Result<Option<JobTitle>, Error> {
        const SQL: &str = "SELECT id, name FROM job_titles WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_job_title_by_name(
        &self,
        name: &str,
    ) -> Result<Option<JobTitle>, Error> {
        const SQL: &str = "SELECT id, name FROM job_titles WHERE name = $1";
        Ok(self.0.query_opt(SQL, &[&name]).await?.as_ref().map(from_row))
    }

    async fn list_job_titles(&self) -> Result<Vec<JobTitle>, Error> {
        const SQL: &str = "SELECT id, name FROM job_titles ORDER BY name";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_job_title(&self, job_title: &JobTitle) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO job_titles (id, name) \
            VALUES ($1, $2) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name";
        self.0
            .execute(SQL, &[&job_title.id, &job_title.name])
            .await
            .map(drop)
    }

    async fn delete_job_title(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM job_titles WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
