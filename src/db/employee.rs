use async_trait::async_trait;
use tokio_postgres::{Error, Row};

use super::{job_title, object, user, Client};

#[derive(Clone, Debug)]
pub struct Employee {
    pub id: Id,
    pub full_name: String,
    /// Natural key, distinct from the surrogate `id`.
    pub personnel_number: String,
    pub phone_number: String,
    pub email: String,
    pub bank_details: String,
    pub passport: String,
    pub job_title: Option<job_title::Id>,
    pub object: Option<object::Id>,
    /// At most one employee links to a given user.
    pub user: Option<user::Id>,
}

define_id!(Id);

#[async_trait]
pub trait EmployeeStore {
    async fn get_employee_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Employee>, Error>;

    async fn get_employee_by_personnel_number(
        &self,
        personnel_number: &str,
    ) -> Result<Option<Employee>, Error>;

    async fn get_employee_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Employee>, Error>;

    async fn list_employees(&self) -> Result<Vec<Employee>, Error>;

    async fn write_employee(&self, employee: &Employee) -> Result<(), Error>;

    /// Deletes the employee together with its work-time records.
    async fn delete_employee(&self, id: Id) -> Result<bool, Error>;
}

const COLUMNS: &str = "id, full_name, personnel_number, phone_number, email, \
                       bank_details, passport, job_title_id, object_id, \
                       user_id";

fn from_row(row: &Row) -> Employee {
    Employee {
        id: row.get("id"),
        full_name: row.get("full_name"),
        personnel_number: row.get("personnel_number"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
        bank_details: row.get("bank_details"),
        passport: row.get("passport"),
        job_title: row.get("job_title_id"),
        object: row.get("object_id"),
        user: row.get("user_id"),
    }
}

#[async_trait]
impl EmployeeStore for Client {
    async fn get_employee_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Employee>, Error> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE id = $1");
        Ok(self.0.query_opt(&sql, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_employee_by_personnel_number(
        &self,
        personnel_number: &str,
    ) -> Result<Option<Employee>, Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM employees WHERE personnel_number = $1"
        );
        Ok(self
            .0
            .query_opt(&sql, &[&personnel_number])
            .await?
            .as_ref()
            .map(from_row))
    }

    async fn get_employee_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Employee>, Error> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE user_id = $1");
        Ok(self.0.query_opt(&sql, &[&user]).await?.as_ref().map(from_row))
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, Error> {
        let sql = format!("SELECT {COLUMNS} FROM employees ORDER BY full_name");
        Ok(self.0.query(&sql, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_employee(&self, employee: &Employee) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO employees (id, full_name, personnel_number, \
                                   phone_number, email, bank_details, \
                                   passport, job_title_id, object_id, \
                                   user_id) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
            ON CONFLICT (id) DO UPDATE \
            SET full_name = EXCLUDED.full_name, \
                personnel_number = EXCLUDED.personnel_number, \
                phone_number = EXCLUDED.phone_number, \
                email = EXCLUDED.email, \
                bank_details = EXCLUDED.bank_details, \
                passport = EXCLUDED.passport, \
                job_title_id = EXCLUDED.job_title_id, \
                object_id = EXCLUDED.object_id, \
                user_id = EXCLUDED.user_id";

        self.0
            .execute(
                SQL,
                &[
                    &employee.id,
                    &employee.full_name,
                    &employee.personnel_number,
                    &employee.phone_number,
                    &employee.email,
                    &employee.bank_details,
                    &employee.passport,
                    &employee.job_title,
                    &employee.object,
                    &employee.user,
                ],
            )
            .await
            .map(drop)
    }

    async fn delete_employee(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM employees WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
