use async_trait::async_trait;
use time::{Date, Time};
use tokio_postgres::{Error, Row};

use super::{employee, Client};

/// One working day of an employee.
///
/// A record is *open* while `end_time` is `None` and *closed* afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkTime {
    pub id: Id,
    pub employee: employee::Id,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Option<Time>,
}

define_id!(Id);

#[async_trait]
pub trait WorkTimeStore {
    async fn get_work_time_by_id(
        &self,
        id: Id,
    ) -> Result<Option<WorkTime>, Error>;

    async fn get_work_time(
        &self,
        employee: employee::Id,
        date: Date,
    ) -> Result<Option<WorkTime>, Error>;

    /// Atomically inserts the record unless the employee already has one for
    /// that date. Returns whether it was inserted.
    async fn insert_work_time(&self, record: &WorkTime) -> Result<bool, Error>;

    /// Atomically closes the open record of the employee for that date.
    /// Returns the closed record, or `None` if there was no open one.
    async fn close_work_time(
        &self,
        employee: employee::Id,
        date: Date,
        end_time: Time,
    ) -> Result<Option<WorkTime>, Error>;

    async fn write_work_time(&self, record: &WorkTime) -> Result<(), Error>;

    async fn delete_work_time(
        &self,
        employee: employee::Id,
        date: Date,
    ) -> Result<bool, Error>;

    /// Records of the given employees (all when `None`) dated on or after
    /// `since`, newest first.
    async fn list_work_times(
        &self,
        employees: Option<&[employee::Id]>,
        since: Option<Date>,
    ) -> Result<Vec<WorkTime>, Error>;
}

fn from_row(row: &Row) -> WorkTime {
    WorkTime {
        id: row.get("id"),
        employee: row.get("employee_id"),
        date: row.get("date"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
    }
}

#[async_trait]
impl WorkTimeStore for Client {
    async fn get_work_time_by_id(
        &self,
        id: Id,
    ) -> Result<Option<WorkTime>, Error> {
        const SQL: &str = "SELECT id, employee_id, date, start_time, end_time \
                           FROM work_times \
                           WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_work_time(
        &self,
        employee: employee::Id,
        date: Date,
    ) -> Result<Option<WorkTime>, Error> {
        const SQL: &str = "SELECT id, employee_id, date, start_time, end_time \
                           FROM work_times \
                           WHERE employee_id = $1 AND date = $2";
        Ok(self
            .0
            .query_opt(SQL, &[&employee, &date])
            .await?
            .as_ref()
            .map(from_row))
    }

    async fn insert_work_time(&self, record: &WorkTime) -> Result<bool, Error> {
        const SQL: &str = "\
            INSERT INTO work_times (id, employee_id, date, \
                                    start_time, end_time) \
            VALUES ($1, $2, $3, $4, $5) \
            ON CONFLICT (employee_id, date) DO NOTHING";
        let inserted = self
            .0
            .execute(
                SQL,
                &[
                    &record.id,
                    &record.employee,
                    &record.date,
                    &record.start_time,
                    &record.end_time,
                ],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn close_work_time(
        &self,
        employee: employee::Id,
        date: Date,
        end_time: Time,
    ) -> Result<Option<WorkTime>, Error> {
        const SQL: &str = "\
            UPDATE work_times \
            SET end_time = $3 \
            WHERE employee_id = $1 AND date = $2 AND end_time IS NULL \
            RETURNING id, employee_id, date, start_time, end_time";
        Ok(self
            .0
            .query_opt(SQL, &[&employee, &date, &end_time])
            .await?
            .as_ref()
            .map(from_row))
    }

    async fn write_work_time(&self, record: &WorkTime) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO work_times (id, employee_id, date, \
                                    start_time, end_time) \
            VALUES ($1, $2, $3, $4, $5) \
            ON CONFLICT (id) DO UPDATE \
            SET start_time = EXCLUDED.start_time, \
                end_time = EXCLUDED.end_time";
        self.0
            .execute(
                SQL,
                &[
                    &record.id,
                    &record.employee,
                    &record.date,
                    &record.start_time,
                    &record.end_time,
                ],
            )
            .await
            .map(drop)
    }

    async fn delete_work_time(
        &self,
        employee: employee::Id,
        date: Date,
    ) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM work_times \
                           WHERE employee_id = $1 AND date = $2";
        Ok(self.0.execute(SQL, &[&employee, &date]).await? > 0)
    }

    async fn list_work_times(
        &self,
        employees: Option<&[employee::Id]>,
        since: Option<Date>,
    ) -> Result<Vec<WorkTime>, Error> {
        const SQL: &str = "\
            SELECT id, employee_id, date, start_time, end_time \
            FROM work_times \
            WHERE ($1::UUID[] IS NULL OR employee_id = ANY($1)) \
              AND ($2::DATE IS NULL OR date >= $2) \
            ORDER BY date DESC, \
                     start_time DESC";
        Ok(self
            .0
            .query(SQL, &[&employees, &since])
            .await?
            .iter()
            .map(from_row)
            .collect())
    }
}
