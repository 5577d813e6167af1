//! Work-time tracking.
//!
//! Every employee has at most one [`WorkTime`] per date, moving through
//! `NoRecord -> Open -> Closed`: [`start_work`] opens it, [`end_work`] closes
//! it, and neither transition can be repeated. Administrators may correct the
//! times of a record afterwards with [`update`], but never its date.

use derive_more::{Display, From};
use time::{
    error::ComponentRange, Date, Duration, OffsetDateTime, Time, UtcOffset,
};
use tracing::info;

use crate::{
    config,
    db::{self, work_time, Employee, Store, WorkTime},
};

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("database error: {_0}")]
    #[from]
    Db(db::Error),

    #[display("Сотрудник с таким табельным номером не найден")]
    UnknownEmployee,

    #[display("Рабочий день уже начат")]
    AlreadyStarted,

    #[display("Рабочий день ещё не начат")]
    NotStarted,

    #[display("Рабочий день уже завершён")]
    AlreadyEnded,

    #[display("startTime не может быть позже endTime")]
    InvalidRange,

    #[display("Изменение даты не разрешено")]
    DateChanged,

    #[display("Запись учёта времени не найдена")]
    NotFound,
}

/// Source of the local "today" and "now".
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    offset: UtcOffset,
}

impl Clock {
    /// Fails if the configured offset is not a valid UTC offset.
    pub fn new(config: config::Clock) -> Result<Self, ComponentRange> {
        let offset = UtcOffset::from_hms(config.utc_offset_hours, 0, 0)?;
        Ok(Self { offset })
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    /// Current local date and wall-clock time, truncated to whole seconds.
    pub fn today(&self) -> (Date, Time) {
        let now = self.now();
        let time = now.time().replace_nanosecond(0).unwrap_or(now.time());
        (now.date(), time)
    }
}

/// Requested corrections to a record. Absent fields stay untouched.
#[derive(Clone, Debug, Default)]
pub struct Changes {
    pub date: Option<Date>,
    pub start_time: Option<Time>,
    pub end_time: Option<Option<Time>>,
}

impl Changes {
    /// Applies the corrections, refusing to move the record to another date
    /// or to leave it ending before it starts.
    pub fn apply(self, record: &mut WorkTime) -> Result<(), Error> {
        if self.date.is_some_and(|date| date != record.date) {
            return Err(Error::DateChanged);
        }

        let start_time = self.start_time.unwrap_or(record.start_time);
        let end_time = self.end_time.unwrap_or(record.end_time);
        if end_time.is_some_and(|end| start_time > end) {
            return Err(Error::InvalidRange);
        }

        record.start_time = start_time;
        record.end_time = end_time;
        Ok(())
    }
}

pub async fn employee_by_personnel_number(
    store: &dyn Store,
    personnel_number: &str,
) -> Result<Employee, Error> {
    store
        .get_employee_by_personnel_number(personnel_number)
        .await?
        .ok_or(Error::UnknownEmployee)
}

/// Opens the working day of the employee on `date`.
pub async fn start_work(
    store: &dyn Store,
    personnel_number: &str,
    date: Date,
    now: Time,
) -> Result<WorkTime, Error> {
    let employee = employee_by_personnel_number(store, personnel_number).await?;

    let record = WorkTime {
        id: work_time::Id::new(),
        employee: employee.id,
        date,
        start_time: now,
        end_time: None,
    };
    if !store.insert_work_time(&record).await? {
        return Err(Error::AlreadyStarted);
    }

    info!(personnel_number, %date, "work day started");
    Ok(record)
}

/// Closes the open working day of the employee on `date`.
pub async fn end_work(
    store: &dyn Store,
    personnel_number: &str,
    date: Date,
    now: Time,
) -> Result<WorkTime, Error> {
    let employee = employee_by_personnel_number(store, personnel_number).await?;

    let record = store
        .get_work_time(employee.id, date)
        .await?
        .ok_or(Error::NotStarted)?;
    if record.end_time.is_some() {
        return Err(Error::AlreadyEnded);
    }
    if now < record.start_time {
        return Err(Error::InvalidRange);
    }

    // A concurrent stop may have won between the read and the update.
    let record = store
        .close_work_time(employee.id, date, now)
        .await?
        .ok_or(Error::AlreadyEnded)?;

    info!(personnel_number, %date, "work day ended");
    Ok(record)
}

pub async fn update(
    store: &dyn Store,
    id: work_time::Id,
    changes: Changes,
) -> Result<WorkTime, Error> {
    let mut record = store
        .get_work_time_by_id(id)
        .await?
        .ok_or(Error::NotFound)?;
    changes.apply(&mut record)?;
    store.write_work_time(&record).await?;
    Ok(record)
}

/// Locates the record of the employee on `date`.
pub async fn find(
    store: &dyn Store,
    personnel_number: &str,
    date: Date,
) -> Result<WorkTime, Error> {
    let employee = employee_by_personnel_number(store, personnel_number).await?;
    store
        .get_work_time(employee.id, date)
        .await?
        .ok_or(Error::NotFound)
}

pub async fn delete(
    store: &dyn Store,
    personnel_number: &str,
    date: Date,
) -> Result<(), Error> {
    let employee = employee_by_personnel_number(store, personnel_number).await?;
    if !store.delete_work_time(employee.id, date).await? {
        return Err(Error::NotFound);
    }
    info!(personnel_number, %date, "work time record deleted");
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub personnel_number: Option<String>,
    /// Case-insensitive substring of the full name.
    pub full_name: Option<String>,
}

impl Filter {
    fn is_empty(&self) -> bool {
        self.personnel_number.is_none() && self.full_name.is_none()
    }

    fn matches(&self, employee: &Employee) -> bool {
        let by_number = self
            .personnel_number
            .as_ref()
            .map_or(true, |n| &employee.personnel_number == n);
        let by_name = self.full_name.as_ref().map_or(true, |needle| {
            employee
                .full_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        by_number && by_name
    }
}

/// Records matching `filter`, newest first, each with its employee.
pub async fn list(
    store: &dyn Store,
    filter: &Filter,
) -> Result<Vec<(WorkTime, Employee)>, Error> {
    let employees = store.list_employees().await?;
    let selected = employees
        .iter()
        .filter(|e| filter.matches(e))
        .map(|e| e.id)
        .collect::<Vec<_>>();
    let scope = (!filter.is_empty()).then_some(selected.as_slice());

    let records = store.list_work_times(scope, None).await?;
    Ok(records
        .into_iter()
        .filter_map(|record| {
            let employee = employees.iter().find(|e| e.id == record.employee)?;
            Some((record, employee.clone()))
        })
        .collect())
}

/// Records of `employee` from the last `days` days, newest first.
pub async fn recent(
    store: &dyn Store,
    employee: &Employee,
    today: Date,
    days: i64,
) -> Result<Vec<WorkTime>, Error> {
    let since = today - Duration::days(days);
    Ok(store
        .list_work_times(Some(&[employee.id][..]), Some(since))
        .await?)
}

#[cfg(test)]
mod tests {
    use time::macros::{date, time};

    use crate::db::{employee, EmployeeStore as _, Memory};

    use super::*;

    const DAY: Date = date!(2024 - 05 - 20);

    async fn store_with(personnel_number: &str) -> Memory {
        let store = Memory::new();
        store
            .write_employee(&Employee {
                id: employee::Id::new(),
                full_name: "Петров Пётр Петрович".to_owned(),
                personnel_number: personnel_number.to_owned(),
                phone_number: "+7 900 000-00-00".to_owned(),
                email: "petrov@example.com".to_owned(),
                bank_details: String::new(),
                passport: String::new(),
                job_title: None,
                object: None,
                user: None,
            })
            .await
            .unwrap();
        store
    }

    fn record(start: Time, end: Option<Time>) -> WorkTime {
        WorkTime {
            id: work_time::Id::new(),
            employee: employee::Id::new(),
            date: DAY,
            start_time: start,
            end_time: end,
        }
    }

    #[tokio::test]
    async fn walks_through_the_day() {
        let store = store_with("E100").await;

        let open = start_work(&store, "E100", DAY, time!(09:00)).await.unwrap();
        assert_eq!(open.end_time, None);

        let closed = end_work(&store, "E100", DAY, time!(18:00)).await.unwrap();
        assert_eq!(closed.start_time, time!(09:00));
        assert_eq!(closed.end_time, Some(time!(18:00)));
    }

    #[tokio::test]
    async fn refuses_second_start() {
        let store = store_with("E100").await;
        start_work(&store, "E100", DAY, time!(09:00)).await.unwrap();

        let again = start_work(&store, "E100", DAY, time!(09:05)).await;
        let again = again.unwrap_err();
        assert!(matches!(again, Error::AlreadyStarted));
        assert_eq!(again.to_string(), "Рабочий день уже начат");

        end_work(&store, "E100", DAY, time!(18:00)).await.unwrap();
        let after_close = start_work(&store, "E100", DAY, time!(19:00)).await;
        assert!(matches!(after_close, Err(Error::AlreadyStarted)));
    }

    #[tokio::test]
    async fn refuses_stop_without_start_or_twice() {
        let store = store_with("E100").await;

        let early = end_work(&store, "E100", DAY, time!(18:00)).await;
        assert!(matches!(early, Err(Error::NotStarted)));

        start_work(&store, "E100", DAY, time!(09:00)).await.unwrap();
        end_work(&store, "E100", DAY, time!(18:00)).await.unwrap();
        let again = end_work(&store, "E100", DAY, time!(18:30)).await;
        assert!(matches!(again, Err(Error::AlreadyEnded)));
    }

    #[tokio::test]
    async fn rejects_unknown_personnel_number() {
        let store = store_with("E100").await;
        let started = start_work(&store, "E404", DAY, time!(09:00)).await;
        assert!(matches!(started, Err(Error::UnknownEmployee)));
    }

    #[test]
    fn refuses_impossible_offset() {
        let clock = Clock::new(config::Clock {
            utc_offset_hours: 30,
        });
        assert!(clock.is_err());

        let moscow = Clock::new(config::Clock::default()).unwrap();
        let offset = UtcOffset::from_hms(3, 0, 0).unwrap();
        assert_eq!(moscow.now().offset(), offset);
    }

    #[test]
    fn applies_time_corrections() {
        let mut r = record(time!(09:00), Some(time!(18:00)));
        Changes {
            date: Some(DAY),
            start_time: Some(time!(08:30)),
            end_time: None,
        }
        .apply(&mut r)
        .unwrap();
        assert_eq!(r.start_time, time!(08:30));
        assert_eq!(r.end_time, Some(time!(18:00)));
    }

    #[test]
    fn refuses_date_change() {
        let mut r = record(time!(09:00), None);
        let changed = Changes {
            date: Some(date!(2024 - 05 - 21)),
            ..Changes::default()
        }
        .apply(&mut r);
        assert!(matches!(changed, Err(Error::DateChanged)));
    }

    #[test]
    fn refuses_inverted_range() {
        let mut r = record(time!(09:00), Some(time!(18:00)));
        let inverted = Changes {
            start_time: Some(time!(19:00)),
            ..Changes::default()
        }
        .apply(&mut r);
        assert!(matches!(inverted, Err(Error::InvalidRange)));
        assert_eq!(r.start_time, time!(09:00));

        let reopened = Changes {
            end_time: Some(None),
            ..Changes::default()
        }
        .apply(&mut r);
        assert!(reopened.is_ok());
        assert_eq!(r.end_time, None);
    }

    #[tokio::test]
    async fn filters_by_employee() {
        let store = store_with("E100").await;
        start_work(&store, "E100", DAY, time!(09:00)).await.unwrap();

        let all = list(&store, &Filter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        let by_name = Filter {
            full_name: Some("петров".to_owned()),
            ..Filter::default()
        };
        assert_eq!(list(&store, &by_name).await.unwrap().len(), 1);

        let other = Filter {
            personnel_number: Some("E200".to_owned()),
            ..Filter::default()
        };
        assert!(list(&store, &other).await.unwrap().is_empty());
    }
}
