//! Volatile [`Store`](super::Store) keeping every table in process memory.
//!
//! Foreign-key policies of the relational schema (cascades and nullified
//! references) are reproduced by the delete operations.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::{Date, OffsetDateTime, Time};

use super::{
    application::{self, Application, ApplicationStore},
    employee::{self, Employee, EmployeeStore},
    job_title::{self, JobTitle, JobTitleStore},
    material::{self, Material, MaterialStore},
    object::{self, Object, ObjectStore},
    right::{self, Right, RightStore},
    role::{self, Role, RoleStore},
    session::{self, Session, SessionStore},
    user::{self, User, UserStore},
    work_time::{self, WorkTime, WorkTimeStore},
    Error,
};

#[derive(Default)]
pub struct Memory(RwLock<Tables>);

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    rights: Vec<Right>,
    role_rights: HashSet<(role::Id, right::Id)>,
    job_titles: Vec<JobTitle>,
    objects: Vec<Object>,
    materials: Vec<Material>,
    employees: Vec<Employee>,
    application_types: Vec<application::Type>,
    application_statuses: Vec<application::Status>,
    applications: Vec<Application>,
    work_times: Vec<WorkTime>,
    sessions: Vec<Session>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Inserts `row` or replaces the row sharing its key.
fn upsert<T: Clone, K: PartialEq>(
    rows: &mut Vec<T>,
    row: &T,
    key: impl Fn(&T) -> K,
) {
    match rows.iter().position(|r| key(r) == key(row)) {
        Some(i) => rows[i] = row.clone(),
        None => rows.push(row.clone()),
    }
}

/// Removes rows matching `pred`, returning whether any did.
fn remove<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|r| !pred(r));
    rows.len() != before
}

fn sorted<T: Clone, K: Ord>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(key);
    rows
}

#[async_trait]
impl UserStore for Memory {
    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error> {
        Ok(self.0.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        Ok(self.0.read().users.iter().find(|u| u.login == login).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        Ok(sorted(&self.0.read().users, |u| u.login.clone()))
    }

    async fn write_user(&self, user: &User) -> Result<(), Error> {
        upsert(&mut self.0.write().users, user, |u| u.id);
        Ok(())
    }

    async fn delete_user(&self, id: user::Id) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.users, |u| u.id == id) {
            return Ok(false);
        }
        tables.sessions.retain(|s| s.user != id);
        for employee in &mut tables.employees {
            if employee.user == Some(id) {
                employee.user = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl RoleStore for Memory {
    async fn get_role_by_id(
        &self,
        id: role::Id,
    ) -> Result<Option<Role>, Error> {
        Ok(self.0.read().roles.iter().find(|r| r.id == id).cloned())
    }

    async fn get_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Role>, Error> {
        Ok(self.0.read().roles.iter().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, Error> {
        Ok(sorted(&self.0.read().roles, |r| r.name.clone()))
    }

    async fn write_role(&self, role: &Role) -> Result<(), Error> {
        upsert(&mut self.0.write().roles, role, |r| r.id);
        Ok(())
    }

    async fn delete_role(&self, id: role::Id) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.roles, |r| r.id == id) {
            return Ok(false);
        }
        tables.role_rights.retain(|(role, _)| *role != id);
        for user in &mut tables.users {
            if user.role == Some(id) {
                user.role = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl RightStore for Memory {
    async fn get_right_by_action(
        &self,
        action: &str,
    ) -> Result<Option<Right>, Error> {
        Ok(self.0.read().rights.iter().find(|r| r.action == action).cloned())
    }

    async fn list_rights(&self) -> Result<Vec<Right>, Error> {
        Ok(sorted(&self.0.read().rights, |r| r.action.clone()))
    }

    async fn write_right(&self, right: &Right) -> Result<(), Error> {
        let mut tables = self.0.write();
        if !tables.rights.iter().any(|r| r.action == right.action) {
            tables.rights.push(right.clone());
        }
        Ok(())
    }

    async fn list_role_rights(
        &self,
        role: role::Id,
    ) -> Result<Vec<Right>, Error> {
        let tables = self.0.read();
        let mut rights = tables
            .rights
            .iter()
            .filter(|r| tables.role_rights.contains(&(role, r.id)))
            .cloned()
            .collect::<Vec<_>>();
        rights.sort_by(|a, b| a.action.cmp(&b.action));
        Ok(rights)
    }

    async fn grant_right(
        &self,
        role: role::Id,
        right: right::Id,
    ) -> Result<(), Error> {
        self.0.write().role_rights.insert((role, right));
        Ok(())
    }

    async fn set_role_rights(
        &self,
        role: role::Id,
        rights: &[right::Id],
    ) -> Result<(), Error> {
        let mut tables = self.0.write();
        tables.role_rights.retain(|(r, _)| *r != role);
        tables
            .role_rights
            .extend(rights.iter().map(|right| (role, *right)));
        Ok(())
    }

    async fn role_has_right(
        &self,
        role: role::Id,
        action: &str,
    ) -> Result<bool, Error> {
        let tables = self.0.read();
        Ok(tables
            .rights
            .iter()
            .filter(|r| r.action == action)
            .any(|r| tables.role_rights.contains(&(role, r.id))))
    }
}

#[async_trait]
impl JobTitleStore for Memory {
    async fn get_job_title_by_id(
        &self,
        id: job_title::Id,
    ) -> Result<Option<JobTitle>, Error> {
        Ok(self.0.read().job_titles.iter().find(|j| j.id == id).cloned())
    }

    async fn get_job_title_by_name(
        &self,
        name: &str,
    ) -> Result<Option<JobTitle>, Error> {
        Ok(self.0.read().job_titles.iter().find(|j| j.name == name).cloned())
    }

    async fn list_job_titles(&self) -> Result<Vec<JobTitle>, Error> {
        Ok(sorted(&self.0.read().job_titles, |j| j.name.clone()))
    }

    async fn write_job_title(&self, job_title: &JobTitle) -> Result<(), Error> {
        upsert(&mut self.0.write().job_titles, job_title, |j| j.id);
        Ok(())
    }

    async fn delete_job_title(&self, id: job_title::Id) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.job_titles, |j| j.id == id) {
            return Ok(false);
        }
        for employee in &mut tables.employees {
            if employee.job_title == Some(id) {
                employee.job_title = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ObjectStore for Memory {
    async fn get_object_by_id(
        &self,
        id: object::Id,
    ) -> Result<Option<Object>, Error> {
        Ok(self.0.read().objects.iter().find(|o| o.id == id).cloned())
    }

    async fn get_object_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Object>, Error> {
        Ok(self.0.read().objects.iter().find(|o| o.name == name).cloned())
    }

    async fn list_objects(&self) -> Result<Vec<Object>, Error> {
        Ok(sorted(&self.0.read().objects, |o| o.name.clone()))
    }

    async fn write_object(&self, object: &Object) -> Result<(), Error> {
        upsert(&mut self.0.write().objects, object, |o| o.id);
        Ok(())
    }

    async fn delete_object(&self, id: object::Id) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.objects, |o| o.id == id) {
            return Ok(false);
        }
        tables.materials.retain(|m| m.object != id);
        for employee in &mut tables.employees {
            if employee.object == Some(id) {
                employee.object = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl MaterialStore for Memory {
    async fn get_material_by_id(
        &self,
        id: material::Id,
    ) -> Result<Option<Material>, Error> {
        Ok(self.0.read().materials.iter().find(|m| m.id == id).cloned())
    }

    async fn list_materials(&self) -> Result<Vec<Material>, Error> {
        Ok(sorted(&self.0.read().materials, |m| m.name.clone()))
    }

    async fn write_material(&self, material: &Material) -> Result<(), Error> {
        upsert(&mut self.0.write().materials, material, |m| m.id);
        Ok(())
    }

    async fn delete_material(&self, id: material::Id) -> Result<bool, Error> {
        Ok(remove(&mut self.0.write().materials, |m| m.id == id))
    }
}

#[async_trait]
impl EmployeeStore for Memory {
    async fn get_employee_by_id(
        &self,
        id: employee::Id,
    ) -> Result<Option<Employee>, Error> {
        Ok(self.0.read().employees.iter().find(|e| e.id == id).cloned())
    }

    async fn get_employee_by_personnel_number(
        &self,
        personnel_number: &str,
    ) -> Result<Option<Employee>, Error> {
        Ok(self
            .0
            .read()
            .employees
            .iter()
            .find(|e| e.personnel_number == personnel_number)
            .cloned())
    }

    async fn get_employee_by_user(
        &self,
        user: user::Id,
    ) -> Result<Option<Employee>, Error> {
        Ok(self
            .0
            .read()
            .employees
            .iter()
            .find(|e| e.user == Some(user))
            .cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, Error> {
        Ok(sorted(&self.0.read().employees, |e| e.full_name.clone()))
    }

    async fn write_employee(&self, employee: &Employee) -> Result<(), Error> {
        upsert(&mut self.0.write().employees, employee, |e| e.id);
        Ok(())
    }

    async fn delete_employee(&self, id: employee::Id) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.employees, |e| e.id == id) {
            return Ok(false);
        }
        tables.work_times.retain(|w| w.employee != id);
        Ok(true)
    }
}

#[async_trait]
impl ApplicationStore for Memory {
    async fn get_application_by_id(
        &self,
        id: application::Id,
    ) -> Result<Option<Application>, Error> {
        Ok(self.0.read().applications.iter().find(|a| a.id == id).cloned())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, Error> {
        let mut applications = self.0.read().applications.clone();
        applications.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
        });
        Ok(applications)
    }

    async fn write_application(
        &self,
        application: &Application,
    ) -> Result<(), Error> {
        upsert(&mut self.0.write().applications, application, |a| a.id);
        Ok(())
    }

    async fn delete_application(
        &self,
        id: application::Id,
    ) -> Result<bool, Error> {
        Ok(remove(&mut self.0.write().applications, |a| a.id == id))
    }

    async fn get_application_type_by_id(
        &self,
        id: application::TypeId,
    ) -> Result<Option<application::Type>, Error> {
        Ok(self
            .0
            .read()
            .application_types
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn get_application_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<application::Type>, Error> {
        Ok(self
            .0
            .read()
            .application_types
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn list_application_types(
        &self,
    ) -> Result<Vec<application::Type>, Error> {
        Ok(sorted(&self.0.read().application_types, |t| t.name.clone()))
    }

    async fn write_application_type(
        &self,
        kind: &application::Type,
    ) -> Result<(), Error> {
        upsert(&mut self.0.write().application_types, kind, |t| t.id);
        Ok(())
    }

    async fn delete_application_type(
        &self,
        id: application::TypeId,
    ) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.application_types, |t| t.id == id) {
            return Ok(false);
        }
        for application in &mut tables.applications {
            if application.kind == Some(id) {
                application.kind = None;
            }
        }
        Ok(true)
    }

    async fn get_application_status_by_id(
        &self,
        id: application::StatusId,
    ) -> Result<Option<application::Status>, Error> {
        Ok(self
            .0
            .read()
            .application_statuses
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_application_status_by_name(
        &self,
        name: &str,
    ) -> Result<Option<application::Status>, Error> {
        Ok(self
            .0
            .read()
            .application_statuses
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list_application_statuses(
        &self,
    ) -> Result<Vec<application::Status>, Error> {
        Ok(sorted(&self.0.read().application_statuses, |s| s.name.clone()))
    }

    async fn write_application_status(
        &self,
        status: &application::Status,
    ) -> Result<(), Error> {
        upsert(&mut self.0.write().application_statuses, status, |s| s.id);
        Ok(())
    }

    async fn delete_application_status(
        &self,
        id: application::StatusId,
    ) -> Result<bool, Error> {
        let mut tables = self.0.write();
        if !remove(&mut tables.application_statuses, |s| s.id == id) {
            return Ok(false);
        }
        for application in &mut tables.applications {
            if application.status == Some(id) {
                application.status = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl WorkTimeStore for Memory {
    async fn get_work_time_by_id(
        &self,
        id: work_time::Id,
    ) -> Result<Option<WorkTime>, Error> {
        Ok(self.0.read().work_times.iter().find(|w| w.id == id).cloned())
    }

    async fn get_work_time(
        &self,
        employee: employee::Id,
        date: Date,
    ) -> Result<Option<WorkTime>, Error> {
        Ok(self
            .0
            .read()
            .work_times
            .iter()
            .find(|w| w.employee == employee && w.date == date)
            .cloned())
    }

    async fn insert_work_time(&self, record: &WorkTime) -> Result<bool, Error> {
        let mut tables = self.0.write();
        let taken = tables
            .work_times
            .iter()
            .any(|w| w.employee == record.employee && w.date == record.date);
        if !taken {
            tables.work_times.push(record.clone());
        }
        Ok(!taken)
    }

    async fn close_work_time(
        &self,
        employee: employee::Id,
        date: Date,
        end_time: Time,
    ) -> Result<Option<WorkTime>, Error> {
        let mut tables = self.0.write();
        let closed = tables
            .work_times
            .iter_mut()
            .find(|w| {
                w.employee == employee && w.date == date && w.end_time.is_none()
            })
            .map(|w| {
                w.end_time = Some(end_time);
                w.clone()
            });
        Ok(closed)
    }

    async fn write_work_time(&self, record: &WorkTime) -> Result<(), Error> {
        upsert(&mut self.0.write().work_times, record, |w| w.id);
        Ok(())
    }

    async fn delete_work_time(
        &self,
        employee: employee::Id,
        date: Date,
    ) -> Result<bool, Error> {
        Ok(remove(&mut self.0.write().work_times, |w| {
            w.employee == employee && w.date == date
        }))
    }

    async fn list_work_times(
        &self,
        employees: Option<&[employee::Id]>,
        since: Option<Date>,
    ) -> Result<Vec<WorkTime>, Error> {
        let mut records = self
            .0
            .read()
            .work_times
            .iter()
            .filter(|w| employees.map_or(true, |ids| ids.contains(&w.employee)))
            .filter(|w| since.map_or(true, |since| w.date >= since))
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            b.date.cmp(&a.date).then(b.start_time.cmp(&a.start_time))
        });
        Ok(records)
    }
}

#[async_trait]
impl SessionStore for Memory {
    async fn get_session(
        &self,
        handle: session::Handle,
    ) -> Result<Option<Session>, Error> {
        Ok(self.0.read().sessions.iter().find(|s| s.handle == handle).cloned())
    }

    async fn write_session(&self, session: &Session) -> Result<(), Error> {
        upsert(&mut self.0.write().sessions, session, |s| s.handle);
        Ok(())
    }

    async fn delete_session(
        &self,
        handle: session::Handle,
    ) -> Result<bool, Error> {
        Ok(remove(&mut self.0.write().sessions, |s| s.handle == handle))
    }

    async fn delete_expired_sessions(
        &self,
        now: OffsetDateTime,
    ) -> Result<u64, Error> {
        let mut tables = self.0.write();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| !s.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, time};

    use super::*;

    fn employee(personnel_number: &str) -> Employee {
        Employee {
            id: employee::Id::new(),
            full_name: "Иванов Иван".to_owned(),
            personnel_number: personnel_number.to_owned(),
            phone_number: String::new(),
            email: String::new(),
            bank_details: String::new(),
            passport: String::new(),
            job_title: None,
            object: None,
            user: None,
        }
    }

    #[tokio::test]
    async fn keeps_one_work_time_per_day() {
        let store = Memory::new();
        let e = employee("E1");
        let record = WorkTime {
            id: work_time::Id::new(),
            employee: e.id,
            date: date!(2024 - 03 - 01),
            start_time: time!(09:00),
            end_time: None,
        };
        assert!(store.insert_work_time(&record).await.unwrap());

        let again = WorkTime {
            id: work_time::Id::new(),
            ..record.clone()
        };
        assert!(!store.insert_work_time(&again).await.unwrap());
    }

    #[tokio::test]
    async fn closes_only_open_work_time() {
        let store = Memory::new();
        let e = employee("E1");
        let day = date!(2024 - 03 - 01);
        store
            .insert_work_time(&WorkTime {
                id: work_time::Id::new(),
                employee: e.id,
                date: day,
                start_time: time!(09:00),
                end_time: None,
            })
            .await
            .unwrap();

        let closed = store.close_work_time(e.id, day, time!(18:00)).await;
        assert_eq!(closed.unwrap().unwrap().end_time, Some(time!(18:00)));

        let closed = store.close_work_time(e.id, day, time!(19:00)).await;
        assert!(closed.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_object_cascades_to_materials() {
        let store = Memory::new();
        let site = Object {
            id: object::Id::new(),
            name: "Site".to_owned(),
            address: "ул. Мира, 1".to_owned(),
            description: None,
        };
        store.write_object(&site).await.unwrap();

        let mut e = employee("E1");
        e.object = Some(site.id);
        store.write_employee(&e).await.unwrap();
        store
            .write_material(&Material {
                id: material::Id::new(),
                name: "Cement".to_owned(),
                amount: 10.into(),
                object: site.id,
            })
            .await
            .unwrap();

        assert!(store.delete_object(site.id).await.unwrap());
        assert!(store.list_materials().await.unwrap().is_empty());
        let e = store.get_employee_by_id(e.id).await.unwrap().unwrap();
        assert_eq!(e.object, None);
    }
}
