//! Shapes exchanged with clients as JSON.

pub mod application;
pub mod employee;
pub mod job_title;
pub mod material;
pub mod object;
pub mod role;
pub mod session;
pub mod user;
pub mod work_time;

pub use self::{
    application::Application, employee::Employee, job_title::JobTitle,
    material::Material, object::Object, role::Role, user::User,
    work_time::WorkTime,
};
