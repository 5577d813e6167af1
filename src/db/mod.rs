/// Declares a UUID-backed surrogate key stored in a `UUID` column.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            ::serde::Deserialize,
            ::derive_more::Display,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            ::serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }
        }

        impl From<u128> for $name {
            fn from(value: u128) -> Self {
                Self(::uuid::Uuid::from_u128(value))
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(value: ::uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl ::tokio_postgres::types::FromSql<'_> for $name {
            ::tokio_postgres::types::accepts!(UUID);

            fn from_sql(
                ty: &::tokio_postgres::types::Type,
                raw: &[u8],
            ) -> Result<
                Self,
                Box<dyn ::std::error::Error + Sync + Send>,
            > {
                <::uuid::Uuid as ::tokio_postgres::types::FromSql>::from_sql(
                    ty, raw,
                )
                .map(Self)
            }
        }

        impl ::tokio_postgres::types::ToSql for $name {
            ::tokio_postgres::types::accepts!(UUID);

            ::tokio_postgres::types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &::tokio_postgres::types::Type,
                out: &mut ::tokio_postgres::types::private::BytesMut,
            ) -> Result<
                ::tokio_postgres::types::IsNull,
                Box<dyn ::std::error::Error + Sync + Send>,
            > {
                ::tokio_postgres::types::ToSql::to_sql(&self.0, ty, out)
            }
        }
    };
}

pub mod application;
pub mod employee;
pub mod job_title;
pub mod material;
pub mod memory;
pub mod object;
pub mod right;
pub mod role;
pub mod seed;
pub mod session;
pub mod user;
pub mod work_time;

use tokio_postgres::{tls::NoTlsStream, NoTls, Socket};

pub use tokio_postgres::Error;

pub use self::{
    application::{Application, ApplicationStore},
    employee::{Employee, EmployeeStore},
    job_title::{JobTitle, JobTitleStore},
    material::{Material, MaterialStore},
    memory::Memory,
    object::{Object, ObjectStore},
    right::{Right, RightStore},
    role::{Role, RoleStore},
    session::{Session, SessionStore},
    user::{User, UserStore},
    work_time::{WorkTime, WorkTimeStore},
};

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

pub async fn connect(url: &str) -> Result<(Client, Connection), Error> {
    tokio_postgres::connect(url, NoTls)
        .await
        .map(|(client, connection)| (Client(client), connection))
}

/// PostgreSQL-backed [`Store`].
pub struct Client(tokio_postgres::Client);

/// Every table the backend persists.
pub trait Store:
    ApplicationStore
    + EmployeeStore
    + JobTitleStore
    + MaterialStore
    + ObjectStore
    + RightStore
    + RoleStore
    + SessionStore
    + UserStore
    + WorkTimeStore
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: ApplicationStore
        + EmployeeStore
        + JobTitleStore
        + MaterialStore
        + ObjectStore
        + RightStore
        + RoleStore
        + SessionStore
        + UserStore
        + WorkTimeStore
        + Send
        + Sync
{
}

/// Serde formats for calendar values exchanged over the wire.
pub mod format {
    use time::{Date, Time};

    time::serde::format_description!(
        pub date,
        Date,
        "[year]-[month]-[day]"
    );
    // Seconds may be omitted on input and are always written out.
    time::serde::format_description!(
        pub clock,
        Time,
        "[hour]:[minute][optional [:[second]]]"
    );
}
