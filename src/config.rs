use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub db: Db,
    pub http: Http,
    pub session: Session,
    #[serde(default)]
    pub clock: Clock,
    pub bootstrap: Option<Bootstrap>,
}

/// Storage backend selection.
#[derive(Deserialize)]
#[serde(rename_all = "lowercase", tag = "backend")]
pub enum Db {
    Postgres { url: String },

    /// Volatile in-process tables, lost on restart.
    Memory,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct Session {
    #[serde(default = "Session::default_cookie_name")]
    pub cookie_name: String,
    #[serde(with = "humantime_serde")]
    pub lifetime: time::Duration,
    /// Marks the session cookie `Secure`.
    #[serde(default)]
    pub secure: bool,
}

impl Session {
    fn default_cookie_name() -> String {
        "sessionid".to_owned()
    }
}

#[derive(Clone, Copy, Deserialize)]
pub struct Clock {
    /// Offset of the local working day from UTC.
    pub utc_offset_hours: i8,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            utc_offset_hours: 3,
        }
    }
}

/// Administrator account created on startup when missing.
#[derive(Deserialize)]
pub struct Bootstrap {
    pub admin_login: String,
    pub admin_password: String,
}
