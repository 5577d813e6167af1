pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod guard;
pub mod http;
pub mod wtt;

pub use self::config::Config;
