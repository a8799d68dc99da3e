pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod models;
pub mod query;
pub mod utils;
pub mod web;

pub use config::Config;
pub use database::Database;
pub use models::{Priority, Task, User};
pub use utils::Profile;
