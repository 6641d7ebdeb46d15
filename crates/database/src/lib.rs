pub mod db;
pub mod entities;
pub mod scope;
pub mod services;

pub use sea_orm::{DatabaseConnection, DbErr};
