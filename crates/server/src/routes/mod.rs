pub mod auth;
pub mod dashboard;
pub mod department;
pub mod faculty;
pub mod marks;
pub mod root;
pub mod settings;
pub mod student;
pub mod subject;
pub mod user;
