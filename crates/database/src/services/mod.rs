pub mod department;
pub mod faculty;
pub mod marks;
pub mod stats;
pub mod student;
pub mod subject;
pub mod user;
