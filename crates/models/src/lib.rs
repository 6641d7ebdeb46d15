pub mod analytics;
pub mod batch;
pub mod import;
pub mod marks;
pub mod principal;
pub mod role;
