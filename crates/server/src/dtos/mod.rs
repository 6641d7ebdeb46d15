use serde::Serialize;
use utoipa::ToSchema;

pub mod auth;
pub mod department;
pub mod faculty;
pub mod marks;
pub mod settings;
pub mod stats;
pub mod student;
pub mod subject;
pub mod user;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
