use crate::{auth::token::TokenIssuer, config::InstituteSettings};
use database::DatabaseConnection;
use std::sync::Arc;

/// Shared by every handler; cloning is cheap
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenIssuer>,
    pub institute: Arc<InstituteSettings>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, tokens: TokenIssuer, institute: InstituteSettings) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
            institute: Arc::new(institute),
        }
    }
}
