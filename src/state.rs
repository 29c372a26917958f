use std::sync::Arc;

use sqlx::SqlitePool;

use crate::clock::Clock;
use crate::config::Config;
use crate::crypto::SigningKeys;
use crate::email::SystemMailer;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub keys: SigningKeys,
    pub clock: Arc<dyn Clock>,
    pub system_mailer: Option<Arc<SystemMailer>>,
}
