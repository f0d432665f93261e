use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, events::EventBus, gateway::ZarinpalClient};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: AppConfig,
    pub gateway: ZarinpalClient,
    pub events: EventBus,
}
