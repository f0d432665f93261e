use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Merchant id registered with the payment gateway.
    pub zarinpal_merchant_id: String,
    /// Gateway API base, defaults to the sandbox environment.
    pub zarinpal_base_url: String,
    /// Public base URL this service is reachable at; the payment callback
    /// URL is built from it.
    pub callback_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let zarinpal_merchant_id = env::var("ZARINPAL_MERCHANT_ID")?;
        let zarinpal_base_url = env::var("ZARINPAL_BASE_URL")
            .unwrap_or_else(|_| "https://sandbox.zarinpal.com".to_string());
        let callback_base_url = env::var("CALLBACK_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));
        Ok(Self {
            database_url,
            host,
            port,
            zarinpal_merchant_id,
            zarinpal_base_url,
            callback_base_url,
        })
    }
}
