use clap::Parser;

/// Runtime configuration for the table server, sourced from CLI flags or the
/// matching environment variable (see each field's `env` attribute).
#[derive(Parser, Clone, Debug)]
#[command(name = "tablestakes-server", version, about)]
pub struct AppConfig {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "HEARTBEAT_INTERVAL_SECS", default_value_t = 15)]
    pub heartbeat_interval_secs: u64,

    #[arg(long, env = "HEARTBEAT_TIMEOUT_SECS", default_value_t = 45)]
    pub heartbeat_timeout_secs: u64,

    #[arg(long, env = "CHAT_RETENTION_HOURS", default_value_t = 72)]
    pub chat_retention_hours: u64,

    #[arg(long, env = "TURN_TIMER_SECS", default_value_t = 30)]
    pub turn_timer_secs: u64,

    #[arg(long, env = "OUTBOUND_QUEUE_MESSAGES", default_value_t = 256)]
    pub outbound_queue_messages: usize,

    #[arg(long, env = "OUTBOUND_QUEUE_BYTES", default_value_t = 4 * 1024 * 1024)]
    pub outbound_queue_bytes: usize,

    #[arg(long, env = "INSTANCE_ID")]
    pub instance_id: Option<String>,

    #[arg(long, env = "WS_AUTH_SECRET")]
    pub ws_auth_secret: String,

    #[arg(long, env = "PRESENCE_AWAY_SECS", default_value_t = 120)]
    pub presence_away_secs: u64,
}

impl AppConfig {
    pub fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn chat_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.chat_retention_hours as i64)
    }

    pub fn turn_timer(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.turn_timer_secs)
    }

    pub fn presence_away_after(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.presence_away_secs)
    }
}
