use serde::Deserialize;

/// Top-level server configuration, loaded from `parlor.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub data: DataConfig,
    pub caches: CacheConfig,
    pub rooms: RoomsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:1145".to_string(),
            web_root: "web".to_string(),
            data: DataConfig::default(),
            caches: CacheConfig::default(),
            rooms: RoomsConfig::default(),
        }
    }
}

/// Durable storage locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub users_db: String,
    pub chat_db: String,
    pub icon_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            users_db: "users.db".to_string(),
            chat_db: "chat.db".to_string(),
            icon_dir: "icons".to_string(),
        }
    }
}

/// Write-behind cache cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between unread/chat flushes.
    pub flush_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 600,
        }
    }
}

/// Room lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// Seconds between empty-room sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Load `parlor.toml` from the working directory, falling back to the
    /// defaults when it is absent or malformed.
    pub fn load() -> Self {
        match std::fs::read_to_string("parlor.toml") {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed parlor.toml, using defaults");
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.caches.flush_interval_secs, 600);
        assert_eq!(config.rooms.sweep_interval_secs, 300);
        assert!(!config.listen_addr.is_empty());
    }

    #[test]
    fn partial_toml_fills_the_rest() {
        let config: ServerConfig = toml::from_str(
            r#"
            listen_addr = "127.0.0.1:9999"

            [caches]
            flush_interval_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9999");
        assert_eq!(config.caches.flush_interval_secs, 5);
        assert_eq!(config.rooms.sweep_interval_secs, 300);
        assert_eq!(config.data.users_db, "users.db");
    }
}
