use super::{types::Config, ConfigError, ProviderConfig};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Lottery id length is within 4..=32
/// - At least one search provider, Jackett providers carry an API key
/// - qBittorrent section is present and has a URL when a client is configured
/// - Job queue capacity is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if !(4..=32).contains(&config.lottery.id_length) {
        return Err(ConfigError::ValidationError(format!(
            "lottery.id_length must be between 4 and 32, got {}",
            config.lottery.id_length
        )));
    }

    if config.searcher.providers.is_empty() {
        return Err(ConfigError::ValidationError(
            "searcher.providers must list at least one provider".to_string(),
        ));
    }

    for provider in &config.searcher.providers {
        if let ProviderConfig::Jackett(jackett) = provider {
            if jackett.api_key.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "jackett provider requires a non-empty api_key".to_string(),
                ));
            }
        }
    }

    if let Some(client) = &config.torrent_client {
        match &client.qbittorrent {
            Some(qb) if qb.url.trim().is_empty() => {
                return Err(ConfigError::ValidationError(
                    "torrent_client.qbittorrent.url cannot be empty".to_string(),
                ));
            }
            Some(_) => {}
            None => {
                return Err(ConfigError::ValidationError(
                    "torrent_client.qbittorrent section is required".to_string(),
                ));
            }
        }
    }

    if config.downloads.queue_size == 0 {
        return Err(ConfigError::ValidationError(
            "downloads.queue_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        JackettConfig, QBittorrentConfig, ServerConfig, TorrentClientBackend,
        TorrentClientConfig,
    };
    use std::net::IpAddr;

    fn assert_invalid(config: &Config) {
        let result = validate_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_id_length_bounds() {
        let mut config = Config::default();
        config.lottery.id_length = 3;
        assert_invalid(&config);
        config.lottery.id_length = 33;
        assert_invalid(&config);
        config.lottery.id_length = 4;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_no_providers_fails() {
        let mut config = Config::default();
        config.searcher.providers.clear();
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_jackett_without_key_fails() {
        let mut config = Config::default();
        config.searcher.providers = vec![ProviderConfig::Jackett(JackettConfig {
            url: "http://localhost:9117".to_string(),
            api_key: "  ".to_string(),
            indexer: "all".to_string(),
        })];
        assert_invalid(&config);
    }

    #[test]
    fn test_validate_torrent_client_requires_section() {
        let mut config = Config::default();
        config.torrent_client = Some(TorrentClientConfig {
            backend: TorrentClientBackend::Qbittorrent,
            qbittorrent: None,
        });
        assert_invalid(&config);

        config.torrent_client = Some(TorrentClientConfig {
            backend: TorrentClientBackend::Qbittorrent,
            qbittorrent: Some(QBittorrentConfig {
                url: "http://localhost:8081".to_string(),
                username: "admin".to_string(),
                password: "secret".to_string(),
                download_path: None,
                timeout_secs: 15,
            }),
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_queue_size_zero_fails() {
        let mut config = Config::default();
        config.downloads.queue_size = 0;
        assert_invalid(&config);
    }
}
