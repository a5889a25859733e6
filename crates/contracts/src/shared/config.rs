use serde::Deserialize;

/// Настройки мастера создания заказа
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WizardConfig {
    pub autosave: AutoSaveConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AutoSaveConfig {
    /// Пауза без изменений, после которой черновик сохраняется
    pub quiet_period_secs: u64,
    /// Максимальное время, которое несохранённые изменения могут ждать
    pub max_wait_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Ключ черновика в localStorage
    pub draft_key: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_port: u16,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[autosave]
quiet_period_secs = 5
max_wait_secs = 30

[storage]
draft_key = "rental-order-draft"

[api]
base_port = 3000
"#;

/// Load the wizard configuration.
///
/// `overrides` is a TOML document (for example one served next to the wasm
/// bundle); when absent the embedded default is used.
pub fn load_config(overrides: Option<&str>) -> anyhow::Result<WizardConfig> {
    let config: WizardConfig = match overrides {
        Some(text) => {
            log::info!("Loading wizard config from override document");
            toml::from_str(text)?
        }
        None => {
            log::debug!("Using default embedded wizard configuration");
            toml::from_str(DEFAULT_CONFIG)?
        }
    };

    if config.autosave.max_wait_secs < config.autosave.quiet_period_secs {
        anyhow::bail!(
            "autosave.max_wait_secs ({}) must not be less than autosave.quiet_period_secs ({})",
            config.autosave.max_wait_secs,
            config.autosave.quiet_period_secs
        );
    }
    if config.storage.draft_key.trim().is_empty() {
        anyhow::bail!("storage.draft_key must not be empty");
    }

    Ok(config)
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            autosave: AutoSaveConfig {
                quiet_period_secs: 5,
                max_wait_secs: 30,
            },
            storage: StorageConfig {
                draft_key: "rental-order-draft".to_string(),
            },
            api: ApiConfig { base_port: 3000 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = load_config(None);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.autosave.quiet_period_secs, 5);
        assert_eq!(config.autosave.max_wait_secs, 30);
        assert_eq!(config.storage.draft_key, "rental-order-draft");
        assert_eq!(config, WizardConfig::default());
    }

    #[test]
    fn test_override_is_validated() {
        let text = r#"
[autosave]
quiet_period_secs = 10
max_wait_secs = 3

[storage]
draft_key = "x"

[api]
base_port = 8080
"#;
        assert!(load_config(Some(text)).is_err());

        let text = text.replace("max_wait_secs = 3", "max_wait_secs = 60");
        let config = load_config(Some(&text)).unwrap();
        assert_eq!(config.api.base_port, 8080);
        assert_eq!(config.autosave.max_wait_secs, 60);
    }
}
