use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct SsoConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub registry: RegistryConfig,
    pub redis: Option<RedisConfig>,
    pub tickets: TicketConfig,
    pub sso: SsoSettings,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegistryBackend {
    Memory,
    Json,
    Redis,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub backend: RegistryBackend,
    pub json_path: Option<String>,
    pub reload_interval_seconds: u64,
    pub redis_scan_count: usize,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TicketConfig {
    pub cleaner_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SsoSettings {
    pub enabled: bool,
    pub callback_url_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub admin_api_key: String,
}

impl SsoConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let backend: RegistryBackend = get_env("SERVICE_REGISTRY_TYPE", Some("memory"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let json_path = match backend {
            RegistryBackend::Json => Some(get_env(
                "SERVICE_REGISTRY_JSON_PATH",
                Some("services.json"),
                is_prod,
            )?),
            _ => None,
        };

        let redis = match backend {
            RegistryBackend::Redis => Some(RedisConfig {
                url: get_env("REDIS_URL", None, is_prod)?,
            }),
            _ => None,
        };

        let config = SsoConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("sso-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            registry: RegistryConfig {
                backend,
                json_path,
                reload_interval_seconds: parse_env(
                    "SERVICE_REGISTRY_RELOAD_INTERVAL_SECONDS",
                    "60",
                    is_prod,
                )?,
                redis_scan_count: parse_env("SERVICE_REGISTRY_REDIS_SCAN_COUNT", "100", is_prod)?,
            },
            redis,
            tickets: TicketConfig {
                cleaner_interval_seconds: parse_env(
                    "TICKET_CLEANER_INTERVAL_SECONDS",
                    "120",
                    is_prod,
                )?,
            },
            sso: SsoSettings {
                enabled: parse_env("SSO_ENABLED", "true", is_prod)?,
                callback_url_prefix: env::var("SERVICE_CALLBACK_URL_PREFIX")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },
            security: SecurityConfig {
                admin_api_key: get_env("ADMIN_API_KEY", None, true)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.registry.reload_interval_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SERVICE_REGISTRY_RELOAD_INTERVAL_SECONDS must be positive"
            )));
        }

        if self.registry.redis_scan_count == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SERVICE_REGISTRY_REDIS_SCAN_COUNT must be positive"
            )));
        }

        if self.tickets.cleaner_interval_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TICKET_CLEANER_INTERVAL_SECONDS must be positive"
            )));
        }

        match self.registry.backend {
            RegistryBackend::Redis if self.redis.is_none() => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "REDIS_URL is required for the redis service registry"
                )));
            }
            RegistryBackend::Json if self.registry.json_path.is_none() => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SERVICE_REGISTRY_JSON_PATH is required for the json service registry"
                )));
            }
            _ => {}
        }

        if self.environment == Environment::Prod && self.registry.backend == RegistryBackend::Memory
        {
            tracing::warn!("In-memory service registry in production starts empty on every restart");
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for RegistryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(RegistryBackend::Memory),
            "json" => Ok(RegistryBackend::Json),
            "redis" => Ok(RegistryBackend::Redis),
            _ => Err(format!("Invalid service registry type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SsoConfig {
        SsoConfig {
            common: core_config::Config {
                port: 8080,
                host: "127.0.0.1".to_string(),
            },
            environment: Environment::Dev,
            service_name: "sso-service".to_string(),
            service_version: "0.1.0".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            registry: RegistryConfig {
                backend: RegistryBackend::Memory,
                json_path: None,
                reload_interval_seconds: 60,
                redis_scan_count: 100,
            },
            redis: None,
            tickets: TicketConfig {
                cleaner_interval_seconds: 120,
            },
            sso: SsoSettings {
                enabled: true,
                callback_url_prefix: None,
            },
            security: SecurityConfig {
                admin_api_key: "key".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_zero_reload_interval_rejected() {
        let mut cfg = config();
        cfg.registry.reload_interval_seconds = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut cfg = config();
        cfg.registry.backend = RegistryBackend::Redis;
        assert!(cfg.validate().is_err());
        cfg.redis = Some(RedisConfig {
            url: "redis://localhost:6379".to_string(),
        });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_boolean_rejected() {
        for value in ["0", "off", "no", "False"] {
            env::set_var("SSO_CONFIG_TEST_FLAG", value);
            let parsed = parse_env::<bool>("SSO_CONFIG_TEST_FLAG", "true", false);
            assert!(parsed.is_err(), "{value:?} should not parse as a boolean");
        }
        env::set_var("SSO_CONFIG_TEST_FLAG", "false");
        assert!(!parse_env::<bool>("SSO_CONFIG_TEST_FLAG", "true", false).unwrap());
        env::remove_var("SSO_CONFIG_TEST_FLAG");
        assert!(parse_env::<bool>("SSO_CONFIG_TEST_FLAG", "true", false).unwrap());
    }

    #[test]
    fn test_dev_defaults_to_memory_registry() {
        env::remove_var("ENVIRONMENT");
        env::remove_var("SERVICE_REGISTRY_TYPE");
        env::remove_var("SSO_ENABLED");
        env::set_var("ADMIN_API_KEY", "dev-key");

        let cfg = SsoConfig::from_env().unwrap();
        assert_eq!(cfg.registry.backend, RegistryBackend::Memory);
        assert!(cfg.registry.json_path.is_none());
        assert!(cfg.sso.enabled);

        env::set_var("SSO_ENABLED", "off");
        assert!(SsoConfig::from_env().is_err());
        env::remove_var("SSO_ENABLED");
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("REDIS".parse::<RegistryBackend>(), Ok(RegistryBackend::Redis));
        assert!("ldap".parse::<RegistryBackend>().is_err());
    }
}
