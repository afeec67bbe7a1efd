use config::{Config, Environment, Source};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{self, AuditError};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Evolution API 连接参数
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub instance_name: String,
}

impl ProviderConfig {
    /// URL、密钥、实例名均非空才算已配置
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty() && !self.instance_name.is_empty()
    }
}

// 日志里不输出密钥
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("instance_name", &self.instance_name)
            .finish()
    }
}

/// 电话号码比对策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneMatching {
    /// 完全相同或一方为另一方后缀
    Suffix,
    /// 仅数字完全相同
    Exact,
}

impl FromStr for PhoneMatching {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix),
            "exact" => Ok(Self::Exact),
            other => Err(AuditError::Config(format!(
                "PHONE_MATCHING must be 'suffix' or 'exact', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub lookback_days: u32,
    pub message_fetch_limit: u32,
    pub phone_matching: PhoneMatching,
    pub report_path: PathBuf,
    pub phone_report_path: PathBuf,
}

/// 环境变量的扁平映射 (键已小写)
#[derive(Debug, Deserialize)]
struct EnvSettings {
    database_url: String,
    evolution_api_url: String,
    evolution_api_key: String,
    evolution_instance_name: String,
    lookback_days: u32,
    message_fetch_limit: u32,
    phone_matching: String,
    report_path: String,
    phone_report_path: String,
    server_host: String,
    server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/store".to_string(),
            },
            provider: ProviderConfig::default(),
            audit: AuditConfig {
                lookback_days: 30,
                message_fetch_limit: 500,
                phone_matching: PhoneMatching::Suffix,
                report_path: PathBuf::from("delivery-audit-report.json"),
                phone_report_path: PathBuf::from("phone-report.json"),
            },
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置 (先读取 .env.local / .env，不覆盖已有变量)
    pub fn from_env() -> error::Result<Self> {
        for file in [".env.local", ".env"] {
            if dotenvy::from_filename(file).is_ok() {
                tracing::info!("Loaded environment from {}", file);
            }
        }
        Self::from_source(Environment::default())
    }

    /// 从任意配置源加载，未提供的键使用默认值
    pub fn from_source<S>(source: S) -> error::Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        let settings: EnvSettings = Config::builder()
            .set_default("database_url", defaults.database.url.clone())?
            .set_default("evolution_api_url", "")?
            .set_default("evolution_api_key", "")?
            .set_default("evolution_instance_name", "")?
            .set_default("lookback_days", defaults.audit.lookback_days as i64)?
            .set_default("message_fetch_limit", defaults.audit.message_fetch_limit as i64)?
            .set_default("phone_matching", "suffix")?
            .set_default("report_path", "delivery-audit-report.json")?
            .set_default("phone_report_path", "phone-report.json")?
            .set_default("server_host", defaults.server.host.clone())?
            .set_default("server_port", defaults.server.port as i64)?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        if settings.lookback_days == 0 {
            return Err(AuditError::Config("LOOKBACK_DAYS must be at least 1".to_string()));
        }
        if settings.message_fetch_limit == 0 {
            return Err(AuditError::Config(
                "MESSAGE_FETCH_LIMIT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            server: ServerConfig {
                host: settings.server_host,
                port: settings.server_port,
            },
            database: DatabaseConfig {
                url: settings.database_url,
            },
            provider: ProviderConfig {
                base_url: settings.evolution_api_url.trim_end_matches('/').to_string(),
                api_key: settings.evolution_api_key,
                instance_name: settings.evolution_instance_name,
            },
            audit: AuditConfig {
                lookback_days: settings.lookback_days,
                message_fetch_limit: settings.message_fetch_limit,
                phone_matching: settings.phone_matching.parse()?,
                report_path: PathBuf::from(settings.report_path),
                phone_report_path: PathBuf::from(settings.phone_report_path),
            },
        })
    }
}
