//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::{BadgeError, Result};

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 单次触发调用的处理时限，由宿主（HTTP 入口）施加
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 60,
        }
    }
}

/// 推送通道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushProvider {
    /// Firebase Cloud Messaging HTTP v1
    Fcm,
    /// 仅记录日志，不实际投递（开发环境）
    Log,
}

/// 推送配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub provider: PushProvider,
    pub endpoint: String,
    pub project_id: String,
    /// 由外部注入的访问令牌，本服务不负责签发或刷新
    pub access_token: String,
    pub timeout_seconds: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            provider: PushProvider::Log,
            endpoint: "https://fcm.googleapis.com".to_string(),
            project_id: String::new(),
            access_token: String::new(),
            timeout_seconds: 10,
        }
    }
}

/// 用户文档字段映射
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub badges_field: String,
    pub token_field: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            badges_field: "badges".to_string(),
            token_field: "notificationToken".to_string(),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
    pub metrics_enabled: bool,
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub push: PushConfig,
    pub trigger: TriggerConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "badge-notifier".to_string(),
            environment: "development".to_string(),
            server: ServerConfig::default(),
            push: PushConfig::default(),
            trigger: TriggerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. .env 文件（仅注入进程环境变量）
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. config/{service_name}.toml（服务特定配置）
    /// 5. 环境变量（BADGE_ 前缀，`__` 分隔层级，如 BADGE_PUSH__ACCESS_TOKEN -> push.access_token）
    pub fn load(service_name: &str) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let env = std::env::var("BADGE_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 从指定目录加载配置，环境名由调用方给出
    pub fn load_from(config_dir: &Path, env: &str, service_name: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{env}.toml"))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{service_name}.toml"))).required(false),
            )
            .add_source(
                Environment::with_prefix("BADGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// 校验配置组合是否可用
    ///
    /// 使用 FCM 通道时必须提供项目 ID 和访问令牌。
    pub fn validate(&self) -> Result<()> {
        if self.push.provider == PushProvider::Fcm {
            if self.push.project_id.trim().is_empty() {
                return Err(BadgeError::InvalidConfig {
                    key: "push.project_id".to_string(),
                    message: "FCM 通道需要项目 ID".to_string(),
                });
            }
            if self.push.access_token.trim().is_empty() {
                return Err(BadgeError::InvalidConfig {
                    key: "push.access_token".to_string(),
                    message: "FCM 通道需要访问令牌".to_string(),
                });
            }
        }
        if self.trigger.badges_field.is_empty() || self.trigger.token_field.is_empty() {
            return Err(BadgeError::InvalidConfig {
                key: "trigger".to_string(),
                message: "字段名不能为空".to_string(),
            });
        }
        Ok(())
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
