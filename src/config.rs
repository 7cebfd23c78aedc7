use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 基地址
    pub api_base_url: String,
    /// Bearer 令牌（可选）
    pub api_bearer: Option<String>,
    /// 本地持久化文件（设备ID / 用户ID / 离线队列都存在这里）
    pub storage_file: String,
    /// 每次测验抽题数量
    pub quiz_item_count: usize,
    /// 测验时长（秒）
    pub quiz_duration_secs: u64,
    /// 单题作答秒数估算上限
    pub avg_per_item_secs: u64,
    /// 提交前是否自动评估计算过程
    pub auto_eval: bool,
    /// 过程评估是否启用强判分策略
    pub eval_strong: bool,
    /// 过程评估并发上限
    pub eval_concurrency: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8787".to_string(),
            api_bearer: None,
            storage_file: "afterclass_store.json".to_string(),
            quiz_item_count: 4,
            quiz_duration_secs: 600,
            avg_per_item_secs: 150,
            auto_eval: false,
            eval_strong: false,
            eval_concurrency: 3,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("AFTERCLASS_API_BASE").unwrap_or(default.api_base_url),
            api_bearer: std::env::var("AFTERCLASS_API_BEARER").ok().or(default.api_bearer),
            storage_file: std::env::var("AFTERCLASS_STORAGE_FILE").unwrap_or(default.storage_file),
            quiz_item_count: std::env::var("AFTERCLASS_ITEM_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quiz_item_count),
            quiz_duration_secs: std::env::var("AFTERCLASS_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.quiz_duration_secs),
            avg_per_item_secs: std::env::var("AFTERCLASS_AVG_PER_ITEM_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.avg_per_item_secs),
            auto_eval: std::env::var("AFTERCLASS_AUTO_EVAL").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_eval),
            eval_strong: std::env::var("AFTERCLASS_EVAL_STRONG").ok().and_then(|v| v.parse().ok()).unwrap_or(default.eval_strong),
            eval_concurrency: std::env::var("AFTERCLASS_EVAL_CONCURRENCY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.eval_concurrency),
            verbose_logging: std::env::var("AFTERCLASS_VERBOSE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 配置文件加载
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::ParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })
    }
}
