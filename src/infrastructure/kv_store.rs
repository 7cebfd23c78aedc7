//! 键值持久化 - 基础设施层
//!
//! 核心只依赖一个最小的 get/set/delete 接口；任何能提供这三个操作的
//! 平台（浏览器 IndexedDB、移动端、本地文件）都能不改核心直接接入。
//! 默认实现是单个 JSON 文件，写入采用临时文件+改名保证原子性。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// 最小键值存储接口
///
/// 职责：
/// - 只暴露 get / set / delete 三个能力
/// - 不认识队列 / 会话等业务概念
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// 单文件 JSON 键值存储
///
/// 文件内容是一个扁平 JSON 对象 `{key: value}`。文件损坏时以空表
/// 代替并告警，不让损坏的本地数据变成致命错误。
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> AppResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::storage_read_failed(self.path.display().to_string(), e))?;
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("⚠️ 本地存储文件损坏，按空存储处理: {}", e);
                Ok(HashMap::new())
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> AppResult<()> {
        let content = serde_json::to_string_pretty(map)?;
        atomic_write(&self.path, &content)
            .map_err(|e| AppError::storage_write_failed(self.path.display().to_string(), e))
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// 纯内存键值存储（测试和无文件系统的宿主用）
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.map
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.map.lock().await.remove(key);
        Ok(())
    }
}

/// 先写临时文件再改名，避免进程中断留下半个文件
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
