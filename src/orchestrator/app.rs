//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：装配存储、身份、队列、客户端与测验流程，
//!    全部单实例、显式注入，不留隐藏全局状态
//! 2. **联网补送**：订阅连通性变化，在离线→在线的边沿补送队列
//! 3. **无头补送入口**：`run()` 做一次健康检查 + 队列补送，
//!    是联网事件补送的手动版

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::{ApiClient, QuizBackend};
use crate::config::Config;
use crate::infrastructure::{Clock, ConnectivityWatcher, JsonFileStore, KvStore, SystemClock};
use crate::services::{EvalService, Normalizer, SessionService, SubmissionQueue};
use crate::workflow::{QuizFlow, QuizFlowOptions};

/// 应用主结构
pub struct App {
    config: Config,
    backend: Arc<dyn QuizBackend>,
    session: Arc<SessionService>,
    queue: Arc<SubmissionQueue>,
    flow: Arc<QuizFlow>,
}

impl App {
    /// 初始化应用：三条持久化记录（设备ID、用户ID、离线队列）
    /// 都落在同一个存储文件里，重启后原样可用
    pub async fn initialize(config: Config) -> Result<Self> {
        let store: Arc<dyn KvStore> = Arc::new(JsonFileStore::new(&config.storage_file));
        let backend: Arc<dyn QuizBackend> = Arc::new(ApiClient::new(&config));
        Self::with_components(config, store, backend, Arc::new(SystemClock)).await
    }

    /// 用宿主平台提供的存储/传输/时钟装配应用
    ///
    /// 核心只依赖这三个接口，换一个宿主（浏览器、移动端、测试）
    /// 不需要改核心代码。
    pub async fn with_components(
        config: Config,
        store: Arc<dyn KvStore>,
        backend: Arc<dyn QuizBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let session = Arc::new(SessionService::initialize(store.clone()).await?);
        let queue = Arc::new(SubmissionQueue::new(store));
        let eval = EvalService::new(backend.clone(), config.eval_concurrency, config.eval_strong);

        let flow = Arc::new(QuizFlow::new(
            backend.clone(),
            session.clone(),
            queue.clone(),
            eval,
            Normalizer::default(),
            clock,
            QuizFlowOptions::from(&config),
        ));

        log_startup(&config, &session);

        Ok(Self {
            config,
            backend,
            session,
            queue,
            flow,
        })
    }

    pub fn flow(&self) -> Arc<QuizFlow> {
        self.flow.clone()
    }

    pub fn session(&self) -> Arc<SessionService> {
        self.session.clone()
    }

    pub fn queue(&self) -> Arc<SubmissionQueue> {
        self.queue.clone()
    }

    /// 订阅连通性变化，回到线上时自动补送离线队列
    ///
    /// 补送失败只告警不退出，队列留到下一次边沿再试；flush 对
    /// 空队列是空操作，所以重复触发无害。
    pub fn spawn_reconnect_flush(
        &self,
        mut watcher: ConnectivityWatcher,
    ) -> tokio::task::JoinHandle<()> {
        let queue = self.queue.clone();
        let backend = self.backend.clone();
        tokio::spawn(async move {
            loop {
                match watcher.changed().await {
                    None => break,
                    Some(true) => {
                        info!("🌐 网络恢复，尝试补送离线队列");
                        if let Err(e) = flush_pending(&queue, backend.clone()).await {
                            warn!("⚠️ 补送失败，队列保留待下次重试: {}", e);
                        }
                    }
                    Some(false) => {}
                }
            }
        })
    }

    /// 无头运行：健康检查 + 一次性补送
    pub async fn run(&self) -> Result<()> {
        match self.backend.health().await {
            Ok(h) => info!("💓 后端在线，服务器时间: {}", h.time),
            Err(e) => warn!("⚠️ 后端健康检查失败: {}", e),
        }

        let pending = self.queue.size().await?;
        if pending == 0 {
            info!("✓ 离线队列为空，无需补送");
            return Ok(());
        }

        info!("📦 离线队列待补送: {} 条", pending);
        match flush_pending(&self.queue, self.backend.clone()).await {
            Ok(n) => info!("✅ 补送完成: {} 条", n),
            Err(e) => warn!("⚠️ 补送失败，队列保留: {}", e),
        }

        if self.config.verbose_logging {
            info!("📊 剩余待补送: {} 条", self.queue.size().await?);
        }
        Ok(())
    }
}

/// 用同一个上报原语补送整个队列
async fn flush_pending(queue: &SubmissionQueue, backend: Arc<dyn QuizBackend>) -> Result<usize> {
    queue
        .flush(|batch| async move {
            backend.submit_attempts(&batch).await?;
            Ok(())
        })
        .await
}

fn log_startup(config: &Config, session: &SessionService) {
    info!("{}", "=".repeat(60));
    info!("🚀 课后测验客户端启动");
    info!("🔗 后端: {}", config.api_base_url);
    info!(
        "👤 使用者: {}  装置: {}  场次: {}",
        session.user_id(),
        session.device_id(),
        session.session_id()
    );
    info!("{}", "=".repeat(60));
}
