//! 离线提交队列 - 业务能力层
//!
//! 持久化保存所有"线上发送失败"的作答记录，按入队顺序补送。
//! 不变量：
//! - 只有 sender 确认成功才清空，失败绝不丢数据
//! - 记录不重排、不合并，attempt_id 原样复用（幂等靠后端按 ID 去重）
//! - 入队与补送的读-改-写互相串行，崩溃/并发都不会丢已入队的记录

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::infrastructure::KvStore;
use crate::models::AttemptUp;

const QUEUE_KEY: &str = "afterclass_attempt_queue_v1";

/// 离线提交队列
pub struct SubmissionQueue {
    store: Arc<dyn KvStore>,
    /// 串行化所有读-改-写，enqueue 不会覆盖并发 flush 的中间状态
    lock: Mutex<()>,
}

impl SubmissionQueue {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// 追加一批作答记录到队尾
    pub async fn enqueue(&self, batch: &[AttemptUp]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock().await;
        let mut cur = self.read_list().await?;
        cur.extend_from_slice(batch);
        self.write_list(&cur).await?;
        info!("📥 已离线入队 {} 条作答记录", batch.len());
        Ok(())
    }

    /// 补送：把整个队列交给 sender，成功才清空
    ///
    /// sender 恰好被调用一次（队列为空则不调用）。sender 失败时
    /// 持久化内容原样保留，由调用方在下次联网事件再试；因此重复
    /// 触发 flush 是安全的。返回补送成功的记录数。
    pub async fn flush<F, Fut>(&self, sender: F) -> Result<usize>
    where
        F: FnOnce(Vec<AttemptUp>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let _guard = self.lock.lock().await;
        let cur = self.read_list().await?;
        if cur.is_empty() {
            return Ok(0);
        }

        let count = cur.len();
        sender(cur).await?;

        // 只有确认送达才走到这里
        self.store.delete(QUEUE_KEY).await?;
        info!("📤 离线队列补送成功: {} 条", count);
        Ok(count)
    }

    /// 当前待补送数量（只读）
    pub async fn size(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.read_list().await?.len())
    }

    /// 查看全部待补送记录（只读）
    pub async fn peek(&self) -> Result<Vec<AttemptUp>> {
        let _guard = self.lock.lock().await;
        self.read_list().await
    }

    /// 无条件清空（仅供管理端显式重置，不在正常补送路径上）
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.delete(QUEUE_KEY).await?;
        Ok(())
    }

    async fn read_list(&self) -> Result<Vec<AttemptUp>> {
        let raw = self.store.get(QUEUE_KEY).await?;
        match raw {
            None => Ok(Vec::new()),
            Some(json) => match serde_json::from_str(&json) {
                Ok(list) => Ok(list),
                Err(e) => {
                    // 损坏的本地数据按空队列处理，不升级为致命错误
                    warn!("⚠️ 离线队列内容损坏，按空队列处理: {}", e);
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn write_list(&self, list: &[AttemptUp]) -> Result<()> {
        let json = serde_json::to_string(list)?;
        self.store.set(QUEUE_KEY, &json).await?;
        Ok(())
    }
}
