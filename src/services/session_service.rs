//! 身份与会话服务 - 业务能力层
//!
//! 维护 {设备ID, 用户ID, 场次ID} 三元组：
//! - 设备ID：首次启动生成并永久持久化，之后不再变
//! - 用户ID：持久化，默认匿名占位，只能由用户显式修改
//! - 场次ID：每次测验开始/交卷成功后重新生成，只要求每场不同
//!
//! 三个 ID 会盖在每条作答记录上，供后端去重和统计。

use std::sync::{Arc, RwLock};

use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::infrastructure::KvStore;

/// 匿名用户占位符
pub const ANON_USER_ID: &str = "anon";

const DEVICE_ID_KEY: &str = "afterclass_device_id";
const USER_ID_KEY: &str = "afterclass_user_id";

/// 身份快照：组装作答记录时一次性取走
#[derive(Debug, Clone)]
pub struct IdentitySnapshot {
    pub device_id: String,
    pub user_id: String,
    pub session_id: String,
}

/// 身份与会话服务
///
/// 进程内只建一份，按引用传给流程层——单实例语义靠显式构造保证，
/// 不靠隐藏的全局变量。
pub struct SessionService {
    store: Arc<dyn KvStore>,
    device_id: String,
    user_id: RwLock<String>,
    session_id: RwLock<String>,
}

impl SessionService {
    /// 启动时初始化：读出（或生成并持久化）设备ID与用户ID，生成场次ID
    pub async fn initialize(store: Arc<dyn KvStore>) -> AppResult<Self> {
        let device_id = match store.get(DEVICE_ID_KEY).await? {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = Uuid::new_v4().to_string();
                // 先持久化再投入使用
                store.set(DEVICE_ID_KEY, &id).await?;
                info!("🆔 首次启动，生成设备ID: {}", id);
                id
            }
        };

        let user_id = store
            .get(USER_ID_KEY)
            .await?
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ANON_USER_ID.to_string());

        Ok(Self {
            store,
            device_id,
            user_id: RwLock::new(user_id),
            session_id: RwLock::new(Uuid::new_v4().to_string()),
        })
    }

    pub fn device_id(&self) -> String {
        self.device_id.clone()
    }

    pub fn user_id(&self) -> String {
        self.user_id.read().expect("用户ID锁中毒").clone()
    }

    pub fn session_id(&self) -> String {
        self.session_id.read().expect("场次ID锁中毒").clone()
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            device_id: self.device_id(),
            user_id: self.user_id(),
            session_id: self.session_id(),
        }
    }

    /// 用户在设置页修改身份：先持久化，再切换内存值
    pub async fn set_user_id(&self, id: &str) -> AppResult<()> {
        self.store.set(USER_ID_KEY, id).await?;
        *self.user_id.write().expect("用户ID锁中毒") = id.to_string();
        Ok(())
    }

    /// 换新场次（交卷成功后调用），返回新场次ID
    pub fn renew_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        *self.session_id.write().expect("场次ID锁中毒") = id.clone();
        id
    }
}
