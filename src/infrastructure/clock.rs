//! 时钟 - 基础设施层
//!
//! 倒计时一律用"截止时刻 − 当前时刻"重算，而不是每秒递减的计数器，
//! 这样页签挂起/恢复之后剩余时间依然正确。把时钟抽成接口是为了让
//! 测试能直接拨表。

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// 时钟接口
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动时钟：测试里用 `advance` 拨动
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().expect("时钟锁中毒");
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("时钟锁中毒")
    }
}
