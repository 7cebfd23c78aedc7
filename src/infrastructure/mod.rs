//! 基础设施层（Infrastructure Layer）
//!
//! 持有平台资源，只向上暴露能力：
//! - `kv_store` - 最小键值持久化接口及文件/内存实现
//! - `clock` - 可注入的时钟
//! - `connectivity` - 联网状态变化通知

pub mod clock;
pub mod connectivity;
pub mod kv_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connectivity::{ConnectivitySource, ConnectivityWatcher};
pub use kv_store::{JsonFileStore, KvStore, MemoryStore};
