//! 连通性通知 - 基础设施层
//!
//! 浏览器里的 `online` 事件在这里抽象成一个 watch 通道：宿主平台
//! 在联网状态变化时调用 `set_online`，订阅方在离线→在线的边沿
//! 触发补送。重复触发是安全的（队列为空时 flush 是空操作）。

use tokio::sync::watch;

/// 连通性状态源（宿主平台持有）
pub struct ConnectivitySource {
    tx: watch::Sender<bool>,
}

impl ConnectivitySource {
    pub fn set_online(&self, online: bool) {
        // 接收端全部退订也不算错误
        let _ = self.tx.send(online);
    }
}

/// 连通性订阅端
#[derive(Clone)]
pub struct ConnectivityWatcher {
    rx: watch::Receiver<bool>,
}

impl ConnectivityWatcher {
    pub fn is_online(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待下一次进入在线状态
    ///
    /// 状态源被丢弃后返回 `false`，订阅循环应当退出。
    pub async fn wait_online(&mut self) -> bool {
        loop {
            if *self.rx.borrow_and_update() {
                return true;
            }
            if self.rx.changed().await.is_err() {
                return false;
            }
        }
    }

    /// 等待任意一次状态变化；源已丢弃时返回 `None`
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

/// 建立一对（源，订阅端）
pub fn channel(initial_online: bool) -> (ConnectivitySource, ConnectivityWatcher) {
    let (tx, rx) = watch::channel(initial_online);
    (ConnectivitySource { tx }, ConnectivityWatcher { rx })
}
