//! 联网补送集成测试：离线交卷 → online 事件 → 自动补送

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use afterclass_submit::infrastructure::{connectivity, KvStore, MemoryStore, SystemClock};
use afterclass_submit::models::{Answer, ItemKind};
use afterclass_submit::orchestrator::App;
use afterclass_submit::workflow::SubmitTrigger;
use afterclass_submit::Config;
use common::{item, FakeBackend};

#[tokio::test]
async fn test_reconnect_event_flushes_queue() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let backend = FakeBackend::with_items(vec![item(
        "I1",
        ItemKind::Single,
        Some(vec!["A", "B"]),
        "题目",
    )]);

    let app = App::with_components(
        Config::default(),
        store,
        backend.clone(),
        Arc::new(SystemClock),
    )
    .await
    .unwrap();

    // 离线状态下交卷 → 入队
    let flow = app.flow();
    flow.start().await.unwrap();
    flow.record_answer("I1", Answer::Single { index: 0 });
    backend.set_fail_submit(true);
    flow.submit(SubmitTrigger::Manual).await.unwrap();

    let queued_ids: Vec<String> = app
        .queue()
        .peek()
        .await
        .unwrap()
        .iter()
        .map(|a| a.attempt_id.clone())
        .collect();
    assert!(!queued_ids.is_empty());

    // 订阅连通性；初始离线
    let (source, watcher) = connectivity::channel(false);
    let handle = app.spawn_reconnect_flush(watcher);

    // 网络恢复 → 自动补送
    backend.set_fail_submit(false);
    let calls_before = backend.submit_calls.load(Ordering::SeqCst);
    source.set_online(true);

    let queue = app.queue();
    let mut drained = false;
    for _ in 0..200 {
        if queue.size().await.unwrap() == 0 {
            drained = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(drained, "队列未在期限内补送完");

    // 补送的正是入队那批 ID
    let replayed: Vec<String> = backend
        .last_batch()
        .iter()
        .map(|a| a.attempt_id.clone())
        .collect();
    assert_eq!(replayed, queued_ids);

    // 再来一次离线→在线的边沿：队列已空，flush 是空操作
    source.set_online(false);
    source.set_online(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        backend.submit_calls.load(Ordering::SeqCst),
        calls_before + 1
    );

    drop(source);
    let _ = handle.await;
}
