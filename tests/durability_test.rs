//! 持久化集成测试：离线队列与身份三元组跨"进程重启"存活

mod common;

use std::sync::Arc;

use afterclass_submit::infrastructure::{JsonFileStore, KvStore};
use afterclass_submit::models::{Answer, ItemKind};
use afterclass_submit::services::{SessionService, SubmissionQueue};
use afterclass_submit::workflow::SubmitTrigger;
use common::{harness, item};

fn file_store(path: &std::path::Path) -> Arc<dyn KvStore> {
    Arc::new(JsonFileStore::new(path))
}

/// 入队 → 模拟重启 → peek 原样取回（内容、顺序都不变）
#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    // 第一段"进程"：交卷失败入队
    let batch = {
        let h = harness(vec![
            item("I1", ItemKind::Single, Some(vec!["A", "B"]), "第一题"),
            item("I2", ItemKind::Text, None, "第二题"),
        ])
        .await;
        h.flow.start().await.unwrap();
        h.flow.record_answer("I1", Answer::Single { index: 1 });
        h.backend.set_fail_submit(true);
        h.flow.submit(SubmitTrigger::Manual).await.unwrap();

        let queued = h.queue.peek().await.unwrap();
        // 把同样的内容搬进文件存储，模拟真实宿主
        let file_queue = SubmissionQueue::new(file_store(&path));
        file_queue.enqueue(&queued).await.unwrap();
        queued
    };

    // 第二段"进程"：同一路径新开存储
    let reopened = SubmissionQueue::new(file_store(&path));
    assert_eq!(reopened.peek().await.unwrap(), batch);
    assert_eq!(reopened.size().await.unwrap(), 2);

    // 补送失败 → 重启后依然在
    let result = reopened
        .flush(|_batch| async { anyhow::bail!("仍然离线") })
        .await;
    assert!(result.is_err());

    let after_failed_flush = SubmissionQueue::new(file_store(&path));
    assert_eq!(after_failed_flush.peek().await.unwrap(), batch);

    // 补送成功 → 清空，重启后也为空
    after_failed_flush
        .flush(|_batch| async { Ok(()) })
        .await
        .unwrap();
    let after_success = SubmissionQueue::new(file_store(&path));
    assert!(after_success.peek().await.unwrap().is_empty());
}

/// 设备ID只生成一次；用户ID的修改跨重启保留；场次ID每次启动都新
#[tokio::test]
async fn test_identity_triple_lifecycle_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let (device, session_first) = {
        let session = SessionService::initialize(file_store(&path)).await.unwrap();
        assert_eq!(session.user_id(), "anon");
        session.set_user_id("g7_li_hua").await.unwrap();
        (session.device_id(), session.session_id())
    };

    let session = SessionService::initialize(file_store(&path)).await.unwrap();
    assert_eq!(session.device_id(), device);
    assert_eq!(session.user_id(), "g7_li_hua");
    assert_ne!(session.session_id(), session_first);
}

/// 多批次入队保持先后顺序，不重排不合并
#[tokio::test]
async fn test_batches_keep_arrival_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let h = harness(vec![item("I1", ItemKind::Single, Some(vec!["A", "B"]), "题")]).await;
    h.flow.start().await.unwrap();
    h.backend.set_fail_submit(true);

    // 连续两场都失败（成功路径才换题，这里每场都交同一批）
    h.flow.submit(SubmitTrigger::Manual).await.unwrap();
    let first: Vec<String> = h
        .queue
        .peek()
        .await
        .unwrap()
        .iter()
        .map(|a| a.attempt_id.clone())
        .collect();

    h.flow.start().await.unwrap();
    h.flow.submit(SubmitTrigger::Manual).await.unwrap();

    let queue_on_disk = SubmissionQueue::new(file_store(&path));
    queue_on_disk
        .enqueue(&h.queue.peek().await.unwrap())
        .await
        .unwrap();

    let all = queue_on_disk.peek().await.unwrap();
    assert_eq!(all.len(), 2);
    // 第一批的记录仍在队首
    assert_eq!(all[0].attempt_id, first[0]);
}
