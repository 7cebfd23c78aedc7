//! 集成测试公用件：内存假后端 + 流程装配
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use afterclass_submit::clients::QuizBackend;
use afterclass_submit::error::{AppError, AppResult};
use afterclass_submit::infrastructure::{KvStore, ManualClock, MemoryStore};
use afterclass_submit::models::{
    AttemptUp, AttemptsBulkResp, EvalRequest, EvalResp, HealthResp, Item, ItemKind, ItemStatus,
    ItemsResp,
};
use afterclass_submit::services::{EvalService, Normalizer, SessionService, SubmissionQueue};
use afterclass_submit::workflow::{QuizFlow, QuizFlowOptions};

/// 可控的假后端：能按开关让提交失败，并记录收到的每一批作答
#[derive(Default)]
pub struct FakeBackend {
    pub items: Mutex<Vec<Item>>,
    pub fail_submit: AtomicBool,
    pub submit_calls: AtomicUsize,
    pub submitted: Mutex<Vec<Vec<AttemptUp>>>,
}

impl FakeBackend {
    pub fn with_items(items: Vec<Item>) -> Arc<Self> {
        let backend = Self::default();
        *backend.items.lock().unwrap() = items;
        Arc::new(backend)
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// 收到的最后一批作答
    pub fn last_batch(&self) -> Vec<AttemptUp> {
        self.submitted.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl QuizBackend for FakeBackend {
    async fn health(&self) -> AppResult<HealthResp> {
        Ok(HealthResp {
            ok: true,
            time: Utc::now().to_rfc3339(),
        })
    }

    async fn fetch_items(&self, count: usize, _randomize: bool) -> AppResult<ItemsResp> {
        let items: Vec<Item> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .take(count)
            .cloned()
            .collect();
        Ok(ItemsResp {
            page: 1,
            count: items.len() as u32,
            items,
        })
    }

    async fn fetch_item(&self, id: &str) -> AppResult<Item> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|it| it.id == id)
            .cloned()
            .ok_or_else(|| AppError::api_bad_response(format!("/api/items/{}", id), 404, "没有这题"))
    }

    async fn submit_attempts(&self, attempts: &[AttemptUp]) -> AppResult<AttemptsBulkResp> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        // 给并发触发留出交错的机会
        tokio::task::yield_now().await;

        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(AppError::api_bad_response("/api/attempts/bulk", 503, "后端不可用"));
        }
        self.submitted.lock().unwrap().push(attempts.to_vec());
        Ok(AttemptsBulkResp {
            inserted: attempts.len() as u32,
            updated: 0,
            duplicates: 0,
        })
    }

    async fn evaluate_process(&self, _req: &EvalRequest) -> AppResult<EvalResp> {
        Ok(EvalResp {
            model: "grader-test".to_string(),
            result: serde_json::json!({"score": 0.5}),
        })
    }
}

/// 造一道已发布的题目
pub fn item(id: &str, kind: ItemKind, choices: Option<Vec<&str>>, stem: &str) -> Item {
    Item {
        id: id.to_string(),
        subject: "math".to_string(),
        grade: "G7".to_string(),
        unit: "unit-1".to_string(),
        kcs: vec!["kc-1".to_string()],
        item_type: kind,
        difficulty: 3,
        stem: stem.to_string(),
        choices: choices.map(|c| c.into_iter().map(String::from).collect()),
        answer: None,
        solution: None,
        tags: vec![],
        source: None,
        status: ItemStatus::Published,
    }
}

/// 测试装配：假后端 + 内存存储 + 手动时钟
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub session: Arc<SessionService>,
    pub queue: Arc<SubmissionQueue>,
    pub clock: Arc<ManualClock>,
    pub flow: Arc<QuizFlow>,
}

pub async fn harness(items: Vec<Item>) -> Harness {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let backend = FakeBackend::with_items(items);
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let session = Arc::new(SessionService::initialize(store.clone()).await.unwrap());
    let queue = Arc::new(SubmissionQueue::new(store));
    let eval = EvalService::new(backend.clone(), 2, false);

    let flow = Arc::new(QuizFlow::new(
        backend.clone(),
        session.clone(),
        queue.clone(),
        eval,
        Normalizer::default(),
        clock.clone(),
        QuizFlowOptions {
            item_count: 4,
            duration_secs: 600,
            avg_per_item_secs: 150,
            auto_eval: false,
        },
    ));

    Harness {
        backend,
        session,
        queue,
        clock,
        flow,
    }
}
