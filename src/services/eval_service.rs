//! 过程评估服务 - 业务能力层
//!
//! 把学生的文字步骤和手写笔迹送后端评分（可选功能）。整批评估是
//! 有界并发的 map：每道题独立成败，单题失败记为 null，绝不把
//! 整卷提交拖下水。

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::clients::QuizBackend;
use crate::models::{EvalPolicy, EvalRequest, EvalResp, ItemKind, StepsMeta, StepsPayload};

/// 单题评估任务
#[derive(Debug, Clone)]
pub struct EvalJob {
    pub item_id: String,
    pub stem: String,
    pub solution: Option<String>,
    pub item_type: ItemKind,
    /// 学生写下的文字步骤
    pub notes: Vec<String>,
    /// 手写板导出的原始 JSON 字符串
    pub work_json: Option<String>,
    pub has_work_png: bool,
}

/// 过程评估服务
pub struct EvalService {
    backend: Arc<dyn QuizBackend>,
    concurrency: usize,
    strong: bool,
}

impl EvalService {
    pub fn new(backend: Arc<dyn QuizBackend>, concurrency: usize, strong: bool) -> Self {
        Self {
            backend,
            concurrency: concurrency.max(1),
            strong,
        }
    }

    /// 评估一批题目，返回 item_id → 评估结果（失败为 None）
    pub async fn evaluate_batch(&self, jobs: Vec<EvalJob>) -> HashMap<String, Option<EvalResp>> {
        debug!("开始过程评估: {} 题, 并发 {}", jobs.len(), self.concurrency);

        futures::stream::iter(jobs)
            .map(|job| {
                let backend = self.backend.clone();
                let strong = self.strong;
                async move {
                    let item_id = job.item_id.clone();
                    let req = build_request(job, strong);
                    match backend.evaluate_process(&req).await {
                        Ok(resp) => (item_id, Some(resp)),
                        Err(e) => {
                            // 评估失败不中断整张卷
                            warn!("⚠️ 题目 {} 过程评估失败: {}", item_id, e);
                            (item_id, None)
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

fn build_request(job: EvalJob, strong: bool) -> EvalRequest {
    // 手写笔迹 JSON 解析失败时退化为空数组
    let sketch_paths = job
        .work_json
        .as_deref()
        .and_then(|raw| serde_json::from_str::<JsonValue>(raw).ok())
        .unwrap_or_else(|| JsonValue::Array(vec![]));

    EvalRequest {
        stem: job.stem,
        solution: job.solution,
        steps: StepsPayload {
            notes: job.notes,
            sketch_paths,
            meta: StepsMeta {
                item_type: job.item_type,
                has_work_png: job.has_work_png,
            },
        },
        policy: EvalPolicy { strong },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::{AttemptUp, AttemptsBulkResp, HealthResp, Item, ItemsResp};
    use async_trait::async_trait;

    /// 指定题干包含 "fail" 时评估失败的假后端
    struct FlakyEvalBackend;

    #[async_trait]
    impl QuizBackend for FlakyEvalBackend {
        async fn health(&self) -> AppResult<HealthResp> {
            unimplemented!()
        }
        async fn fetch_items(&self, _count: usize, _randomize: bool) -> AppResult<ItemsResp> {
            unimplemented!()
        }
        async fn fetch_item(&self, _id: &str) -> AppResult<Item> {
            unimplemented!()
        }
        async fn submit_attempts(&self, _attempts: &[AttemptUp]) -> AppResult<AttemptsBulkResp> {
            unimplemented!()
        }
        async fn evaluate_process(&self, req: &EvalRequest) -> AppResult<EvalResp> {
            if req.stem.contains("fail") {
                Err(AppError::api_bad_response("/api/process/eval", 500, "炸了"))
            } else {
                Ok(EvalResp {
                    model: "grader-v2".to_string(),
                    result: serde_json::json!({"score": 1}),
                })
            }
        }
    }

    fn job(id: &str, stem: &str) -> EvalJob {
        EvalJob {
            item_id: id.to_string(),
            stem: stem.to_string(),
            solution: None,
            item_type: ItemKind::Numeric,
            notes: vec!["第一步".to_string()],
            work_json: None,
            has_work_png: false,
        }
    }

    #[tokio::test]
    async fn test_partial_failure_degrades_to_null() {
        let svc = EvalService::new(Arc::new(FlakyEvalBackend), 2, false);
        let results = svc
            .evaluate_batch(vec![job("a", "正常题"), job("b", "会 fail 的题"), job("c", "另一道")])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results["a"].is_some());
        assert!(results["b"].is_none());
        assert!(results["c"].is_some());
    }

    #[test]
    fn test_malformed_sketch_json_becomes_empty_array() {
        let mut j = job("a", "题");
        j.work_json = Some("{broken".to_string());
        let req = build_request(j, false);
        assert_eq!(req.steps.sketch_paths, serde_json::json!([]));

        let mut j2 = job("b", "题");
        j2.work_json = Some("[[0,1],[2,3]]".to_string());
        let req2 = build_request(j2, true);
        assert_eq!(req2.steps.sketch_paths, serde_json::json!([[0, 1], [2, 3]]));
        assert!(req2.policy.strong);
    }
}
