//! 后端 API 客户端
//!
//! 封装所有与测验后端相关的调用逻辑。核心对后端的依赖收敛在
//! `QuizBackend` 这一个接口上，线上实现走 reqwest，测试可以注入假后端。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    AttemptUp, AttemptsBulkResp, EvalRequest, EvalResp, HealthResp, Item, ItemsResp,
};

/// 测验后端能力接口
///
/// 对应后端的五个逻辑操作；路径和动词是实现细节，不属于接口语义。
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// 健康检查
    async fn health(&self) -> AppResult<HealthResp>;
    /// 抽题：固定数量、可乱序，只返回已发布题目
    async fn fetch_items(&self, count: usize, randomize: bool) -> AppResult<ItemsResp>;
    /// 按 ID 取单题
    async fn fetch_item(&self, id: &str) -> AppResult<Item>;
    /// 批量上报作答；以 attempt_id 幂等 upsert，可安全重放
    async fn submit_attempts(&self, attempts: &[AttemptUp]) -> AppResult<AttemptsBulkResp>;
    /// 计算过程评估；尽力而为，失败由调用方降级
    async fn evaluate_process(&self, req: &EvalRequest) -> AppResult<EvalResp>;
}

/// 线上 API 客户端
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bearer: config.api_bearer.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.bearer {
            req = req.bearer_auth(token);
        }
        req
    }

    /// 发送请求并解析 JSON 回应
    ///
    /// 非 2xx 状态一律映射为 `ApiError::BadResponse`，对上层而言
    /// 与网络失败等价（都走离线队列）。
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: reqwest::RequestBuilder,
    ) -> AppResult<T> {
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::api_bad_response(endpoint, status.as_u16(), body));
        }

        resp.json::<T>()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))
    }
}

#[async_trait]
impl QuizBackend for ApiClient {
    async fn health(&self) -> AppResult<HealthResp> {
        let endpoint = "/api/health";
        self.send(endpoint, self.request(reqwest::Method::GET, endpoint))
            .await
    }

    async fn fetch_items(&self, count: usize, randomize: bool) -> AppResult<ItemsResp> {
        let endpoint = "/api/items";
        debug!("抓题: n={} random={}", count, randomize);
        let req = self
            .request(reqwest::Method::GET, endpoint)
            .query(&[("n", count.to_string()), ("random", if randomize { "1" } else { "0" }.to_string())]);
        self.send(endpoint, req).await
    }

    async fn fetch_item(&self, id: &str) -> AppResult<Item> {
        let endpoint = format!("/api/items/{}", id);
        self.send(&endpoint, self.request(reqwest::Method::GET, &endpoint))
            .await
    }

    async fn submit_attempts(&self, attempts: &[AttemptUp]) -> AppResult<AttemptsBulkResp> {
        let endpoint = "/api/attempts/bulk";
        debug!("上报作答: {} 条", attempts.len());
        let req = self
            .request(reqwest::Method::POST, endpoint)
            .json(&serde_json::json!({ "attempts": attempts }));
        self.send(endpoint, req).await
    }

    async fn evaluate_process(&self, req: &EvalRequest) -> AppResult<EvalResp> {
        let endpoint = "/api/process/eval";
        let req = self.request(reqwest::Method::POST, endpoint).json(req);
        self.send(endpoint, req).await
    }
}
