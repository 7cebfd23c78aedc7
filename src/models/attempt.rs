use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{Answer, Item, ItemKind};

/// 批次作答上传记录（与后端 attempts/bulk 对齐）
///
/// 一次提交里每道题对应一条。`attempt_id` 在组装批次时一次性生成，
/// 之后无论重试多少次都原样复用——后端靠它去重，实现幂等 upsert。
/// 记录要么立即发送成功后丢弃，要么整批进离线队列等待补送，
/// 从不部分更新。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptUp {
    /// 全局唯一，客户端生成，幂等键
    pub attempt_id: String,
    pub user_id: String,
    pub item_id: String,
    /// ISO-8601 时间戳
    pub ts: String,
    pub elapsed_sec: u32,
    /// 规范形态的答案（绝不会是 truefalse），未作答为 null
    pub raw_answer: Option<Answer>,
    pub attempts: u32,
    /// 暂未启用对象存储上传，恒为 null
    pub work_url: Option<String>,
    /// 手写板笔迹 JSON（解析失败以 null 代替）
    pub process_json: Option<JsonValue>,
    /// 过程评估的评分结果
    pub rubric_json: Option<JsonValue>,
    /// 产出 rubric 的模型名
    pub eval_model: Option<String>,
    pub device_id: Option<String>,
    pub session_id: Option<String>,
}

/// `/api/items` 回应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResp {
    pub page: u32,
    pub count: u32,
    pub items: Vec<Item>,
}

/// `/api/health` 回应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResp {
    pub ok: bool,
    pub time: String,
}

/// `/api/attempts/bulk` 回应
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttemptsBulkResp {
    pub inserted: u32,
    pub updated: u32,
    pub duplicates: u32,
}

/// `/api/process/eval` 回应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResp {
    pub model: String,
    pub result: JsonValue,
}

/// 过程评估请求
#[derive(Debug, Clone, Serialize)]
pub struct EvalRequest {
    pub stem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    pub steps: StepsPayload,
    pub policy: EvalPolicy,
}

/// 过程评估的步骤载荷：文字步骤 + 手写笔迹路径 + 元信息
#[derive(Debug, Clone, Serialize)]
pub struct StepsPayload {
    pub notes: Vec<String>,
    /// 手写板导出的路径数组；原始 JSON 解析失败时退化为空数组
    pub sketch_paths: JsonValue,
    pub meta: StepsMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepsMeta {
    pub item_type: ItemKind,
    pub has_work_png: bool,
}

/// 评估策略
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvalPolicy {
    pub strong: bool,
}
