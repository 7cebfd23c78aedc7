//! 测验运行上下文
//!
//! 封装"这一场测验进行到哪了"：题目批次、各题作答条目、开始时刻。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::models::{Answer, Item};

/// 单题作答条目
///
/// `answer` 永远是规范形态（经过出站归一化和校验），手写板导出与
/// 文字步骤只在本地暂存，评估/上报时才取用。
#[derive(Debug, Clone, Default)]
pub struct AnswerEntry {
    pub answer: Option<Answer>,
    /// 手写板导出的笔迹 JSON 字符串
    pub work_json: Option<String>,
    /// 手写板截图（data URL；暂不上传）
    pub work_png: Option<String>,
    /// 文字步骤
    pub notes: Vec<String>,
}

/// 单场测验的运行状态
#[derive(Debug, Clone)]
pub struct QuizCtx {
    pub items: Vec<Item>,
    /// item_id → 作答条目
    pub entries: HashMap<String, AnswerEntry>,
    /// 本场开始时刻（剩余时间 = 时长 − 已用，始终按墙钟重算）
    pub started_at: DateTime<Utc>,
}

impl QuizCtx {
    pub fn new(items: Vec<Item>, started_at: DateTime<Utc>) -> Self {
        Self {
            items,
            entries: HashMap::new(),
            started_at,
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|it| it.id == item_id)
    }
}

/// 安全解析手写板 JSON：解析失败以 None 代替，绝不让损坏的本地
/// 数据阻断提交
pub fn parse_process_json(raw: Option<&str>) -> Option<JsonValue> {
    let raw = raw?;
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_json_recovers_from_garbage() {
        assert_eq!(parse_process_json(None), None);
        assert_eq!(parse_process_json(Some("{oops")), None);
        assert_eq!(
            parse_process_json(Some("[[1,2]]")),
            Some(serde_json::json!([[1, 2]]))
        );
    }
}
