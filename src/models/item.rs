use serde::{Deserialize, Serialize};

/// 题型枚举
///
/// 与后端 `item_type` 字段对齐，同时也是答案 `kind` 标签的受控集合。
/// 旧数据里判断题可能写成 `tf` / `judge`，反序列化时做别名兼容。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// 单选题
    Single,
    /// 多选题
    Multiple,
    /// 数值题
    Numeric,
    /// 文字题
    Text,
    /// 填空题
    Cloze,
    /// 排序题
    Ordering,
    /// 配对题
    Matching,
    /// 表格填空题
    Tablefill,
    /// 判断题（仅用于界面呈现，提交时转成 single）
    #[serde(alias = "tf", alias = "judge")]
    Truefalse,
}

impl ItemKind {
    /// 获取标准名称
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Single => "single",
            ItemKind::Multiple => "multiple",
            ItemKind::Numeric => "numeric",
            ItemKind::Text => "text",
            ItemKind::Cloze => "cloze",
            ItemKind::Ordering => "ordering",
            ItemKind::Matching => "matching",
            ItemKind::Tablefill => "tablefill",
            ItemKind::Truefalse => "truefalse",
        }
    }

    /// 线上存储/上报时实际使用的题型
    ///
    /// 判断题在持久化和上报时一律以 `single` 表示，其余题型不变。
    pub fn wire_kind(self) -> ItemKind {
        match self {
            ItemKind::Truefalse => ItemKind::Single,
            other => other,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 题目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// 已发布（才能进入测验抽题）
    Published,
    /// 草稿
    Draft,
}

/// 题目
///
/// 字段名称与后端 `/api/items` 回传一致。题目由后端独占维护，
/// 客户端只读，不会回写任何字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// 科目，例如 "math"
    pub subject: String,
    /// 年级，例如 "G7"
    pub grade: String,
    pub unit: String,
    /// 知识点列表（后端以 '|' 存储，API 序列化为数组）
    #[serde(default)]
    pub kcs: Vec<String>,
    pub item_type: ItemKind,
    /// 难度 1~5
    pub difficulty: u8,
    pub stem: String,
    /// 选项：single/multiple/ordering/matching 使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// 标准答案：考试模式下后端不下发，因此可为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<super::Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub status: ItemStatus,
}

impl Item {
    /// 选项列表（没有选项时返回空切片）
    pub fn choice_list(&self) -> &[String] {
        self.choices.as_deref().unwrap_or(&[])
    }
}
