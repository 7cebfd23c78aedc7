use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::item::{Item, ItemKind};

/// 答案校验错误
///
/// 上游输入组件产出不一致的载荷时，构造/校验必须失败而不是悄悄修正；
/// 调用方把失败字段当作"未作答"处理，绝不让整卷提交崩溃。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("选项索引 {index} 超出范围 [0, {max})")]
    IndexOutOfRange { index: usize, max: usize },
    #[error("多选索引必须严格递增且不重复")]
    IndicesNotAscending,
    #[error("数值 '{value}' 无法解析为小数或分数")]
    NumericUnparsable { value: String },
    #[error("容差 '{tolerance}' 必须是非负数值")]
    BadTolerance { tolerance: String },
    #[error("提交的文字答案不能为空")]
    EmptyText,
    #[error("填空数量 {got} 与题干空位数 {expected} 不一致")]
    BlankCountMismatch { got: usize, expected: usize },
    #[error("排序答案必须是 0..{n} 的一个排列")]
    NotAPermutation { n: usize },
    #[error("配对答案左侧键重复: {key}")]
    DuplicateLeftKey { key: String },
    #[error("表格答案不是 {rows}x{cols} 的矩形")]
    GridShapeMismatch { rows: usize, cols: usize },
    #[error("题目缺少选项，无法校验该答案")]
    MissingChoices,
    #[error("truefalse 仅用于界面呈现，不能持久化或上报")]
    UiOnlyVariant,
    #[error("答案类型 {got} 与题型 {expected} 不符")]
    KindMismatch {
        got: &'static str,
        expected: &'static str,
    },
}

/// 核心答案类型：封闭的带标签联合，与后端判分对齐
///
/// 每个变体对应一种作答形状；`kind` 标签随 JSON 序列化，
/// 与前端/后端约定的 `{kind: "..."}` 线上格式完全一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Answer {
    /// 单选：选项索引
    Single { index: usize },
    /// 多选：升序且不重复的索引集合
    Multiple { indices: Vec<usize> },
    /// 数值：十进制小数或 a/b 分数字符串，容差可选
    Numeric {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tolerance: Option<String>,
    },
    /// 文字：作答端是 text，命题端可带 accept 列表
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accept: Option<Vec<String>>,
    },
    /// 填空：按空位顺序排列的字符串
    Cloze { blanks: Vec<String> },
    /// 排序：[0..n) 的一个排列
    Ordering { order: Vec<usize> },
    /// 配对：(左键, 右键) 列表，左键不得重复
    Matching { pairs: Vec<(String, String)> },
    /// 表格填空：二维字符串网格
    Tablefill { cells: Vec<Vec<String>> },
    /// 判断题（仅界面使用，提交前必须转成 single；index 为空表示未作答）
    Truefalse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u8>,
    },
}

impl Answer {
    /// 本答案的题型标签
    pub fn kind(&self) -> ItemKind {
        match self {
            Answer::Single { .. } => ItemKind::Single,
            Answer::Multiple { .. } => ItemKind::Multiple,
            Answer::Numeric { .. } => ItemKind::Numeric,
            Answer::Text { .. } => ItemKind::Text,
            Answer::Cloze { .. } => ItemKind::Cloze,
            Answer::Ordering { .. } => ItemKind::Ordering,
            Answer::Matching { .. } => ItemKind::Matching,
            Answer::Tablefill { .. } => ItemKind::Tablefill,
            Answer::Truefalse { .. } => ItemKind::Truefalse,
        }
    }

    /// 针对某道题目校验本答案能否上报
    ///
    /// 校验两层：kind 是否与题型的线上形态一致，以及各变体自己的载荷不变量。
    /// 判断题题目的线上形态是 single，所以 `Truefalse` 走到这里一律报错
    /// （归一化层应当在此之前就把它转掉）。
    pub fn validate_for_item(&self, item: &Item) -> Result<(), AnswerError> {
        if matches!(self, Answer::Truefalse { .. }) {
            return Err(AnswerError::UiOnlyVariant);
        }

        let expected = item.item_type.wire_kind();
        if self.kind() != expected {
            return Err(AnswerError::KindMismatch {
                got: self.kind().as_str(),
                expected: expected.as_str(),
            });
        }

        match self {
            Answer::Single { index } => {
                let max = item.choice_list().len();
                if max == 0 {
                    return Err(AnswerError::MissingChoices);
                }
                if *index >= max {
                    return Err(AnswerError::IndexOutOfRange { index: *index, max });
                }
                Ok(())
            }
            Answer::Multiple { indices } => {
                let max = item.choice_list().len();
                if max == 0 {
                    return Err(AnswerError::MissingChoices);
                }
                // 严格递增同时保证了唯一
                if indices.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(AnswerError::IndicesNotAscending);
                }
                if let Some(&bad) = indices.iter().find(|&&i| i >= max) {
                    return Err(AnswerError::IndexOutOfRange { index: bad, max });
                }
                Ok(())
            }
            Answer::Numeric { value, tolerance } => {
                if parse_rational(value).is_none() {
                    return Err(AnswerError::NumericUnparsable {
                        value: value.clone(),
                    });
                }
                if let Some(tol) = tolerance {
                    match parse_rational(tol) {
                        Some(v) if v >= 0.0 => {}
                        _ => {
                            return Err(AnswerError::BadTolerance {
                                tolerance: tol.clone(),
                            })
                        }
                    }
                }
                Ok(())
            }
            Answer::Text { text, accept } => {
                let has_text = text.as_deref().map(|t| !t.trim().is_empty()).unwrap_or(false);
                let has_accept = accept
                    .as_deref()
                    .map(|list| list.iter().any(|s| !s.trim().is_empty()))
                    .unwrap_or(false);
                if has_text || has_accept {
                    Ok(())
                } else {
                    Err(AnswerError::EmptyText)
                }
            }
            Answer::Cloze { blanks } => {
                let expected = count_blank_markers(&item.stem);
                // 旧题目可能没在题干里标出空位，这时不强制数量
                if expected > 0 && blanks.len() != expected {
                    return Err(AnswerError::BlankCountMismatch {
                        got: blanks.len(),
                        expected,
                    });
                }
                Ok(())
            }
            Answer::Ordering { order } => {
                let n = item.choice_list().len();
                if n == 0 {
                    return Err(AnswerError::MissingChoices);
                }
                if order.len() != n {
                    return Err(AnswerError::NotAPermutation { n });
                }
                let seen: HashSet<usize> = order.iter().copied().collect();
                if seen.len() != n || order.iter().any(|&i| i >= n) {
                    return Err(AnswerError::NotAPermutation { n });
                }
                Ok(())
            }
            Answer::Matching { pairs } => {
                let mut seen = HashSet::new();
                for (left, _) in pairs {
                    if !seen.insert(left.as_str()) {
                        return Err(AnswerError::DuplicateLeftKey { key: left.clone() });
                    }
                }
                Ok(())
            }
            Answer::Tablefill { cells } => {
                let rows = cells.len();
                let cols = cells.first().map(|r| r.len()).unwrap_or(0);
                if rows == 0 || cols == 0 || cells.iter().any(|r| r.len() != cols) {
                    return Err(AnswerError::GridShapeMismatch { rows, cols });
                }
                // 题目带标准答案时，以它的行列数为声明形状
                if let Some(Answer::Tablefill { cells: expected }) = &item.answer {
                    let erows = expected.len();
                    let ecols = expected.first().map(|r| r.len()).unwrap_or(0);
                    if erows > 0 && (rows != erows || cols != ecols) {
                        return Err(AnswerError::GridShapeMismatch {
                            rows: erows,
                            cols: ecols,
                        });
                    }
                }
                Ok(())
            }
            Answer::Truefalse { .. } => unreachable!("已在入口处拦截"),
        }
    }
}

/// 解析十进制小数或 a/b 分数
///
/// 返回 `None` 表示不可解析（NaN / 无穷 / 分母为零都算不可解析）。
pub fn parse_rational(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some((num, den)) = s.split_once('/') {
        let num: i64 = num.trim().parse().ok()?;
        let den: i64 = den.trim().parse().ok()?;
        if den == 0 {
            return None;
        }
        return Some(num as f64 / den as f64);
    }
    let v: f64 = s.parse().ok()?;
    v.is_finite().then_some(v)
}

/// 统计题干中的空位标记数
///
/// 空位标记：连续 2 个以上半角下划线，或任意个全角下划线。
pub fn count_blank_markers(stem: &str) -> usize {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let re = MARKER.get_or_init(|| Regex::new(r"_{2,}|＿+").expect("空位标记正则非法"));
    re.find_iter(stem).count()
}
