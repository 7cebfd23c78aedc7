//! 答案归一化 - 业务能力层
//!
//! 判断题的 `truefalse` 形态只为两键界面存在，绝不上线。边界由
//! 一对互逆的纯函数守住：
//! - 入站（存储/线上 → 界面）：`single{0|1}` 映射为同索引的
//!   `truefalse`；其他索引一律视为未作答，不做静默收敛
//! - 出站（界面 → 存储/线上）：`truefalse{i}` 还原为 `single{i}`，
//!   其余形态原样通过
//!
//! 另外，原生 `single` 且恰有两个选项、选项文字都落在真值词表里的
//! 题目，也按判断题渲染——这只是呈现层的重分类，持久化内容不变。

use std::collections::HashSet;

use crate::models::{Answer, Item, ItemKind};

/// 产品默认真值词表（双语）
///
/// 词表成员是产品决策，未来可能扩充，所以匹配逻辑做成可替换的
/// `TruthLabels` 策略，而不是写死在归一化函数里。
static DEFAULT_TRUTH_LABELS: phf::Set<&'static str> = phf::phf_set! {
    "對", "錯", "是", "否", "正確", "錯誤", "true", "false",
};

/// 真值词表策略
pub struct TruthLabels {
    /// `None` 表示使用内建默认词表
    custom: Option<HashSet<String>>,
}

impl Default for TruthLabels {
    fn default() -> Self {
        Self { custom: None }
    }
}

impl TruthLabels {
    /// 自定义词表（替换默认集合）
    pub fn custom<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            custom: Some(
                labels
                    .into_iter()
                    .map(|s| normalize_label(&s.into()))
                    .collect(),
            ),
        }
    }

    /// 选项文字是否属于真值词表
    ///
    /// 先去首尾空白；拉丁字母按小写比较，CJK 词条精确比较。
    pub fn matches(&self, label: &str) -> bool {
        let key = normalize_label(label);
        match &self.custom {
            Some(set) => set.contains(&key),
            None => DEFAULT_TRUTH_LABELS.contains(key.as_str()),
        }
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// 答案归一化器
#[derive(Default)]
pub struct Normalizer {
    truth_labels: TruthLabels,
}

impl Normalizer {
    pub fn new(truth_labels: TruthLabels) -> Self {
        Self { truth_labels }
    }

    /// 判断一道题在界面上按什么题型渲染
    ///
    /// 原生判断题直接返回；两选项的 single 且两个选项都是真值词时
    /// 重分类为判断题；其余按题面题型。
    pub fn resolve_render_kind(&self, item: &Item) -> ItemKind {
        if item.item_type == ItemKind::Truefalse {
            return ItemKind::Truefalse;
        }
        if item.item_type == ItemKind::Single {
            if let [a, b] = item.choice_list() {
                if self.truth_labels.matches(a) && self.truth_labels.matches(b) {
                    return ItemKind::Truefalse;
                }
            }
        }
        item.item_type
    }

    /// 入站：存储值 → 界面显示值
    pub fn inbound(&self, render_kind: ItemKind, stored: &Answer) -> Answer {
        if render_kind == ItemKind::Truefalse {
            if let Answer::Single { index } = stored {
                let index = match *index {
                    0 => Some(0),
                    1 => Some(1),
                    // 越界索引视为未作答，不收敛到 0/1
                    _ => None,
                };
                return Answer::Truefalse { index };
            }
        }
        stored.clone()
    }

    /// 出站：界面回传值 → 存储/上报值
    ///
    /// `truefalse{i}` 还原成 `single{i}`；未作答（索引为空或非法）
    /// 返回 `None`；其余形态原样通过。
    pub fn outbound(&self, ui_value: Answer) -> Option<Answer> {
        match ui_value {
            Answer::Truefalse { index } => match index {
                Some(i @ (0 | 1)) => Some(Answer::Single { index: i as usize }),
                _ => None,
            },
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;

    fn single_item(choices: Vec<&str>) -> Item {
        Item {
            id: "i1".to_string(),
            subject: "math".to_string(),
            grade: "G7".to_string(),
            unit: "u1".to_string(),
            kcs: vec![],
            item_type: ItemKind::Single,
            difficulty: 2,
            stem: "2 是质数".to_string(),
            choices: Some(choices.into_iter().map(String::from).collect()),
            answer: None,
            solution: None,
            tags: vec![],
            source: None,
            status: ItemStatus::Published,
        }
    }

    #[test]
    fn test_roundtrip_law_for_valid_indices() {
        let n = Normalizer::default();
        for i in 0..=1usize {
            let stored = Answer::Single { index: i };
            let ui = n.inbound(ItemKind::Truefalse, &stored);
            assert_eq!(n.outbound(ui), Some(stored));
        }
    }

    #[test]
    fn test_inbound_out_of_range_becomes_unanswered() {
        let n = Normalizer::default();
        let ui = n.inbound(ItemKind::Truefalse, &Answer::Single { index: 2 });
        assert_eq!(ui, Answer::Truefalse { index: None });
        // 未作答不会被出站捏造成 single{0}
        assert_eq!(n.outbound(ui), None);
    }

    #[test]
    fn test_non_truefalse_kinds_pass_through() {
        let n = Normalizer::default();
        let numeric = Answer::Numeric {
            value: "1/2".to_string(),
            tolerance: None,
        };
        assert_eq!(n.inbound(ItemKind::Numeric, &numeric), numeric);
        assert_eq!(n.outbound(numeric.clone()), Some(numeric));
    }

    #[test]
    fn test_two_choice_truth_vocab_reclassified() {
        let n = Normalizer::default();
        assert_eq!(
            n.resolve_render_kind(&single_item(vec!["對", "錯"])),
            ItemKind::Truefalse
        );
        assert_eq!(
            n.resolve_render_kind(&single_item(vec!["True", "False"])),
            ItemKind::Truefalse
        );
        // 词表之外的两选项不重分类
        assert_eq!(
            n.resolve_render_kind(&single_item(vec!["甲", "乙"])),
            ItemKind::Single
        );
        // 三个选项不重分类
        assert_eq!(
            n.resolve_render_kind(&single_item(vec!["對", "錯", "不确定"])),
            ItemKind::Single
        );
    }

    #[test]
    fn test_custom_truth_labels_policy() {
        let n = Normalizer::new(TruthLabels::custom(["同意", "不同意"]));
        assert_eq!(
            n.resolve_render_kind(&single_item(vec!["同意", "不同意"])),
            ItemKind::Truefalse
        );
        // 换了词表后默认词不再命中
        assert_eq!(
            n.resolve_render_kind(&single_item(vec!["對", "錯"])),
            ItemKind::Single
        );
    }
}
