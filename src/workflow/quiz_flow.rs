//! 测验流程 - 流程层
//!
//! 核心职责：驱动一场限时测验的完整状态机
//!
//! 状态推进：
//! `Idle → Loading → Active → Submitting → Settled`
//! - 抽题成功进入 Active，同时记下开始时刻，剩余时间永远按
//!   "时长 − 已用"重算
//! - 交卷由学生点击或倒计时归零触发，两个触发互斥且幂等：
//!   in-flight 标志在检查的同一步内原子置位（check-and-set），
//!   晚到的那个触发是空操作
//! - 线上提交成功：换新场次、清空作答、重新抽题开始下一场
//! - 线上提交失败：整批进离线队列，本场照样结束，学生不被卡住

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clients::QuizBackend;
use crate::infrastructure::Clock;
use crate::models::{Answer, AttemptUp, Item, ItemKind};
use crate::services::{EvalJob, EvalService, Normalizer, SessionService, SubmissionQueue};
use crate::workflow::quiz_ctx::{parse_process_json, QuizCtx};

/// 状态机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loading,
    Active,
    Submitting,
    Settled,
}

/// 交卷触发源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// 学生点击交卷
    Manual,
    /// 倒计时归零
    Deadline,
}

/// 交卷结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// 线上提交成功，已开始下一场
    Submitted {
        inserted: u32,
        updated: u32,
        duplicates: u32,
    },
    /// 线上失败，整批已入离线队列
    QueuedOffline { count: usize },
    /// 已有一次提交在途，本次触发是空操作
    AlreadyInFlight,
    /// 没有题目可交
    NothingToSubmit,
}

impl SubmitOutcome {
    /// 给界面的非阻塞状态文案
    pub fn message(&self) -> &'static str {
        match self {
            SubmitOutcome::Submitted { .. } => "提交成功！",
            SubmitOutcome::QueuedOffline { .. } => "提交失败，已离线储存，稍后会自动上传。",
            SubmitOutcome::AlreadyInFlight => "正在提交中…",
            SubmitOutcome::NothingToSubmit => "目前没有可提交的作答。",
        }
    }
}

/// 测验流程配置
#[derive(Debug, Clone)]
pub struct QuizFlowOptions {
    pub item_count: usize,
    pub duration_secs: u64,
    pub avg_per_item_secs: u64,
    pub auto_eval: bool,
}

impl From<&crate::config::Config> for QuizFlowOptions {
    fn from(c: &crate::config::Config) -> Self {
        Self {
            item_count: c.quiz_item_count,
            duration_secs: c.quiz_duration_secs,
            avg_per_item_secs: c.avg_per_item_secs,
            auto_eval: c.auto_eval,
        }
    }
}

/// 测验流程
///
/// - 编排抽题、作答收集、倒计时、评估与交卷
/// - 不直接碰持久化，身份/队列/评估都委托给业务能力层
pub struct QuizFlow {
    backend: Arc<dyn QuizBackend>,
    session: Arc<SessionService>,
    queue: Arc<SubmissionQueue>,
    eval: EvalService,
    normalizer: Normalizer,
    clock: Arc<dyn Clock>,
    opts: QuizFlowOptions,
    auto_eval: AtomicBool,
    state: Mutex<RunState>,
    ctx: Mutex<QuizCtx>,
    /// 唯一防止交卷双触发的闸门，必须与检查同步置位
    submitting: AtomicBool,
}

impl QuizFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: Arc<dyn QuizBackend>,
        session: Arc<SessionService>,
        queue: Arc<SubmissionQueue>,
        eval: EvalService,
        normalizer: Normalizer,
        clock: Arc<dyn Clock>,
        opts: QuizFlowOptions,
    ) -> Self {
        let auto_eval = opts.auto_eval;
        let now = clock.now();
        Self {
            backend,
            session,
            queue,
            eval,
            normalizer,
            clock,
            opts,
            auto_eval: AtomicBool::new(auto_eval),
            state: Mutex::new(RunState::Idle),
            ctx: Mutex::new(QuizCtx::new(Vec::new(), now)),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().expect("状态锁中毒")
    }

    fn set_state(&self, next: RunState) {
        *self.state.lock().expect("状态锁中毒") = next;
    }

    /// 开始（或重新抽题开始）一场测验
    pub async fn start(&self) -> Result<()> {
        self.set_state(RunState::Loading);
        info!("📚 抓题中: {} 题, 乱序", self.opts.item_count);

        let resp = match self.backend.fetch_items(self.opts.item_count, true).await {
            Ok(resp) => resp,
            Err(e) => {
                self.set_state(RunState::Idle);
                return Err(e.into());
            }
        };

        if resp.items.is_empty() {
            warn!("⚠️ 没有可用题目（后端需要 status='published' 的题目）");
        } else {
            info!("✓ 取到 {} 道题，倒计时 {} 秒", resp.items.len(), self.opts.duration_secs);
            for (idx, it) in resp.items.iter().enumerate() {
                debug!(
                    "第 {} 题 [{}]: {}",
                    idx + 1,
                    it.item_type,
                    crate::utils::logging::truncate_text(&it.stem, 80)
                );
            }
        }

        *self.ctx.lock().expect("上下文锁中毒") = QuizCtx::new(resp.items, self.clock.now());
        self.submitting.store(false, Ordering::SeqCst);
        self.set_state(RunState::Active);
        Ok(())
    }

    /// 当前题目批次（给渲染层）
    pub fn items(&self) -> Vec<Item> {
        self.ctx.lock().expect("上下文锁中毒").items.clone()
    }

    /// 某道题在界面上的渲染题型
    pub fn render_kind(&self, item: &Item) -> ItemKind {
        self.normalizer.resolve_render_kind(item)
    }

    /// 某道题当前存储的规范作答值
    pub fn stored_answer(&self, item_id: &str) -> Option<Answer> {
        let ctx = self.ctx.lock().expect("上下文锁中毒");
        ctx.entries.get(item_id)?.answer.clone()
    }

    /// 某道题给界面显示的作答值（入站归一化后）
    pub fn ui_value(&self, item_id: &str) -> Option<Answer> {
        let ctx = self.ctx.lock().expect("上下文锁中毒");
        let item = ctx.item(item_id)?;
        let stored = ctx.entries.get(item_id)?.answer.as_ref()?;
        Some(self.normalizer.inbound(self.normalizer.resolve_render_kind(item), stored))
    }

    /// 记录一次作答（界面回传值）
    ///
    /// 出站归一化 → 不变量校验；校验失败时该字段按未作答处理并
    /// 告警，不阻断其余题目。
    pub fn record_answer(&self, item_id: &str, ui_value: Answer) {
        if self.state() != RunState::Active {
            warn!("⚠️ 非作答状态，忽略 {} 的作答", item_id);
            return;
        }
        let mut ctx = self.ctx.lock().expect("上下文锁中毒");
        let Some(item) = ctx.item(item_id).cloned() else {
            warn!("⚠️ 未知题目 {}, 忽略作答", item_id);
            return;
        };

        let canonical = match self.normalizer.outbound(ui_value) {
            None => None,
            Some(ans) => match ans.validate_for_item(&item) {
                Ok(()) => Some(ans),
                Err(e) => {
                    warn!("⚠️ 题目 {} 的作答不合法，按未作答处理: {}", item_id, e);
                    None
                }
            },
        };

        ctx.entries.entry(item_id.to_string()).or_default().answer = canonical;
    }

    /// 记录手写板导出
    pub fn record_work(&self, item_id: &str, work_json: Option<String>, work_png: Option<String>) {
        let mut ctx = self.ctx.lock().expect("上下文锁中毒");
        let entry = ctx.entries.entry(item_id.to_string()).or_default();
        entry.work_json = work_json;
        entry.work_png = work_png;
    }

    /// 记录文字步骤
    pub fn record_notes(&self, item_id: &str, notes: Vec<String>) {
        let mut ctx = self.ctx.lock().expect("上下文锁中毒");
        ctx.entries.entry(item_id.to_string()).or_default().notes = notes;
    }

    /// 提交前是否自动评估计算过程
    pub fn set_auto_eval(&self, on: bool) {
        self.auto_eval.store(on, Ordering::SeqCst);
    }

    /// 剩余秒数 = 时长 − 已用（页签挂起恢复后依然正确）
    pub fn remaining_secs(&self) -> u64 {
        let started_at = self.ctx.lock().expect("上下文锁中毒").started_at;
        let elapsed = (self.clock.now() - started_at).num_seconds().max(0) as u64;
        self.opts.duration_secs.saturating_sub(elapsed)
    }

    /// 倒计时回调：归零且本场仍在作答时自动交卷
    pub async fn tick(&self) -> Option<SubmitOutcome> {
        if self.state() != RunState::Active || self.remaining_secs() > 0 {
            return None;
        }
        match self.submit(SubmitTrigger::Deadline).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("❌ 到时自动交卷失败: {}", e);
                None
            }
        }
    }

    /// 交卷（手动或到时）
    ///
    /// 两个触发源共用这同一把闸门：`compare_exchange` 在检查的
    /// 同一原子步骤里置位，后到者直接拿到 `AlreadyInFlight`。
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmitOutcome> {
        // 本场已结束/尚未开始时没有可交的东西；重复点交卷不会
        // 再造一批新 attempt_id
        if self.state() != RunState::Active {
            info!("忽略 {:?} 触发：当前状态 {:?}", trigger, self.state());
            return Ok(SubmitOutcome::NothingToSubmit);
        }

        if self
            .submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("⏳ 已有提交在途，忽略 {:?} 触发", trigger);
            return Ok(SubmitOutcome::AlreadyInFlight);
        }

        let (items, entries, started_at) = {
            let ctx = self.ctx.lock().expect("上下文锁中毒");
            (ctx.items.clone(), ctx.entries.clone(), ctx.started_at)
        };

        if items.is_empty() {
            self.submitting.store(false, Ordering::SeqCst);
            return Ok(SubmitOutcome::NothingToSubmit);
        }

        info!("📤 开始交卷（触发源: {:?}，共 {} 题）", trigger, items.len());
        self.set_state(RunState::Submitting);

        // （可选）先做计算过程评估，拿 rubric；单题失败记 null
        let rubric_map = if self.auto_eval.load(Ordering::SeqCst) {
            let jobs = items
                .iter()
                .map(|it| {
                    let entry = entries.get(&it.id).cloned().unwrap_or_default();
                    EvalJob {
                        item_id: it.id.clone(),
                        stem: it.stem.clone(),
                        solution: it.solution.clone(),
                        item_type: it.item_type,
                        notes: entry.notes,
                        work_json: entry.work_json,
                        has_work_png: entry.work_png.is_some(),
                    }
                })
                .collect();
            self.eval.evaluate_batch(jobs).await
        } else {
            Default::default()
        };

        // 单题耗时粗估：总用时平摊到每题，夹在 [1, 上限]
        let elapsed = (self.clock.now() - started_at).num_seconds().max(0) as u64;
        let per_item_cap = self.opts.avg_per_item_secs.max(1);
        let per_item = (elapsed / items.len() as u64).clamp(1, per_item_cap) as u32;

        // 组装批次；attempt_id 在这里一次性生成，之后重试原样复用
        let ids = self.session.snapshot();
        let ts = self.clock.now().to_rfc3339();
        let attempts: Vec<AttemptUp> = items
            .iter()
            .map(|it| {
                let entry = entries.get(&it.id).cloned().unwrap_or_default();
                // 组装前再校验一次：不合规的字段按未作答上报
                let raw_answer = entry.answer.filter(|ans| match ans.validate_for_item(it) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("⚠️ 题目 {} 的作答未通过校验，置空上报: {}", it.id, e);
                        false
                    }
                });
                let rubric = rubric_map.get(&it.id).cloned().flatten();
                AttemptUp {
                    attempt_id: Uuid::new_v4().to_string(),
                    user_id: ids.user_id.clone(),
                    item_id: it.id.clone(),
                    ts: ts.clone(),
                    elapsed_sec: per_item,
                    raw_answer,
                    attempts: 1,
                    work_url: None,
                    process_json: parse_process_json(entry.work_json.as_deref()),
                    eval_model: rubric.as_ref().map(|r| r.model.clone()),
                    rubric_json: rubric.map(|r| r.result),
                    device_id: Some(ids.device_id.clone()),
                    session_id: Some(ids.session_id.clone()),
                }
            })
            .collect();

        // 线上送出
        match self.backend.submit_attempts(&attempts).await {
            Ok(resp) => {
                info!(
                    "✅ 提交成功: inserted={} updated={} duplicates={}",
                    resp.inserted, resp.updated, resp.duplicates
                );
                // 换新场次、清空作答，本场落幕
                self.session.renew_session();
                self.ctx.lock().expect("上下文锁中毒").entries.clear();
                self.set_state(RunState::Settled);
                self.submitting.store(false, Ordering::SeqCst);

                // 重新抽题，进入下一场
                if let Err(e) = self.start().await {
                    warn!("⚠️ 下一场抽题失败，停在空闲状态: {}", e);
                }

                Ok(SubmitOutcome::Submitted {
                    inserted: resp.inserted,
                    updated: resp.updated,
                    duplicates: resp.duplicates,
                })
            }
            Err(e) => {
                // 线上失败 → 整批离线入队，稍后联网自动补送
                warn!("⚠️ 线上提交失败，转入离线队列: {}", e);
                let count = attempts.len();
                let enqueue_result = self.queue.enqueue(&attempts).await;
                self.set_state(RunState::Settled);
                self.submitting.store(false, Ordering::SeqCst);
                enqueue_result?;
                Ok(SubmitOutcome::QueuedOffline { count })
            }
        }
    }
}
