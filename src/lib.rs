//! # Afterclass Submit
//!
//! 限时测验的作答提交核心：学生在限时内完成一批题目，作答保证
//! 最终送达后端——哪怕网络不稳，也不需要重交或重复劳动。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有平台资源，只暴露能力
//! - `KvStore` - 最小键值持久化（get / set / delete）
//! - `Clock` - 可注入时钟
//! - `connectivity` - 联网状态变化通知
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，互相独立
//! - `SessionService` - 设备/用户/场次三元组
//! - `SubmissionQueue` - 离线提交队列（失败不丢、成功才清）
//! - `Normalizer` - 判断题 truefalse ⇄ single 归一化
//! - `EvalService` - 过程评估（有界并发，单题失败不拖垮整卷）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场测验"的完整状态机
//! - `QuizFlow` - Idle → Loading → Active → Submitting → Settled
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 装配所有服务，联网事件驱动队列补送
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ApiClient, QuizBackend};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{Clock, JsonFileStore, KvStore, ManualClock, MemoryStore, SystemClock};
pub use models::{Answer, AnswerError, AttemptUp, Item, ItemKind, ItemStatus};
pub use orchestrator::App;
pub use services::{EvalService, Normalizer, SessionService, SubmissionQueue, TruthLabels};
pub use workflow::{QuizFlow, QuizFlowOptions, RunState, SubmitOutcome, SubmitTrigger};
