//! 编排层（Orchestration Layer）
//!
//! 负责装配与生命周期：初始化所有服务、把连通性事件接到队列补送、
//! 提供无头补送入口。不处理单场测验的细节（那是流程层的事）。

pub mod app;

pub use app::App;
