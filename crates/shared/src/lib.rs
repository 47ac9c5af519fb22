//! 共享库
//!
//! 包含徽章通知服务共用的配置、错误处理、事件模型与可观测性基础设施代码。

pub mod config;
pub mod error;
pub mod events;
pub mod observability;
pub mod test_utils;
