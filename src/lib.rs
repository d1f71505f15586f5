//! # DomGuard 库
//!
//! 一个防御性的兼容垫片：当响应式 UI 框架与页内翻译服务同时改写
//! 同一棵活动 DOM 树时，拦截结构变更原语、识别翻译产物并优雅降级，
//! 保证页面不因失效引用异常而崩溃。
//!
//! ## 模块组织
//!
//! - `dom` - 宿主 DOM 基底（解析、序列化、原始结构原语、变更通知）
//! - `realm` - 页面执行上下文（全局标志、错误通道、延迟任务）
//! - `guard` - 拦截与协调引擎（核心）
//! - `loader` - 引导加载器

pub mod dom;
pub mod guard;
pub mod loader;
pub mod realm;

// Re-export commonly used items for convenience
pub use dom::{DomApi, DomError, Handle, Primitive, RawDom};
pub use guard::{install, install_with_config, GuardConfig, GuardEngine, GuardError};
pub use realm::{ErrorEvent, PageRealm};
