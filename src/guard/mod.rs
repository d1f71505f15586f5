//! 拦截与协调引擎。
//!
//! 两个互不知情的变更者（基于虚拟模型做差量更新的响应式框架，
//! 以及直接改写 DOM 的页内翻译服务）交替作用于同一棵活动树时，
//! 框架对节点身份与父子关系的假设会失效，进而在增删节点时抛出
//! 未捕获异常、拖垮整个页面。本模块以拦截、分类与优雅降级来
//! 化解这种无锁交错：
//!
//! - **primitives**: 结构原语的拦截代理（先验证、再委托、
//!   失效引用一律降级，异常绝不外泄）
//! - **classify**: 翻译产物识别（结构签名优先，调用栈归因兜底）
//! - **observer**: 事后的变更观察循环
//! - **tracking**: 以节点身份为键的弱引用旁路状态
//! - **install**: 一次性安装、幂等保护与只读诊断
//! - **config**: 引擎参数
//! - **error**: 错误类型与失效引用分类
//!
//! 引擎不试图合并或撤销翻译服务的改动，也不保证框架的虚拟模型
//! 与活动树保持一致；它只保证页面不崩溃，并让后续的变更尝试
//! 降级为尽力而为的空操作。

pub mod classify;
pub mod config;
pub mod error;
pub mod install;
pub mod observer;
pub mod primitives;
pub mod tracking;

pub use config::{constants, GuardConfig};
pub use error::{is_stale_reference, is_structural_crash_message, GuardError, GuardResult};
pub use install::{install, install_with_config, GuardDiagnostics, GuardEngine, PatchedPrimitives};
pub use primitives::{GuardedDom, GUARD_IDENTITY_MARK};
pub use tracking::{OriginalTextMap, WeakNodeSet};
