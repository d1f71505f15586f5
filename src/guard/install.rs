//! 安装与幂等保护。
//!
//! 整套补丁在每次页面加载中恰好应用一次：realm 级安装标志位在任何
//! 补丁动作之前置位，重复安装是无副作用的空操作。安装完成后通过
//! 只读的诊断对象对外报告各原语的补丁状态——这只是观测面，不属于
//! 功能合约。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::dom::{DomApi, MutationObserver, Primitive};
use crate::realm::{ErrorEvent, PageRealm};

use super::config::{constants, GuardConfig};
use super::error::is_structural_crash_message;
use super::primitives::{GuardedDom, GUARD_IDENTITY_MARK};
use super::tracking::{OriginalTextMap, WeakNodeSet};

/// 拦截与协调引擎。
///
/// 安装后纯被动：从不主动发起任何变更，只拦截两个变更者的调用，
/// 并通过变更通知订阅在事后观察、分类翻译服务造成的结构改动。
pub struct GuardEngine {
    /// 引擎运行参数。
    pub(crate) config: GuardConfig,
    /// 安装时捕获的原始访问点；打补丁后原始实现始终可达。
    pub(crate) originals: Rc<dyn DomApi>,
    /// 翻译产物标记集：置位一次，永不清除。
    pub(crate) artifacts: WeakNodeSet,
    /// 已处理集，防止同一元素被重复分类造成观察循环。
    pub(crate) processed: WeakNodeSet,
    /// 属性写入需要吞错保护的元素（创建期被标记的包装元素）。
    pub(crate) fragile_attrs: WeakNodeSet,
    /// 文本节点的原始内容记录，仅作诊断。
    pub(crate) original_text: OriginalTextMap,
    /// 变更通知订阅；整个页面生命周期内最多一份，从不退订。
    pub(crate) observer: RefCell<Option<MutationObserver>>,
}

/// 各原语的补丁状态，由补丁函数的文本身份自报。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchedPrimitives {
    pub remove_child: bool,
    pub insert_before: bool,
    pub replace_child: bool,
    pub append_child: bool,
    pub normalize: bool,
}

impl PatchedPrimitives {
    pub fn all(&self) -> bool {
        self.remove_child
            && self.insert_before
            && self.replace_child
            && self.append_child
            && self.normalize
    }
}

/// 只读诊断快照。
#[derive(Debug, Clone)]
pub struct GuardDiagnostics {
    pub version: String,
    pub patched: PatchedPrimitives,
    pub artifact_nodes: usize,
    pub processed_nodes: usize,
    pub original_text_records: usize,
    pub guarded_attribute_nodes: usize,
}

impl GuardEngine {
    /// 生成当前的诊断快照。补丁状态通过检查当前访问点各操作的
    /// 文本身份是否带有守护标识得出。
    pub fn diagnostics(&self, realm: &PageRealm) -> GuardDiagnostics {
        let api = realm.dom();
        let is_patched = |primitive: Primitive| api.identity(primitive).contains(GUARD_IDENTITY_MARK);
        GuardDiagnostics {
            version: constants::VERSION.to_string(),
            patched: PatchedPrimitives {
                remove_child: is_patched(Primitive::RemoveChild),
                insert_before: is_patched(Primitive::InsertBefore),
                replace_child: is_patched(Primitive::ReplaceChild),
                append_child: is_patched(Primitive::AppendChild),
                normalize: is_patched(Primitive::Normalize),
            },
            artifact_nodes: self.artifacts.len(),
            processed_nodes: self.processed.len(),
            original_text_records: self.original_text.len(),
            guarded_attribute_nodes: self.fragile_attrs.len(),
        }
    }
}

/// 以默认配置安装守护引擎。
pub fn install(realm: &Rc<PageRealm>) -> Rc<GuardEngine> {
    install_with_config(realm, GuardConfig::default())
}

/// 安装守护引擎；重复调用返回既有引擎，不会重复包装任何原语。
pub fn install_with_config(realm: &Rc<PageRealm>, config: GuardConfig) -> Rc<GuardEngine> {
    if realm.has_global(constants::INSTALLED_FLAG) {
        if let Some(engine) = realm.engine() {
            debug!("守护引擎已安装，跳过重复安装");
            return engine;
        }
        warn!("安装标志已置位但引擎缺失，继续执行安装");
    }

    // 标志位先行：即使后续步骤被再次触发也不会二次打补丁。
    realm.set_global(constants::INSTALLED_FLAG, "true");
    info!("守护引擎 v{} 初始化中...", constants::VERSION);

    let observe_delay_ms = config.observe_delay_ms;
    let engine = Rc::new(GuardEngine {
        config,
        originals: realm.dom(),
        artifacts: WeakNodeSet::new(),
        processed: WeakNodeSet::new(),
        fragile_attrs: WeakNodeSet::new(),
        original_text: OriginalTextMap::new(),
        observer: RefCell::new(None),
    });

    realm.set_dom(Rc::new(GuardedDom::new(engine.clone())));

    // 最后一道防线：未捕获错误通道上的已知结构崩溃签名被抑制，
    // 其余错误不做掩盖。
    realm.add_error_listener(|event: &ErrorEvent| {
        if is_structural_crash_message(event.message()) {
            warn!("已抑制结构崩溃错误: {}", event.message());
            event.prevent_default();
        }
    });

    // 立即开始观察，同时安排一次延迟启动以覆盖更晚挂载的文档主体；
    // 启动是幂等的，订阅始终只有一份。
    engine.start_observation(realm);
    {
        let engine = engine.clone();
        let realm_weak = Rc::downgrade(realm);
        realm.schedule(observe_delay_ms, move || {
            if let Some(realm) = realm_weak.upgrade() {
                engine.start_observation(&realm);
            }
        });
    }

    realm.set_engine(engine.clone());

    if engine.diagnostics(realm).patched.all() {
        info!("DOM 结构原语已全部打补丁");
    }

    engine
}
