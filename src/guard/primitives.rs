//! 结构原语的拦截代理。
//!
//! 每个被拦截的操作都遵循同一套策略：先验证调用者多半默认成立的
//! 前置条件，违反时优雅降级；随后委托给安装时捕获的原始实现；
//! 原始实现仍然抛出失效引用错误时（校验与委托之间的窗口），在
//! 本地转换为同样的降级结果。结构错误永远不会穿透到上层框架——
//! 一条漏出的异常就足以中断框架的整棵协调流程。
//!
//! 非失效引用类的错误（层级错误等）不在降级范围内，原样上抛。

use std::rc::Rc;

use tracing::{debug, warn};

use crate::dom::{raw, DomApi, DomError, Handle, Primitive};

use super::classify;
use super::error::is_stale_reference;
use super::install::GuardEngine;

/// 补丁函数文本身份里的守护标识。
pub const GUARD_IDENTITY_MARK: &str = "domguard";

/// 打过补丁的 DOM 访问点。
///
/// 持有引擎（分类状态与配置）以及安装时捕获的原始访问点；
/// 非异常路径上永远委托原始实现，自己从不重新实现结构语义。
pub struct GuardedDom {
    engine: Rc<GuardEngine>,
}

impl GuardedDom {
    pub(crate) fn new(engine: Rc<GuardEngine>) -> GuardedDom {
        GuardedDom { engine }
    }

    fn originals(&self) -> &Rc<dyn DomApi> {
        &self.engine.originals
    }
}

impl DomApi for GuardedDom {
    fn remove_child(&self, parent: &Handle, child: &Handle) -> Result<Handle, DomError> {
        // 结构可能在调用者构建视图之后已被另一个变更者改动。
        if !raw::contains(parent, child) {
            warn!("removeChild: 目标不是当前节点的子节点，忽略本次移除");
            return Ok(child.clone());
        }
        match self.originals().remove_child(parent, child) {
            Ok(removed) => Ok(removed),
            Err(error) if is_stale_reference(&error) => {
                warn!("removeChild 错误已捕获并处理: {}", error.message());
                Ok(child.clone())
            }
            Err(error) => Err(error),
        }
    }

    fn insert_before(
        &self,
        parent: &Handle,
        node: &Handle,
        reference: Option<&Handle>,
    ) -> Result<Handle, DomError> {
        let Some(reference) = reference else {
            return self.append_child(parent, node);
        };
        if !raw::contains(parent, reference) {
            warn!("insertBefore: 参照节点已不存在，降级为追加");
            return self.append_child(parent, node);
        }
        match self.originals().insert_before(parent, node, Some(reference)) {
            Ok(inserted) => Ok(inserted),
            Err(error) if is_stale_reference(&error) => {
                warn!("insertBefore 错误已捕获，降级为追加: {}", error.message());
                match self.originals().append_child(parent, node) {
                    Ok(appended) => Ok(appended),
                    Err(append_error) => {
                        warn!("appendChild 兜底同样失败: {}", append_error.message());
                        Ok(node.clone())
                    }
                }
            }
            Err(error) => Err(error),
        }
    }

    fn replace_child(
        &self,
        parent: &Handle,
        new_child: &Handle,
        old_child: &Handle,
    ) -> Result<Handle, DomError> {
        if !raw::contains(parent, old_child) {
            warn!("replaceChild: 旧节点已不在树中，降级为追加新节点");
            return self.append_child(parent, new_child);
        }
        match self
            .originals()
            .replace_child(parent, new_child, old_child)
        {
            Ok(replaced) => Ok(replaced),
            Err(error) if is_stale_reference(&error) => {
                warn!("replaceChild 错误已捕获，降级为追加: {}", error.message());
                match self.originals().append_child(parent, new_child) {
                    Ok(appended) => Ok(appended),
                    Err(append_error) => {
                        warn!("appendChild 兜底同样失败: {}", append_error.message());
                        Ok(new_child.clone())
                    }
                }
            }
            Err(error) => Err(error),
        }
    }

    fn append_child(&self, parent: &Handle, node: &Handle) -> Result<Handle, DomError> {
        // appendChild 本身不降级：它是其余操作的兜底目标。
        self.originals().append_child(parent, node)
    }

    fn normalize(&self, node: &Handle) -> Result<(), DomError> {
        // 合并相邻文本节点会破坏翻译服务依赖的包装结构，并使上层
        // 框架的子节点索引失效，因此只要子树里存在包装签名就整体跳过。
        if classify::subtree_contains_wrapper(&self.engine.config, node) {
            debug!("normalize: 子树包含已翻译内容，跳过规范化");
            return Ok(());
        }
        match self.originals().normalize(node) {
            Ok(()) => Ok(()),
            Err(error) => {
                warn!("normalize 错误已捕获: {}", error.message());
                Ok(())
            }
        }
    }

    fn identity(&self, primitive: Primitive) -> String {
        format!(
            "function {}() {{ [{} v{}] }}",
            primitive.name(),
            GUARD_IDENTITY_MARK,
            super::config::constants::VERSION
        )
    }
}
