//! 弱引用追踪表。
//!
//! 引擎不拥有任何节点：所有旁路状态都以节点身份为键、以弱引用存值，
//! 节点被文档释放后对应条目自然失效。这些表只服务于诊断与去重，
//! 从不参与正确性判断。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{Handle, WeakHandle};

/// 节点身份键（按 `Rc` 指针地址）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey(usize);

impl NodeKey {
    fn of(node: &Handle) -> NodeKey {
        NodeKey(Rc::as_ptr(node) as usize)
    }
}

/// 弱引用节点集合（已处理集、标记集）。
#[derive(Default)]
pub struct WeakNodeSet {
    entries: RefCell<HashMap<NodeKey, WeakHandle>>,
}

impl WeakNodeSet {
    pub fn new() -> WeakNodeSet {
        WeakNodeSet::default()
    }

    /// 加入集合；重复加入是无害的。
    pub fn insert(&self, node: &Handle) {
        self.entries
            .borrow_mut()
            .insert(NodeKey::of(node), Rc::downgrade(node));
    }

    /// 节点是否在集合中。升级失败（节点已释放）或地址被复用的
    /// 条目视为不存在。
    pub fn contains(&self, node: &Handle) -> bool {
        self.entries
            .borrow()
            .get(&NodeKey::of(node))
            .and_then(|weak| weak.upgrade())
            .is_some_and(|live| Rc::ptr_eq(&live, node))
    }

    /// 存活条目数（诊断用，顺带清理失效条目）。
    pub fn len(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, weak| weak.upgrade().is_some());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 文本节点的原始内容表：首次记录生效，之后不再覆盖。
#[derive(Default)]
pub struct OriginalTextMap {
    entries: RefCell<HashMap<NodeKey, (WeakHandle, String)>>,
}

impl OriginalTextMap {
    pub fn new() -> OriginalTextMap {
        OriginalTextMap::default()
    }

    /// 记录一个文本节点的原始内容；若已有记录则保持不变。
    /// 返回是否发生了新记录。
    pub fn record_once(&self, node: &Handle, content: &str) -> bool {
        let mut entries = self.entries.borrow_mut();
        let key = NodeKey::of(node);
        if let Some((weak, _)) = entries.get(&key) {
            if weak.upgrade().is_some_and(|live| Rc::ptr_eq(&live, node)) {
                return false;
            }
        }
        entries.insert(key, (Rc::downgrade(node), content.to_string()));
        true
    }

    /// 查询已记录的原始内容。
    pub fn get(&self, node: &Handle) -> Option<String> {
        self.entries
            .borrow()
            .get(&NodeKey::of(node))
            .filter(|(weak, _)| weak.upgrade().is_some_and(|live| Rc::ptr_eq(&live, node)))
            .map(|(_, content)| content.clone())
    }

    /// 存活记录数（诊断用）。
    pub fn len(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, (weak, _)| weak.upgrade().is_some());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
