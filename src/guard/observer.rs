//! 变更观察循环。
//!
//! 订阅文档主体的结构与文本变更，分批处理通知：补上创建期钩子
//! 漏掉的翻译产物（例如翻译服务移动而非新建的元素），并在文本被
//! 覆盖前记录其原始内容。通知在变更落地之后才送达，观察循环永远
//! 是在事后协调，从不阻止任何变更。
//!
//! 单条变更的分类失败只记录日志，绝不中断同批其余变更的处理。

use tracing::{debug, warn};

use markup5ever_rcdom::NodeData;

use crate::dom::{
    body_or_root, text_content, tree, Handle, MutationObserver, MutationRecord, ObserveOptions,
};
use crate::realm::PageRealm;

use super::classify;
use super::error::GuardResult;
use super::install::GuardEngine;

impl GuardEngine {
    /// 启动观察。幂等：订阅在整个页面生命周期内只建立一份。
    pub fn start_observation(&self, realm: &PageRealm) {
        let mut slot = self.observer.borrow_mut();
        if slot.is_some() {
            return;
        }
        let target = realm.with_document(body_or_root);
        *slot = Some(MutationObserver::observe(
            &target,
            ObserveOptions::subtree_with_text(),
        ));
        debug!("观察循环已启动");
    }

    /// 处理一批待送达的变更通知，返回处理的记录条数。
    pub fn process_mutations(&self) -> usize {
        let records = {
            let slot = self.observer.borrow();
            let Some(observer) = slot.as_ref() else {
                return 0;
            };
            observer.take_records()
        };

        let mut handled = 0;
        for record in records {
            match record {
                MutationRecord::ChildList { added_nodes, .. } => {
                    for node in added_nodes {
                        if let Err(error) = self.handle_added_node(&node) {
                            // 一条失败不影响本批其余通知。
                            warn!("处理新增节点失败: {error}");
                        }
                    }
                }
                MutationRecord::CharacterData { target, old_value } => {
                    self.handle_character_data(&target, old_value.as_deref());
                }
            }
            handled += 1;
        }
        handled
    }

    /// 对一个新增节点做包装签名匹配：节点本身、创建期已标记的
    /// 节点、以及后代里所有匹配的元素。
    fn handle_added_node(&self, node: &Handle) -> GuardResult<()> {
        let NodeData::Element { .. } = node.data else {
            return Ok(());
        };
        if classify::matches_wrapper_signature(&self.config, node) || self.artifacts.contains(node)
        {
            self.classify_wrapper(node)?;
        }
        for wrapper in classify::find_wrapper_descendants(&self.config, node) {
            self.classify_wrapper(&wrapper)?;
        }
        Ok(())
    }

    /// 把一个包装元素登记为翻译产物。已处理过的元素直接跳过，
    /// 避免重复通知造成的无限循环。
    fn classify_wrapper(&self, element: &Handle) -> GuardResult<()> {
        if self.processed.contains(element) {
            return Ok(());
        }

        // 先把包装下的文本内容记录在案（首次记录生效），再打标记。
        let mut text_nodes: Vec<Handle> = Vec::new();
        tree::for_each_node(element, &mut |node| {
            if let NodeData::Text { .. } = node.data {
                text_nodes.push(node.clone());
            }
        });
        for text_node in &text_nodes {
            let content = text_content(text_node);
            self.original_text.record_once(text_node, &content);
        }

        self.artifacts.insert(element);
        self.processed.insert(element);
        debug!("元素已标记为翻译产物");
        Ok(())
    }

    /// 文本变更：在内容被覆盖前记录旧值，之后不再覆盖记录。
    /// 内容本身从不回滚。
    fn handle_character_data(&self, target: &Handle, old_value: Option<&str>) {
        let NodeData::Text { .. } = target.data else {
            return;
        };
        let original = match old_value {
            Some(value) => value.to_string(),
            None => text_content(target),
        };
        if self.original_text.record_once(target, &original) {
            debug!("已记录文本节点的原始内容");
        }
    }
}
