//! 集成测试共享工具
//!
//! 提供测试页面构建、节点查询和结构快照等辅助设施。

#![allow(dead_code)]

use std::rc::Rc;

use domguard::dom::{
    get_child_node_by_name, get_node_name, serialize_node, Handle,
};
use domguard::PageRealm;

/// 标准测试页面：`<div id=r><span>Hello</span></div>`。
pub struct TestPage {
    pub realm: Rc<PageRealm>,
    pub body: Handle,
    pub root: Handle,
    pub span: Handle,
}

impl TestPage {
    pub fn new() -> TestPage {
        let realm = PageRealm::from_html(
            "<html><head></head><body><div id=\"r\"><span>Hello</span></div></body></html>",
        );
        let document = realm.document_handle();
        let html = get_child_node_by_name(&document, "html").expect("html element");
        let body = get_child_node_by_name(&html, "body").expect("body element");
        let root = get_child_node_by_name(&body, "div").expect("div#r element");
        let span = get_child_node_by_name(&root, "span").expect("span element");
        TestPage {
            realm,
            body,
            root,
            span,
        }
    }

    /// span 里的文本节点。
    pub fn text_node(&self) -> Handle {
        self.span.children.borrow()[0].clone()
    }
}

/// 节点所有子元素的标签名（忽略非元素子节点）。
pub fn child_tags(node: &Handle) -> Vec<String> {
    node.children
        .borrow()
        .iter()
        .filter_map(|child| get_node_name(child).map(str::to_string))
        .collect()
}

/// 包含节点自身的结构快照。
pub fn snapshot(node: &Handle) -> String {
    serialize_node(node)
}

/// 初始化测试日志输出（重复调用无害）。
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
