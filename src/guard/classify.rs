//! 翻译产物的分类逻辑。
//!
//! 两条互补的识别路径：
//!
//! 1. **结构签名**（首选）：带有 `background-color` 样式的 `font`
//!    包装元素。属性一旦就位就稳定可查。
//! 2. **调用栈归因**（次选，启发式）：元素创建发生时还没有任何
//!    属性可查，只能检查当前执行是否归属于翻译服务——脚本作用域
//!    栈里出现已知脚本标识，或页面全局上有翻译服务的标志位。
//!    脚本改名会导致漏判，这是接受的近似，不是硬保证。

use std::cell::RefCell;

use crate::dom::{get_node_attr, get_node_name, tree, Handle};
use crate::realm::PageRealm;

use super::config::GuardConfig;

// ----------------------------------------------------------------------
// 结构签名
// ----------------------------------------------------------------------

/// 节点本身是否匹配包装元素签名。
pub fn matches_wrapper_signature(config: &GuardConfig, node: &Handle) -> bool {
    let Some(name) = get_node_name(node) else {
        return false;
    };
    if !name.eq_ignore_ascii_case(&config.wrapper_tag) {
        return false;
    }
    get_node_attr(node, "style")
        .is_some_and(|style| style.contains(&config.wrapper_style_marker))
}

/// 子树（含根）里是否存在匹配签名的元素。
pub fn subtree_contains_wrapper(config: &GuardConfig, root: &Handle) -> bool {
    let mut found = false;
    tree::for_each_node(root, &mut |node| {
        if !found && matches_wrapper_signature(config, node) {
            found = true;
        }
    });
    found
}

/// 收集 `root` 的后代中所有匹配签名的元素（不含 `root` 本身，
/// 与宿主的后代选择器查询语义一致）。
pub fn find_wrapper_descendants(config: &GuardConfig, root: &Handle) -> Vec<Handle> {
    let mut matches = Vec::new();
    let children: Vec<Handle> = root.children.borrow().iter().cloned().collect();
    for child in children {
        tree::for_each_node(&child, &mut |node| {
            if matches_wrapper_signature(config, node) {
                matches.push(node.clone());
            }
        });
    }
    matches
}

// ----------------------------------------------------------------------
// 调用栈归因
// ----------------------------------------------------------------------

thread_local! {
    static SCRIPT_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// 脚本执行作用域的 RAII 守卫：构造时入栈，析构时出栈。
///
/// 宿主在派发某个脚本的回调前建立作用域，使其间的元素创建可以
/// 归因到该脚本。
pub struct ScriptScope {
    _private: (),
}

impl Drop for ScriptScope {
    fn drop(&mut self) {
        SCRIPT_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// 进入一个以 `label` 标识的脚本执行作用域。
pub fn script_scope(label: &str) -> ScriptScope {
    SCRIPT_STACK.with(|stack| stack.borrow_mut().push(label.to_string()));
    ScriptScope { _private: () }
}

/// 当前调用栈的文本形式（自顶向下，一行一帧）。
pub fn stack_text() -> String {
    SCRIPT_STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join("\n")
    })
}

/// 当前执行是否归属于翻译服务。
pub fn is_translator_context(config: &GuardConfig, realm: &PageRealm) -> bool {
    let stack = stack_text();
    config
        .translator_signatures
        .iter()
        .any(|signature| stack.contains(signature.as_str()))
        || realm.has_global(&config.translator_global)
}

// ----------------------------------------------------------------------
// 创建期拦截
// ----------------------------------------------------------------------

impl super::install::GuardEngine {
    /// 创建元素，并在创建瞬间完成归因分类。
    ///
    /// 此时元素还没有任何属性可供签名匹配，只能依赖调用栈归因：
    /// 标签与包装标签一致且当前执行归属于翻译服务时，立即打上
    /// 翻译产物标记，并为其开启属性写入的吞错保护（翻译服务会在
    /// 元素移除中途继续设置属性）。其余元素原样返回，除栈检查外
    /// 没有任何额外开销。
    pub fn create_element(&self, realm: &PageRealm, tag: &str) -> Handle {
        let element = realm.with_document(|dom| crate::dom::new_element(dom, tag, &[]));
        if tag.eq_ignore_ascii_case(&self.config.wrapper_tag)
            && is_translator_context(&self.config, realm)
        {
            self.artifacts.insert(&element);
            self.fragile_attrs.insert(&element);
            tracing::debug!("元素创建归因于翻译服务，已标记: <{tag}>");
        }
        element
    }

    /// 属性写入。对创建期标记过的元素，写入失败只记录日志并
    /// 静默返回；其余元素的错误原样上抛。
    pub fn set_attribute(
        &self,
        node: &Handle,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), crate::dom::DomError> {
        match crate::dom::set_attr(node, name, value) {
            Ok(()) => Ok(()),
            Err(error) if self.fragile_attrs.contains(node) => {
                tracing::warn!("setAttribute 错误已捕获: {}", error.message());
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// 对外暴露的分类谓词：节点带有产物标记，或当前就匹配包装签名。
    pub fn is_translation_artifact(&self, node: &Handle) -> bool {
        self.artifacts.contains(node) || matches_wrapper_signature(&self.config, node)
    }

    /// 查询文本节点被记录过的原始内容（仅诊断用途）。
    pub fn original_text_of(&self, node: &Handle) -> Option<String> {
        self.original_text.get(node)
    }

    /// 当前执行是否归属于翻译服务（诊断对象暴露的谓词）。
    pub fn translator_context(&self, realm: &PageRealm) -> bool {
        is_translator_context(&self.config, realm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{html_to_dom, new_element, new_text};
    use crate::realm::PageRealm;

    #[test]
    fn wrapper_signature_requires_tag_and_style_marker() {
        let dom = html_to_dom(b"<html></html>", "utf-8".to_string());
        let config = GuardConfig::default();

        let wrapper = new_element(&dom, "font", &[("style", "background-color: #c9d7f1")]);
        assert!(matches_wrapper_signature(&config, &wrapper));

        let plain_font = new_element(&dom, "font", &[("color", "red")]);
        assert!(!matches_wrapper_signature(&config, &plain_font));

        let styled_span = new_element(&dom, "span", &[("style", "background-color: red")]);
        assert!(!matches_wrapper_signature(&config, &styled_span));

        assert!(!matches_wrapper_signature(&config, &new_text("hola")));
    }

    #[test]
    fn descendant_query_excludes_the_root() {
        let dom = html_to_dom(b"<html></html>", "utf-8".to_string());
        let config = GuardConfig::default();
        let root = new_element(&dom, "font", &[("style", "background-color: #fff")]);
        let inner = new_element(&dom, "font", &[("style", "background-color: #fff")]);
        crate::dom::raw::append_child(&root, &inner).unwrap();

        let found = find_wrapper_descendants(&config, &root);
        assert_eq!(found.len(), 1);
        assert!(std::rc::Rc::ptr_eq(&found[0], &inner));
        assert!(subtree_contains_wrapper(&config, &root));
    }

    #[test]
    fn attribution_via_script_stack() {
        let config = GuardConfig::default();
        let realm = PageRealm::from_html("<html><body></body></html>");
        assert!(!is_translator_context(&config, &realm));

        {
            let _app = script_scope("https://app.example/static/js/main.chunk.js");
            assert!(!is_translator_context(&config, &realm));
            {
                let _translate =
                    script_scope("https://translate.googleapis.com/translate_a/element.js");
                assert!(is_translator_context(&config, &realm));
            }
            assert!(!is_translator_context(&config, &realm));
        }
        assert!(stack_text().is_empty());
    }

    #[test]
    fn attribution_via_global_flag() {
        let config = GuardConfig::default();
        let realm = PageRealm::from_html("<html><body></body></html>");
        realm.set_global("google.translate", "1");
        assert!(is_translator_context(&config, &realm));
    }

    #[test]
    fn creation_in_translator_context_marks_the_element() {
        let realm = PageRealm::from_html("<html><body></body></html>");
        let engine = crate::guard::install(&realm);

        let unattributed = engine.create_element(&realm, "font");
        assert!(!engine.artifacts.contains(&unattributed));

        let _scope = script_scope("https://example.com/translate_m.js?cb=x");
        let attributed = engine.create_element(&realm, "FONT");
        assert!(engine.artifacts.contains(&attributed));
        assert!(engine.fragile_attrs.contains(&attributed));

        // 其它标签即便在翻译上下文里也不标记。
        let span = engine.create_element(&realm, "span");
        assert!(!engine.artifacts.contains(&span));
    }

    #[test]
    fn fragile_elements_swallow_attribute_errors() {
        let realm = PageRealm::from_html("<html><body></body></html>");
        let engine = crate::guard::install(&realm);

        // 翻译服务在元素被移除中途继续写属性时会拿到失效句柄；
        // 这里用一个被标记为脆弱的文本句柄模拟那种失败。
        let stale_handle = new_text("hola");
        engine.fragile_attrs.insert(&stale_handle);
        engine
            .set_attribute(&stale_handle, "style", Some("background-color: #fff"))
            .expect("error swallowed for fragile handles");

        // 未标记的句柄照常上抛。
        let plain = new_text("hola");
        assert!(engine.set_attribute(&plain, "style", Some("x")).is_err());
    }
}
