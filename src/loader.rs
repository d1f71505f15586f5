//! 加载器。
//!
//! 与引擎之间唯一的约定是"让引擎代码在页面上下文里尽早执行一次"，
//! 不跨边界传递任何参数。加载器把一个脚本元素挂到 head（没有 head
//! 时挂到文档元素）上，触发引擎的一次性安装，然后移除自己的痕迹。

use std::rc::Rc;

use tracing::info;

use crate::dom::{get_child_node_by_name, new_element, Handle};
use crate::guard::{install, GuardEngine, GuardError, GuardResult};
use crate::realm::PageRealm;

/// 注入脚本在文档里使用的标识。
const INJECT_SRC: &str = "domguard/inject.js";

fn mount_point(realm: &PageRealm) -> Option<Handle> {
    let document = realm.document_handle();
    let html = get_child_node_by_name(&document, "html")?;
    Some(get_child_node_by_name(&html, "head").unwrap_or(html))
}

/// 引导引擎：注入、安装、清理。重复引导由引擎的幂等保护兜底。
pub fn boot(realm: &Rc<PageRealm>) -> GuardResult<Rc<GuardEngine>> {
    let mount = mount_point(realm).ok_or_else(|| {
        GuardError::BootstrapError("文档缺少可用的脚本挂载点".to_string())
    })?;

    // 尽早执行：挂到挂载点的最前面，排在页面其它脚本之前。
    // 此时访问点还是安装前的原生实现。
    let script = realm.with_document(|dom| new_element(dom, "script", &[("src", INJECT_SRC)]));
    let first_child = mount.children.borrow().first().cloned();
    realm.dom().insert_before(&mount, &script, first_child.as_ref())?;

    let engine = install(realm);

    // 清理痕迹。此时访问点已被打补丁，移除走的是守护后的路径。
    realm.dom().remove_child(&mount, &script)?;

    info!("加载器引导完成");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::text_content;

    #[test]
    fn boot_installs_and_removes_its_trace() {
        let realm = PageRealm::from_html("<html><head></head><body></body></html>");
        let engine = boot(&realm).unwrap();
        assert!(engine.diagnostics(&realm).patched.all());

        // 脚本元素没有留在文档里。
        let mount = mount_point(&realm).unwrap();
        assert!(get_child_node_by_name(&mount, "script").is_none());
    }

    #[test]
    fn boot_twice_is_idempotent() {
        let realm = PageRealm::from_html("<html><head></head><body>x</body></html>");
        let first = boot(&realm).unwrap();
        let second = boot(&realm).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(
            text_content(&realm.document_handle()).trim(),
            "x",
            "document content is untouched by the loader"
        );
    }
}
