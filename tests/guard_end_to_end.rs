//! 端到端场景：翻译服务与框架在同一棵树上交错变更
//!
//! 模拟翻译服务的完整动作序列（创建包装元素、带失效引用插入、
//! 覆盖文本内容），验证降级插入、观察循环的产物标记与原始内容
//! 记录，以及引导加载器的整条链路。

use std::rc::Rc;

use domguard::dom::{new_text, raw, text_content};
use domguard::guard::classify::script_scope;
use domguard::{install, loader};

mod common;

use common::{child_tags, init_tracing, TestPage};

/// 翻译服务用失效参照节点插入包装元素：降级为追加、不抛错，
/// 观察循环随后把插入的 font 标记为翻译产物。
#[test]
fn stale_insert_falls_back_and_wrapper_gets_marked() {
    init_tracing();
    let page = TestPage::new();
    let engine = install(&page.realm);
    let dom = page.realm.dom();

    // 翻译服务在自己的脚本上下文里创建包装元素。
    let font = {
        let _scope = script_scope("https://translate.googleapis.com/translate_a/element.js");
        engine.create_element(&page.realm, "font")
    };
    engine
        .set_attribute(&font, "style", Some("background-color: #c9d7f1"))
        .expect("style attribute");
    raw::append_child(&font, &new_text("Hola")).unwrap();

    // 参照节点来自翻译服务过期的树视图。
    let stale_reference = new_text("Hello");
    dom.insert_before(&page.span, &font, Some(&stale_reference))
        .expect("degrades to append instead of throwing");
    assert_eq!(
        child_tags(&page.span),
        vec!["font"],
        "wrapper appended as last child"
    );

    // 通知批次送达后，包装元素被标记为翻译产物。
    let handled = engine.process_mutations();
    assert!(handled > 0, "observer received the mutation batch");
    assert!(engine.is_translation_artifact(&font));

    let diagnostics = engine.diagnostics(&page.realm);
    assert!(diagnostics.artifact_nodes >= 1);
    assert!(diagnostics.processed_nodes >= 1);

    // 重复通知不会重复处理。
    raw::remove_child(&page.span, &font).unwrap();
    raw::append_child(&page.span, &font).unwrap();
    engine.process_mutations();
    assert_eq!(
        engine.diagnostics(&page.realm).processed_nodes,
        diagnostics.processed_nodes,
        "already-processed wrapper is not re-classified"
    );
}

/// 文本被翻译服务覆盖时，原始内容被记录一次且之后不再覆盖。
#[test]
fn original_text_is_recorded_before_overwrite() {
    init_tracing();
    let page = TestPage::new();
    let engine = install(&page.realm);

    let text = page.text_node();
    assert_eq!(text_content(&text), "Hello");

    raw::set_text(&text, "Hola").unwrap();
    engine.process_mutations();
    assert_eq!(engine.original_text_of(&text).as_deref(), Some("Hello"));

    // 第二次覆盖不会更新记录：首次记录生效。
    raw::set_text(&text, "Bonjour").unwrap();
    engine.process_mutations();
    assert_eq!(engine.original_text_of(&text).as_deref(), Some("Hello"));
    assert_eq!(text_content(&text), "Bonjour", "content itself is never reverted");
}

/// 观察循环也能补上不是由创建钩子标记的包装元素（整棵子树插入）。
#[test]
fn observer_classifies_wrappers_moved_into_the_tree() {
    init_tracing();
    let page = TestPage::new();
    let engine = install(&page.realm);

    // 翻译服务把现成的包装结构整体挂进来（移动而非创建）。
    let wrapper_parent = page
        .realm
        .with_document(|d| domguard::dom::new_element(d, "div", &[]));
    let font = page.realm.with_document(|d| {
        domguard::dom::new_element(d, "font", &[("style", "background-color: #fdd")])
    });
    raw::append_child(&font, &new_text("Hallo")).unwrap();
    raw::append_child(&wrapper_parent, &font).unwrap();
    raw::append_child(&page.root, &wrapper_parent).unwrap();

    engine.process_mutations();
    assert!(engine.is_translation_artifact(&font));

    // 包装下的文本内容在分类时已记录在案。
    let inner_text = font.children.borrow()[0].clone();
    assert_eq!(engine.original_text_of(&inner_text).as_deref(), Some("Hallo"));
}

/// 延迟启动任务可以安全运行：订阅仍然只有一份。
#[test]
fn deferred_observation_start_is_idempotent() {
    init_tracing();
    let page = TestPage::new();
    let engine = install(&page.realm);

    assert_eq!(page.realm.run_scheduled(), 1, "one deferred start pending");

    // 订阅没有翻倍：一次变更只产生一批通知。
    let em = page
        .realm
        .with_document(|d| domguard::dom::new_element(d, "em", &[]));
    raw::append_child(&page.root, &em).unwrap();
    assert_eq!(engine.process_mutations(), 1);
}

/// 加载器引导的完整链路：安装、清理痕迹、随后的降级行为可用。
#[test]
fn loader_boot_end_to_end() {
    init_tracing();
    let page = TestPage::new();
    let engine = loader::boot(&page.realm).expect("boot succeeds");
    assert!(engine.diagnostics(&page.realm).patched.all());

    let dom = page.realm.dom();
    dom.remove_child(&page.root, &page.span).expect("first remove");
    let returned = dom
        .remove_child(&page.root, &page.span)
        .expect("second remove degrades");
    assert!(Rc::ptr_eq(&returned, &page.span));
}
