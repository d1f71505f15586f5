//! 页面执行上下文（realm）。
//!
//! 一个 realm 对应一次页面加载：持有文档、可替换的 DOM 访问点、
//! 全局标志位、未捕获错误通道以及一次性的延迟任务队列。守护引擎
//! 的安装、诊断入口和错误监听器都挂载在这里。
//!
//! Realm 的生命周期等于页面的生命周期：没有卸载，也没有取消。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{html_to_dom, DomApi, Handle, RawDom, RcDom};
use crate::guard::GuardEngine;

/// 未捕获错误通道上的一次事件。
///
/// 监听器可以调用 [`ErrorEvent::prevent_default`] 来抑制宿主默认的
/// 崩溃处理；事件本身不携带任何可恢复的状态。
pub struct ErrorEvent {
    message: String,
    default_prevented: std::cell::Cell<bool>,
}

impl ErrorEvent {
    pub fn new(message: &str) -> ErrorEvent {
        ErrorEvent {
            message: message.to_string(),
            default_prevented: std::cell::Cell::new(false),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 抑制宿主对该错误的默认处理。
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

type ErrorListener = Rc<dyn Fn(&ErrorEvent)>;

struct ScheduledTask {
    delay_ms: u64,
    run: Box<dyn FnOnce()>,
}

/// 页面执行上下文。
pub struct PageRealm {
    document: RefCell<RcDom>,
    dom: RefCell<Rc<dyn DomApi>>,
    globals: RefCell<HashMap<String, String>>,
    error_listeners: RefCell<Vec<ErrorListener>>,
    tasks: RefCell<Vec<ScheduledTask>>,
    engine: RefCell<Option<Rc<GuardEngine>>>,
}

impl PageRealm {
    /// 用已解析的文档创建 realm，DOM 访问点初始为未打补丁的原生实现。
    pub fn new(document: RcDom) -> Rc<PageRealm> {
        Rc::new(PageRealm {
            document: RefCell::new(document),
            dom: RefCell::new(Rc::new(RawDom)),
            globals: RefCell::new(HashMap::new()),
            error_listeners: RefCell::new(Vec::new()),
            tasks: RefCell::new(Vec::new()),
            engine: RefCell::new(None),
        })
    }

    /// 直接从 HTML 字符串创建 realm（测试与演示的便捷入口）。
    pub fn from_html(html: &str) -> Rc<PageRealm> {
        PageRealm::new(html_to_dom(html.as_bytes(), "utf-8".to_string()))
    }

    /// 以只读方式访问文档。
    pub fn with_document<R>(&self, f: impl FnOnce(&RcDom) -> R) -> R {
        f(&self.document.borrow())
    }

    /// 文档根节点的句柄。
    pub fn document_handle(&self) -> Handle {
        self.document.borrow().document.clone()
    }

    /// 当前的 DOM 访问点（安装守护后即为拦截代理）。
    pub fn dom(&self) -> Rc<dyn DomApi> {
        self.dom.borrow().clone()
    }

    /// 替换 DOM 访问点。只有守护安装流程会调用。
    pub(crate) fn set_dom(&self, api: Rc<dyn DomApi>) {
        *self.dom.borrow_mut() = api;
    }

    // ------------------------------------------------------------------
    // 全局标志位
    // ------------------------------------------------------------------

    pub fn set_global(&self, key: &str, value: &str) {
        self.globals
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn has_global(&self, key: &str) -> bool {
        self.globals.borrow().contains_key(key)
    }

    pub fn global(&self, key: &str) -> Option<String> {
        self.globals.borrow().get(key).cloned()
    }

    // ------------------------------------------------------------------
    // 未捕获错误通道
    // ------------------------------------------------------------------

    /// 注册一个捕获阶段的错误监听器。注册后不可移除。
    pub fn add_error_listener(&self, listener: impl Fn(&ErrorEvent) + 'static) {
        self.error_listeners.borrow_mut().push(Rc::new(listener));
    }

    /// 派发一个未捕获错误事件；返回默认处理是否被抑制。
    pub fn dispatch_error(&self, event: &ErrorEvent) -> bool {
        let listeners: Vec<ErrorListener> = self.error_listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
        event.default_prevented()
    }

    // ------------------------------------------------------------------
    // 一次性延迟任务
    // ------------------------------------------------------------------

    /// 安排一个一次性的延迟任务。不是重试机制：每个任务只会运行一次。
    pub fn schedule(&self, delay_ms: u64, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push(ScheduledTask {
            delay_ms,
            run: Box::new(task),
        });
    }

    /// 按延迟顺序运行所有已到期任务（测试环境里的事件循环推进）。
    pub fn run_scheduled(&self) -> usize {
        let mut tasks: Vec<ScheduledTask> = self.tasks.borrow_mut().drain(..).collect();
        tasks.sort_by_key(|task| task.delay_ms);
        let count = tasks.len();
        for task in tasks {
            (task.run)();
        }
        count
    }

    // ------------------------------------------------------------------
    // 守护引擎挂载点
    // ------------------------------------------------------------------

    pub(crate) fn set_engine(&self, engine: Rc<GuardEngine>) {
        *self.engine.borrow_mut() = Some(engine);
    }

    /// 已安装的守护引擎（诊断全局对象的宿主侧入口）。
    pub fn engine(&self) -> Option<Rc<GuardEngine>> {
        self.engine.borrow().clone()
    }
}
