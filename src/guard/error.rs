//! 守护引擎的错误类型与失效引用分类。
//!
//! 引擎自身的失败用 [`GuardError`] 表达；对底层结构错误的分类
//! （按错误类别与消息子串）集中在这里，是恢复策略的唯一判据。

use thiserror::Error;

use crate::dom::DomError;

/// 守护引擎错误。
#[derive(Error, Debug)]
pub enum GuardError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 分类错误（观察循环中单条变更的处理失败）
    #[error("分类错误: {0}")]
    ClassificationError(String),

    /// 引导错误（加载器找不到挂载点等）
    #[error("引导错误: {0}")]
    BootstrapError(String),

    /// 底层 DOM 结构错误
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// 守护操作的结果类型别名。
pub type GuardResult<T> = Result<T, GuardError>;

/// 判断一个结构错误是否为失效引用错误。
///
/// 按合约只认两种信号：`NotFoundError` 类别，或消息里出现
/// "not a child" 子串。其余错误一律不在降级范围内。
pub fn is_stale_reference(error: &DomError) -> bool {
    matches!(error, DomError::NotFound(_)) || error.message().contains("not a child")
}

/// 判断一条未捕获错误消息是否属于已知的结构崩溃签名。
///
/// 这些子串就是合约本身，不代表更通用的错误模型。
pub fn is_structural_crash_message(message: &str) -> bool {
    message.contains("removeChild")
        || message.contains("insertBefore")
        || message.contains("not a child")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_stale() {
        let err = DomError::not_a_child("removeChild", "The node to be removed");
        assert!(is_stale_reference(&err));
    }

    #[test]
    fn hierarchy_error_is_not_stale() {
        let err = DomError::hierarchy("appendChild", "The new child element contains the parent.");
        assert!(!is_stale_reference(&err));
    }

    #[test]
    fn message_substring_alone_is_enough() {
        let err = DomError::InvalidState("weird state: not a child anymore".to_string());
        assert!(is_stale_reference(&err));
    }

    #[test]
    fn crash_signatures() {
        assert!(is_structural_crash_message(
            "Failed to execute 'removeChild' on 'Node': The node to be removed is not a child of this node."
        ));
        assert!(is_structural_crash_message("insertBefore blew up"));
        assert!(!is_structural_crash_message("TypeError: undefined is not a function"));
    }
}
