//! 守护引擎配置。
//!
//! 提供引擎的可调参数：翻译服务使用的包装元素签名、调用栈归因的
//! 脚本标识、观察启动的延迟等。所有参数都有内置默认值，也可以从
//! TOML 配置文件加载。

use serde::Deserialize;

use super::error::{GuardError, GuardResult};

/// 配置常量（内置默认值）。
pub mod constants {
    /// 引擎版本号，随诊断对象一起暴露。
    pub const VERSION: &str = "1.0.0";

    /// realm 级安装标志位的键名。
    pub const INSTALLED_FLAG: &str = "__domGuardInstalled";

    /// 翻译服务用于包装文本的元素标签。
    pub const WRAPPER_TAG: &str = "font";

    /// 包装元素 style 属性中的签名子串。
    pub const WRAPPER_STYLE_MARKER: &str = "background-color";

    /// 翻译服务已知的脚本标识（调用栈归因用，启发式）。
    pub const TRANSLATOR_SIGNATURES: [&str; 3] = [
        "translate_m.js",
        "translate.googleapis.com",
        "translate_a/element.js",
    ];

    /// 翻译服务安装在页面全局上的标志位键名。
    pub const TRANSLATOR_GLOBAL: &str = "google.translate";

    /// 首次启动观察前的一次性延迟（毫秒）。
    pub const OBSERVE_DELAY_MS: u64 = 100;
}

/// 守护引擎的运行参数。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// 包装元素的标签名（不区分大小写比较）。
    pub wrapper_tag: String,
    /// 包装元素 style 属性必须包含的子串。
    pub wrapper_style_marker: String,
    /// 调用栈文本里代表翻译服务的脚本标识。
    pub translator_signatures: Vec<String>,
    /// 翻译服务的页面全局标志位键名。
    pub translator_global: String,
    /// 首次启动观察前的延迟（毫秒）。
    pub observe_delay_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> GuardConfig {
        GuardConfig {
            wrapper_tag: constants::WRAPPER_TAG.to_string(),
            wrapper_style_marker: constants::WRAPPER_STYLE_MARKER.to_string(),
            translator_signatures: constants::TRANSLATOR_SIGNATURES
                .iter()
                .map(|signature| signature.to_string())
                .collect(),
            translator_global: constants::TRANSLATOR_GLOBAL.to_string(),
            observe_delay_ms: constants::OBSERVE_DELAY_MS,
        }
    }
}

impl GuardConfig {
    /// 从 TOML 文本解析配置，缺失字段使用默认值。
    pub fn from_toml_str(content: &str) -> GuardResult<GuardConfig> {
        toml::from_str(content)
            .map_err(|e| GuardError::ConfigError(format!("TOML解析错误: {e}")))
    }

    /// 从配置文件加载。
    pub fn load_from_file(path: &std::path::Path) -> GuardResult<GuardConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GuardError::ConfigError(format!("读取配置文件失败: {e}")))?;
        GuardConfig::from_toml_str(&content)
    }
}
