// ==========================================
// BOM 矩阵管理系统 - 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库，文案位于 locales/{zh-CN,en}.yml
// 使用方: 导入报告的行级问题、默认机种描述、文件缺失日志
// 语言来源: 配置 app/locale（启动时及配置更新时切换）
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::config::config_manager::SUPPORTED_LOCALES;

/// 当前界面语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换界面语言
///
/// 仅接受 zh-CN / en；其他值保持当前语言并返回 false
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale, "不支持的语言，保持当前语言");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 翻译并替换 `%{name}` 占位符
///
/// # 示例
/// ```no_run
/// use bom_matrix::i18n::t_with_args;
/// let msg = t_with_args("import.duplicate_location", &[("location", "C1")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 默认机种（Model A/B/C）的描述文案
pub fn default_model_description(name: &str) -> String {
    t_with_args("matrix.default_model_description", &[("name", name)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 为全局状态，相关测试串行执行
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale_rejects_unsupported() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert!(set_locale("en"));
        assert_eq!(current_locale(), "en");

        assert!(!set_locale("de"));
        assert_eq!(current_locale(), "en");

        set_locale("zh-CN");
    }

    #[test]
    fn test_import_issue_messages_follow_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        let msg = t_with_args("import.duplicate_location", &[("location", "C1")]);
        assert!(msg.contains("C1"));
        assert!(msg.contains("位置重复"));

        set_locale("en");
        let msg = t_with_args("import.invalid_status", &[("value", "Q")]);
        assert!(msg.contains("Q"));
        assert!(!msg.contains("%{value}"));

        set_locale("zh-CN");
    }

    #[test]
    fn test_default_model_description() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert!(default_model_description("Model B").contains("Model B"));

        set_locale("zh-CN");
        let msg = default_model_description("Model A");
        assert!(msg.contains("Model A"));
        assert!(msg.contains("默认机种"));
    }

    #[test]
    fn test_messages_exist_in_both_locales() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        let keys = [
            "import.file_not_found",
            "import.orphan_second_source",
            "import.missing_supplier",
            "import.invalid_item",
            "import.invalid_status",
            "import.invalid_type",
            "import.duplicate_location",
            "import.incomplete_row",
            "matrix.default_model_description",
        ];
        for locale in SUPPORTED_LOCALES {
            set_locale(locale);
            for key in keys {
                // 缺失的键会原样返回 "<locale>.<key>" 形式
                let msg = t_with_args(key, &[]);
                assert!(!msg.is_empty());
                assert!(!msg.contains(key), "{} 缺少翻译: {}", locale, key);
            }
        }
        set_locale("zh-CN");
    }
}
