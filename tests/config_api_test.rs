// ==========================================
// ConfigApi 集成测试
// ==========================================

mod helpers;

use std::collections::BTreeMap;

use bom_matrix::api::ApiError;
use bom_matrix::config::config_keys;
use helpers::api_test_helper::*;

#[test]
fn test_update_and_list_configs() {
    let env = ApiTestEnv::new().unwrap();
    let api = &env.config_api;

    assert!(api.list_configs().unwrap().is_empty());
    assert_eq!(api.get_config("custom/flag").unwrap(), None);

    api.update_config("custom/flag", "1").unwrap();
    api.update_config("custom/flag", "2").unwrap();
    api.update_config(config_keys::IMPORT_SHEET_NAME, "BOM").unwrap();

    let entries = api.list_configs().unwrap();
    let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["custom/flag", "import/sheet_name"]);
    assert_eq!(api.get_config("custom/flag").unwrap().as_deref(), Some("2"));
}

#[test]
fn test_update_config_validates_known_keys() {
    let env = ApiTestEnv::new().unwrap();
    let api = &env.config_api;

    assert!(matches!(
        api.update_config(config_keys::MATRIX_DEFAULT_MODELS, "not json"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_config(config_keys::APP_LOCALE, "de"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_config(" ", "x"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(api.list_configs().unwrap().is_empty());
}

#[test]
fn test_batch_update_is_all_or_nothing() {
    let env = ApiTestEnv::new().unwrap();
    let api = &env.config_api;

    let mut configs = BTreeMap::new();
    configs.insert("custom/a".to_string(), "1".to_string());
    configs.insert(config_keys::APP_LOCALE.to_string(), "xx".to_string());
    assert!(api.batch_update_configs(&configs).is_err());
    assert!(api.list_configs().unwrap().is_empty());

    configs.insert(config_keys::APP_LOCALE.to_string(), "zh-CN".to_string());
    assert_eq!(api.batch_update_configs(&configs).unwrap(), 2);
    assert_eq!(api.list_configs().unwrap().len(), 2);
}

#[test]
fn 配置快照_导出与恢复() {
    let source = ApiTestEnv::new().unwrap();
    source
        .config_api
        .update_config(
            config_keys::MATRIX_DEFAULT_MODELS,
            r#"[{"name":"EU","description":null}]"#,
        )
        .unwrap();
    source.config_api.update_config("custom/x", "y").unwrap();

    let snapshot = source.config_api.get_config_snapshot().unwrap();

    let target = ApiTestEnv::new().unwrap();
    assert_eq!(
        target
            .config_api
            .restore_config_from_snapshot(&snapshot)
            .unwrap(),
        2
    );
    assert_eq!(
        target.config_api.get_config("custom/x").unwrap().as_deref(),
        Some("y")
    );

    assert!(matches!(
        target.config_api.restore_config_from_snapshot("[1,2]"),
        Err(ApiError::InvalidInput(_))
    ));
}
