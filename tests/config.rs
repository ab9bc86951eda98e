use anyhow::Result;
use serde_json::{json, Value};
use swc_common::FileName;
use swc_ecma_loader::resolve::Resolve;

use preload_bridge::config::{
    default_config, merge_config, ConfigModuleLoader, ConfigResolver, MockConfig,
    MockConfigManager, CONFIG_TEMPLATE,
};
use preload_bridge::module_cache::ModuleCache;

mod common;
use common::fixture;

#[test]
fn config_defaults() {
    let config = MockConfig::default();
    assert!(config.enabled);
    assert!(config.show_dev_indicator);
    assert!(config.preload_api.enabled);
    assert!(config.preload_api.mount_name.is_none());
    assert_eq!(
        json!("utools_mock_"),
        config.utools_api["dbStorage"]["prefix"]
    );
}

#[test]
fn config_merge_one_level() {
    let user = json!({
        "enabled": false,
        "showDevIndicator": null,
        "utoolsApi": { "enabled": false },
        "preloadApi": { "mountName": "services" },
    });
    let merged = merge_config(&default_config(), &user);
    assert_eq!(json!(false), merged["enabled"]);
    assert_eq!(json!(true), merged["showDevIndicator"]);
    assert_eq!(json!(false), merged["utoolsApi"]["enabled"]);
    assert_eq!(json!({}), merged["utoolsApi"]["customMethods"]);
    assert_eq!(json!(true), merged["preloadApi"]["enabled"]);
    assert_eq!(json!("services"), merged["preloadApi"]["mountName"]);
}

#[test]
fn config_merge_replaces_mock_data() {
    let defaults = json!({ "mockData": { "a": 1, "b": 2 } });
    let merged = merge_config(&defaults, &json!({ "mockData": { "c": 3 } }));
    assert_eq!(json!({ "c": 3 }), merged["mockData"]);

    let merged = merge_config(&defaults, &Value::Null);
    assert_eq!(defaults, merged);
}

#[test]
fn config_evaluate_module() -> Result<()> {
    let cache: ModuleCache<Value> = ModuleCache::new();
    let loader = ConfigModuleLoader::new(&cache);
    let value = loader.load(fixture("config/utools.mock.ts"))?;

    assert_eq!(json!(false), value["showDevIndicator"]);
    assert_eq!(json!("color: dark"), value["devIndicatorStyles"]);
    assert_eq!(
        json!({
            "users": [{ "id": 1, "name": "alice" }, { "id": 2, "name": "bob" }],
            "appName": "demo",
            "maxItems": 10,
        }),
        value["mockData"]
    );
    assert_eq!(
        json!("(name: string) => `[Custom Mock] hello ${name}`"),
        value["preloadApi"]["customMethods"]["hello"]
    );
    assert_eq!(
        json!("read(path) { return Promise.resolve(path); }"),
        value["preloadApi"]["customMethods"]["read"]
    );

    // imported modules are cached as well
    assert!(cache.contains(fixture("config/mock/data.ts")));
    assert!(cache.contains(fixture("config/mock/constants/index.ts")));
    Ok(())
}

#[test]
fn config_named_exports() -> Result<()> {
    let cache: ModuleCache<Value> = ModuleCache::new();
    let loader = ConfigModuleLoader::new(&cache);
    let value = loader.load(fixture("config/mock/constants/index.ts"))?;
    assert_eq!(
        json!({ "APP_NAME": "demo", "LIMITS": { "max": 10, "min": -1 } }),
        value
    );
    Ok(())
}

#[test]
fn config_commonjs_module() -> Result<()> {
    let cache: ModuleCache<Value> = ModuleCache::new();
    let loader = ConfigModuleLoader::new(&cache);
    let value = loader.load(fixture("config/commonjs.js"))?;
    assert_eq!(
        json!({
            "enabled": false,
            "mockData": { "items": [1, 2, 3] },
            "showDevIndicator": true,
        }),
        value
    );
    Ok(())
}

#[test]
fn config_circular_import() {
    let cache: ModuleCache<Value> = ModuleCache::new();
    let loader = ConfigModuleLoader::new(&cache);
    let err = loader.load(fixture("config/circular/a.ts")).unwrap_err();
    assert!(format!("{:#}", err).contains("circular import of config module"));
}

#[test]
fn config_resolver() -> Result<()> {
    let resolver = ConfigResolver::new();
    let base = FileName::Real(fixture("config/utools.mock.ts"));

    assert_eq!(
        FileName::Real(fixture("config/mock/data.ts")),
        resolver.resolve(&base, "./mock/data")?
    );
    assert_eq!(
        FileName::Real(fixture("config/mock/constants/index.ts")),
        resolver.resolve(&base, "./mock/constants")?
    );
    assert!(resolver.resolve(&base, "lodash").is_err());
    assert!(resolver.resolve(&base, "./mock/missing").is_err());
    Ok(())
}

#[test]
fn config_manager_loads_project() -> Result<()> {
    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut manager = MockConfigManager::new(fixture("config"), &cache);
    let config = manager.config()?;

    assert!(config.enabled);
    assert!(!config.show_dev_indicator);
    assert_eq!(Some("services".to_string()), config.preload_api.mount_name);
    assert!(config.preload_api.enabled);
    let overrides = config.preload_api.overrides();
    let names: Vec<&str> = overrides.keys().map(|k| k.as_str()).collect();
    assert_eq!(vec!["hello", "read"], names);
    // defaults survive for keys the project does not set
    assert_eq!(json!(true), config.utools_api["enabled"]);
    Ok(())
}

#[test]
fn config_manager_skips_invalid_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("utools.mock.json"), "{ not json")?;
    std::fs::write(
        dir.path().join("utools.mock.ts"),
        "export default { enabled: false };",
    )?;

    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut manager = MockConfigManager::new(dir.path(), &cache);
    let (path, _) = manager.load_user_config().unwrap();
    assert_eq!(dir.path().join("utools.mock.ts"), *path);
    assert!(!manager.config()?.enabled);
    Ok(())
}

#[test]
fn config_manager_without_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut manager = MockConfigManager::new(dir.path(), &cache);
    assert!(manager.load_user_config().is_none());
    assert_eq!(MockConfig::default(), manager.config()?);
    Ok(())
}

#[test]
fn config_manager_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("utools.mock.ts");
    std::fs::write(&file, "export default { showDevIndicator: false };")?;

    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut manager = MockConfigManager::new(dir.path(), &cache);
    assert!(!manager.config()?.show_dev_indicator);

    std::fs::write(&file, "export default { showDevIndicator: true };")?;
    assert!(!manager.config()?.show_dev_indicator);
    assert!(manager.reload()?.show_dev_indicator);
    Ok(())
}

#[test]
fn config_template() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut manager = MockConfigManager::new(dir.path(), &cache);

    let path = manager.write_template("utools.mock.ts")?;
    assert_eq!(CONFIG_TEMPLATE, std::fs::read_to_string(&path)?);
    assert!(manager.write_template("utools.mock.ts").is_err());

    let config = manager.config()?;
    assert!(config.enabled);
    assert!(config.preload_api.overrides().is_empty());
    Ok(())
}
