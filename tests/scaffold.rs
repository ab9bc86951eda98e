use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::json;

use preload_bridge::config::MockConfig;
use preload_bridge::scaffold::{mock_path, MockScaffolder, ScaffoldOutcome};

mod common;
use common::{fixture, read_to_string};

fn project() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let preload = dir.path().join("preload.ts");
    std::fs::copy(fixture("preload/hello.ts"), &preload)?;
    Ok((dir, preload))
}

#[test]
fn scaffold_mock_path() {
    assert_eq!(
        PathBuf::from("src/preload.mock.ts"),
        mock_path("src/preload.ts")
    );
    assert_eq!(PathBuf::from("api.mock.js"), mock_path("api.js"));
    assert_eq!(PathBuf::from("preload.mock"), mock_path("preload"));
}

#[test]
fn scaffold_creates_once() -> Result<()> {
    let (_dir, preload) = project()?;
    let scaffolder = MockScaffolder::new(&preload, "preload");
    let mock = scaffolder.mock_path().to_path_buf();

    assert_eq!(ScaffoldOutcome::Created(mock.clone()), scaffolder.scaffold());
    assert_eq!(
        read_to_string(fixture("mock/hello.mock.ts"))?,
        read_to_string(&mock)?
    );

    std::fs::write(&mock, "// edited by hand\n")?;
    assert_eq!(ScaffoldOutcome::Existing(mock.clone()), scaffolder.scaffold());
    assert_eq!("// edited by hand\n", read_to_string(&mock)?);
    Ok(())
}

#[test]
fn scaffold_failure_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let preload = dir.path().join("preload.ts");
    std::fs::write(&preload, "export const = ;")?;

    let scaffolder = MockScaffolder::new(&preload, "preload");
    match scaffolder.scaffold() {
        ScaffoldOutcome::Failed(message) => {
            assert!(message.starts_with("failed to scaffold mock file"));
        }
        outcome => panic!("unexpected outcome {:?}", outcome),
    }
    assert!(!scaffolder.mock_path().exists());
    Ok(())
}

#[test]
fn scaffold_with_config() -> Result<()> {
    let (_dir, preload) = project()?;
    let mut config = MockConfig::default();
    config.preload_api.mount_name = Some("services".to_string());
    let mut custom = IndexMap::new();
    custom.insert("hello".to_string(), json!("() => 42"));
    custom.insert("ignored".to_string(), json!(1));
    config.preload_api.custom_methods = custom;

    let scaffolder = MockScaffolder::new(&preload, "preload").with_config(&config);
    assert_eq!("services", scaffolder.global_name());
    let code = scaffolder.render()?;
    assert!(code.contains("    services: {\n        hello: () => 42,\n    },\n"));
    assert!(!code.contains("ignored"));
    Ok(())
}

#[test]
fn scaffold_disabled() -> Result<()> {
    let (_dir, preload) = project()?;
    let mut config = MockConfig::default();
    config.preload_api.enabled = false;

    let scaffolder = MockScaffolder::new(&preload, "preload").with_config(&config);
    assert_eq!(ScaffoldOutcome::Disabled, scaffolder.scaffold());
    assert!(!scaffolder.mock_path().exists());
    assert!(scaffolder.resolve_id("/src/preload.ts").is_none());
    Ok(())
}

#[test]
fn scaffold_resolve_id() {
    let scaffolder = MockScaffolder::new("/project/src/preload.ts", "preload");
    assert_eq!(
        Some(Path::new("/project/src/preload.mock.ts")),
        scaffolder.resolve_id("/src/preload.ts")
    );
    assert_eq!(
        Some(Path::new("/project/src/preload.mock.ts")),
        scaffolder.resolve_id("C:\\project\\src\\preload.ts")
    );
    assert_eq!(
        Some(Path::new("/project/src/preload.mock.ts")),
        scaffolder.resolve_id("/project/src/preload")
    );
    assert_eq!(
        Some(Path::new("/project/src/preload.mock.ts")),
        scaffolder.resolve_id("/project/src/preload.ts?import")
    );
    assert!(scaffolder.resolve_id("/src/main.ts").is_none());
    assert!(scaffolder.resolve_id("/src/notpreload.ts").is_none());
    assert!(scaffolder.resolve_id("/lib/preload.ts").is_none());
}

#[test]
fn scaffold_resolve_id_index_preload() {
    let scaffolder = MockScaffolder::new("/project/preload/index.ts", "preload");
    assert_eq!(
        Some(Path::new("/project/preload/index.mock.ts")),
        scaffolder.resolve_id("/preload/index.ts")
    );
    assert!(scaffolder.resolve_id("/src/components/index.ts").is_none());
    assert!(scaffolder.resolve_id("/project/src/index.ts").is_none());
}

#[test]
fn scaffold_bootstrap_html() {
    let scaffolder = MockScaffolder::new("/project/src/preload.ts", "services");
    let html = scaffolder.bootstrap_html("/project", "/app/");
    assert!(html.starts_with("<script type=\"module\">\n"));
    assert!(html.contains("import mocked from '/app/src/preload.mock.ts';\n"));
    assert!(html.contains("  Object.assign(window, windowMocks);\n"));
    assert!(html.contains("window['services'] = mocked['services'];\n"));
    assert!(html.ends_with("</script>"));

    let scaffolder = MockScaffolder::new("/project/src/preload.ts", "");
    let html = scaffolder.bootstrap_html("/project", "");
    assert!(html.contains("import mocked from '/src/preload.mock.ts';\n"));
    assert!(!html.contains("window['"));
}
