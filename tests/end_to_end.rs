use anyhow::Result;
use serde_json::Value;

use preload_bridge::config::MockConfigManager;
use preload_bridge::descriptor::write_plugin_json;
use preload_bridge::manifest::MockManifestBuilder;
use preload_bridge::module_cache::ModuleCache;
use preload_bridge::options::{Options, OptionsResolver};
use preload_bridge::preload::bundle::PRELOAD_FILE_NAME;
use preload_bridge::preload::{Bundle, OutputChunk};
use preload_bridge::scaffold::{MockScaffolder, ScaffoldOutcome};

mod common;
use common::{fixture, read_to_string};

const COMPILED: &str = r#""use strict";
Object.defineProperties(exports, { __esModule: { value: true }, [Symbol.toStringTag]: { value: "Module" } });
const fs = require('fs');
const hello = (name) => `hello ${name}`;
const index = {
  greet: () => "hi"
};
exports.default = index;
exports.hello = hello;
"#;

#[test]
fn end_to_end_plugin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    std::fs::create_dir_all(root.join("preload"))?;
    std::fs::copy(fixture("plugin/plugin.json"), root.join("plugin.json"))?;
    std::fs::copy(
        fixture("plugin/preload/index.ts"),
        root.join("preload").join("index.ts"),
    )?;

    let resolved = OptionsResolver::new(root).resolve(Options::default())?;
    let preload = resolved.require_preload()?.to_path_buf();

    // development: scaffold the mock and mount it from the page
    let cache: ModuleCache<Value> = ModuleCache::new();
    let config = MockConfigManager::new(root, &cache).config()?;
    let scaffolder =
        MockScaffolder::new(&preload, resolved.global_name()).with_config(&config);
    let mock = match scaffolder.scaffold() {
        ScaffoldOutcome::Created(path) => path,
        outcome => panic!("unexpected outcome {:?}", outcome),
    };
    let code = read_to_string(&mock)?;
    assert!(code.contains("    window: {\n        greet() {\n"));
    assert!(code.contains("    preload: {\n        hello(name) {\n"));
    assert!(code.contains("            return '';\n"));
    assert!(code.contains("import type { ExportsTypesForMock } from './index.d';"));

    let html = scaffolder.bootstrap_html(root, "/");
    assert!(html.contains("import mocked from '/preload/index.mock.ts';"));
    assert!(html.contains("window['preload'] = mocked['preload'];"));

    let manifest = MockManifestBuilder::new(root, &preload, resolved.global_name()).build()?;
    assert!(manifest.changed);
    assert!(manifest.manifest.metadata.is_complete);
    let ids: Vec<&str> = manifest
        .manifest
        .signatures
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(vec!["window.greet", "preload.hello"], ids);

    // production: rewrite the compiled chunk and write the descriptor
    let mut bundle = Bundle::new();
    bundle.insert(
        PRELOAD_FILE_NAME.to_string(),
        OutputChunk {
            code: COMPILED.to_string(),
            exports: vec!["default".to_string(), "hello".to_string()],
        },
    );
    let out_dir = root.join(&resolved.options.out_dir);
    std::fs::create_dir_all(&out_dir)?;
    let bundler = resolved.preload_bundler();
    let asset = bundler.generate_bundle(&mut bundle)?.unwrap();
    asset.write(&out_dir)?;

    assert_eq!(
        "window.preload = Object.create(null);\nconst fs = require('fs');\nconst hello = (name) => `hello ${name}`;\nconst index = {\n  greet: () => \"hi\"\n};\nObject.assign(window, index);\nwindow.preload = { hello };\n",
        read_to_string(out_dir.join(PRELOAD_FILE_NAME))?
    );
    let declarations = read_to_string(root.join("preload").join("index.d.ts"))?;
    assert!(declarations.contains("Pick<typeof PreloadModule, 'hello'>"));

    write_plugin_json(&resolved.plugin, &out_dir, None)?;
    let descriptor: Value =
        serde_json::from_str(&read_to_string(out_dir.join("plugin.json"))?)?;
    assert_eq!("preload.js", descriptor["preload"]);
    Ok(())
}

#[test]
fn end_to_end_mock_source() -> Result<()> {
    let source = read_to_string(fixture("preload/hello.ts"))?;
    let expected = read_to_string(fixture("mock/hello.mock.ts"))?;
    assert_eq!(
        expected,
        preload_bridge::mock_source(&source, "preload.ts", "preload")?
    );
    Ok(())
}
