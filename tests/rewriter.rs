use anyhow::Result;

use preload_bridge::preload::rewriter::{rewrite, RewriteOptions};

mod common;
use common::{fixture, read_to_string};

fn options(name: &str) -> RewriteOptions {
    RewriteOptions {
        global_name: name.to_string(),
        export_names: vec!["hello".to_string(), "read".to_string()],
        externals: vec!["utools-api-types".to_string()],
    }
}

#[test]
fn rewrite_plain_assignments() -> Result<()> {
    let code = read_to_string(fixture("chunks/plain.js"))?;
    let result = rewrite(&code, &options("services"))?;

    assert!(result.starts_with(
        "const electron = require('electron');\nwindow.services = Object.create(null);\n"
    ));
    assert!(!result.contains("use strict"));
    assert!(result.contains("const api = void 0;"));
    assert!(result.contains("const fs = require('fs');"));
    assert!(result.contains("const ipc = electron.ipcRenderer;"));
    assert!(!result.contains("window.electron"));
    assert!(!result.contains("exports."));
    assert!(result.contains("Object.assign(window, index);"));
    assert_eq!(1, result.matches("window.services = { hello, read };").count());
    assert!(result.ends_with("window.services = { hello, read };\n"));
    Ok(())
}

#[test]
fn rewrite_define_property_exports() -> Result<()> {
    let code = read_to_string(fixture("chunks/define.js"))?;
    let result = rewrite(&code, &options("services"))?;

    assert!(result.starts_with("window.services = Object.create(null);\n"));
    assert!(!result.contains("defineProperties"));
    // electron is provided by the host and keeps its require
    assert!(result.contains("const electron = require(\"electron\");"));
    assert_eq!(1, result.matches("require(\"electron\")").count());
    assert!(result.contains("const api = void 0;"));
    assert!(result.contains("Object.defineProperty(window.services, \"hello\""));
    assert!(!result.contains("exports."));
    assert!(result.contains(
        "Object.assign(window, {\n  ping() {\n    return 'pong';\n  }\n});"
    ));
    assert_eq!(1, result.matches("window.services = { hello, read };").count());
    Ok(())
}

#[test]
fn rewrite_without_global_name() -> Result<()> {
    let code = read_to_string(fixture("chunks/define.js"))?;
    let result = rewrite(&code, &options(""))?;

    assert!(!result.contains("Object.create(null)"));
    assert!(result.contains("Object.defineProperty(window, \"hello\""));
    assert!(result.ends_with("Object.assign(window, { hello, read });\n"));
    Ok(())
}

#[test]
fn rewrite_keeps_unrelated_assignments() -> Result<()> {
    let code = "'use strict';\nconst exportsTotal = 1;\nexports.hello = hello;\nfunction hello() { return exportsTotal; }\n";
    let options = RewriteOptions {
        global_name: "preload".to_string(),
        export_names: vec!["hello".to_string()],
        externals: Vec::new(),
    };
    let result = rewrite(code, &options)?;
    assert_eq!(
        "window.preload = Object.create(null);\nconst exportsTotal = 1;\nfunction hello() { return exportsTotal; }\nwindow.preload = { hello };\n",
        result
    );
    Ok(())
}

#[test]
fn rewrite_keeps_qualified_exports_assignments() -> Result<()> {
    let code = "'use strict';\nmodule.exports.foo = 1;\nmyexports.x = 1;\nmodule.exports.default = {};\nexports.hello = hello;\nexports.extra = 2;\n";
    let options = RewriteOptions {
        global_name: "preload".to_string(),
        export_names: vec!["hello".to_string()],
        externals: Vec::new(),
    };
    let result = rewrite(code, &options)?;
    assert!(result.contains("module.exports.foo = 1;\n"));
    assert!(result.contains("myexports.x = 1;\n"));
    assert!(result.contains("module.exports.default = {};\n"));
    assert!(!result.contains("Object.assign(window"));
    assert!(!result.contains("exports.extra"));
    assert!(result.ends_with("window.preload = { hello };\n"));
    Ok(())
}

#[test]
fn rewrite_without_exports() -> Result<()> {
    let code = "console.log('side effects only');";
    let options = RewriteOptions {
        global_name: "preload".to_string(),
        ..Default::default()
    };
    let result = rewrite(code, &options)?;
    assert_eq!(
        "window.preload = Object.create(null);\nconsole.log('side effects only');",
        result
    );
    Ok(())
}

#[test]
fn rewrite_appends_after_unterminated_line() -> Result<()> {
    let code = "function a() {}\nexports.a = a;\nconsole.log(a)";
    let options = RewriteOptions {
        global_name: String::new(),
        export_names: vec!["a".to_string()],
        externals: Vec::new(),
    };
    let result = rewrite(code, &options)?;
    assert_eq!(
        "function a() {}\nconsole.log(a)\nObject.assign(window, { a });\n",
        result
    );
    Ok(())
}

#[test]
fn rewrite_is_stable_over_extra_externals() -> Result<()> {
    let code = read_to_string(fixture("chunks/plain.js"))?;
    let mut opts = options("services");
    opts.externals.push("electron".to_string());
    opts.externals.push("not-used".to_string());
    let result = rewrite(&code, &opts)?;
    assert!(result.contains("const electron = require('electron');"));
    assert_eq!(result, rewrite(&code, &opts)?);
    Ok(())
}
