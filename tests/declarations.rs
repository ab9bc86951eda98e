use anyhow::Result;

use preload_bridge::preload::DeclarationOptions;

mod common;
use common::read_to_string;

#[test]
fn declarations_with_global_name() {
    let options = DeclarationOptions::new(
        "services",
        vec!["hello".to_string(), "read".to_string()],
    );
    let result = options.render();
    assert!(result.contains("import type * as PreloadModule from './preload';\n"));
    assert!(result.contains(
        "export type PreloadNamedExportsType = Pick<typeof PreloadModule, 'hello' | 'read'>;\n"
    ));
    assert!(result.contains(
        "export interface ExportsTypesForMock {\n    window?: PreloadDefaultType;\n    services?: PreloadNamedExportsType;\n}\n"
    ));
    assert!(result.ends_with(
        "declare global {\n    interface Window {\n        services: PreloadNamedExportsType;\n    }\n}\n"
    ));
}

#[test]
fn declarations_without_global_name() {
    let options = DeclarationOptions::new("", vec!["hello".to_string()]);
    let result = options.render();
    assert!(result.contains("    window?: PreloadDefaultType & PreloadNamedExportsType;\n"));
    assert!(result.contains("    interface Window extends PreloadNamedExportsType {}\n"));
}

#[test]
fn declarations_without_exports() {
    let options = DeclarationOptions::new("preload", Vec::new());
    assert!(options
        .render()
        .contains("PreloadNamedExportsType = Pick<typeof PreloadModule, never>;"));
}

#[test]
fn declarations_write() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("preload.d.ts");
    let mut options = DeclarationOptions::new("preload", vec!["a".to_string()]);
    options.preload_module = "./src/preload".to_string();
    let written = options.write(&file)?;
    assert_eq!(file, written);
    let content = read_to_string(&file)?;
    assert!(content.contains("from './src/preload';"));
    assert_eq!(options.render(), content);
    Ok(())
}
