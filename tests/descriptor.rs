use anyhow::Result;
use serde_json::{json, Value};

use preload_bridge::descriptor::{
    descriptor_value, local_url, write_plugin_json, DescriptorWriter, PLUGIN_FILE_NAME,
};
use preload_bridge::options::PluginJson;

mod common;
use common::{fixture, read_to_string};

fn plugin() -> Result<PluginJson> {
    PluginJson::parse(&read_to_string(fixture("plugin/plugin.json"))?)
}

#[test]
fn descriptor_local_url() {
    let line = "  \u{1b}[32m➜\u{1b}[39m  \u{1b}[1mLocal\u{1b}[22m:   \u{1b}[36mhttp://localhost:\u{1b}[1m5173\u{1b}[22m/\u{1b}[39m";
    assert_eq!("http://localhost:5173/", local_url(line));
    assert_eq!("http://127.0.0.1:3000/", local_url("Local: http://127.0.0.1:3000/"));
    assert_eq!("http://localhost/", local_url("http://localhost/"));
}

#[test]
fn descriptor_value_keys() -> Result<()> {
    let value = descriptor_value(&plugin()?, Some("http://localhost:5173/"))?;
    assert_eq!(json!("preload.js"), value["preload"]);
    assert_eq!(json!({ "main": "http://localhost:5173/" }), value["development"]);
    assert_eq!(json!("Demo"), value["pluginName"]);
    assert_eq!(json!({ "single": true }), value["pluginSetting"]);

    let value = descriptor_value(&plugin()?, None)?;
    assert_eq!(json!({}), value["development"]);
    Ok(())
}

#[test]
fn descriptor_write() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let out_dir = dir.path().join("dist");
    let file = write_plugin_json(&plugin()?, &out_dir, Some("http://localhost:5173/"))?;
    assert_eq!(out_dir.join(PLUGIN_FILE_NAME), file);

    let written: Value = serde_json::from_str(&read_to_string(&file)?)?;
    assert_eq!(json!("preload.js"), written["preload"]);
    assert_eq!(json!("http://localhost:5173/"), written["development"]["main"]);
    Ok(())
}

#[test]
fn descriptor_writer_observes_dev_server() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let plugin = plugin()?;
    let mut writer = DescriptorWriter::new(&plugin, dir.path());

    let line = writer.observe("vite v2.9.0 building SSR bundle for development...")?;
    assert_eq!("vite v2.9.0 building uTools bundle for development...", line);
    assert!(writer.local_url().is_none());
    assert!(!dir.path().join(PLUGIN_FILE_NAME).exists());

    writer.observe("  > Local: http://localhost:3000/")?;
    assert_eq!(Some("http://localhost:3000/"), writer.local_url());
    let written: Value =
        serde_json::from_str(&read_to_string(dir.path().join(PLUGIN_FILE_NAME))?)?;
    assert_eq!(json!("http://localhost:3000/"), written["development"]["main"]);
    Ok(())
}
