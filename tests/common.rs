#![allow(dead_code)]
use anyhow::Result;
use std::path::{Path, PathBuf};

use preload_bridge::preload::{analyze_preload_source, ExportEntity, ExportsInfo};

pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut content = std::fs::read_to_string(path)?;
    if cfg!(target_os = "windows") {
        content = content.replace("\r\n", "\n");
    }
    Ok(content)
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn analyze(source: &str) -> Result<ExportsInfo> {
    analyze_preload_source(source, "preload.ts")
}

pub fn function(params: &[&str], mock_return_value: &str) -> ExportEntity {
    ExportEntity::Function {
        params: params.iter().map(|p| p.to_string()).collect(),
        mock_return_value: mock_return_value.to_string(),
        param_types: Vec::new(),
        return_type: None,
    }
}

pub fn constant(value: &str) -> ExportEntity {
    ExportEntity::Constant {
        value: value.to_string(),
    }
}

/// Parameter names and mock return value of a function entity.
pub fn signature(entity: &ExportEntity) -> Option<(Vec<String>, String)> {
    match entity {
        ExportEntity::Function {
            params,
            mock_return_value,
            ..
        } => Some((params.clone(), mock_return_value.clone())),
        _ => None,
    }
}
