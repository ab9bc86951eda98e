//! Manifest of the preload signatures that mocks are generated from.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::preload::{analyze_preload_file, ExportEntity, Exports, ExportsInfo};

/// Manifest format version.
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Directory for mock artifacts relative to the project root.
pub const MOCK_DIR: &str = ".utools_mock";

/// Manifest file name inside the mock directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const WINDOW: &str = "window";

/// Kind of an exported member.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Function,
    Object,
    Primitive,
}

/// Signature of a member mounted on the window.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreloadSignature {
    /// Namespace qualified name.
    pub id: String,
    pub name: String,
    pub kind: SignatureKind,
    /// Parameter names for functions.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Parameter type annotations, `any` where missing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// `window` for default export members, otherwise the global name.
    pub namespace: String,
    /// Export name when the member is bridged from a named export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_export_name: Option<String>,
    /// Whether the analyzer could not model the member.
    #[serde(default)]
    pub fallback: bool,
}

/// Metadata describing a signature set.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    /// Hex encoded SHA-256 of the signatures.
    pub signature_hash: String,
    /// No analyzer errors and no fallback signatures.
    pub is_complete: bool,
    pub warnings: Vec<String>,
}

/// Persisted manifest.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockManifest {
    pub version: String,
    pub generated_at: String,
    pub preload_name: String,
    pub signatures: Vec<PreloadSignature>,
    pub metadata: ManifestMetadata,
}

impl MockManifest {
    /// Build a manifest from export information.
    pub fn new(global_name: &str, info: &ExportsInfo) -> Result<Self> {
        let signatures = signatures(global_name, info);
        let signature_hash = signature_hash(&signatures)?;
        let is_complete = info.errors.is_empty() && signatures.iter().all(|s| !s.fallback);
        Ok(Self {
            version: MANIFEST_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            preload_name: global_name.to_string(),
            signatures,
            metadata: ManifestMetadata {
                signature_hash,
                is_complete,
                warnings: info.errors.clone(),
            },
        })
    }

    /// Read a manifest file.
    pub fn read<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("unable to read {}", file.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid manifest {}", file.display()))
    }

    /// Write the manifest, creating the parent directory.
    pub fn write<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        if let Some(dir) = file.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("unable to create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(file, content)
            .with_context(|| format!("unable to write {}", file.display()))
    }
}

/// Signatures for every member that ends up on the window.
pub fn signatures(global_name: &str, info: &ExportsInfo) -> Vec<PreloadSignature> {
    let mut out = Vec::new();
    if let Some(default_export) = &info.default_export {
        collect(&mut out, WINDOW, default_export, false);
    }
    let namespace = if global_name.is_empty() { WINDOW } else { global_name };
    collect(&mut out, namespace, &info.named_exports, true);
    out
}

fn collect(out: &mut Vec<PreloadSignature>, namespace: &str, exports: &Exports, named: bool) {
    for (name, entity) in exports.iter() {
        let mut signature = PreloadSignature {
            id: format!("{}.{}", namespace, name),
            name: name.clone(),
            kind: SignatureKind::Primitive,
            parameters: Vec::new(),
            param_types: Vec::new(),
            return_type: None,
            namespace: namespace.to_string(),
            source_export_name: if named { Some(name.clone()) } else { None },
            fallback: entity.is_unknown(),
        };
        match entity {
            ExportEntity::Function {
                params,
                param_types,
                return_type,
                ..
            } => {
                signature.kind = SignatureKind::Function;
                signature.parameters = params.clone();
                signature.param_types = param_types
                    .iter()
                    .map(|ty| ty.clone().unwrap_or_else(|| String::from("any")))
                    .collect();
                signature.return_type = return_type.clone();
            }
            ExportEntity::Object { .. } => signature.kind = SignatureKind::Object,
            ExportEntity::Constant { .. } => {}
        }
        out.push(signature);
    }
}

/// Hash of a signature set.
pub fn signature_hash(signatures: &[PreloadSignature]) -> Result<String> {
    let canonical = serde_json::to_vec(signatures)?;
    let digest = Sha256::digest(&canonical);
    Ok(hex::encode(digest))
}

/// Result of building a manifest.
#[derive(Debug)]
pub struct ManifestResult {
    pub manifest: MockManifest,
    /// Whether the signatures differ from the manifest on disk.
    pub changed: bool,
    pub path: PathBuf,
}

/// Analyze a preload source and update the manifest on disk.
pub struct MockManifestBuilder {
    project_root: PathBuf,
    output_dir: PathBuf,
    preload_file: PathBuf,
    global_name: String,
}

impl MockManifestBuilder {
    /// Create a builder writing into `<project_root>/.utools_mock`.
    pub fn new<P, Q, S>(project_root: P, preload_file: Q, global_name: S) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        S: Into<String>,
    {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            output_dir: PathBuf::from(MOCK_DIR),
            preload_file: preload_file.as_ref().to_path_buf(),
            global_name: global_name.into(),
        }
    }

    /// Use a different output directory relative to the project root.
    pub fn output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(&self.output_dir).join(MANIFEST_FILE)
    }

    /// Analyze the preload and write the manifest when the
    /// signatures changed.
    pub fn build(&self) -> Result<ManifestResult> {
        let info = analyze_preload_file(&self.preload_file).with_context(|| {
            format!("unable to analyze {}", self.preload_file.display())
        })?;
        for error in info.errors.iter() {
            log::warn!("{}: {}", self.preload_file.display(), error);
        }
        let manifest = MockManifest::new(&self.global_name, &info)?;
        let path = self.manifest_path();

        let previous = if path.is_file() {
            match MockManifest::read(&path) {
                Ok(previous) => Some(previous),
                Err(e) => {
                    log::warn!("{:#}", e);
                    None
                }
            }
        } else {
            None
        };

        if let Some(previous) = previous {
            if previous.metadata.signature_hash == manifest.metadata.signature_hash {
                log::info!("mock manifest unchanged");
                return Ok(ManifestResult {
                    manifest: previous,
                    changed: false,
                    path,
                });
            }
        }

        manifest.write(&path)?;
        log::info!("mock manifest regenerated");
        Ok(ManifestResult {
            manifest,
            changed: true,
            path,
        })
    }
}

/// Reads and caches the manifest of a project.
pub struct MockFileManager {
    project_root: PathBuf,
    mock_dir: PathBuf,
    manifest: Option<MockManifest>,
}

impl MockFileManager {
    /// Create a manager for a project.
    pub fn new<P: AsRef<Path>>(project_root: P) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            mock_dir: PathBuf::from(MOCK_DIR),
            manifest: None,
        }
    }

    /// Analyze the preload and update the manifest.
    pub fn initialize<P: AsRef<Path>>(
        &mut self,
        preload_file: P,
        global_name: &str,
    ) -> Result<&MockManifest> {
        let result = MockManifestBuilder::new(&self.project_root, preload_file, global_name)
            .output_dir(&self.mock_dir)
            .build()?;
        Ok(self.manifest.insert(result.manifest))
    }

    /// The last manifest built or the manifest on disk.
    pub fn read_manifest(&mut self) -> Result<Option<&MockManifest>> {
        if self.manifest.is_none() {
            let path = self.project_root.join(&self.mock_dir).join(MANIFEST_FILE);
            if !path.is_file() {
                return Ok(None);
            }
            self.manifest = Some(MockManifest::read(&path)?);
        }
        Ok(self.manifest.as_ref())
    }
}
