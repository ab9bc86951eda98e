//! Preload module pipeline.
//!
//! The analyzer extracts the exported surface of a preload source module,
//! the generator renders a browser mock for that surface and the rewriter
//! turns the compiled commonjs chunk of the real module into the script
//! that the host application loads.
use indexmap::IndexMap;
use serde::Serialize;

/// Map from an exported (or property) name to the entity it describes.
pub type Exports = IndexMap<String, ExportEntity>;

/// An exported symbol as seen by the mock generator.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum ExportEntity {
    /// Function, arrow function or object method.
    Function {
        /// Parameter names in declaration order.
        params: Vec<String>,
        /// Expression returned by the mock implementation.
        #[serde(rename = "mockReturnValue")]
        mock_return_value: String,
        /// Source text of each parameter type annotation.
        #[serde(rename = "paramTypes", skip_serializing_if = "Vec::is_empty")]
        param_types: Vec<Option<String>>,
        /// Source text of the return type annotation.
        #[serde(rename = "returnType", skip_serializing_if = "Option::is_none")]
        return_type: Option<String>,
    },
    /// Literal value serialized as an expression.
    Constant {
        /// The serialized literal.
        value: String,
    },
    /// Object literal, nested to the depth of the source literal.
    Object {
        /// Properties in declaration order.
        props: Exports,
    },
}

impl ExportEntity {
    /// Placeholder for a declaration that exists but cannot be modelled.
    pub fn unknown() -> Self {
        ExportEntity::Constant {
            value: NULL_VALUE.to_string(),
        }
    }

    /// Determine if this entity is the placeholder for an unmodelled value.
    pub fn is_unknown(&self) -> bool {
        matches!(self, ExportEntity::Constant { value } if value == NULL_VALUE)
    }
}

pub(crate) const NULL_VALUE: &str = "null";

/// Everything the analyzer learned about a preload module.
#[derive(Serialize, Default, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportsInfo {
    /// Named exports, mounted under the global namespace.
    pub named_exports: Exports,
    /// Properties of the default export, mounted directly on `window`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_export: Option<Exports>,
    /// Diagnostics for exports that could not be modelled.
    pub errors: Vec<String>,
}

pub mod analyzer;
pub mod bundle;
pub mod declarations;
pub mod edits;
pub mod generator;
pub mod rewriter;
mod values;

pub use analyzer::{analyze_preload_file, analyze_preload_source, Analyzer};
pub use bundle::{Bundle, EmittedAsset, OutputChunk, PreloadBundler};
pub use declarations::DeclarationOptions;
pub use edits::{Edit, EditError, EditList};
pub use generator::Generator;
pub use rewriter::{RewriteOptions, Rewriter};
