//! Render a browser mock module for an analyzed preload surface.
use indexmap::IndexMap;

use super::values::property_key;
use super::{ExportEntity, Exports, ExportsInfo};

const INDENT: &str = "    ";
const WINDOW: &str = "window";

/// Generate the source of a mock module from export information.
pub struct Generator<'a> {
    global_name: &'a str,
    info: &'a ExportsInfo,
    types_module: String,
    mock_file_name: String,
    overrides: IndexMap<String, String>,
}

impl<'a> Generator<'a> {
    /// Create a new generator.
    pub fn new(global_name: &'a str, info: &'a ExportsInfo) -> Self {
        Generator {
            global_name,
            info,
            types_module: String::from("./preload.d"),
            mock_file_name: String::from("preload.mock.ts"),
            overrides: Default::default(),
        }
    }

    /// Module specifier of the co-located declaration file.
    pub fn types_module<S: Into<String>>(mut self, module: S) -> Self {
        self.types_module = module.into();
        self
    }

    /// File name reported by the load log line.
    pub fn mock_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.mock_file_name = name.into();
        self
    }

    /// Source text that replaces the stub of a top level named export.
    pub fn overrides(mut self, overrides: IndexMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Render the mock module.
    pub fn generate(&self) -> String {
        let mut blocks: Vec<(&str, Vec<String>)> = Vec::new();

        let mut window = self
            .info
            .default_export
            .as_ref()
            .map(|exports| self.members(&self.window_exports(exports), 2, false))
            .unwrap_or_default();

        let named = self.members(&self.info.named_exports, 2, true);
        if self.global_name.is_empty() {
            window.extend(named);
        } else if !named.is_empty() {
            blocks.push((self.global_name, named));
        }
        if !window.is_empty() {
            blocks.insert(0, (WINDOW, window));
        }

        let mut out = String::new();
        out.push_str("// This file is generated once and is never overwritten.\n");
        out.push_str("// Customize the mock implementation as needed.\n");
        out.push_str(&format!(
            "import type {{ ExportsTypesForMock }} from '{}';\n\n",
            self.types_module
        ));
        out.push_str(&format!(
            "console.log('[Mock Preload] {} loaded in browser.');\n\n",
            self.mock_file_name
        ));
        out.push_str("// --- Exports Mock ---\n");
        out.push_str("const mocked: ExportsTypesForMock = {\n");
        for (name, members) in blocks {
            out.push_str(&format!("{}{}: {{\n", INDENT, property_key(name)));
            for member in members {
                out.push_str(&member);
            }
            out.push_str(&format!("{}}},\n", INDENT));
        }
        out.push_str("};\n\nexport default mocked;\n");
        out
    }

    /// Default export members mounted on `window`. Without a global
    /// name the named exports share the block and win on conflicts.
    fn window_exports(&self, exports: &Exports) -> Exports {
        if !self.global_name.is_empty() {
            return exports.clone();
        }
        exports
            .iter()
            .filter(|(name, _)| {
                let shadowed = self.info.named_exports.contains_key(*name);
                if shadowed {
                    log::warn!(
                        "default export member `{}` is shadowed by the named export",
                        name
                    );
                }
                !shadowed
            })
            .map(|(name, entity)| (name.clone(), entity.clone()))
            .collect()
    }

    /// Render each entity as an object member at the given depth.
    fn members(
        &self,
        exports: &Exports,
        depth: usize,
        top_level_named: bool,
    ) -> Vec<String> {
        let indent = INDENT.repeat(depth);
        let mut out = Vec::with_capacity(exports.len());
        for (name, entity) in exports.iter() {
            let key = property_key(name);

            let custom = if top_level_named {
                self.overrides.get(name)
            } else {
                None
            };
            if let Some(source) = custom {
                if is_method_source(name, source) {
                    out.push(format!("{}{},\n", indent, source.trim()));
                } else {
                    out.push(format!("{}{}: {},\n", indent, key, source.trim()));
                }
                continue;
            }

            let member = match entity {
                ExportEntity::Constant { value } => {
                    format!("{}{}: {},\n", indent, key, value)
                }
                ExportEntity::Object { props } => {
                    let mut member = format!("{}{}: {{\n", indent, key);
                    for prop in self.members(props, depth + 1, false) {
                        member.push_str(&prop);
                    }
                    member.push_str(&format!("{}}},\n", indent));
                    member
                }
                ExportEntity::Function {
                    params,
                    mock_return_value,
                    ..
                } => {
                    let params = params.join(", ");
                    let args = if params.is_empty() {
                        String::from("{}")
                    } else {
                        format!("{{ {} }}", params)
                    };
                    let body_indent = INDENT.repeat(depth + 1);
                    format!(
                        "{indent}{key}({params}) {{\n\
                         {body}console.log(\"[Mock] Function \\\"{name}\\\" called with args:\", {args});\n\
                         {body}return {value};\n\
                         {indent}}},\n",
                        indent = indent,
                        key = key,
                        params = params,
                        body = body_indent,
                        name = name.replace('\\', "\\\\").replace('"', "\\\""),
                        args = args,
                        value = mock_return_value,
                    )
                }
            };
            out.push(member);
        }
        out
    }
}

/// Determine if custom source is written as method shorthand for `name`.
fn is_method_source(name: &str, source: &str) -> bool {
    let source = source.trim_start();
    let source = source.strip_prefix("async ").unwrap_or(source).trim_start();
    source
        .strip_prefix(name)
        .map(|rest| rest.trim_start().starts_with('('))
        .unwrap_or(false)
}
