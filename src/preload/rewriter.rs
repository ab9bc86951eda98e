//! Rewrite the compiled commonjs preload chunk so that its exports are
//! attached to the global object.
use anyhow::Result;
use regex::Regex;

use super::edits::{Edit, EditList};

/// Module provided by the host runtime, never neutralized.
pub const BRIDGE_MODULE: &str = "electron";

/// Options for a rewrite.
#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Global namespace name, empty to mount on `window` directly.
    pub global_name: String,
    /// Named exports of the chunk, `default` excluded.
    pub export_names: Vec<String>,
    /// Externalized module identifiers.
    pub externals: Vec<String>,
}

impl RewriteOptions {
    /// Expression for the object exports are attached to.
    pub fn target(&self) -> String {
        if self.global_name.is_empty() {
            String::from("window")
        } else {
            format!("window.{}", self.global_name)
        }
    }
}

/// Rewrites a compiled chunk.
pub struct Rewriter<'a> {
    code: &'a str,
    options: &'a RewriteOptions,
    edits: EditList,
}

impl<'a> Rewriter<'a> {
    /// Create a rewriter for compiled code.
    pub fn new(code: &'a str, options: &'a RewriteOptions) -> Self {
        Rewriter {
            code,
            options,
            edits: EditList::new(),
        }
    }

    /// Compute every edit and apply them to the code.
    pub fn rewrite(mut self) -> Result<String> {
        self.prologue()?;
        self.electron()?;
        self.externals()?;
        self.named_exports()?;
        self.interop()?;
        self.default_export()?;
        self.aggregate_exports()?;
        self.append_exports();
        Ok(self.edits.apply(self.code)?)
    }

    /// Replace the strict mode prologue with the namespace initialization.
    fn prologue(&mut self) -> Result<()> {
        let mut lines = Vec::new();
        if self.needs_electron_binding()? {
            lines.push(format!(
                "const {0} = require('{0}');\n",
                BRIDGE_MODULE
            ));
        }
        if !self.options.global_name.is_empty() {
            lines.push(format!(
                "window.{} = Object.create(null);\n",
                self.options.global_name
            ));
        }
        let text = lines.concat();

        let strict = Regex::new(
            r#"\A\s*(?:'use strict'|"use strict");?[ \t]*\r?\n?"#,
        )?;
        if let Some(m) = strict.find(self.code) {
            self.edits.push(Edit::new(m.start(), m.end(), text))?;
        } else if !text.is_empty() {
            self.edits.push(Edit::insert(0, text))?;
        }
        Ok(())
    }

    fn needs_electron_binding(&self) -> Result<bool> {
        let global = Regex::new(r"\bwindow\.electron\b")?;
        let required = Regex::new(&format!(
            r#"require\(\s*['"]{}['"]\s*\)"#,
            regex::escape(BRIDGE_MODULE)
        ))?;
        Ok(global.is_match(self.code) && !required.is_match(self.code))
    }

    /// Replace the global electron alias with a direct binding.
    fn electron(&mut self) -> Result<()> {
        let global = Regex::new(r"\bwindow\.electron\b")?;
        for m in global.find_iter(self.code) {
            self.edits
                .try_claim(Edit::new(m.start(), m.end(), BRIDGE_MODULE));
        }
        Ok(())
    }

    /// Neutralize `require()` calls of externalized modules.
    fn externals(&mut self) -> Result<()> {
        for id in self.options.externals.iter() {
            if id == BRIDGE_MODULE {
                continue;
            }
            let id = regex::escape(id);
            let call = Regex::new(&format!(
                r#"require\(\s*(?:'{0}'|"{0}")\s*\)"#,
                id
            ))?;
            for m in call.find_iter(self.code) {
                self.edits.try_claim(Edit::new(m.start(), m.end(), "void 0"));
            }
        }
        Ok(())
    }

    /// Remove `exports.x = x;` and redirect `defineProperty` exports.
    fn named_exports(&mut self) -> Result<()> {
        let target = self.options.target();
        for name in self.options.export_names.iter() {
            let name = regex::escape(name);
            let assign = Regex::new(&format!(
                r"(?m)^[ \t]*exports\.{0}\s*=\s*{0}\s*;?[ \t]*\r?\n?",
                name
            ))?;
            for m in assign.find_iter(self.code) {
                self.edits.try_claim(Edit::remove(m.start(), m.end()));
            }

            let define = Regex::new(&format!(
                r#"defineProperty\(\s*(exports)\s*,\s*['"]{}['"]"#,
                name
            ))?;
            for caps in define.captures_iter(self.code) {
                if let Some(m) = caps.get(1) {
                    self.edits.try_claim(Edit::new(
                        m.start(),
                        m.end(),
                        target.clone(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Strip interop markers and leftover export assignments.
    fn interop(&mut self) -> Result<()> {
        // Handles one level of nested parentheses.
        let properties = Regex::new(
            r"Object\.defineProperties\s*\((?:[^()]|\([^()]*\))*\)\s*;?[ \t]*\r?\n?",
        )?;
        for m in properties.find_iter(self.code) {
            self.edits.try_claim(Edit::remove(m.start(), m.end()));
        }

        let leftover = Regex::new(r"exports\.(\w+)\s*=\s*[^;]*;")?;
        for caps in leftover.captures_iter(self.code) {
            if caps.get(1).map(|m| m.as_str()) == Some("default") {
                continue;
            }
            if let Some(m) = caps.get(0) {
                // `module.exports.x` and `myexports.x` are not bare exports
                if is_member_or_ident_tail(self.code, m.start()) {
                    continue;
                }
                self.edits.try_claim(Edit::remove(m.start(), m.end()));
            }
        }
        Ok(())
    }

    /// `exports.default = expr;` becomes `Object.assign(window, expr);`.
    fn default_export(&mut self) -> Result<()> {
        let assign = Regex::new(r"exports\.default\s*=\s*")?;
        let matches = assign
            .find_iter(self.code)
            .filter(|m| !is_member_or_ident_tail(self.code, m.start()))
            .map(|m| (m.start(), m.end()))
            .collect::<Vec<_>>();
        for (start, expr_start) in matches {
            let (expr_end, stmt_end) = scan_expression(self.code, expr_start);
            let expr = self.code[expr_start..expr_end].trim();
            if expr.is_empty() {
                continue;
            }
            self.edits.try_claim(Edit::new(
                start,
                stmt_end,
                format!("Object.assign(window, {});", expr),
            ));
        }
        Ok(())
    }

    /// Remove `export { ... };` statements.
    fn aggregate_exports(&mut self) -> Result<()> {
        let aggregate = Regex::new(r"(?m)^export\s*\{[^}]+\};?")?;
        for m in aggregate.find_iter(self.code) {
            self.edits.try_claim(Edit::remove(m.start(), m.end()));
        }
        Ok(())
    }

    /// Assign every named export onto the target.
    fn append_exports(&mut self) {
        if self.options.export_names.is_empty() {
            return;
        }
        let names = self.options.export_names.join(", ");
        let assignment = if self.options.global_name.is_empty() {
            format!("Object.assign(window, {{ {} }});\n", names)
        } else {
            format!("window.{} = {{ {} }};\n", self.options.global_name, names)
        };
        let text = if self.code.is_empty() || self.code.ends_with('\n') {
            assignment
        } else {
            format!("\n{}", assignment)
        };
        self.edits.try_claim(Edit::insert(self.code.len(), text));
    }
}

/// Find the end of the expression starting at `start`.
///
/// Returns the end of the expression and the end of the statement,
/// which includes the terminating semicolon when there is one.
fn scan_expression(code: &str, start: usize) -> (usize, usize) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in code[start..].char_indices() {
        let pos = start + offset;
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return (pos, pos);
                }
                depth -= 1;
            }
            ';' if depth == 0 => return (pos, pos + 1),
            '\n' if depth == 0 && !code[start..pos].trim().is_empty() => {
                return (pos, pos);
            }
            _ => {}
        }
    }
    (code.len(), code.len())
}

/// Rewrite compiled code with the given options.
pub fn rewrite(code: &str, options: &RewriteOptions) -> Result<String> {
    Rewriter::new(code, options).rewrite()
}

/// Whether the byte before `pos` continues an identifier or a member
/// access.
fn is_member_or_ident_tail(code: &str, pos: usize) -> bool {
    code[..pos]
        .chars()
        .next_back()
        .map(|c| c == '.' || c == '_' || c == '$' || c.is_alphanumeric())
        .unwrap_or(false)
}
