//! Analyze the exported surface of a preload module.
use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;

use swc_common::Spanned;
use swc_ecma_ast::*;
use swc_ecma_visit::{Node, Visit, VisitWith};

use super::values::{literal_value, mock_return_value, unwrap_expr};
use super::{ExportEntity, Exports, ExportsInfo};
use crate::helpers::ident_declarators;
use crate::swc_utils::{load_file, parse_source, ParsedModule};

const ANONYMOUS_DEFAULT: &str = "anonymous default export unsupported";

/// Record for a module export.
#[derive(Debug)]
enum ExportRecord {
    /// `export const foo = ...;`
    VarDecl { var: VarDecl },
    /// `export function foo() {}`
    FnDecl { func: FnDecl },
    /// `export { foo, bar as baz };`
    Named { specifiers: Vec<ExportSpecifier> },
    /// `export default ...;`
    DefaultExpr { expr: Box<Expr> },
    /// `export default function foo() {}`
    DefaultFn { func: FnExpr },
    /// `export default class {}` and friends.
    DefaultOther,
}

/// A top level declaration that an identifier may refer to.
#[derive(Debug)]
enum Declaration {
    Fn(Function),
    Var(Option<Box<Expr>>),
}

/// Collects exports and top level declarations of a module.
#[derive(Default, Debug)]
pub struct Analyzer {
    exports: Vec<ExportRecord>,
    declarations: IndexMap<String, Declaration>,
}

impl Analyzer {
    /// Create a new export analyzer.
    pub fn new() -> Self {
        Self {
            exports: Default::default(),
            declarations: Default::default(),
        }
    }

    /// Analyze a parsed module.
    pub fn analyze(mut self, parsed: &ParsedModule) -> ExportsInfo {
        parsed.module.visit_children_with(&mut self);

        let mut resolver = EntityResolver {
            declarations: &self.declarations,
            parsed,
            resolving: Vec::new(),
        };

        let mut info: ExportsInfo = Default::default();
        for record in self.exports.iter() {
            match record {
                ExportRecord::VarDecl { var } => {
                    for (name, decl) in ident_declarators(var) {
                        if let Some(init) = &decl.init {
                            let entity = resolver.declarator(name, init);
                            info.named_exports.insert(name.to_string(), entity);
                        }
                    }
                }
                ExportRecord::FnDecl { func } => {
                    info.named_exports.insert(
                        func.ident.sym.as_ref().to_string(),
                        resolver.function(&func.function),
                    );
                }
                ExportRecord::Named { specifiers } => {
                    for spec in specifiers {
                        if let ExportSpecifier::Named(export) = spec {
                            let local = export.orig.sym.as_ref();
                            let exported = export
                                .exported
                                .as_ref()
                                .unwrap_or(&export.orig)
                                .sym
                                .as_ref();
                            info.named_exports.insert(
                                exported.to_string(),
                                resolver.resolve(local),
                            );
                        }
                    }
                }
                ExportRecord::DefaultExpr { expr } => {
                    match resolver.default_expr(expr) {
                        Some(props) => info.default_export = Some(props),
                        None => info.errors.push(ANONYMOUS_DEFAULT.to_string()),
                    }
                }
                ExportRecord::DefaultFn { func } => {
                    if let Some(ident) = &func.ident {
                        let mut props = Exports::new();
                        props.insert(
                            ident.sym.as_ref().to_string(),
                            resolver.function(&func.function),
                        );
                        info.default_export = Some(props);
                    } else {
                        info.errors.push(ANONYMOUS_DEFAULT.to_string());
                    }
                }
                ExportRecord::DefaultOther => {
                    info.errors.push(ANONYMOUS_DEFAULT.to_string());
                }
            }
        }

        info
    }

    fn declare(&mut self, decl: &Decl) {
        match decl {
            Decl::Fn(func) => {
                self.declarations
                    .entry(func.ident.sym.as_ref().to_string())
                    .or_insert_with(|| Declaration::Fn(func.function.clone()));
            }
            Decl::Var(var) => {
                for (name, decl) in ident_declarators(var) {
                    self.declarations
                        .entry(name.to_string())
                        .or_insert_with(|| Declaration::Var(decl.init.clone()));
                }
            }
            _ => {}
        }
    }
}

impl Visit for Analyzer {
    fn visit_module_item(&mut self, n: &ModuleItem, _: &dyn Node) {
        match n {
            ModuleItem::Stmt(Stmt::Decl(decl)) => self.declare(decl),
            ModuleItem::ModuleDecl(decl) => match decl {
                ModuleDecl::ExportDecl(export) => {
                    self.declare(&export.decl);
                    match &export.decl {
                        // export const foo = null;
                        Decl::Var(var) => {
                            self.exports
                                .push(ExportRecord::VarDecl { var: var.clone() });
                        }
                        // export function foo() {}
                        Decl::Fn(func) => {
                            self.exports
                                .push(ExportRecord::FnDecl { func: func.clone() });
                        }
                        _ => {}
                    }
                }
                ModuleDecl::ExportNamed(export) => {
                    // export { grey as gray } from './colors';
                    if let Some(ref src) = export.src {
                        log::debug!(
                            "skipping re-export from {}",
                            src.value.as_ref()
                        );
                    // export { aleph as alpha };
                    } else {
                        self.exports.push(ExportRecord::Named {
                            specifiers: export.specifiers.clone(),
                        });
                    }
                }
                ModuleDecl::ExportDefaultExpr(export) => {
                    self.exports.push(ExportRecord::DefaultExpr {
                        expr: export.expr.clone(),
                    });
                }
                ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                    DefaultDecl::Fn(func) => {
                        self.exports
                            .push(ExportRecord::DefaultFn { func: func.clone() });
                    }
                    DefaultDecl::Class(_) => {
                        self.exports.push(ExportRecord::DefaultOther);
                    }
                    DefaultDecl::TsInterfaceDecl(_) => {}
                },
                _ => {}
            },
            _ => {}
        }
    }
}

/// Turns declarations into export entities, following identifiers
/// to the declarations they name.
struct EntityResolver<'a> {
    declarations: &'a IndexMap<String, Declaration>,
    parsed: &'a ParsedModule,
    /// Names currently being resolved, guards `a = b; b = a` chains.
    resolving: Vec<String>,
}

impl<'a> EntityResolver<'a> {
    /// Entity for a name declared at the top level of the module.
    fn resolve(&mut self, name: &str) -> ExportEntity {
        let declarations = self.declarations;
        match declarations.get(name) {
            Some(Declaration::Fn(func)) => self.function(func),
            Some(Declaration::Var(Some(init))) => self.declarator(name, init),
            Some(Declaration::Var(None)) => ExportEntity::unknown(),
            None => {
                log::debug!("no top level declaration for {}", name);
                ExportEntity::unknown()
            }
        }
    }

    /// Entity for a variable declarator.
    fn declarator(&mut self, name: &str, init: &Expr) -> ExportEntity {
        if self.resolving.iter().any(|n| n == name) {
            log::debug!("circular initializer for {}", name);
            return ExportEntity::unknown();
        }
        self.resolving.push(name.to_string());
        let entity = match unwrap_expr(init) {
            Expr::Arrow(arrow) => self.arrow(arrow),
            Expr::Fn(func) => self.function(&func.function),
            Expr::Object(obj) => ExportEntity::Object {
                props: self.object_literal(obj),
            },
            Expr::Ident(ident) => self.resolve(ident.sym.as_ref()),
            expr => literal_value(expr)
                .map(|value| ExportEntity::Constant { value })
                .unwrap_or_else(ExportEntity::unknown),
        };
        self.resolving.pop();
        entity
    }

    /// Properties for the expression of `export default`.
    fn default_expr(&mut self, expr: &Expr) -> Option<Exports> {
        match unwrap_expr(expr) {
            Expr::Object(obj) => Some(self.object_literal(obj)),
            Expr::Ident(ident) => {
                let name = ident.sym.as_ref();
                match self.resolve(name) {
                    ExportEntity::Object { props } => Some(props),
                    entity => {
                        let mut props = Exports::new();
                        props.insert(name.to_string(), entity);
                        Some(props)
                    }
                }
            }
            _ => None,
        }
    }

    fn object_literal(&mut self, obj: &ObjectLit) -> Exports {
        let mut props = Exports::new();
        for prop in obj.props.iter() {
            let prop = match prop {
                PropOrSpread::Prop(prop) => prop,
                PropOrSpread::Spread(_) => continue,
            };
            match &**prop {
                // method() {}
                Prop::Method(method) => {
                    if let Some(key) = key_name(&method.key) {
                        props.insert(key, self.function(&method.function));
                    }
                }
                // key: value
                Prop::KeyValue(entry) => {
                    let key = match key_name(&entry.key) {
                        Some(key) => key,
                        None => continue,
                    };
                    let entity = match unwrap_expr(&*entry.value) {
                        Expr::Arrow(arrow) => Some(self.arrow(arrow)),
                        Expr::Fn(func) => Some(self.function(&func.function)),
                        Expr::Object(obj) => Some(ExportEntity::Object {
                            props: self.object_literal(obj),
                        }),
                        Expr::Ident(ident) => {
                            Some(self.resolve(ident.sym.as_ref()))
                        }
                        expr => literal_value(expr)
                            .map(|value| ExportEntity::Constant { value }),
                    };
                    if let Some(entity) = entity {
                        props.insert(key, entity);
                    }
                }
                // { foo }
                Prop::Shorthand(ident) => {
                    let name = ident.sym.as_ref();
                    props.insert(name.to_string(), self.resolve(name));
                }
                _ => {}
            }
        }
        props
    }

    fn function(&mut self, func: &Function) -> ExportEntity {
        let params = func.params.iter().map(|p| &p.pat).collect::<Vec<_>>();
        self.function_info(&params, func.return_type.as_ref())
    }

    fn arrow(&mut self, arrow: &ArrowExpr) -> ExportEntity {
        let params = arrow.params.iter().collect::<Vec<_>>();
        self.function_info(&params, arrow.return_type.as_ref())
    }

    fn function_info(
        &self,
        params: &[&Pat],
        return_type: Option<&TsTypeAnn>,
    ) -> ExportEntity {
        let param_types = params
            .iter()
            .map(|pat| {
                param_type(pat)
                    .and_then(|ann| self.parsed.snippet(ann.type_ann.span()))
            })
            .collect::<Vec<_>>();
        ExportEntity::Function {
            params: params
                .iter()
                .enumerate()
                .map(|(index, pat)| param_name(pat, index))
                .collect(),
            mock_return_value: mock_return_value(return_type).to_string(),
            param_types: if param_types.iter().all(Option::is_none) {
                Vec::new()
            } else {
                param_types
            },
            return_type: return_type
                .and_then(|ann| self.parsed.snippet(ann.type_ann.span())),
        }
    }
}

fn key_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.as_ref().to_string()),
        PropName::Str(s) => Some(s.value.as_ref().to_string()),
        _ => None,
    }
}

/// Name for a parameter; destructured parameters get a positional name.
fn param_name(pat: &Pat, index: usize) -> String {
    match pat {
        Pat::Ident(binding) => binding.id.sym.as_ref().to_string(),
        Pat::Rest(rest) => format!("...{}", param_name(&*rest.arg, index)),
        Pat::Assign(assign) => param_name(&*assign.left, index),
        _ => format!("arg{}", index),
    }
}

fn param_type(pat: &Pat) -> Option<&TsTypeAnn> {
    match pat {
        Pat::Ident(binding) => binding.type_ann.as_ref(),
        Pat::Rest(rest) => rest.type_ann.as_ref(),
        Pat::Assign(assign) => param_type(&*assign.left),
        Pat::Object(obj) => obj.type_ann.as_ref(),
        Pat::Array(arr) => arr.type_ann.as_ref(),
        _ => None,
    }
}

/// Analyze preload source code.
pub fn analyze_preload_source(
    source: &str,
    file_name: &str,
) -> Result<ExportsInfo> {
    let parsed = parse_source(source, file_name)?;
    Ok(Analyzer::new().analyze(&parsed))
}

/// Load and analyze a preload file.
pub fn analyze_preload_file<P: AsRef<Path>>(file: P) -> Result<ExportsInfo> {
    let parsed = load_file(file.as_ref())?;
    Ok(Analyzer::new().analyze(&parsed))
}
