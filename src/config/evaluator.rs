//! Static evaluation of mock configuration modules.
//!
//! Configuration modules are never executed. Their exports are folded
//! into JSON values: literals, arrays and objects are evaluated,
//! identifiers are followed to top level bindings and imports of
//! local files are loaded through the resolver. Functions are kept
//! as their source text so they can be written into generated mocks.
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use swc_common::{FileName, Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_loader::resolve::Resolve;

use super::resolver::ConfigResolver;
use crate::helpers::{ident_declarators, is_local_specifier};
use crate::module_cache::ModuleCache;
use crate::swc_utils::{load_file, ParsedModule};

const DEFAULT: &str = "default";

/// Loads configuration modules, caching the exports of each file.
pub struct ConfigModuleLoader<'a> {
    resolver: Box<dyn Resolve>,
    cache: &'a ModuleCache<Value>,
    loading: RefCell<Vec<PathBuf>>,
}

impl<'a> ConfigModuleLoader<'a> {
    /// Create a loader using the restricted config resolver.
    pub fn new(cache: &'a ModuleCache<Value>) -> Self {
        Self {
            resolver: Box::new(ConfigResolver::new()),
            cache,
            loading: RefCell::new(Vec::new()),
        }
    }

    /// Value of a configuration module: the default export when there
    /// is one otherwise the object of named exports.
    pub fn load<P: AsRef<Path>>(&self, file: P) -> Result<Value> {
        let exports = self.exports(file)?;
        Ok(module_value(&exports))
    }

    /// Exports object of a module, the default export is stored
    /// under the `default` key.
    pub fn exports<P: AsRef<Path>>(&self, file: P) -> Result<Arc<Value>> {
        let file = file.as_ref();
        let key = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        if self.loading.borrow().contains(&key) {
            bail!("circular import of config module {}", key.display());
        }

        self.loading.borrow_mut().push(key);
        let result = self.cache.get_or_load(file, |path| self.evaluate(path));
        self.loading.borrow_mut().pop();
        result
    }

    fn evaluate(&self, file: &Path) -> Result<Value> {
        log::debug!("evaluate config module {}", file.display());
        let parsed = load_file(file)?;
        let mut evaluator = ModuleEvaluator {
            loader: self,
            parsed: &parsed,
            file: file.to_path_buf(),
            bindings: IndexMap::new(),
            resolving: Vec::new(),
        };
        evaluator.run()
    }
}

fn module_value(exports: &Value) -> Value {
    match exports.get(DEFAULT) {
        Some(value) if !value.is_null() => value.clone(),
        _ => exports.clone(),
    }
}

/// Value bound to a top level name.
#[derive(Clone)]
enum Binding {
    /// Initializer not evaluated yet.
    Expr(Box<Expr>),
    /// Evaluated value.
    Value(Value),
    /// Import from a package, calls with one argument return the argument.
    Helper,
}

struct ModuleEvaluator<'a, 'b> {
    loader: &'a ConfigModuleLoader<'b>,
    parsed: &'a ParsedModule,
    file: PathBuf,
    bindings: IndexMap<String, Binding>,
    resolving: Vec<String>,
}

impl<'a, 'b> ModuleEvaluator<'a, 'b> {
    fn run(&mut self) -> Result<Value> {
        let items = self.parsed.module.body.clone();
        for item in items.iter() {
            self.bind(item)?;
        }

        let mut exports = Map::new();
        for item in items.iter() {
            self.export(item, &mut exports)?;
        }
        Ok(Value::Object(exports))
    }

    /// Exports of another local module.
    fn import(&self, specifier: &str) -> Result<Arc<Value>> {
        let base = FileName::Real(self.file.clone());
        match self.loader.resolver.resolve(&base, specifier)? {
            FileName::Real(path) => self.loader.exports(path),
            other => bail!("unable to load {} resolved to {}", specifier, other),
        }
    }

    fn bind(&mut self, item: &ModuleItem) -> Result<()> {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                if import.type_only {
                    return Ok(());
                }
                let src = import.src.value.as_ref();
                if !is_local_specifier(src) {
                    log::debug!("treating imports of {} as helpers", src);
                    for spec in import.specifiers.iter() {
                        self.bindings
                            .insert(local_name(spec).to_string(), Binding::Helper);
                    }
                    return Ok(());
                }
                let exports = self.import(src)?;
                for spec in import.specifiers.iter() {
                    let value = match spec {
                        ImportSpecifier::Default(_) => module_value(&exports),
                        ImportSpecifier::Namespace(_) => (*exports).clone(),
                        ImportSpecifier::Named(named) => {
                            let imported = named.imported.as_ref().unwrap_or(&named.local);
                            exports
                                .get(imported.sym.as_ref())
                                .cloned()
                                .unwrap_or(Value::Null)
                        }
                    };
                    self.bindings
                        .insert(local_name(spec).to_string(), Binding::Value(value));
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                self.bind_decl(&export.decl);
            }
            ModuleItem::Stmt(Stmt::Decl(decl)) => self.bind_decl(decl),
            _ => {}
        }
        Ok(())
    }

    fn bind_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(var) => {
                for (name, declarator) in ident_declarators(var) {
                    let binding = match &declarator.init {
                        Some(init) => Binding::Expr(init.clone()),
                        None => Binding::Value(Value::Null),
                    };
                    self.bindings.insert(name.to_string(), binding);
                }
            }
            Decl::Fn(func) => {
                let value = self.source(func.function.span);
                self.bindings
                    .insert(func.ident.sym.as_ref().to_string(), Binding::Value(value));
            }
            _ => {}
        }
    }

    fn export(&mut self, item: &ModuleItem, exports: &mut Map<String, Value>) -> Result<()> {
        match item {
            ModuleItem::ModuleDecl(decl) => match decl {
                ModuleDecl::ExportDecl(export) => match &export.decl {
                    Decl::Var(var) => {
                        for (name, _) in ident_declarators(var) {
                            let value = self.lookup(name);
                            exports.insert(name.to_string(), value);
                        }
                    }
                    Decl::Fn(func) => {
                        let name = func.ident.sym.as_ref();
                        let value = self.lookup(name);
                        exports.insert(name.to_string(), value);
                    }
                    _ => {}
                },
                ModuleDecl::ExportNamed(export) => {
                    let from = match &export.src {
                        Some(src) => Some(self.import(src.value.as_ref())?),
                        None => None,
                    };
                    for spec in export.specifiers.iter() {
                        if let ExportSpecifier::Named(named) = spec {
                            let orig = named.orig.sym.as_ref();
                            let exported = named.exported.as_ref().unwrap_or(&named.orig);
                            let value = match &from {
                                Some(module) => module.get(orig).cloned().unwrap_or(Value::Null),
                                None => self.lookup(orig),
                            };
                            exports.insert(exported.sym.as_ref().to_string(), value);
                        }
                    }
                }
                ModuleDecl::ExportAll(export) => {
                    let module = self.import(export.src.value.as_ref())?;
                    if let Value::Object(map) = &*module {
                        for (key, value) in map.iter() {
                            if key != DEFAULT {
                                exports.insert(key.clone(), value.clone());
                            }
                        }
                    }
                }
                ModuleDecl::ExportDefaultExpr(export) => {
                    let value = self.eval(&export.expr);
                    exports.insert(DEFAULT.to_string(), value);
                }
                ModuleDecl::ExportDefaultDecl(export) => {
                    let value = match &export.decl {
                        DefaultDecl::Fn(func) => self.source(func.function.span),
                        DefaultDecl::Class(class) => self.source(class.class.span),
                        DefaultDecl::TsInterfaceDecl(_) => return Ok(()),
                    };
                    exports.insert(DEFAULT.to_string(), value);
                }
                _ => {}
            },
            // module.exports = { ... }; exports.foo = ...;
            ModuleItem::Stmt(Stmt::Expr(stmt)) => {
                if let Expr::Assign(assign) = &*stmt.expr {
                    if assign.op != AssignOp::Assign {
                        return Ok(());
                    }
                    let target = match assign_target(&assign.left).and_then(member_path) {
                        Some(path) => path,
                        None => return Ok(()),
                    };
                    let path = target.iter().map(String::as_str).collect::<Vec<_>>();
                    match path.as_slice() {
                        ["module", "exports"] => match self.eval(&assign.right) {
                            Value::Object(map) => *exports = map,
                            value => {
                                exports.insert(DEFAULT.to_string(), value);
                            }
                        },
                        ["module", "exports", name] | ["exports", name] => {
                            let value = self.eval(&assign.right);
                            exports.insert(name.to_string(), value);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn source(&self, span: Span) -> Value {
        self.parsed
            .snippet(span)
            .map(Value::String)
            .unwrap_or(Value::Null)
    }

    fn lookup(&mut self, name: &str) -> Value {
        let binding = match self.bindings.get(name) {
            Some(binding) => binding.clone(),
            None => {
                if name != "undefined" {
                    log::debug!("{} is not bound in {}", name, self.file.display());
                }
                return Value::Null;
            }
        };
        match binding {
            Binding::Value(value) => value,
            Binding::Helper => Value::Null,
            Binding::Expr(expr) => {
                if self.resolving.iter().any(|n| n == name) {
                    log::debug!("circular initializer for {}", name);
                    return Value::Null;
                }
                self.resolving.push(name.to_string());
                let value = self.eval(&expr);
                self.resolving.pop();
                self.bindings
                    .insert(name.to_string(), Binding::Value(value.clone()));
                value
            }
        }
    }

    fn eval(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Lit(lit) => match lit {
                Lit::Str(s) => Value::String(s.value.as_ref().to_string()),
                Lit::Num(num) => number(num.value),
                Lit::Bool(flag) => Value::Bool(flag.value),
                _ => Value::Null,
            },
            Expr::Tpl(tpl) => {
                let mut out = String::new();
                for (index, quasi) in tpl.quasis.iter().enumerate() {
                    let text = quasi.cooked.as_ref().unwrap_or(&quasi.raw);
                    out.push_str(text.value.as_ref());
                    if let Some(expr) = tpl.exprs.get(index) {
                        match self.eval(expr) {
                            Value::String(s) => out.push_str(&s),
                            value => out.push_str(&value.to_string()),
                        }
                    }
                }
                Value::String(out)
            }
            Expr::Array(arr) => {
                let mut items = Vec::with_capacity(arr.elems.len());
                for elem in arr.elems.iter() {
                    match elem {
                        Some(ExprOrSpread { spread: Some(_), expr }) => {
                            if let Value::Array(spread) = self.eval(expr) {
                                items.extend(spread);
                            }
                        }
                        Some(ExprOrSpread { spread: None, expr }) => {
                            items.push(self.eval(expr));
                        }
                        None => items.push(Value::Null),
                    }
                }
                Value::Array(items)
            }
            Expr::Object(obj) => Value::Object(self.object(obj)),
            Expr::Arrow(_) | Expr::Fn(_) | Expr::Class(_) => self.source(expr.span()),
            Expr::Ident(ident) => self.lookup(ident.sym.as_ref()),
            Expr::Paren(paren) => self.eval(&paren.expr),
            Expr::TsAs(cast) => self.eval(&cast.expr),
            Expr::TsConstAssertion(cast) => self.eval(&cast.expr),
            Expr::TsTypeAssertion(cast) => self.eval(&cast.expr),
            Expr::TsNonNull(expr) => self.eval(&expr.expr),
            Expr::Unary(unary) => match (unary.op, self.eval(&unary.arg)) {
                (UnaryOp::Minus, Value::Number(n)) => {
                    n.as_f64().map(|n| number(-n)).unwrap_or(Value::Null)
                }
                (UnaryOp::Bang, value) => Value::Bool(!truthy(&value)),
                _ => Value::Null,
            },
            Expr::Member(member) => {
                let obj = match &member.obj {
                    ExprOrSuper::Expr(obj) => self.eval(obj),
                    ExprOrSuper::Super(_) => return Value::Null,
                };
                let key = match (&*member.prop, member.computed) {
                    (Expr::Ident(ident), false) => ident.sym.as_ref().to_string(),
                    (prop, true) => match self.eval(prop) {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        _ => return Value::Null,
                    },
                    _ => return Value::Null,
                };
                match obj {
                    Value::Object(map) => map.get(&key).cloned().unwrap_or(Value::Null),
                    Value::Array(items) => key
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| items.get(index).cloned())
                        .unwrap_or(Value::Null),
                    _ => Value::Null,
                }
            }
            // defineMockConfig({ ... })
            Expr::Call(call) => {
                let helper = match &call.callee {
                    ExprOrSuper::Expr(callee) => match &**callee {
                        Expr::Ident(ident) => matches!(
                            self.bindings.get(ident.sym.as_ref()),
                            Some(Binding::Helper)
                        ),
                        _ => false,
                    },
                    _ => false,
                };
                match call.args.as_slice() {
                    [arg] if helper && arg.spread.is_none() => self.eval(&arg.expr),
                    _ => {
                        log::debug!("call expressions are not evaluated in config modules");
                        Value::Null
                    }
                }
            }
            _ => {
                log::debug!("unsupported expression in {}", self.file.display());
                Value::Null
            }
        }
    }

    fn object(&mut self, obj: &ObjectLit) -> Map<String, Value> {
        let mut map = Map::new();
        for prop in obj.props.iter() {
            match prop {
                PropOrSpread::Spread(spread) => {
                    if let Value::Object(other) = self.eval(&spread.expr) {
                        map.extend(other);
                    }
                }
                PropOrSpread::Prop(prop) => match &**prop {
                    Prop::KeyValue(entry) => {
                        if let Some(key) = key_string(&entry.key) {
                            let value = self.eval(&entry.value);
                            map.insert(key, value);
                        }
                    }
                    Prop::Shorthand(ident) => {
                        let name = ident.sym.as_ref();
                        let value = self.lookup(name);
                        map.insert(name.to_string(), value);
                    }
                    Prop::Method(method) => {
                        if let Some(key) = key_string(&method.key) {
                            let span = method.key.span().to(method.function.span);
                            map.insert(key, self.source(span));
                        }
                    }
                    _ => {}
                },
            }
        }
        map
    }
}

fn local_name(spec: &ImportSpecifier) -> &str {
    match spec {
        ImportSpecifier::Default(spec) => spec.local.sym.as_ref(),
        ImportSpecifier::Namespace(spec) => spec.local.sym.as_ref(),
        ImportSpecifier::Named(spec) => spec.local.sym.as_ref(),
    }
}

fn key_string(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.as_ref().to_string()),
        PropName::Str(s) => Some(s.value.as_ref().to_string()),
        PropName::Num(num) => Some(num.value.to_string()),
        _ => None,
    }
}

fn assign_target(left: &PatOrExpr) -> Option<&Expr> {
    match left {
        PatOrExpr::Expr(expr) => Some(expr),
        PatOrExpr::Pat(pat) => match &**pat {
            Pat::Expr(expr) => Some(expr),
            _ => None,
        },
    }
}

/// Names of a static member chain such as `module.exports.foo`.
fn member_path(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Ident(ident) => Some(vec![ident.sym.as_ref().to_string()]),
        Expr::Member(member) => {
            let mut path = match &member.obj {
                ExprOrSuper::Expr(obj) => member_path(obj)?,
                ExprOrSuper::Super(_) => return None,
            };
            match (&*member.prop, member.computed) {
                (Expr::Ident(ident), false) => path.push(ident.sym.as_ref().to_string()),
                (Expr::Lit(Lit::Str(s)), true) => path.push(s.value.as_ref().to_string()),
                _ => return None,
            }
            Some(path)
        }
        _ => None,
    }
}

fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
