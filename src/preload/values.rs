//! Serialize literal expressions and map return types to mock values.
use swc_ecma_ast::*;

use super::NULL_VALUE;

/// Mock return value for a declared return type.
///
/// This is a fixed heuristic, it never tries to build a value that
/// satisfies an arbitrary type.
pub(crate) fn mock_return_value(type_ann: Option<&TsTypeAnn>) -> &'static str {
    let type_ann = match type_ann {
        Some(type_ann) => type_ann,
        None => return "undefined",
    };
    match &*type_ann.type_ann {
        TsType::TsKeywordType(keyword) => match keyword.kind {
            TsKeywordTypeKind::TsStringKeyword => "''",
            TsKeywordTypeKind::TsNumberKeyword => "0",
            TsKeywordTypeKind::TsBooleanKeyword => "false",
            TsKeywordTypeKind::TsVoidKeyword
            | TsKeywordTypeKind::TsUndefinedKeyword => "undefined",
            TsKeywordTypeKind::TsNullKeyword => "null",
            _ => "{}",
        },
        TsType::TsTypeRef(type_ref) if is_promise(&type_ref.type_name) => {
            "Promise.resolve()"
        }
        _ => "{}",
    }
}

fn is_promise(name: &TsEntityName) -> bool {
    match name {
        TsEntityName::Ident(ident) => ident.sym.as_ref() == "Promise",
        _ => false,
    }
}

/// Look through parentheses and type assertions.
pub(crate) fn unwrap_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_expr(&*paren.expr),
        Expr::TsAs(cast) => unwrap_expr(&*cast.expr),
        Expr::TsConstAssertion(cast) => unwrap_expr(&*cast.expr),
        _ => expr,
    }
}

/// Serialize a literal expression.
///
/// Returns `None` when the expression is not a literal.
pub(crate) fn literal_value(expr: &Expr) -> Option<String> {
    match unwrap_expr(expr) {
        Expr::Lit(lit) => match lit {
            Lit::Str(s) => Some(quote(s.value.as_ref())),
            Lit::Num(num) => Some(number(num.value)),
            Lit::Bool(flag) => Some(flag.value.to_string()),
            Lit::Null(_) => Some(String::from("null")),
            _ => None,
        },
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            let text = tpl
                .quasis
                .first()
                .map(|quasi| {
                    quasi
                        .cooked
                        .as_ref()
                        .unwrap_or(&quasi.raw)
                        .value
                        .as_ref()
                        .to_string()
                })
                .unwrap_or_default();
            Some(quote(&text))
        }
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => {
            match unwrap_expr(&*unary.arg) {
                Expr::Lit(Lit::Num(num)) => Some(number(-num.value)),
                _ => None,
            }
        }
        Expr::Array(arr) => {
            let elems = arr
                .elems
                .iter()
                .map(|elem| match elem {
                    Some(ExprOrSpread { spread: None, expr }) => nested_value(expr),
                    Some(ExprOrSpread { spread: Some(_), .. }) => {
                        String::from(NULL_VALUE)
                    }
                    // hole
                    None => String::new(),
                })
                .collect::<Vec<_>>();
            Some(format!("[{}]", elems.join(", ")))
        }
        Expr::Object(obj) => {
            let props = obj
                .props
                .iter()
                .filter_map(|prop| match prop {
                    PropOrSpread::Prop(prop) => match &**prop {
                        Prop::KeyValue(entry) => {
                            let key = prop_name(&entry.key)?;
                            Some(format!("{}: {}", key, nested_value(&*entry.value)))
                        }
                        Prop::Shorthand(ident) => Some(format!(
                            "{}: {}",
                            property_key(ident.sym.as_ref()),
                            NULL_VALUE
                        )),
                        Prop::Method(method) => {
                            let key = prop_name(&method.key)?;
                            Some(format!("{}: {}", key, NULL_VALUE))
                        }
                        _ => None,
                    },
                    PropOrSpread::Spread(_) => None,
                })
                .collect::<Vec<_>>();
            Some(format!("{{{}}}", props.join(", ")))
        }
        _ => None,
    }
}

/// Serialize a value nested in an array or object literal, values that
/// are not literals become the `null` placeholder.
fn nested_value(expr: &Expr) -> String {
    literal_value(expr).unwrap_or_else(|| String::from(NULL_VALUE))
}

/// Render a property name as it would appear in an object literal.
pub(crate) fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.as_ref().to_string()),
        PropName::Str(s) => Some(quote(s.value.as_ref())),
        PropName::Num(num) => Some(number(num.value)),
        _ => None,
    }
}

/// Render a number the way a javascript literal would.
pub(crate) fn number(value: f64) -> String {
    format!("{}", value)
}

/// Single quote a string, escaping as needed.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Determine if a name can be written without quotes.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

/// Quote a property name unless it is a valid identifier.
pub(crate) fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}
