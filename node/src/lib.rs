#[macro_use]
extern crate napi_derive;

use std::ffi::OsString;
use napi::{CallContext, Error, JsObject, JsString, JsUndefined, JsUnknown, Result};

#[module_exports]
fn init(mut exports: JsObject) -> Result<()> {
    exports.create_named_method("run", run)?;
    exports.create_named_method("analyzePreload", analyze_preload)?;
    exports.create_named_method("mockSource", mock_source)?;
    Ok(())
}

fn to_napi(e: anyhow::Error) -> Error {
    Error::from_reason(format!("{:#}", e))
}

#[js_function(1)]
fn run(ctx: CallContext) -> Result<JsUndefined> {
    let arg = ctx.get::<JsUnknown>(0)?;
    let argv: Vec<String> = ctx.env.from_js_value(arg)?;
    let argv: Vec<OsString> = argv.into_iter().map(OsString::from).collect();
    preload_bridge::cli::run::<OsString>(Some(argv)).map_err(to_napi)?;
    ctx.env.get_undefined()
}

#[js_function(2)]
fn analyze_preload(ctx: CallContext) -> Result<JsUnknown> {
    let source = ctx.get::<JsString>(0)?.into_utf8()?;
    let file_name = ctx.get::<JsString>(1)?.into_utf8()?;
    let info = preload_bridge::preload::analyze_preload_source(
        source.as_str()?,
        file_name.as_str()?,
    )
    .map_err(to_napi)?;
    ctx.env.to_js_value(&info)
}

#[js_function(3)]
fn mock_source(ctx: CallContext) -> Result<JsString> {
    let source = ctx.get::<JsString>(0)?.into_utf8()?;
    let file_name = ctx.get::<JsString>(1)?.into_utf8()?;
    let name = ctx.get::<JsString>(2)?.into_utf8()?;
    let code = preload_bridge::mock_source(
        source.as_str()?,
        file_name.as_str()?,
        name.as_str()?,
    )
    .map_err(to_napi)?;
    ctx.env.create_string(&code)
}
