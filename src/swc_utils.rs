//! Helpers to get a handler, parser or a parsed module.
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use swc_common::{
    errors::{emitter::ColorConfig, Handler},
    sync::Lrc,
    FileName, SourceFile, SourceMap, Span,
};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

/// A module parsed together with the source map that owns its spans.
pub struct ParsedModule {
    /// Source map the module was loaded into.
    pub source_map: Lrc<SourceMap>,
    /// The source file for the module.
    pub file: Lrc<SourceFile>,
    /// The module AST node.
    pub module: Module,
}

impl ParsedModule {
    /// Source text covered by a span of this module.
    pub fn snippet(&self, span: Span) -> Option<String> {
        self.source_map.span_to_snippet(span).ok()
    }
}

pub(crate) fn get_handler() -> (Lrc<SourceMap>, Handler) {
    let sm: Lrc<SourceMap> = Default::default();
    let handler = Handler::with_tty_emitter(
        ColorConfig::Auto,
        true,
        false,
        Some(sm.clone()),
    );
    (sm, handler)
}

pub(crate) fn get_parser<'a>(
    fm: &'a SourceFile,
) -> Parser<Lexer<'a, StringInput<'a>>> {
    let lexer = Lexer::new(
        // Preload and config modules are typescript, plain
        // javascript parses with the same syntax
        Syntax::Typescript(Default::default()),
        Default::default(),
        StringInput::from(fm),
        None,
    );
    Parser::new_from(lexer)
}

fn parse(
    sm: Lrc<SourceMap>,
    handler: Handler,
    fm: Lrc<SourceFile>,
) -> Result<ParsedModule> {
    let module = {
        let mut parser = get_parser(&*fm);
        for e in parser.take_errors() {
            e.into_diagnostic(&handler).emit();
        }
        parser.parse_module().map_err(|e| {
            e.into_diagnostic(&handler).emit();
            anyhow!("failed to parse module {}", fm.name)
        })?
    };

    Ok(ParsedModule {
        source_map: sm,
        file: fm,
        module,
    })
}

/// Parse a module from a file.
pub fn load_file<P: AsRef<Path>>(file: P) -> Result<ParsedModule> {
    let (sm, handler) = get_handler();
    let fm = sm
        .load_file(file.as_ref())
        .with_context(|| format!("unable to read {}", file.as_ref().display()))?;
    parse(sm, handler, fm)
}

/// Parse a module from source text using a custom file name.
pub fn parse_source(source: &str, file_name: &str) -> Result<ParsedModule> {
    let (sm, handler) = get_handler();
    let fm = sm.new_source_file(
        FileName::Custom(file_name.to_string()),
        source.to_string(),
    );
    parse(sm, handler, fm)
}
