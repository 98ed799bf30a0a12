use oxc_allocator::Allocator;
use oxc_ast::ast::{Declaration, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use tracing::debug;

use crate::domain::TargetId;

use super::TransformError;

/// Directive literal that opts a module into the transform.
pub const TARGET_DIRECTIVE: &str = "use target";
/// Name of the registration entry point imported by rewritten modules.
pub const REGISTER_FN: &str = "registerTarget";
/// Module rewritten sources import [`REGISTER_FN`] from unless configured otherwise.
pub const DEFAULT_RUNTIME_MODULE: &str = "retarget/runtime";

/// A function the transform turned into a registered target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTarget {
    pub name: String,
    pub id: TargetId,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub source: String,
    pub targets: Vec<DiscoveredTarget>,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// Cheap opt-in check: does the trimmed source begin with the directive literal?
pub fn has_target_directive(source: &str) -> bool {
    let trimmed = source.trim_start_matches('\u{feff}').trim_start();
    ['"', '\''].into_iter().any(|quote| {
        trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_prefix(TARGET_DIRECTIVE))
            .is_some_and(|rest| rest.starts_with(quote))
    })
}

/// Rewrite a target module.
///
/// Returns `Ok(None)` when the module does not carry the directive. Text
/// outside the directive and the rewritten declarations is kept verbatim.
pub fn transform_source(
    module_path: &str,
    source: &str,
    runtime_module: &str,
) -> Result<Option<TransformOutput>, TransformError> {
    if !has_target_directive(source) {
        return Ok(None);
    }

    let allocator = Allocator::default();
    let source_type = SourceType::from_path(module_path)
        .unwrap_or_default()
        .with_module(true);
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if parsed.panicked || !parsed.errors.is_empty() {
        return Err(TransformError::Parse {
            module_path: module_path.to_string(),
            messages: parsed.errors.iter().map(ToString::to_string).collect(),
        });
    }

    let program = &parsed.program;
    let directive = program
        .directives
        .iter()
        .find(|directive| directive.directive.as_str() == TARGET_DIRECTIVE)
        .ok_or_else(|| TransformError::MisplacedDirective {
            module_path: module_path.to_string(),
        })?;

    let mut directive_end = directive.span.end as usize;
    if source[directive_end..].starts_with(';') {
        directive_end += 1;
    }
    let mut edits = vec![Edit {
        start: directive.span.start as usize,
        end: directive_end,
        replacement: format!(
            "import {{ {REGISTER_FN} }} from {};",
            js_string_literal(runtime_module)
        ),
    }];

    let mut targets = Vec::new();
    let mut signatures = Vec::new();
    for statement in &program.body {
        let Statement::ExportNamedDeclaration(export) = statement else {
            continue;
        };
        let Some(Declaration::FunctionDeclaration(function)) = &export.declaration else {
            continue;
        };
        let Some(ident) = &function.id else {
            continue;
        };
        let name = ident.name.as_str();
        if function.body.is_none() {
            signatures.push((name, export.span.start as usize, export.span.end as usize));
            continue;
        }
        if function.generator || function.declare {
            continue;
        }

        let id = TargetId::derive(module_path, name);
        let function_text = &source[function.span.start as usize..function.span.end as usize];
        let async_prefix = if function.r#async && !function_text.starts_with("async") {
            "async "
        } else {
            ""
        };
        edits.push(Edit {
            start: export.span.start as usize,
            end: export.span.end as usize,
            replacement: format!(
                "export const {name} = {REGISTER_FN}({}, {async_prefix}{function_text})",
                js_string_literal(id.as_str())
            ),
        });
        targets.push(DiscoveredTarget {
            name: name.to_string(),
            id,
            is_async: function.r#async,
        });
    }

    // Overload signatures of a registered function would outlive their
    // implementation once it becomes a `const`.
    for (name, start, end) in signatures {
        if !targets.iter().any(|target| target.name == name) {
            continue;
        }
        edits.push(Edit {
            start,
            end: statement_end(source, end),
            replacement: String::new(),
        });
    }

    debug!(
        module_path,
        targets = targets.len(),
        "rewrote target module"
    );

    Ok(Some(TransformOutput {
        source: apply_edits(source, edits),
        targets,
    }))
}

/// Extend `end` over a trailing `;` and the rest of its line break.
fn statement_end(source: &str, mut end: usize) -> usize {
    if source[end..].starts_with(';') {
        end += 1;
    }
    if source[end..].starts_with("\r\n") {
        end += 2;
    } else if source[end..].starts_with('\n') {
        end += 1;
    }
    end
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.start);
    let mut output = String::with_capacity(source.len() + edits.len() * 64);
    let mut cursor = 0;
    for edit in edits {
        output.push_str(&source[cursor..edit.start]);
        output.push_str(&edit.replacement);
        cursor = edit.end;
    }
    output.push_str(&source[cursor..]);
    output
}

fn js_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for ch in value.chars() {
        match ch {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            other => literal.push(other),
        }
    }
    literal.push('"');
    literal
}
