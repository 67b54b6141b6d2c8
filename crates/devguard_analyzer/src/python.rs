//! Python analyzer.
//!
//! Parses with `rustpython_parser::ast::Suite::parse` and walks the tree to
//! emit entities (modules/classes/functions) and relations (calls/imports/
//! inherits/contains).

use rustpython_ast::Ranged;
use rustpython_parser::{ast, Parse};
use serde_json::json;

use crate::ids;
use crate::model::{FileAnalysis, RawEntity, RawRelation};
use devguard_storage::types::{EntityKind, RelationKind};

pub fn analyze(source: &str, file_path: &str) -> anyhow::Result<FileAnalysis> {
    let suite = ast::Suite::parse(source, file_path)
        .map_err(|e| anyhow::anyhow!("python parse error in {file_path}: {e}"))?;

    let lines = LineIndex::new(source);
    let mut out = FileAnalysis::default();
    out.entities.push(crate::model::module_entity(file_path, "python"));
    walk_stmts(&suite, file_path, None, None, &lines, &mut out);
    Ok(out)
}

/// Maps a byte offset to a 1-based line number.
struct LineIndex {
    newline_offsets: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let newline_offsets = source
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i)
            .collect();
        Self { newline_offsets }
    }

    fn line_of(&self, offset: usize) -> i64 {
        match self.newline_offsets.binary_search(&offset) {
            Ok(i) | Err(i) => i as i64 + 1,
        }
    }
}

fn walk_stmts(
    stmts: &[ast::Stmt],
    file_path: &str,
    parent_id: Option<&str>,
    enclosing_entity: Option<&str>,
    lines: &LineIndex,
    out: &mut FileAnalysis,
) {
    for stmt in stmts {
        match stmt {
            ast::Stmt::ClassDef(c) => {
                let line_start = lines.line_of(c.range().start().to_usize());
                let line_end = lines.line_of(c.range().end().to_usize());
                let entity_id = ids::entity_id(file_path, "class", c.name.as_str(), line_start);
                let bases: Vec<String> = c
                    .bases
                    .iter()
                    .filter_map(expr_name)
                    .collect();

                out.entities.push(RawEntity {
                    entity_id: entity_id.clone(),
                    kind: EntityKind::Class,
                    name: c.name.to_string(),
                    qualified_name: format!("{file_path}::{}", c.name),
                    file_path: file_path.to_string(),
                    line_start,
                    line_end: Some(line_end),
                    signature: None,
                    docstring: docstring_of(&c.body),
                    parent_id: parent_id.map(str::to_string),
                    metadata: json!({ "language": "python", "bases": bases }),
                });

                for base in &c.bases {
                    if let Some(base_name) = expr_name(base) {
                        out.relations.push(RawRelation {
                            relation_id: ids::relation_id(
                                file_path,
                                "inherits",
                                &entity_id,
                                &base_name,
                                line_start,
                            ),
                            source_id: entity_id.clone(),
                            target_name: base_name,
                            kind: RelationKind::Inherits,
                            file_path: Some(file_path.to_string()),
                            metadata: json!({}),
                        });
                    }
                }

                walk_stmts(
                    &c.body,
                    file_path,
                    Some(&entity_id),
                    Some(&entity_id),
                    lines,
                    out,
                );
            }

            ast::Stmt::FunctionDef(f) => emit_function(
                f.name.as_str(),
                &f.args,
                &f.body,
                f.range(),
                false,
                file_path,
                parent_id,
                lines,
                out,
            ),

            ast::Stmt::AsyncFunctionDef(f) => emit_function(
                f.name.as_str(),
                &f.args,
                &f.body,
                f.range(),
                true,
                file_path,
                parent_id,
                lines,
                out,
            ),

            ast::Stmt::Import(imp) => {
                let line = lines.line_of(imp.range().start().to_usize());
                for alias in &imp.names {
                    push_import_relation(
                        file_path,
                        enclosing_entity,
                        alias.name.as_str(),
                        line,
                        out,
                    );
                }
            }

            ast::Stmt::ImportFrom(imp) => {
                let line = lines.line_of(imp.range().start().to_usize());
                let module = imp.module.as_deref().unwrap_or("");
                for alias in &imp.names {
                    let full = if module.is_empty() {
                        alias.name.to_string()
                    } else {
                        format!("{module}.{}", alias.name)
                    };
                    push_import_relation(file_path, enclosing_entity, &full, line, out);
                }
            }

            other => {
                // Still descend into compound statements (if/for/with/try/...)
                // so nested defs and calls inside them are found.
                for block in child_blocks(other) {
                    walk_stmts(block, file_path, parent_id, enclosing_entity, lines, out);
                }
                if let Some(caller) = enclosing_entity {
                    collect_calls(other, file_path, caller, lines, out);
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_function(
    name: &str,
    args: &ast::Arguments,
    body: &[ast::Stmt],
    range: rustpython_parser::text_size::TextRange,
    is_async: bool,
    file_path: &str,
    parent_id: Option<&str>,
    lines: &LineIndex,
    out: &mut FileAnalysis,
) {
    let line_start = lines.line_of(range.start().to_usize());
    let line_end = lines.line_of(range.end().to_usize());
    let kind = if parent_id.is_some() {
        EntityKind::Method
    } else {
        EntityKind::Function
    };
    let entity_id = ids::entity_id(file_path, kind.as_str(), name, line_start);

    let params: Vec<String> = args
        .args
        .iter()
        .map(|a| a.def.arg.to_string())
        .collect();

    out.entities.push(RawEntity {
        entity_id: entity_id.clone(),
        kind,
        name: name.to_string(),
        qualified_name: format!("{file_path}::{name}"),
        file_path: file_path.to_string(),
        line_start,
        line_end: Some(line_end),
        signature: Some(format!("{name}({})", params.join(", "))),
        docstring: docstring_of(body),
        parent_id: parent_id.map(str::to_string),
        metadata: json!({ "language": "python", "is_async": is_async }),
    });

    if let Some(class_id) = parent_id {
        out.relations.push(RawRelation {
            relation_id: ids::relation_id(file_path, "contains", class_id, &entity_id, line_start),
            source_id: class_id.to_string(),
            target_name: entity_id.clone(),
            kind: RelationKind::Contains,
            file_path: Some(file_path.to_string()),
            metadata: json!({}),
        });
    }

    for stmt in body {
        collect_calls(stmt, file_path, &entity_id, lines, out);
    }
    // Nested function definitions (closures) still get walked for their own
    // entities, parented to the enclosing function rather than a class.
    walk_stmts(body, file_path, Some(&entity_id), Some(&entity_id), lines, out);
}

fn docstring_of(body: &[ast::Stmt]) -> Option<String> {
    let first = body.first()?;
    let ast::Stmt::Expr(e) = first else {
        return None;
    };
    let ast::Expr::Constant(c) = e.value.as_ref() else {
        return None;
    };
    match &c.value {
        ast::Constant::Str(s) => Some(s.clone()),
        _ => None,
    }
}

fn expr_name(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(n) => Some(n.id.to_string()),
        ast::Expr::Attribute(a) => {
            let base = expr_name(&a.value)?;
            Some(format!("{base}.{}", a.attr))
        }
        _ => None,
    }
}

fn push_import_relation(
    file_path: &str,
    enclosing_entity: Option<&str>,
    module_path: &str,
    line: i64,
    out: &mut FileAnalysis,
) {
    // Module-level imports are attributed to the file itself so the
    // relation still has a meaningful source even outside any function.
    let source_id = enclosing_entity
        .map(str::to_string)
        .unwrap_or_else(|| format!("{file_path}::<module>"));

    out.relations.push(RawRelation {
        relation_id: ids::relation_id(file_path, "imports", &source_id, module_path, line),
        source_id,
        target_name: module_path.to_string(),
        kind: RelationKind::Imports,
        file_path: Some(file_path.to_string()),
        metadata: json!({}),
    });
}

/// Walks expression subtrees reachable from a single statement looking for
/// call sites, emitting a `calls` relation per call whose target is a plain
/// name or a dotted attribute access.
fn collect_calls(
    stmt: &ast::Stmt,
    file_path: &str,
    caller_id: &str,
    lines: &LineIndex,
    out: &mut FileAnalysis,
) {
    for expr in stmt_exprs(stmt) {
        collect_calls_in_expr(expr, file_path, caller_id, lines, out);
    }
}

fn collect_calls_in_expr(
    expr: &ast::Expr,
    file_path: &str,
    caller_id: &str,
    lines: &LineIndex,
    out: &mut FileAnalysis,
) {
    if let ast::Expr::Call(call) = expr {
        if let Some(callee) = expr_name(&call.func) {
            let line = lines.line_of(call.range().start().to_usize());
            out.relations.push(RawRelation {
                relation_id: ids::relation_id(file_path, "calls", caller_id, &callee, line),
                source_id: caller_id.to_string(),
                target_name: callee,
                kind: RelationKind::Calls,
                file_path: Some(file_path.to_string()),
                metadata: json!({}),
            });
        }
        for arg in &call.args {
            collect_calls_in_expr(arg, file_path, caller_id, lines, out);
        }
    }
}

/// Best-effort enumeration of the top-level expressions directly inside a
/// statement (not its nested statement blocks, which `walk_stmts` already
/// descends into separately).
fn stmt_exprs(stmt: &ast::Stmt) -> Vec<&ast::Expr> {
    match stmt {
        ast::Stmt::Expr(e) => vec![e.value.as_ref()],
        ast::Stmt::Assign(a) => vec![a.value.as_ref()],
        ast::Stmt::AugAssign(a) => vec![a.value.as_ref()],
        ast::Stmt::AnnAssign(a) => a.value.iter().map(AsRef::as_ref).collect(),
        ast::Stmt::Return(r) => r.value.iter().map(AsRef::as_ref).collect(),
        ast::Stmt::If(i) => vec![i.test.as_ref()],
        ast::Stmt::While(w) => vec![w.test.as_ref()],
        ast::Stmt::For(f) => vec![f.iter.as_ref()],
        _ => vec![],
    }
}

fn child_blocks(stmt: &ast::Stmt) -> Vec<&[ast::Stmt]> {
    match stmt {
        ast::Stmt::If(i) => vec![i.body.as_slice(), i.orelse.as_slice()],
        ast::Stmt::For(f) => vec![f.body.as_slice(), f.orelse.as_slice()],
        ast::Stmt::AsyncFor(f) => vec![f.body.as_slice(), f.orelse.as_slice()],
        ast::Stmt::While(w) => vec![w.body.as_slice(), w.orelse.as_slice()],
        ast::Stmt::With(w) => vec![w.body.as_slice()],
        ast::Stmt::AsyncWith(w) => vec![w.body.as_slice()],
        ast::Stmt::Try(t) => {
            let mut blocks = vec![t.body.as_slice(), t.orelse.as_slice(), t.finalbody.as_slice()];
            for handler in &t.handlers {
                let ast::ExceptHandler::ExceptHandler(h) = handler;
                blocks.push(h.body.as_slice());
            }
            blocks
        }
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_with_method_and_inheritance() {
        let src = r#"
class Base:
    pass

class Widget(Base):
    """A widget."""

    def render(self):
        helper()
"#;
        let result = analyze(src, "widget.py").unwrap();
        let names: Vec<_> = result.entities.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Widget"));
        assert!(names.contains(&"render"));

        let inherits = result
            .relations
            .iter()
            .any(|r| r.kind == RelationKind::Inherits && r.target_name == "Base");
        assert!(inherits);

        let calls_helper = result
            .relations
            .iter()
            .any(|r| r.kind == RelationKind::Calls && r.target_name == "helper");
        assert!(calls_helper);
    }

    #[test]
    fn extracts_import_from() {
        let src = "from pkg.sub import thing\n";
        let result = analyze(src, "m.py").unwrap();
        assert!(result
            .relations
            .iter()
            .any(|r| r.kind == RelationKind::Imports && r.target_name == "pkg.sub.thing"));
    }
}
