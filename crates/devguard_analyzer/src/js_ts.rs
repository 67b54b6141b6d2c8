//! Tolerant JS/TS/JSX/TSX analyzer.
//!
//! JavaScript has no single canonical parser available as a lightweight
//! Rust crate the rest of this workspace already depends on, so this
//! follows the original analyzer's approach: regex-based extraction of
//! classes/functions/interfaces/imports plus a brace-balancer to find body
//! extents, rather than a full parse. It will misparse adversarial input;
//! it does not need to be a compiler.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::discovery::Language;
use crate::ids;
use crate::model::{FileAnalysis, RawEntity, RawRelation};
use devguard_storage::types::{EntityKind, RelationKind};

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:export\s+)?
        (?:default\s+)?
        (?:abstract\s+)?
        class\s+(?P<name>\w+)
        (?:<[^>]+>)?
        (?:\s+extends\s+(?P<extends>[\w.]+))?
        (?:\s+implements\s+(?P<implements>[\w.,\s]+))?
        \s*\{
        ",
    )
    .unwrap()
});

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:export\s+)?(?:async\s+)?function\s*\*?\s+(?P<name>\w+)\s*
        (?:<[^>]+>)?\s*\(
        ",
    )
    .unwrap()
});

static ARROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:export\s+)?(?:const|let|var)\s+(?P<name>\w+)\s*
        (?::\s*[^=]+)?
        =\s*(?:async\s+)?\(?[^=]*?\)?\s*=>
        ",
    )
    .unwrap()
});

static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:export\s+)?interface\s+(?P<name>\w+)(?:<[^>]+>)?(?:\s+extends\s+(?P<extends>[\w.,\s]+))?\s*\{").unwrap()
});

static TYPE_ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:export\s+)?type\s+(?P<name>\w+)(?:<[^>]+>)?\s*=").unwrap());

static ENUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:export\s+)?(?:const\s+)?enum\s+(?P<name>\w+)\s*\{").unwrap()
});

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+(?:const|let|var)\s+(?P<name>\w+)\s*(?::\s*[^=]+)?=").unwrap()
});

static FC_ANNOTATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:export\s+)?const\s+(?P<name>[A-Z]\w*)\s*:\s*(?:React\.)?FC(?:<[^>]*>)?\s*=",
    )
    .unwrap()
});

static FUNCTION_COMPONENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:export\s+)?(?:default\s+)?function\s+(?P<name>[A-Z]\w*)\s*
        (?:<[^>]+>)?\s*\([^)]*\)\s*(?::\s*[^\{]+)?\{
        ",
    )
    .unwrap()
});

static ARROW_COMPONENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:export\s+)?const\s+(?P<name>[A-Z]\w*)\s*
        (?::\s*[^=]+)?
        =\s*(?:async\s+)?\(?[^=]*?\)?\s*=>
        ",
    )
    .unwrap()
});

static HOOK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:export\s+)?
        (?:function\s+(?P<fname>use[A-Z]\w*)\s*\(
        |
        const\s+(?P<cname>use[A-Z]\w*)\s*(?::\s*[^=]+)?=\s*(?:async\s+)?\(?[^=]*?\)?\s*=>
        )
        ",
    )
    .unwrap()
});

const JSX_RETURN_HINT: &str = "return (<";

fn returns_jsx(body: &str) -> bool {
    body.contains(JSX_RETURN_HINT)
        || body.contains("return <")
        || body.contains("=> (<")
        || body.contains("=> <")
}

static IMPORT_NAMED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+\{([^}]+)\}\s+from\s+["']([^"']+)["']"#).unwrap());
static IMPORT_DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+(\w+)\s+from\s+["']([^"']+)["']"#).unwrap());
static IMPORT_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+\*\s+as\s+(\w+)\s+from\s+["']([^"']+)["']"#).unwrap());
static REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:const|let|var)\s+(\w+)\s*=\s*require\(["']([^"']+)["']\)"#).unwrap()
});
static CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?P<name>[A-Za-z_$][\w$]*)\s*\(").unwrap());

const JS_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "typeof", "new", "await",
];

pub fn analyze(source: &str, file_path: &str, language: Language) -> FileAnalysis {
    let cleaned = strip_comments(source);
    let mut out = FileAnalysis::default();

    out.entities.push(crate::model::module_entity(
        file_path,
        if language.is_typescript() { "typescript" } else { "javascript" },
    ));

    extract_imports(&cleaned, file_path, &mut out);
    extract_classes(&cleaned, file_path, language, &mut out);
    extract_functions(&cleaned, file_path, language, &mut out);
    extract_variables(&cleaned, file_path, language, &mut out);
    extract_hooks(&cleaned, file_path, &mut out);

    if language.is_typescript() {
        extract_interfaces(&cleaned, file_path, &mut out);
        extract_type_aliases(&cleaned, file_path, &mut out);
        extract_enums(&cleaned, file_path, &mut out);
    }

    if language.is_jsx() {
        extract_react_components(&cleaned, file_path, language, &mut out);
    }

    out
}

fn strip_comments(source: &str) -> String {
    static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//[^\n]*").unwrap());
    static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());
    let no_line = LINE_COMMENT.replace_all(source, "");
    BLOCK_COMMENT.replace_all(&no_line, "").into_owned()
}

fn line_of(source: &str, byte_offset: usize) -> i64 {
    source[..byte_offset].matches('\n').count() as i64 + 1
}

/// Finds the `}` matching the `{` at `open_brace_index`.
fn find_matching_brace(source: &str, open_brace_index: usize) -> usize {
    let bytes = source.as_bytes();
    let mut depth = 0i32;
    let mut i = open_brace_index;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn extract_imports(source: &str, file_path: &str, out: &mut FileAnalysis) {
    let module_id = format!("{file_path}::<module>");
    let mut push = |targets: &str, from: &str, line: i64| {
        for name in targets.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            out.relations.push(RawRelation {
                relation_id: ids::relation_id(file_path, "imports", &module_id, from, line),
                source_id: module_id.clone(),
                target_name: from.to_string(),
                kind: RelationKind::Imports,
                file_path: Some(file_path.to_string()),
                metadata: json!({ "imported": name }),
            });
        }
    };

    for caps in IMPORT_NAMED_RE.captures_iter(source) {
        let line = line_of(source, caps.get(0).unwrap().start());
        push(&caps[1], &caps[2], line);
    }
    for caps in IMPORT_DEFAULT_RE.captures_iter(source) {
        let line = line_of(source, caps.get(0).unwrap().start());
        push(&caps[1], &caps[2], line);
    }
    for caps in IMPORT_STAR_RE.captures_iter(source) {
        let line = line_of(source, caps.get(0).unwrap().start());
        push(&caps[1], &caps[2], line);
    }
    for caps in REQUIRE_RE.captures_iter(source) {
        let line = line_of(source, caps.get(0).unwrap().start());
        push(&caps[1], &caps[2], line);
    }
}

fn extract_classes(source: &str, file_path: &str, language: Language, out: &mut FileAnalysis) {
    for caps in CLASS_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let name = &caps["name"];
        let line_start = line_of(source, whole.start());
        let body_start = whole.end();
        let body_end = find_matching_brace(source, body_start - 1);
        let line_end = line_of(source, body_end);

        let entity_id = ids::entity_id(file_path, "class", name, line_start);
        let extends = caps.name("extends").map(|m| m.as_str().trim().to_string());

        out.entities.push(RawEntity {
            entity_id: entity_id.clone(),
            kind: EntityKind::Class,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_end),
            signature: Some(whole.as_str().trim().trim_end_matches('{').trim().to_string()),
            docstring: None,
            parent_id: None,
            metadata: json!({
                "language": if language.is_typescript() { "typescript" } else { "javascript" },
                "extends": extends,
            }),
        });

        if let Some(base) = caps.name("extends") {
            let base_name = base.as_str().trim().to_string();
            out.relations.push(RawRelation {
                relation_id: ids::relation_id(file_path, "inherits", &entity_id, &base_name, line_start),
                source_id: entity_id.clone(),
                target_name: base_name,
                kind: RelationKind::Inherits,
                file_path: Some(file_path.to_string()),
                metadata: json!({}),
            });
        }

        let body = &source[body_start..body_end.min(source.len())];
        extract_methods(body, body_start, source, file_path, &entity_id, out);
    }
}

fn extract_methods(
    body: &str,
    body_offset: usize,
    full_source: &str,
    file_path: &str,
    class_id: &str,
    out: &mut FileAnalysis,
) {
    static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^\s*(?:public\s+|private\s+|protected\s+|static\s+|async\s+)*(?P<name>[\w$]+)\s*\(([^)]*)\)\s*(?::\s*[^\{]+)?\{").unwrap()
    });

    for caps in METHOD_RE.captures_iter(body) {
        let name = &caps["name"];
        if JS_KEYWORDS.contains(&name) || name == "constructor" {
            // constructor still becomes a method entity, just without the skip-list exclusion
        }
        let whole = caps.get(0).unwrap();
        let line_start = line_of(full_source, body_offset + whole.start());
        let entity_id = ids::entity_id(file_path, "method", name, line_start);

        out.entities.push(RawEntity {
            entity_id: entity_id.clone(),
            kind: EntityKind::Method,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_start),
            signature: Some(format!("{name}({})", caps[2].trim())),
            docstring: None,
            parent_id: Some(class_id.to_string()),
            metadata: json!({}),
        });

        out.relations.push(RawRelation {
            relation_id: ids::relation_id(file_path, "contains", class_id, &entity_id, line_start),
            source_id: class_id.to_string(),
            target_name: entity_id.clone(),
            kind: RelationKind::Contains,
            file_path: Some(file_path.to_string()),
            metadata: json!({}),
        });

        let method_body_start = body_offset + whole.end() - 1;
        let method_body_end = find_matching_brace(full_source, method_body_start);
        let method_body = &full_source[method_body_start..method_body_end.min(full_source.len())];
        emit_call_relations(method_body, file_path, &entity_id, line_start, out);
    }
}

fn emit_call_relations(
    body: &str,
    file_path: &str,
    caller_id: &str,
    caller_line: i64,
    out: &mut FileAnalysis,
) {
    for callee in extract_calls(body) {
        out.relations.push(RawRelation {
            relation_id: ids::relation_id(file_path, "calls", caller_id, callee, caller_line),
            source_id: caller_id.to_string(),
            target_name: callee.to_string(),
            kind: RelationKind::Calls,
            file_path: Some(file_path.to_string()),
            metadata: json!({}),
        });
    }
}

fn extract_functions(source: &str, file_path: &str, language: Language, out: &mut FileAnalysis) {
    for caps in FUNCTION_RE.captures_iter(source) {
        emit_top_level_function(source, file_path, language, &caps["name"], caps.get(0).unwrap().start(), out);
    }
    for caps in ARROW_RE.captures_iter(source) {
        emit_top_level_function(source, file_path, language, &caps["name"], caps.get(0).unwrap().start(), out);
    }
}

fn emit_top_level_function(
    source: &str,
    file_path: &str,
    language: Language,
    name: &str,
    start: usize,
    out: &mut FileAnalysis,
) {
    let line_start = line_of(source, start);
    let entity_id = ids::entity_id(file_path, "function", name, line_start);
    if out.entities.iter().any(|e| e.entity_id == entity_id) {
        return;
    }

    out.entities.push(RawEntity {
        entity_id,
        kind: EntityKind::Function,
        name: name.to_string(),
        qualified_name: format!("{file_path}::{name}"),
        file_path: file_path.to_string(),
        line_start,
        line_end: Some(line_start),
        signature: Some(name.to_string()),
        docstring: None,
        parent_id: None,
        metadata: json!({
            "language": if language.is_typescript() { "typescript" } else { "javascript" },
        }),
    });
}

fn extract_interfaces(source: &str, file_path: &str, out: &mut FileAnalysis) {
    for caps in INTERFACE_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let name = &caps["name"];
        let line_start = line_of(source, whole.start());
        out.entities.push(RawEntity {
            entity_id: ids::entity_id(file_path, "interface", name, line_start),
            kind: EntityKind::Interface,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_start),
            signature: Some(whole.as_str().trim().trim_end_matches('{').trim().to_string()),
            docstring: None,
            parent_id: None,
            metadata: json!({ "language": "typescript" }),
        });
    }
}

fn extract_type_aliases(source: &str, file_path: &str, out: &mut FileAnalysis) {
    for caps in TYPE_ALIAS_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let name = &caps["name"];
        let line_start = line_of(source, whole.start());
        out.entities.push(RawEntity {
            entity_id: ids::entity_id(file_path, "type_alias", name, line_start),
            kind: EntityKind::TypeAlias,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_start),
            signature: None,
            docstring: None,
            parent_id: None,
            metadata: json!({ "language": "typescript" }),
        });
    }
}

fn extract_enums(source: &str, file_path: &str, out: &mut FileAnalysis) {
    for caps in ENUM_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let name = &caps["name"];
        let line_start = line_of(source, whole.start());
        out.entities.push(RawEntity {
            entity_id: ids::entity_id(file_path, "enum", name, line_start),
            kind: EntityKind::Enum,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_start),
            signature: Some(whole.as_str().trim().trim_end_matches('{').trim().to_string()),
            docstring: None,
            parent_id: None,
            metadata: json!({ "language": "typescript" }),
        });
    }
}

/// Only exported bindings whose name reads as a constant or a schema/config
/// object are worth tracking as entities; ordinary exported variables are
/// too noisy to be useful here.
fn is_trackable_variable_name(name: &str) -> bool {
    let is_upper_case = name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit());
    is_upper_case || name.ends_with("Schema") || name.ends_with("Config")
}

fn extract_variables(source: &str, file_path: &str, language: Language, out: &mut FileAnalysis) {
    for caps in VARIABLE_RE.captures_iter(source) {
        let name = &caps["name"];
        if !is_trackable_variable_name(name) {
            continue;
        }
        let whole = caps.get(0).unwrap();
        let line_start = line_of(source, whole.start());
        out.entities.push(RawEntity {
            entity_id: ids::entity_id(file_path, "variable", name, line_start),
            kind: EntityKind::Variable,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_start),
            signature: None,
            docstring: None,
            parent_id: None,
            metadata: json!({
                "language": if language.is_typescript() { "typescript" } else { "javascript" },
            }),
        });
    }
}

fn extract_hooks(source: &str, file_path: &str, out: &mut FileAnalysis) {
    for caps in HOOK_RE.captures_iter(source) {
        let name = caps
            .name("fname")
            .or_else(|| caps.name("cname"))
            .unwrap()
            .as_str();
        let whole = caps.get(0).unwrap();
        let line_start = line_of(source, whole.start());
        let entity_id = ids::entity_id(file_path, "react_hook", name, line_start);
        if out.entities.iter().any(|e| e.entity_id == entity_id) {
            continue;
        }
        out.entities.push(RawEntity {
            entity_id,
            kind: EntityKind::ReactHook,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_start),
            signature: Some(name.to_string()),
            docstring: None,
            parent_id: None,
            metadata: json!({}),
        });
    }
}

/// Function/arrow declarations whose name starts uppercase or is typed as
/// `FC`, and whose body returns JSX, are treated as React components.
fn extract_react_components(source: &str, file_path: &str, language: Language, out: &mut FileAnalysis) {
    let mut push = |name: &str, start: usize, body_probe_end: usize| {
        let line_start = line_of(source, start);
        let entity_id = ids::entity_id(file_path, "react_component", name, line_start);
        if out.entities.iter().any(|e| e.entity_id == entity_id) {
            return;
        }
        out.entities.push(RawEntity {
            entity_id,
            kind: EntityKind::ReactComponent,
            name: name.to_string(),
            qualified_name: format!("{file_path}::{name}"),
            file_path: file_path.to_string(),
            line_start,
            line_end: Some(line_of(source, body_probe_end)),
            signature: Some(name.to_string()),
            docstring: None,
            parent_id: None,
            metadata: json!({
                "language": if language.is_typescript() { "typescript" } else { "javascript" },
            }),
        });
    };

    for caps in FC_ANNOTATED_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        push(&caps["name"], whole.start(), whole.end());
    }

    for caps in FUNCTION_COMPONENT_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let body_end = find_matching_brace(source, whole.end() - 1);
        let body = &source[whole.end().min(source.len())..body_end.min(source.len())];
        if returns_jsx(body) {
            push(&caps["name"], whole.start(), body_end);
        }
    }

    for caps in ARROW_COMPONENT_RE.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let probe_end = (whole.end() + 200).min(source.len());
        let probe = &source[whole.end()..probe_end];
        if returns_jsx(probe) || probe.trim_start().starts_with('<') {
            push(&caps["name"], whole.start(), whole.end());
        }
    }
}

fn extract_calls(body: &str) -> impl Iterator<Item = &str> {
    CALL_RE
        .captures_iter(body)
        .map(|c| c.get(1).unwrap().as_str())
        .filter(|n| !JS_KEYWORDS.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_and_method() {
        let src = r#"
export class Widget extends Base {
    render() {
        return helper();
    }
}
"#;
        let result = analyze(src, "widget.tsx", Language::Tsx);
        let names: Vec<_> = result.entities.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Widget"));
        assert!(names.contains(&"render"));
        assert!(result
            .relations
            .iter()
            .any(|r| r.kind == RelationKind::Inherits && r.target_name == "Base"));
    }

    #[test]
    fn extracts_named_import() {
        let src = "import { useState } from 'react';\n";
        let result = analyze(src, "app.tsx", Language::Tsx);
        assert!(result
            .relations
            .iter()
            .any(|r| r.kind == RelationKind::Imports && r.target_name == "react"));
    }

    #[test]
    fn extracts_arrow_function() {
        let src = "export const useThing = () => {\n  return 1;\n};\n";
        let result = analyze(src, "hook.ts", Language::TypeScript);
        assert!(result.entities.iter().any(|e| e.name == "useThing"));
    }

    #[test]
    fn emits_module_entity_for_every_file() {
        let result = analyze("export const X = 1;\n", "config/values.ts", Language::TypeScript);
        assert!(result
            .entities
            .iter()
            .any(|e| e.kind == EntityKind::Module && e.qualified_name == "config.values"));
    }

    #[test]
    fn interfaces_and_type_aliases_keep_their_own_kind() {
        let src = "export interface Options {\n  limit: number;\n}\nexport type Handler = () => void;\n";
        let result = analyze(src, "types.ts", Language::TypeScript);
        assert!(result
            .entities
            .iter()
            .any(|e| e.name == "Options" && e.kind == EntityKind::Interface));
        assert!(result
            .entities
            .iter()
            .any(|e| e.name == "Handler" && e.kind == EntityKind::TypeAlias));
    }

    #[test]
    fn extracts_enum() {
        let src = "export enum Status {\n  Open,\n  Closed,\n}\n";
        let result = analyze(src, "status.ts", Language::TypeScript);
        assert!(result
            .entities
            .iter()
            .any(|e| e.name == "Status" && e.kind == EntityKind::Enum));
    }

    #[test]
    fn extracts_exported_upper_case_and_config_variables_only() {
        let src = "export const MAX_RETRIES = 3;\nexport const dbConfig = {};\nexport const helper = 1;\n";
        let result = analyze(src, "consts.ts", Language::TypeScript);
        let names: Vec<_> = result
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Variable)
            .map(|e| e.name.as_str())
            .collect();
        assert!(names.contains(&"MAX_RETRIES"));
        assert!(names.contains(&"dbConfig"));
        assert!(!names.contains(&"helper"));
    }

    #[test]
    fn extracts_react_function_component_and_hook() {
        let src = r#"
export function Widget(props: Props) {
    return (<div>{props.label}</div>);
}

export const useWidget = () => {
    return 1;
};
"#;
        let result = analyze(src, "widget.tsx", Language::Tsx);
        assert!(result
            .entities
            .iter()
            .any(|e| e.name == "Widget" && e.kind == EntityKind::ReactComponent));
        assert!(result
            .entities
            .iter()
            .any(|e| e.name == "useWidget" && e.kind == EntityKind::ReactHook));
    }
}
