//! Analyzer-internal entity/relation shape, independent of the storage
//! crate's row shape (the orchestrator in `analyze.rs` maps one to the
//! other once entity ids are final).

use devguard_storage::types::{EntityKind, RelationKind};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct RawEntity {
    pub entity_id: String,
    pub kind: EntityKind,
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub line_start: i64,
    pub line_end: Option<i64>,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub parent_id: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct RawRelation {
    pub relation_id: String,
    pub source_id: String,
    /// A name that hasn't been resolved to an entity id yet (e.g. a called
    /// function, an imported module path). The orchestrator's second pass
    /// resolves these within one project; cross-project references stay
    /// unresolved (`target_id` stays `None`).
    pub target_name: String,
    pub kind: RelationKind,
    pub file_path: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Default)]
pub struct FileAnalysis {
    pub entities: Vec<RawEntity>,
    pub relations: Vec<RawRelation>,
}

/// The one `module` entity every analyzer emits per file. `qualified_name`
/// is the dotted path from the project root; `name` is the last path
/// segment without its extension.
pub fn module_entity(file_path: &str, language: &str) -> RawEntity {
    let without_ext = file_path
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_path);
    let qualified_name = without_ext.replace('/', ".");
    let name = without_ext
        .rsplit('/')
        .next()
        .unwrap_or(without_ext)
        .to_string();

    RawEntity {
        entity_id: crate::ids::entity_id(file_path, "module", file_path, 1),
        kind: EntityKind::Module,
        name,
        qualified_name,
        file_path: file_path.to_string(),
        line_start: 1,
        line_end: None,
        signature: None,
        docstring: None,
        parent_id: None,
        metadata: json!({ "language": language }),
    }
}
