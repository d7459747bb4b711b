//! Per-module reports for the CLI and JSON consumers

use std::path::PathBuf;

use serde::Serialize;
use tabled::Tabled;

use crate::graph::{BuildStats, ModuleGraph, ModuleId};
use crate::module::AnalyzedModule;
use crate::scope::DeclKind;
use crate::writer::{EmitReport, EmittedModule};
use crate::FileStatus;

/// A binding the pruner deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedBinding {
    pub name: String,
    pub kind: DeclKind,
    pub line: u32,
}

/// Import specifiers from one dependency, split by liveness
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub path: PathBuf,
    pub kept: Vec<String>,
    pub dropped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub path: PathBuf,
    /// Absent when the module was not emitted
    pub output: Option<PathBuf>,
    pub status: Option<FileStatus>,
    pub declarations: usize,
    pub removed: Vec<RemovedBinding>,
    pub imports: Vec<DependencyReport>,
    /// Write error, if emission failed
    pub error: Option<String>,
}

impl ModuleReport {
    pub fn from_module(module: &AnalyzedModule) -> Self {
        let removed = module
            .removed_declarations()
            .map(|decl| RemovedBinding {
                name: decl.display_name(),
                kind: decl.kind,
                line: decl.line,
            })
            .collect();

        let imports = module
            .imports
            .iter()
            .map(|entry| {
                let (kept, dropped): (Vec<_>, Vec<_>) =
                    entry.specifiers.iter().partition(|s| module.is_live(s));
                DependencyReport {
                    path: entry.path.clone(),
                    kept: kept.into_iter().map(specifier_label).collect(),
                    dropped: dropped.into_iter().map(specifier_label).collect(),
                }
            })
            .collect();

        Self {
            path: module.path.clone(),
            output: None,
            status: None,
            declarations: module.declarations.len(),
            removed,
            imports,
            error: None,
        }
    }

    fn record_emitted(&mut self, emitted: &EmittedModule) {
        self.output = Some(emitted.output.clone());
        self.status = emitted.status;
    }
}

/// `imported` or `imported as local`
fn specifier_label(specifier: &crate::module::ImportSpecifier) -> String {
    match &specifier.local {
        Some(local) if *local != specifier.imported => format!("{} as {}", specifier.imported, local),
        _ => specifier.imported.clone(),
    }
}

/// Everything one `shake` run produced
#[derive(Debug, Clone, Serialize)]
pub struct ShakeReport {
    pub entry: PathBuf,
    pub modules: Vec<ModuleReport>,
    pub stats: BuildStats,
    /// Dependencies skipped in keep-going mode
    pub skipped: Vec<String>,
    pub dry_run: bool,
}

impl ShakeReport {
    pub fn new(graph: &ModuleGraph, emit: &EmitReport, dry_run: bool) -> Self {
        let mut modules: Vec<ModuleReport> = graph
            .iter()
            .map(|node| ModuleReport::from_module(&node.module))
            .collect();

        for emitted in &emit.emitted {
            modules[emitted.id.index()].record_emitted(emitted);
        }
        for failure in &emit.failures {
            modules[failure.id.index()].error = Some(failure.error.to_string());
        }

        Self {
            entry: graph.module(graph.root()).path.clone(),
            modules,
            stats: graph.stats(),
            skipped: graph.failures().iter().map(ToString::to_string).collect(),
            dry_run,
        }
    }

    pub fn removed_count(&self) -> usize {
        self.modules.iter().map(|m| m.removed.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.modules.iter().filter(|m| m.error.is_some()).count() + self.skipped.len()
    }

    pub fn rows(&self) -> Vec<ModuleRow> {
        self.modules.iter().map(ModuleRow::from).collect()
    }
}

/// Table row for one module
#[derive(Tabled)]
pub struct ModuleRow {
    #[tabled(rename = "Module")]
    pub module: String,
    #[tabled(rename = "Decls")]
    pub declarations: usize,
    #[tabled(rename = "Removed")]
    pub removed: String,
    #[tabled(rename = "Output")]
    pub output: String,
}

impl From<&ModuleReport> for ModuleRow {
    fn from(report: &ModuleReport) -> Self {
        let removed = if report.removed.is_empty() {
            "-".to_string()
        } else {
            report
                .removed
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let output = match (&report.error, &report.output, report.status) {
            (Some(error), _, _) => format!("error: {error}"),
            (None, Some(path), Some(status)) => format!("{} ({})", path.display(), status_label(status)),
            (None, Some(path), None) => path.display().to_string(),
            (None, None, _) => "-".to_string(),
        };
        Self {
            module: report.path.display().to_string(),
            declarations: report.declarations,
            removed,
            output,
        }
    }
}

pub fn status_label(status: FileStatus) -> &'static str {
    match status {
        FileStatus::New => "new",
        FileStatus::Modified => "modified",
        FileStatus::Unchanged => "unchanged",
    }
}

/// Module tree as printed by `treeshake graph`
#[derive(Debug, Clone, Serialize)]
pub struct GraphNodeReport {
    pub path: PathBuf,
    pub imports: Vec<DependencyReport>,
    pub removed: Vec<RemovedBinding>,
    pub children: Vec<GraphNodeReport>,
    /// Set when the module already appeared earlier in the tree
    pub repeated: bool,
}

impl GraphNodeReport {
    pub fn from_graph(graph: &ModuleGraph) -> Self {
        let mut seen = vec![false; graph.len()];
        Self::build(graph, graph.root(), &mut seen)
    }

    fn build(graph: &ModuleGraph, id: ModuleId, seen: &mut [bool]) -> Self {
        let node = graph.node(id);
        let module = ModuleReport::from_module(&node.module);
        let repeated = std::mem::replace(&mut seen[id.index()], true);
        let children = if repeated {
            Vec::new()
        } else {
            node.children
                .iter()
                .map(|child| Self::build(graph, *child, seen))
                .collect()
        };
        Self {
            path: module.path,
            imports: module.imports,
            removed: module.removed,
            children,
            repeated,
        }
    }

    /// Indented text lines, one per module and per dependency import
    pub fn lines(&self, style: &dyn Fn(&str, bool) -> String) -> Vec<String> {
        let mut lines = Vec::new();
        self.push_lines(0, style, &mut lines);
        lines
    }

    fn push_lines(&self, depth: usize, style: &dyn Fn(&str, bool) -> String, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        let marker = if self.repeated { " (see above)" } else { "" };
        lines.push(format!("{indent}{}{marker}", self.path.display()));
        if self.repeated {
            return;
        }
        for dependency in &self.imports {
            let mut names: Vec<String> = dependency.kept.iter().map(|n| style(n, true)).collect();
            names.extend(dependency.dropped.iter().map(|n| style(n, false)));
            lines.push(format!(
                "{indent}  <- {} {{{}}}",
                dependency.path.display(),
                names.join(", ")
            ));
        }
        for child in &self.children {
            child.push_lines(depth + 1, style, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::storage::MemoryStore;
    use crate::writer::{emit_graph, EmitOptions};
    use std::path::Path;

    fn graph(store: &MemoryStore) -> ModuleGraph {
        GraphBuilder::new(store).build(Path::new("/app/index.js")).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::with_modules([
            (
                "/app/index.js",
                "import {a, b as bee} from './m.js';\nimport {s} from './shared.js';\nfunction unused() {}\na(s);\n",
            ),
            ("/app/m.js", "import {s} from './shared.js';\nexport function a() { s(); }\nexport const b = 2;\n"),
            ("/app/shared.js", "export function s() {}\n"),
        ])
    }

    #[test]
    fn test_module_report() {
        let store = store();
        let graph = graph(&store);
        let report = ModuleReport::from_module(graph.module(graph.root()));

        assert_eq!(report.declarations, 4);
        assert_eq!(
            report.removed,
            [
                RemovedBinding {
                    name: "bee".to_string(),
                    kind: DeclKind::Import,
                    line: 1
                },
                RemovedBinding {
                    name: "unused".to_string(),
                    kind: DeclKind::Function,
                    line: 3
                }
            ]
        );
        assert_eq!(report.imports[0].kept, ["a"]);
        assert_eq!(report.imports[0].dropped, ["b as bee"]);
    }

    #[test]
    fn test_shake_report_merges_emission() {
        let store = store();
        let graph = graph(&store);
        let emit = emit_graph(&graph, &store, &EmitOptions::default());
        let report = ShakeReport::new(&graph, &emit, false);

        assert_eq!(report.modules.len(), 3);
        assert_eq!(report.removed_count(), 2);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.modules[0].output, Some(PathBuf::from("/app/shaking/index.js")));
        assert_eq!(report.modules[0].status, Some(FileStatus::New));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["modules"][0]["removed"][1]["kind"], "function");
        assert_eq!(json["stats"]["parsed"], 3);
    }

    #[test]
    fn test_graph_lines_mark_repeats() {
        let store = store();
        let graph = graph(&store);
        let tree = GraphNodeReport::from_graph(&graph);
        let lines = tree.lines(&|name, live| {
            if live { name.to_string() } else { format!("~{name}") }
        });

        assert_eq!(
            lines,
            [
                "/app/index.js",
                "  <- /app/m.js {a, ~b as bee}",
                "  <- /app/shared.js {s}",
                "  /app/m.js",
                "    <- /app/shared.js {s}",
                "    /app/shared.js",
                "  /app/shared.js (see above)",
            ]
        );
    }
}
