//! Emission - print every pruned module and write it next to its source
//!
//! A module at `D/F` is written to `D/<dir_name>/F`. Modules are
//! independent once analysed, so with more than one job they are
//! printed and written by a scoped worker pool. A failed write is
//! recorded against its module and never stops the others.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crossbeam::channel;
use serde::Serialize;

use crate::graph::{ModuleGraph, ModuleId};
use crate::storage::ModuleStore;
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::{Error, FileStatus};

/// Default output directory segment
pub const DEFAULT_DIR_NAME: &str = "shaking";

#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Sub-directory inserted between a module's directory and file name
    pub dir_name: String,
    /// Worker threads; 0 and 1 both mean sequential
    pub jobs: usize,
    /// Compute outputs without writing them
    pub dry_run: bool,
    pub progress: Option<channel::Sender<ProgressMessage>>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_DIR_NAME.to_string(),
            jobs: 1,
            dry_run: false,
            progress: None,
        }
    }
}

/// One module's output
#[derive(Debug, Clone, Serialize)]
pub struct EmittedModule {
    pub id: ModuleId,
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` on a dry run
    pub status: Option<FileStatus>,
    pub bytes: usize,
}

/// A module whose output could not be written
#[derive(Debug)]
pub struct EmitFailure {
    pub id: ModuleId,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct EmitReport {
    /// Successfully emitted modules, in module order
    pub emitted: Vec<EmittedModule>,
    pub failures: Vec<EmitFailure>,
}

impl EmitReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.emitted
            .iter()
            .filter(|m| m.status == Some(status))
            .count()
    }
}

/// `D/F` -> `D/<dir_name>/F`
pub fn output_path(path: &Path, dir_name: &str) -> PathBuf {
    let file = path.file_name().unwrap_or(path.as_os_str());
    match path.parent() {
        Some(parent) => parent.join(dir_name).join(file),
        None => Path::new(dir_name).join(file),
    }
}

/// Print and write every module in the graph
pub fn emit_graph(graph: &ModuleGraph, store: &dyn ModuleStore, options: &EmitOptions) -> EmitReport {
    let ids: Vec<ModuleId> = graph.iter().map(|node| node.id).collect();
    notify(options, ProgressMessage::Started {
        phase: ProgressPhase::Emitting,
        total: ids.len(),
    });

    let results = if options.jobs > 1 && ids.len() > 1 {
        emit_parallel(graph, store, options, &ids)
    } else {
        ids.iter()
            .map(|id| emit_module(graph, store, options, *id))
            .collect()
    };

    notify(options, ProgressMessage::Finished {
        phase: ProgressPhase::Emitting,
    });

    let mut report = EmitReport::default();
    for result in results {
        match result {
            Ok(emitted) => report.emitted.push(emitted),
            Err(failure) => report.failures.push(failure),
        }
    }
    report.emitted.sort_by_key(|m| m.id.index());
    report.failures.sort_by_key(|f| f.id.index());
    report
}

fn notify(options: &EmitOptions, message: ProgressMessage) {
    if let Some(tx) = &options.progress {
        tx.send(message).ok();
    }
}

fn emit_parallel(
    graph: &ModuleGraph,
    store: &dyn ModuleStore,
    options: &EmitOptions,
    ids: &[ModuleId],
) -> Vec<Result<EmittedModule, EmitFailure>> {
    let (work_tx, work_rx) = channel::unbounded::<ModuleId>();
    let (done_tx, done_rx) = channel::unbounded();
    for id in ids {
        work_tx.send(*id).ok();
    }
    drop(work_tx);

    let workers = options.jobs.min(ids.len());
    let outcome = crossbeam::scope(|scope| {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move |_| {
                for id in work_rx {
                    done_tx.send(emit_module(graph, store, options, id)).ok();
                }
            });
        }
    });
    drop(done_tx);

    let mut results: Vec<Result<EmittedModule, EmitFailure>> = done_rx.into_iter().collect();
    if outcome.is_err() {
        // A panicking worker loses the module it was holding
        let finished: HashSet<ModuleId> = results
            .iter()
            .map(|result| match result {
                Ok(emitted) => emitted.id,
                Err(failure) => failure.id,
            })
            .collect();
        for id in ids.iter().filter(|id| !finished.contains(id)) {
            let output = output_path(&graph.module(*id).path, &options.dir_name);
            tracing::error!(path = %output.display(), "writer thread panicked");
            notify(options, ProgressMessage::Error(format!("writer thread panicked: {}", output.display())));
            results.push(Err(EmitFailure {
                id: *id,
                error: Error::Write {
                    path: output,
                    source: io::Error::other("writer thread panicked"),
                },
            }));
        }
    }
    results
}

fn emit_module(
    graph: &ModuleGraph,
    store: &dyn ModuleStore,
    options: &EmitOptions,
    id: ModuleId,
) -> Result<EmittedModule, EmitFailure> {
    let module = graph.module(id);
    let output = output_path(&module.path, &options.dir_name);
    let text = module.output();

    let status = if options.dry_run {
        None
    } else {
        match store.write_module(&output, &text) {
            Ok(status) => Some(status),
            Err(error) => {
                tracing::warn!(path = %output.display(), error = %error, "failed to write module");
                notify(options, ProgressMessage::Error(error.to_string()));
                return Err(EmitFailure { id, error });
            }
        }
    };

    if status.is_some() {
        tracing::info!(source = %module.path.display(), output = %output.display(), "wrote module");
    }
    notify(options, ProgressMessage::Progress {
        phase: ProgressPhase::Emitting,
        file: Some(output.display().to_string()),
    });

    Ok(EmittedModule {
        id,
        source: module.path.clone(),
        output,
        status,
        bytes: text.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::storage::{FsStore, MemoryStore};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/app/src/index.js"), "shaking"),
            PathBuf::from("/app/src/shaking/index.js")
        );
        assert_eq!(output_path(Path::new("/a.js"), "out"), PathBuf::from("/out/a.js"));
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::with_modules([
            ("/app/index.js", "import {a, b} from './lib/m.js';\nconsole.log(a);\n"),
            ("/app/lib/m.js", "export const a = 1;\nexport const b = 2;\nconst c = 3;\n"),
        ])
    }

    #[test]
    fn test_emit_writes_pruned_modules() {
        let store = sample_store();
        let graph = GraphBuilder::new(&store).build(Path::new("/app/index.js")).unwrap();
        let report = emit_graph(&graph, &store, &EmitOptions::default());

        assert!(report.is_success());
        assert_eq!(report.count(FileStatus::New), 2);
        assert_eq!(
            store.get(Path::new("/app/shaking/index.js")).unwrap(),
            "import {a} from './lib/m.js';\nconsole.log(a);\n"
        );
        assert_eq!(
            store.get(Path::new("/app/lib/shaking/m.js")).unwrap(),
            "export const a = 1;\nexport const b = 2;\n"
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let store = sample_store();
        let graph = GraphBuilder::new(&store).build(Path::new("/app/index.js")).unwrap();
        let options = EmitOptions {
            dry_run: true,
            ..EmitOptions::default()
        };
        let report = emit_graph(&graph, &store, &options);

        assert_eq!(report.emitted.len(), 2);
        assert!(report.emitted.iter().all(|m| m.status.is_none()));
        assert_eq!(store.paths().len(), 2);
    }

    #[test]
    fn test_parallel_emission_keeps_module_order() {
        let store = MemoryStore::with_modules([
            ("/index.js", "import './a.js';\nimport './b.js';\nimport './c.js';\n"),
            ("/a.js", "let a;\n"),
            ("/b.js", "let b;\n"),
            ("/c.js", "let c;\n"),
        ]);
        let graph = GraphBuilder::new(&store).build(Path::new("/index.js")).unwrap();
        let options = EmitOptions {
            jobs: 3,
            ..EmitOptions::default()
        };
        let report = emit_graph(&graph, &store, &options);

        let order: Vec<_> = report.emitted.iter().map(|m| m.id.index()).collect();
        assert_eq!(order, [0, 1, 2, 3]);
        assert_eq!(store.get(Path::new("/shaking/a.js")).unwrap(), "");
    }

    /// Panics when asked to write a path ending in `poison`
    struct PanickingStore {
        poison: &'static str,
    }

    impl ModuleStore for PanickingStore {
        fn read_module(&self, path: &Path) -> crate::Result<String> {
            Err(Error::ModuleNotFound {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }

        fn write_module(&self, path: &Path, _contents: &str) -> crate::Result<FileStatus> {
            if path.ends_with(self.poison) {
                panic!("disk on fire");
            }
            Ok(FileStatus::New)
        }
    }

    #[test]
    fn test_worker_panic_becomes_failure() {
        let store = MemoryStore::with_modules([
            ("/index.js", "import './a.js';\nimport './b.js';\n"),
            ("/a.js", "let a;\n"),
            ("/b.js", "let b;\n"),
        ]);
        let graph = GraphBuilder::new(&store).build(Path::new("/index.js")).unwrap();
        let options = EmitOptions {
            jobs: 2,
            ..EmitOptions::default()
        };
        let report = emit_graph(&graph, &PanickingStore { poison: "b.js" }, &options);

        assert_eq!(report.emitted.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id.index(), 2);
        assert!(matches!(
            &report.failures[0].error,
            Error::Write { path, .. } if path == Path::new("/shaking/b.js")
        ));
    }

    #[test]
    fn test_write_failure_is_per_module() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.js"), "import {x} from './sub/x.js';\nx();\n").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("x.js"), "export function x() {}\n").unwrap();
        // A file where the output directory should go
        fs::write(root.join("sub").join("shaking"), "").unwrap();

        let graph = GraphBuilder::new(&FsStore).build(&root.join("index.js")).unwrap();
        let report = emit_graph(&graph, &FsStore, &EmitOptions::default());

        assert_eq!(report.emitted.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, Error::Write { .. }));
        assert_eq!(
            fs::read_to_string(root.join("shaking").join("index.js")).unwrap(),
            "import {x} from './sub/x.js';\nx();\n"
        );
    }
}
