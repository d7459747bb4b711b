//! Module Graph - the modules reachable from an entry module
//!
//! The graph is built by a depth-first walk over each module's import
//! table. Every path is analysed once: a module imported from several
//! places is shared, and re-entering a module that is still being built
//! is a circular import.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::module::AnalyzedModule;
use crate::resolve::Resolver;
use crate::shake;
use crate::storage::ModuleStore;
use crate::syntax::JsParser;
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::{Error, Result};

/// Index of a module within its graph, in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A module and the dependencies it imports, in import-table order
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub id: ModuleId,
    pub module: Arc<AnalyzedModule>,
    pub children: Vec<ModuleId>,
}

/// Counters collected while building a graph
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BuildStats {
    /// Modules parsed and analysed during this build
    pub parsed: usize,
    /// Modules reused from the cache
    pub cache_hits: usize,
}

/// Arena of analysed modules rooted at the entry module
#[derive(Debug)]
pub struct ModuleGraph {
    modules: Vec<ModuleNode>,
    index: HashMap<PathBuf, ModuleId>,
    root: ModuleId,
    failures: Vec<Error>,
    stats: BuildStats,
}

impl ModuleGraph {
    pub fn root(&self) -> ModuleId {
        self.root
    }

    pub fn node(&self, id: ModuleId) -> &ModuleNode {
        &self.modules[id.index()]
    }

    pub fn module(&self, id: ModuleId) -> &AnalyzedModule {
        &self.modules[id.index()].module
    }

    pub fn find(&self, path: &Path) -> Option<ModuleId> {
        self.index.get(path).copied()
    }

    /// All modules, entry first then in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleNode> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Child failures recorded in keep-going mode
    pub fn failures(&self) -> &[Error] {
        &self.failures
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}

/// Analysed modules keyed by path and resolver extension, reused while
/// their text is unchanged.
///
/// Meant for long-lived processes that rebuild graphs repeatedly.
#[derive(Debug, Default)]
pub struct ModuleCache {
    entries: RwLock<HashMap<(PathBuf, String), Arc<AnalyzedModule>>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached module for `path` if it was analysed from text with
    /// this hash under the same resolver extension
    pub fn get(&self, path: &Path, extension: &str, hash: &blake3::Hash) -> Option<Arc<AnalyzedModule>> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&(path.to_path_buf(), extension.to_string()))
            .filter(|module| module.hash == *hash)
            .cloned()
    }

    pub fn insert(&self, extension: &str, module: Arc<AnalyzedModule>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((module.path.clone(), extension.to_string()), module);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutable state of one build
struct BuildState {
    parser: JsParser,
    modules: Vec<ModuleNode>,
    index: HashMap<PathBuf, ModuleId>,
    /// Paths currently being built, outermost first
    stack: Vec<PathBuf>,
    failed: HashSet<PathBuf>,
    failures: Vec<Error>,
    stats: BuildStats,
}

/// Builds a `ModuleGraph` from an entry module
pub struct GraphBuilder<'a> {
    store: &'a dyn ModuleStore,
    resolver: Resolver,
    keep_going: bool,
    cache: Option<&'a ModuleCache>,
    progress: Option<crossbeam::channel::Sender<ProgressMessage>>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a dyn ModuleStore) -> Self {
        Self {
            store,
            resolver: Resolver::default(),
            keep_going: false,
            cache: None,
            progress: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Record failing dependencies instead of aborting the build
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    pub fn with_cache(mut self, cache: &'a ModuleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_progress(mut self, progress: crossbeam::channel::Sender<ProgressMessage>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Build the graph reachable from `entry`.
    ///
    /// The entry module's own failure is always an error. A dependency's
    /// failure is an error too unless keep-going is set.
    pub fn build(&self, entry: &Path) -> Result<ModuleGraph> {
        let entry = self.resolver.resolve_entry(entry)?;
        let mut state = BuildState {
            parser: JsParser::new()?,
            modules: Vec::new(),
            index: HashMap::new(),
            stack: Vec::new(),
            failed: HashSet::new(),
            failures: Vec::new(),
            stats: BuildStats::default(),
        };

        self.notify(ProgressMessage::Started {
            phase: ProgressPhase::Analyzing,
            total: 0,
        });
        let root = self.visit(&entry, &mut state)?;
        self.notify(ProgressMessage::Finished {
            phase: ProgressPhase::Analyzing,
        });

        tracing::debug!(
            entry = %entry.display(),
            modules = state.modules.len(),
            parsed = state.stats.parsed,
            cache_hits = state.stats.cache_hits,
            failures = state.failures.len(),
            "built module graph"
        );

        Ok(ModuleGraph {
            modules: state.modules,
            index: state.index,
            root,
            failures: state.failures,
            stats: state.stats,
        })
    }

    fn notify(&self, message: ProgressMessage) {
        if let Some(tx) = &self.progress {
            tx.send(message).ok();
        }
    }

    fn visit(&self, path: &Path, state: &mut BuildState) -> Result<ModuleId> {
        if let Some(pos) = state.stack.iter().position(|p| p == path) {
            let mut cycle = state.stack[pos..].to_vec();
            cycle.push(path.to_path_buf());
            return Err(Error::CircularImport { cycle });
        }
        if let Some(&id) = state.index.get(path) {
            return Ok(id);
        }

        state.stack.push(path.to_path_buf());
        let result = self.build_node(path, state);
        state.stack.pop();
        result
    }

    fn build_node(&self, path: &Path, state: &mut BuildState) -> Result<ModuleId> {
        let module = self.load(path, state)?;
        let dependencies: Vec<PathBuf> = module.imports.paths().map(Path::to_path_buf).collect();

        let id = ModuleId(state.modules.len() as u32);
        state.index.insert(path.to_path_buf(), id);
        state.modules.push(ModuleNode {
            id,
            module,
            children: Vec::new(),
        });

        let mut children = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            if state.failed.contains(&dependency) {
                continue;
            }
            match self.visit(&dependency, state) {
                Ok(child) => children.push(child),
                Err(err) if self.keep_going => {
                    tracing::warn!(
                        module = %path.display(),
                        dependency = %dependency.display(),
                        error = %err,
                        "skipping failed dependency"
                    );
                    state.failed.insert(dependency);
                    state.failures.push(err);
                }
                Err(err) => return Err(err),
            }
        }
        state.modules[id.index()].children = children;
        Ok(id)
    }

    /// Read and analyse a module, or reuse the cached analysis
    fn load(&self, path: &Path, state: &mut BuildState) -> Result<Arc<AnalyzedModule>> {
        let source = self.store.read_module(path)?;
        self.notify(ProgressMessage::Progress {
            phase: ProgressPhase::Analyzing,
            file: Some(path.display().to_string()),
        });

        if let Some(cache) = self.cache {
            let hash = blake3::hash(source.as_bytes());
            if let Some(module) = cache.get(path, self.resolver.extension(), &hash) {
                tracing::debug!(path = %path.display(), "module cache hit");
                state.stats.cache_hits += 1;
                return Ok(module);
            }
        }

        let module = Arc::new(shake::analyze(
            &mut state.parser,
            &self.resolver,
            path,
            source,
        )?);
        state.stats.parsed += 1;
        if let Some(cache) = self.cache {
            cache.insert(self.resolver.extension(), Arc::clone(&module));
        }
        Ok(module)
    }
}
