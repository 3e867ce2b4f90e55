//! # Concurrent Project Graph Loader
//!
//! The core of this crate: given a set of root descriptor paths, load every
//! project they transitively reference into one collection in which each
//! distinct project (by canonical path) appears exactly once.
//!
//! ## Traversal
//!
//! `load_projects_and_references` spawns one task per root inside a single
//! `rayon::scope`; every task that parses a project spawns one more task
//! per discovered reference. The scope join is the structured fan-in: the
//! call returns only once the whole transitive closure has completed, and
//! the rayon worker pool bounds how many parses run at the same time.
//!
//! ## Deduplication
//!
//! All tasks of one call share a visited set of canonical paths. The
//! "have we seen this path" check and the "mark it seen" mutation happen
//! under one lock acquisition, so no two tasks can both decide to load the
//! same path. The critical section contains no parsing or I/O. A path is
//! marked before its parse outcome is known: a second discovery of a path
//! that is currently failing (or has failed) is treated as already handled
//! and produces no second parse and no second log entry.
//!
//! ## Failure isolation
//!
//! A project that fails to parse is reported to the error sink and pruned;
//! siblings and ancestors keep loading, and everything reachable without
//! going through the failed node still appears in the result. No failure
//! aborts the call.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::logger::{DefaultErrorLogger, ErrorLogger, SourceLocation};
use crate::model::{DescriptorParser, ParseFailure, ParseMode, Project, YamlDescriptorParser};
use crate::path::{canonical_key, resolve_reference};
use crate::stats::LoadStatistics;

/// The item list every project contributes reference edges from.
pub const PROJECT_REFERENCE_ITEM_NAME: &str = "ProjectReference";

/// Default item list a traversal project lists further project files in.
pub const DEFAULT_TRAVERSAL_ITEM_NAME: &str = "ProjectFile";

/// Property consulted by the default traversal predicate.
const IS_TRAVERSAL_PROPERTY: &str = "IsTraversal";

/// Decides whether a parsed project is a traversal project.
pub type TraversalPredicate = Box<dyn Fn(&Project) -> bool + Send + Sync>;

/// Loader configuration, fixed for the lifetime of the loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Properties applied to every parsed project. Global values override
    /// a descriptor's own definitions.
    pub global_properties: BTreeMap<String, String>,
    /// Schema/compat version passed to every parse.
    pub tools_version: String,
    /// How permissively malformed descriptors are tolerated.
    pub parse_mode: ParseMode,
    /// Whether per-project load durations are collected.
    pub collect_stats: bool,
    /// Item list read from traversal projects in addition to the standard
    /// reference list.
    pub traversal_item_name: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            global_properties: BTreeMap::new(),
            tools_version: "1.0".to_string(),
            parse_mode: ParseMode::default(),
            collect_stats: true,
            traversal_item_name: DEFAULT_TRAVERSAL_ITEM_NAME.to_string(),
        }
    }
}

/// Cloneable cancellation handle shared with every traversal task.
///
/// Cancelling stops the loader from issuing new parses; in-flight parses
/// finish normally and their results are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The deduplicated output of one load call.
///
/// Every contained project was parsed with the same global properties and
/// tools version. Sibling ordering is unspecified; the collection is owned
/// by the caller once the call returns.
#[derive(Debug)]
pub struct LoadedProjects {
    global_properties: BTreeMap<String, String>,
    tools_version: String,
    projects: Vec<Project>,
}

impl LoadedProjects {
    fn new(
        global_properties: BTreeMap<String, String>,
        tools_version: String,
        projects: Vec<Project>,
    ) -> Self {
        Self {
            global_properties,
            tools_version,
            projects,
        }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    /// Look up a loaded project by path, using canonical path identity.
    pub fn get(&self, path: &Path) -> Option<&Project> {
        let key = canonical_key(path);
        self.projects
            .iter()
            .find(|project| canonical_key(project.path()) == key)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// The global properties every contained project was evaluated with.
    pub fn global_properties(&self) -> &BTreeMap<String, String> {
        &self.global_properties
    }

    /// The tools version every contained project was parsed against.
    pub fn tools_version(&self) -> &str {
        &self.tools_version
    }
}

impl<'a> IntoIterator for &'a LoadedProjects {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}

/// Loads project descriptors and their transitive references.
pub struct ProjectGraphLoader {
    options: LoaderOptions,
    is_traversal_project: TraversalPredicate,
    parser: Box<dyn DescriptorParser>,
    logger: Box<dyn ErrorLogger>,
    statistics: LoadStatistics,
}

impl ProjectGraphLoader {
    /// Create a loader with the default YAML parser and `log`-backed error
    /// sink.
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_collaborators(
            options,
            Box::new(YamlDescriptorParser::new()),
            Box::new(DefaultErrorLogger),
        )
    }

    /// Create a loader with custom parser and error sink implementations.
    pub fn with_collaborators(
        options: LoaderOptions,
        parser: Box<dyn DescriptorParser>,
        logger: Box<dyn ErrorLogger>,
    ) -> Self {
        Self {
            options,
            is_traversal_project: Box::new(|project: &Project| {
                project.property(IS_TRAVERSAL_PROPERTY) == Some("true")
            }),
            parser,
            logger,
            statistics: LoadStatistics::new(),
        }
    }

    /// Replace the predicate that decides whether a parsed project is a
    /// traversal project. Part of loader construction; the traversal itself
    /// never mutates it.
    pub fn with_traversal_predicate(mut self, predicate: TraversalPredicate) -> Self {
        self.is_traversal_project = predicate;
        self
    }

    /// Per-project load durations collected so far.
    pub fn statistics(&self) -> &LoadStatistics {
        &self.statistics
    }

    /// Load the given root projects and everything they transitively
    /// reference.
    ///
    /// The input may be empty, contain duplicates, or name files that do
    /// not exist. Failures of individual projects are reported to the error
    /// sink and excluded; the call itself always succeeds and returns once
    /// the full closure has been visited.
    pub fn load_projects_and_references(&self, root_paths: &[PathBuf]) -> LoadedProjects {
        self.load_projects_and_references_cancellable(root_paths, &CancelToken::new())
    }

    /// Like [`load_projects_and_references`](Self::load_projects_and_references),
    /// with a cancellation handle. Cancelling stops new parses promptly;
    /// projects already loaded remain in the result.
    pub fn load_projects_and_references_cancellable(
        &self,
        root_paths: &[PathBuf],
        cancel: &CancelToken,
    ) -> LoadedProjects {
        // Both live on this frame and are shared by reference into every
        // spawned task; the scope join below guarantees no task outlives
        // them.
        let visited: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
        let loaded: Mutex<Vec<Project>> = Mutex::new(Vec::new());

        rayon::scope(|scope| {
            for root in root_paths {
                let path = root.clone();
                let visited = &visited;
                let loaded = &loaded;
                scope.spawn(move |scope| self.load_one(path, visited, loaded, cancel, scope));
            }
        });

        LoadedProjects::new(
            self.options.global_properties.clone(),
            self.options.tools_version.clone(),
            loaded.into_inner().unwrap(),
        )
    }

    /// One traversal step: gate on the visited set, parse, record, fan out.
    fn load_one<'s>(
        &'s self,
        path: PathBuf,
        visited: &'s Mutex<HashSet<String>>,
        loaded: &'s Mutex<Vec<Project>>,
        cancel: &'s CancelToken,
        scope: &rayon::Scope<'s>,
    ) {
        if cancel.is_cancelled() {
            return;
        }

        let key = canonical_key(&path);

        // Atomic test-and-insert: whichever task wins this gate owns the
        // load; everyone else backs off silently. Nothing slow happens
        // while the lock is held.
        {
            let mut seen = visited.lock().unwrap();
            if !seen.insert(key.clone()) {
                return;
            }
        }

        let started = Instant::now();
        let project = match self.parser.parse(
            &path,
            &self.options.global_properties,
            &self.options.tools_version,
            self.options.parse_mode,
        ) {
            Ok(project) => project,
            Err(ParseFailure::Invalid(detail)) => {
                let location = SourceLocation::from(&detail);
                self.logger.log_error(Some(&location), &detail.message);
                return;
            }
            Err(ParseFailure::Other(message)) => {
                self.logger.log_error(None, &message);
                return;
            }
        };

        if self.options.collect_stats {
            // The dedup gate means the key cannot already be present; a
            // duplicate is ignored rather than treated as an error.
            self.statistics.record_if_absent(&key, started.elapsed());
        }

        let references = self.collect_references(&project);
        loaded.lock().unwrap().push(project);

        for target in references {
            if cancel.is_cancelled() {
                break;
            }
            scope.spawn(move |scope| self.load_one(target, visited, loaded, cancel, scope));
        }
    }

    /// Resolve the reference edges of a freshly parsed project: the
    /// standard reference list plus, for traversal projects, the configured
    /// traversal item list.
    fn collect_references(&self, project: &Project) -> Vec<PathBuf> {
        let mut items = project.items(PROJECT_REFERENCE_ITEM_NAME).to_vec();
        if (self.is_traversal_project)(project) {
            items.extend_from_slice(project.items(&self.options.traversal_item_name));
        }

        items
            .iter()
            .map(|item| resolve_reference(&item.evaluated_value, &item.declaring_directory))
            .collect()
    }
}
