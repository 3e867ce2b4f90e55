//! # Project Graph Library
//!
//! This library loads build-project descriptor files together with every
//! project they transitively reference, producing one in-memory collection
//! in which each distinct project (by canonical file path) appears exactly
//! once — no matter how many reference paths lead to it and no matter how
//! much of the discovery runs concurrently. It is used by the
//! `project-graph` command-line tool but can be embedded in any
//! application that needs to materialize a project reference graph.
//!
//! ## Quick Example
//!
//! ```
//! use project_graph::loader::{LoaderOptions, ProjectGraphLoader};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(
//!     dir.path().join("app.proj"),
//!     "items:\n  ProjectReference:\n    - lib.proj\n",
//! )
//! .unwrap();
//! std::fs::write(dir.path().join("lib.proj"), "").unwrap();
//!
//! let loader = ProjectGraphLoader::new(LoaderOptions::default());
//! let projects = loader.load_projects_and_references(&[dir.path().join("app.proj")]);
//!
//! assert_eq!(projects.len(), 2);
//! assert!(projects.contains(&dir.path().join("lib.proj")));
//! ```
//!
//! ## Core Concepts
//!
//! - **Loader (`loader`)**: the concurrent, deduplicating traversal. One
//!   task per load attempt, a shared visited set with an atomic
//!   test-and-insert gate, structured fan-out/fan-in so the call returns
//!   only when the whole closure is done.
//! - **Model (`model`)**: the parsed-project handle and the
//!   `DescriptorParser` seam, with a YAML descriptor format as the default
//!   implementation.
//! - **Statistics (`stats`)**: per-project load durations, insert-once,
//!   safe under concurrent writers.
//! - **Failure reporting (`logger`)**: individual project failures never
//!   abort a load; they are routed to an `ErrorLogger` and the node is
//!   excluded from the result.
//! - **Property generation (`props`)**: the companion generator that turns
//!   package manifests into a property-assignment descriptor.

pub mod error;
pub mod loader;
pub mod logger;
pub mod model;
pub mod path;
pub mod props;
pub mod stats;
