//! Load command implementation
//!
//! Runs the graph loader over the given root descriptors, prints the
//! deduplicated closure, and reports per-project load durations
//! slowest-first. Individual project failures are logged by the loader and
//! do not fail the command; the exit code reflects usage errors only.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use project_graph::loader::{LoaderOptions, ProjectGraphLoader, DEFAULT_TRAVERSAL_ITEM_NAME};
use project_graph::model::ParseMode;

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Paths to the root project descriptors
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Global property applied to every project (repeatable)
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Tools version every descriptor is parsed against
    #[arg(long, value_name = "VERSION", default_value = "1.0")]
    pub tools_version: String,

    /// Tolerate malformed descriptor constructs instead of rejecting them
    #[arg(long)]
    pub lenient: bool,

    /// Skip collecting per-project load durations
    #[arg(long)]
    pub no_stats: bool,

    /// Item list read from traversal projects
    #[arg(long, value_name = "NAME", default_value = DEFAULT_TRAVERSAL_ITEM_NAME)]
    pub traversal_item: String,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the load command
pub fn execute(args: LoadArgs) -> Result<()> {
    let global_properties = parse_property_overrides(&args.properties)?;

    let options = LoaderOptions {
        global_properties,
        tools_version: args.tools_version.clone(),
        parse_mode: if args.lenient {
            ParseMode::Lenient
        } else {
            ParseMode::Strict
        },
        collect_stats: !args.no_stats,
        traversal_item_name: args.traversal_item.clone(),
    };

    let loader = ProjectGraphLoader::new(options);
    let projects = loader.load_projects_and_references(&args.paths);

    if !args.quiet {
        println!("Loaded {} projects", projects.len());
        let mut paths: Vec<String> = projects
            .iter()
            .map(|project| project.path().display().to_string())
            .collect();
        paths.sort();
        for path in paths {
            println!("  {}", path);
        }

        if !args.no_stats && !projects.is_empty() {
            let mut timings: Vec<(String, std::time::Duration)> =
                loader.statistics().snapshot().into_iter().collect();
            timings.sort_by(|a, b| b.1.cmp(&a.1));

            println!();
            println!("Load times (slowest first):");
            for (key, duration) in timings {
                println!("  {:>8.2}ms  {}", duration.as_secs_f64() * 1000.0, key);
            }
        }
    }

    Ok(())
}

/// Parse repeated `KEY=VALUE` overrides into a property map.
fn parse_property_overrides(overrides: &[String]) -> Result<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();
    for entry in overrides {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("invalid property override `{}`, expected KEY=VALUE", entry)
        })?;
        if key.is_empty() {
            anyhow::bail!("invalid property override `{}`, empty key", entry);
        }
        properties.insert(key.to_string(), value.to_string());
    }
    Ok(properties)
}
