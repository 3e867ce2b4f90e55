//! Gen-props command implementation
//!
//! Runs the property generator over the given package manifests and writes
//! one property-assignment descriptor.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use project_graph::props::PropertyGenerator;

/// Arguments for the gen-props command
#[derive(Args, Debug)]
pub struct GenPropsArgs {
    /// Paths to the package manifests to combine
    #[arg(required = true, value_name = "MANIFEST")]
    pub manifests: Vec<PathBuf>,

    /// Path of the property descriptor to write
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Prefix prepended to every generated property name
    #[arg(long, value_name = "PREFIX", default_value = "Pkg")]
    pub name_prefix: String,

    /// Prefix prepended to every generated property value
    #[arg(long, value_name = "PREFIX", default_value = "")]
    pub value_prefix: String,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the gen-props command
pub fn execute(args: GenPropsArgs) -> Result<()> {
    let generator = PropertyGenerator::new(args.manifests);
    generator.generate(&args.output, &args.name_prefix, &args.value_prefix)?;

    if !args.quiet {
        println!("Wrote {}", args.output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_execute_writes_output() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("packages.yaml");
        fs::write(&manifest, "- id: Acme.Net\n  version: 0.9.4\n").unwrap();
        let output = dir.path().join("packages.props");

        let args = GenPropsArgs {
            manifests: vec![manifest],
            output: output.clone(),
            name_prefix: "Pkg".to_string(),
            value_prefix: String::new(),
            quiet: true,
        };

        assert!(execute(args).is_ok());
        assert!(fs::read_to_string(&output).unwrap().contains("PkgAcme_Net"));
    }

    #[test]
    fn test_execute_unwritable_output_fails() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("packages.yaml");
        fs::write(&manifest, "- id: A\n  version: 1.0.0\n").unwrap();

        let args = GenPropsArgs {
            manifests: vec![manifest],
            output: dir.path().join("missing-dir").join("out.props"),
            name_prefix: "Pkg".to_string(),
            value_prefix: String::new(),
            quiet: true,
        };

        assert!(execute(args).is_err());
    }
}
