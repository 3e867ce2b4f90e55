//! # Property File Generation
//!
//! Companion to the graph loader: reads package manifests and emits one
//! property-assignment descriptor that projects can pull in through the
//! loader's global properties or reference directly. Plain sequential I/O,
//! no concurrency.
//!
//! A manifest is a YAML sequence of `{id, version}` entries:
//!
//! ```yaml
//! - id: Acme.Logging
//!   version: 2.1.0
//! - id: Acme.Net
//!   version: 0.9.4
//! ```
//!
//! Each package becomes one property in the output descriptor, with dots
//! in the id flattened to underscores in the property name:
//!
//! ```yaml
//! properties:
//!   PkgAcme_Logging: packages/Acme.Logging.2.1.0
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One package pulled out of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub id: String,
    pub version: String,
}

/// Raw manifest entry before validation; both fields optional so that
/// incomplete entries can be skipped rather than failing the manifest.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Shape of the emitted property-assignment descriptor.
#[derive(Debug, Serialize)]
struct PropsDescriptor {
    properties: BTreeMap<String, String>,
}

/// Generates a property-assignment descriptor from package manifests.
pub struct PropertyGenerator {
    manifest_paths: Vec<PathBuf>,
}

impl PropertyGenerator {
    pub fn new(manifest_paths: Vec<PathBuf>) -> Self {
        Self { manifest_paths }
    }

    /// Parse all manifests and write the combined property file.
    ///
    /// Property names are `{name_prefix}{id}` with `.` flattened to `_`;
    /// values are `{value_prefix}{id}.{version}`.
    pub fn generate(
        &self,
        output_path: &Path,
        name_prefix: &str,
        value_prefix: &str,
    ) -> Result<()> {
        let mut properties = BTreeMap::new();
        for package in self.parse_manifests()? {
            let name = format!("{}{}", name_prefix, package.id.replace('.', "_"));
            let value = format!("{}{}.{}", value_prefix, package.id, package.version);
            properties.insert(name, value);
        }

        let descriptor = PropsDescriptor { properties };
        let rendered = serde_yaml::to_string(&descriptor)?;
        fs::write(output_path, rendered).map_err(|e| Error::PropertyFile {
            message: format!("failed to write {}: {}", output_path.display(), e),
        })?;

        log::debug!(
            "wrote {} properties to {}",
            descriptor.properties.len(),
            output_path.display()
        );
        Ok(())
    }

    /// Collect package entries from every manifest.
    ///
    /// Blank and non-existent manifest paths are skipped. Entries missing
    /// an id or version (or with blank values) are skipped. Ids collide
    /// case-insensitively; the last manifest wins.
    fn parse_manifests(&self) -> Result<Vec<PackageEntry>> {
        let mut packages: HashMap<String, PackageEntry> = HashMap::new();

        for manifest_path in self
            .manifest_paths
            .iter()
            .filter(|p| !p.as_os_str().is_empty() && p.exists())
        {
            let text = fs::read_to_string(manifest_path)?;
            let entries: Vec<RawEntry> =
                serde_yaml::from_str(&text).map_err(|e| Error::Manifest {
                    path: manifest_path.display().to_string(),
                    message: e.to_string(),
                })?;

            for entry in entries {
                let (id, version) = match (entry.id, entry.version) {
                    (Some(id), Some(version)) => (id, version),
                    _ => continue,
                };
                if id.trim().is_empty() || version.trim().is_empty() {
                    continue;
                }
                packages.insert(id.to_lowercase(), PackageEntry { id, version });
            }
        }

        let mut collected: Vec<PackageEntry> = packages.into_values().collect();
        collected.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(collected)
    }
}
