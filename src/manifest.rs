//! Dependency manifest reading and provider version resolution.
//!
//! Upstream provider versions come from the `dependencies` object of a
//! `package.json`-style manifest, keyed by npm package (`@pulumi/aws`).
//! Providers that are not npm dependencies of the component package are
//! declared with explicit pins instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::AssembleError;
use crate::loader::load_json;

/// Version used for `aws-native` types unless overridden.
///
/// The component package does not depend on `aws-native` at runtime; only
/// its container-definition types are borrowed.
pub const AWS_NATIVE_VERSION: &str = "0.72.0";

/// npm package that declares the version of an upstream provider.
pub fn package_for(provider: &str) -> String {
    format!("@pulumi/{}", provider)
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

/// Parsed dependency manifest.
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    path: PathBuf,
    dependencies: BTreeMap<String, String>,
}

impl DependencyManifest {
    /// Read the manifest at `path`.
    ///
    /// # Errors
    ///
    /// `Io` / `InvalidJson` if the file can't be read or parsed, `Manifest` if
    /// `dependencies` is not a map of strings.
    pub fn load(path: &Path) -> Result<Self, AssembleError> {
        let raw = load_json(path)?;
        let parsed: PackageJson =
            serde_json::from_value(raw).map_err(|e| AssembleError::Manifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(
            "read {} dependencies from {}",
            parsed.dependencies.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            dependencies: parsed.dependencies,
        })
    }

    /// Build a manifest from in-memory entries; `path` is only used in
    /// error messages.
    pub fn from_entries<I, K, V>(path: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path: path.into(),
            dependencies: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared version of an npm package, with range operators removed.
    pub fn dependency(&self, package: &str) -> Option<&str> {
        self.dependencies
            .get(package)
            .map(|v| v.trim_start_matches(&['^', '~', '='][..]))
            .filter(|v| !v.is_empty())
    }
}

/// Resolves provider names to versions from a manifest plus explicit pins.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    manifest: DependencyManifest,
    pins: BTreeMap<String, String>,
}

impl VersionResolver {
    /// A resolver with the default `aws-native` pin.
    pub fn new(manifest: DependencyManifest) -> Self {
        let mut pins = BTreeMap::new();
        pins.insert("aws-native".to_string(), AWS_NATIVE_VERSION.to_string());
        Self { manifest, pins }
    }

    /// Declare (or replace) the version of a provider. Pins take precedence
    /// over the manifest.
    pub fn pin(mut self, provider: impl Into<String>, version: impl Into<String>) -> Self {
        self.pins.insert(provider.into(), version.into());
        self
    }

    pub fn pins(&self) -> &BTreeMap<String, String> {
        &self.pins
    }

    /// Version for a single provider.
    pub fn version_of(&self, provider: &str) -> Result<String, AssembleError> {
        if let Some(pinned) = self.pins.get(provider) {
            return Ok(pinned.clone());
        }
        self.manifest
            .dependency(&package_for(provider))
            .map(str::to_string)
            .ok_or_else(|| AssembleError::MissingDependency {
                provider: provider.to_string(),
                manifest: self.manifest.path().to_path_buf(),
            })
    }

    /// Versions for every named provider. Fails on the first provider with
    /// no declaration; nothing is fetched by this call.
    pub fn resolve<'a, I>(&self, providers: I) -> Result<BTreeMap<String, String>, AssembleError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        providers
            .into_iter()
            .map(|name| Ok((name.to_string(), self.version_of(name)?)))
            .collect()
    }
}

/// Parse a `name=version` pin.
pub fn parse_pin(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok((name.to_string(), version.to_string()))
        }
        _ => Err(format!("expected <provider>=<version>, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn manifest() -> DependencyManifest {
        DependencyManifest::from_entries(
            "awsx/package.json",
            [("@pulumi/aws", "6.0.4"), ("@pulumi/docker", "^3.6.1")],
        )
    }

    #[test]
    fn load_reads_dependencies() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"name": "@pulumi/awsx", "dependencies": {{"@pulumi/aws": "6.0.4"}}}}"#
        )
        .unwrap();

        let manifest = DependencyManifest::load(file.path()).unwrap();
        assert_eq!(manifest.dependency("@pulumi/aws"), Some("6.0.4"));
        assert_eq!(manifest.dependency("@pulumi/docker"), None);
    }

    #[test]
    fn load_rejects_non_string_versions() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"dependencies": {{"@pulumi/aws": 6}}}}"#).unwrap();
        assert!(matches!(
            DependencyManifest::load(file.path()),
            Err(AssembleError::Manifest { .. })
        ));
    }

    #[test]
    fn range_operators_are_dropped() {
        assert_eq!(manifest().dependency("@pulumi/docker"), Some("3.6.1"));
    }

    #[test]
    fn resolve_uses_manifest_and_default_pin() {
        let versions = VersionResolver::new(manifest())
            .resolve(["aws", "aws-native", "docker"])
            .unwrap();
        assert_eq!(versions["aws"], "6.0.4");
        assert_eq!(versions["aws-native"], AWS_NATIVE_VERSION);
        assert_eq!(versions["docker"], "3.6.1");
    }

    #[test]
    fn pins_override_manifest() {
        let resolver = VersionResolver::new(manifest()).pin("aws", "6.1.0");
        assert_eq!(resolver.version_of("aws").unwrap(), "6.1.0");
    }

    #[test]
    fn missing_provider_names_provider_and_manifest() {
        let err = VersionResolver::new(manifest())
            .resolve(["aws", "random"])
            .unwrap_err();
        match err {
            AssembleError::MissingDependency { provider, manifest } => {
                assert_eq!(provider, "random");
                assert_eq!(manifest, PathBuf::from("awsx/package.json"));
            }
            other => panic!("expected missing dependency, got {other:?}"),
        }
    }

    #[test]
    fn parse_pin_forms() {
        assert_eq!(
            parse_pin("aws-native=0.80.0").unwrap(),
            ("aws-native".to_string(), "0.80.0".to_string())
        );
        assert!(parse_pin("aws").is_err());
        assert!(parse_pin("=1.0").is_err());
    }
}
