//! End-to-end schema assembly.
//!
//! resolve versions → fetch providers → generate fragments → anchor
//! upstream references → merge → check references.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::cache::ProviderCache;
use crate::error::AssembleError;
use crate::linter::check_references;
use crate::manifest::VersionResolver;
use crate::merge::merge;
use crate::modules::{all_modules, ModuleGenerator, ProviderSet};
use crate::refs::RewriteRule;
use crate::rewriter::rewrite_fragment;
use crate::types::{PackageSpec, PACKAGE_NAME};

/// Inputs for one assembly run.
pub struct AssembleOptions {
    resolver: VersionResolver,
    version: Option<String>,
    modules: Vec<Box<dyn ModuleGenerator>>,
}

impl AssembleOptions {
    /// Options assembling every module, with versions from `resolver`.
    pub fn new(resolver: VersionResolver) -> Self {
        Self {
            resolver,
            version: None,
            modules: all_modules(),
        }
    }

    /// Version stamped into the assembled document.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Replace the module list; merge order follows the order given.
    pub fn with_modules(mut self, modules: Vec<Box<dyn ModuleGenerator>>) -> Self {
        self.modules = modules;
        self
    }

    /// Upstream providers needed by the configured modules.
    pub fn required_providers(&self) -> BTreeSet<&'static str> {
        self.modules
            .iter()
            .flat_map(|m| m.providers().iter().copied())
            .collect()
    }
}

/// Assemble the component schema.
///
/// Every provider version is resolved before anything is fetched, so a
/// missing declaration fails without network traffic.
pub fn assemble(options: &AssembleOptions, cache: &ProviderCache) -> Result<PackageSpec, AssembleError> {
    let versions = options.resolver.resolve(options.required_providers())?;
    for (name, version) in &versions {
        debug!("provider {} resolved to {}", name, version);
    }

    let mut providers = ProviderSet::new();
    let mut rules = Vec::new();
    for (name, version) in &versions {
        let descriptor = cache.resolve(name, version)?;
        rules.extend(RewriteRule::anchor(&descriptor)?);
        providers.insert(descriptor);
    }

    let mut fragments = Vec::with_capacity(options.modules.len());
    for module in &options.modules {
        let fragment = module.generate(&providers)?;
        info!(
            "module '{}' generated {} resource(s), {} type(s), {} function(s)",
            module.name(),
            fragment.resources.len(),
            fragment.types.len(),
            fragment.functions.len()
        );
        fragments.push(rewrite_fragment(fragment, &rules));
    }

    let document = merge(base_document(options.version.as_deref(), &versions), fragments)?;

    let declared: BTreeMap<String, String> = providers
        .iter()
        .map(|p| (p.name.clone(), p.ref_version()))
        .collect();
    let diagnostics = check_references(&to_value(&document)?, Some(&declared));
    if !diagnostics.is_empty() {
        return Err(AssembleError::InvalidReferences { diagnostics });
    }

    Ok(document)
}

/// The package metadata every fragment is merged into.
///
/// `versions` supplies the provider versions quoted in the per-language
/// dependency blocks; providers missing from it are left out of those blocks.
pub fn base_document(version: Option<&str>, versions: &BTreeMap<String, String>) -> PackageSpec {
    let aws = versions.get("aws").map(String::as_str);
    let docker = versions.get("docker").map(String::as_str);
    let description = "Pulumi Amazon Web Services (AWS) AWSX Components.";

    let mut nodejs_dependencies = Map::new();
    nodejs_dependencies.insert("@aws-sdk/client-ecs".into(), json!("^3.405.0"));
    nodejs_dependencies.insert("@pulumi/pulumi".into(), json!("^3.0.0"));
    if let Some(aws) = aws {
        nodejs_dependencies.insert("@pulumi/aws".into(), json!(format!("^{}", aws)));
    }
    if let Some(docker) = docker {
        nodejs_dependencies.insert("@pulumi/docker".into(), json!(format!("^{}", docker)));
    }
    nodejs_dependencies.insert("@types/aws-lambda".into(), json!("^8.10.23"));
    nodejs_dependencies.insert("aws-sdk".into(), json!("^2.1450.0"));
    nodejs_dependencies.insert("mime".into(), json!("^2.0.0"));

    let mut python_requires = Map::new();
    python_requires.insert("pulumi".into(), json!(">=3.76.1,<4.0.0"));
    python_requires.insert("pulumi-aws".into(), json!(">=6.0.4,<7.0.0"));
    if let Some(docker) = docker {
        python_requires.insert("pulumi-docker".into(), json!(format!(">={},<4.0.0", docker)));
    }

    let mut language = BTreeMap::new();
    language.insert(
        "csharp".to_string(),
        json!({
            "packageReferences": {
                "Pulumi": "3.*",
                "Pulumi.Aws": "6.*",
                "Pulumi.Docker": "3.*"
            },
            "liftSingleValueMethodReturns": true
        }),
    );
    language.insert(
        "go".to_string(),
        json!({
            "generateResourceContainerTypes": true,
            "importBasePath": "github.com/pulumi/pulumi-awsx/sdk/v2/go/awsx",
            "liftSingleValueMethodReturns": true,
            "internalDependencies": ["github.com/pulumi/pulumi-docker/sdk/v3/go/docker"]
        }),
    );
    if let Some(aws) = aws {
        language.insert(
            "java".to_string(),
            json!({ "dependencies": { "com.pulumi:aws": aws } }),
        );
    }
    language.insert(
        "nodejs".to_string(),
        json!({
            "dependencies": nodejs_dependencies,
            "devDependencies": {
                "@types/node": "^18",
                "@types/mime": "^2.0.0",
                "typescript": "^4.6.2"
            }
        }),
    );
    language.insert(
        "python".to_string(),
        json!({
            "requires": python_requires,
            "usesIOClasses": true,
            "readme": description,
            "liftSingleValueMethodReturns": true
        }),
    );

    PackageSpec {
        name: PACKAGE_NAME.to_string(),
        display_name: Some("AWSx (Pulumi Crosswalk for AWS)".to_string()),
        version: version.filter(|v| !v.is_empty()).map(str::to_string),
        description: Some(description.to_string()),
        keywords: ["pulumi", "aws", "awsx", "kind/component", "category/cloud"]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        homepage: Some("https://pulumi.com".to_string()),
        license: Some("Apache-2.0".to_string()),
        repository: Some("https://github.com/pulumi/pulumi-awsx".to_string()),
        publisher: Some("Pulumi".to_string()),
        language,
        ..PackageSpec::default()
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, AssembleError> {
    serde_json::to_value(value).map_err(|source| AssembleError::InvalidJson {
        origin: "assembled schema".to_string(),
        source,
    })
}

/// Copy of `value` with every object's keys in sorted order.
pub fn to_sorted_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), to_sorted_json(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(to_sorted_json).collect()),
        other => other.clone(),
    }
}

/// `schema.json` contents: sorted keys, four-space indent, trailing newline.
pub fn schema_json_bytes(document: &PackageSpec) -> Result<Vec<u8>, AssembleError> {
    let sorted = to_sorted_json(&to_value(document)?);

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    sorted
        .serialize(&mut serializer)
        .map_err(|source| AssembleError::InvalidJson {
            origin: "assembled schema".to_string(),
            source,
        })?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("aws".to_string(), "6.0.4".to_string()),
            ("docker".to_string(), "3.6.1".to_string()),
        ])
    }

    #[test]
    fn base_document_quotes_provider_versions() {
        let base = base_document(Some("2.0.0"), &versions());
        assert_eq!(base.name, "awsx");
        assert_eq!(base.version.as_deref(), Some("2.0.0"));
        assert_eq!(base.language["java"]["dependencies"]["com.pulumi:aws"], json!("6.0.4"));
        assert_eq!(base.language["nodejs"]["dependencies"]["@pulumi/docker"], json!("^3.6.1"));
        assert_eq!(
            base.language["python"]["requires"]["pulumi-docker"],
            json!(">=3.6.1,<4.0.0")
        );
        assert!(base.resources.is_empty());
    }

    #[test]
    fn base_document_without_docker_omits_it() {
        let base = base_document(None, &BTreeMap::from([("aws".to_string(), "6.0.4".to_string())]));
        assert!(base.version.is_none());
        assert!(base.language["nodejs"]["dependencies"].get("@pulumi/docker").is_none());
        assert!(base.language["python"]["requires"].get("pulumi-docker").is_none());
    }

    #[test]
    fn sorted_json_orders_nested_keys() {
        let value = json!({ "b": { "z": 1, "a": [ { "y": 0, "x": 0 } ] }, "a": 0 });
        let sorted = to_sorted_json(&value);
        let text = serde_json::to_string(&sorted).unwrap();
        assert_eq!(text, r#"{"a":0,"b":{"a":[{"x":0,"y":0}],"z":1}}"#);
    }

    #[test]
    fn schema_bytes_use_four_space_indent() {
        let bytes = schema_json_bytes(&base_document(None, &versions())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n    \"description\""));
        assert!(text.ends_with("}\n"));
    }
}
