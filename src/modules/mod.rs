//! Per-area module generators.
//!
//! Each generator reads template resources from the resolved provider
//! documents and returns a [`Fragment`]. References inside a fragment are
//! either local to the `awsx` package or written in the upstream form
//! (`#/types/aws:...`), which the assembler anchors to the provider version
//! before merging.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::curation::Properties;
use crate::error::AssembleError;
use crate::refs::{type_ref, upstream_ref, RefKind};
use crate::types::{ComplexTypeSpec, Fragment, PackageSpec, PropertySpec, ProviderDescriptor, ResourceSpec, TypeSpec};

mod apigatewayv2;
mod cloudtrail;
mod cloudwatch;
mod ec2;
mod ecr;
mod ecs;
mod iam;
mod lb;
mod s3;

pub use apigatewayv2::ApiGatewayV2;
pub use cloudtrail::Cloudtrail;
pub use cloudwatch::Cloudwatch;
pub use ec2::Ec2;
pub use ecr::Ecr;
pub use ecs::Ecs;
pub use iam::Iam;
pub use lb::Lb;
pub use s3::S3;

/// A generator for one functional area.
///
/// Generators share no state; each only reads the provider set.
pub trait ModuleGenerator: Send + Sync {
    /// Short name used in logs and error reports (`"ecs"`, `"lb"`, ...).
    fn name(&self) -> &'static str;

    /// Upstream providers this module reads templates from or refers to.
    fn providers(&self) -> &'static [&'static str];

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError>;
}

/// Every module, in merge order.
pub fn all_modules() -> Vec<Box<dyn ModuleGenerator>> {
    vec![
        Box::new(Cloudtrail),
        Box::new(Ecs),
        Box::new(Lb),
        Box::new(Cloudwatch),
        Box::new(Iam),
        Box::new(S3),
        Box::new(Ec2),
        Box::new(Ecr),
        Box::new(ApiGatewayV2),
    ]
}

/// Provider documents resolved for this run, keyed by provider name.
#[derive(Debug, Clone, Default)]
pub struct ProviderSet {
    providers: BTreeMap<String, Arc<ProviderDescriptor>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, provider: Arc<ProviderDescriptor>) {
        self.providers.insert(provider.name.clone(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(name).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.values().map(Arc::as_ref)
    }

    fn document(&self, module: &str, provider: &str, template: &str) -> Result<&PackageSpec, AssembleError> {
        self.get(provider)
            .map(|p| &p.document)
            .ok_or_else(|| AssembleError::shape(module, template, provider, "has no resolved provider"))
    }

    /// A template resource, by exact upstream token.
    pub fn resource(&self, module: &str, provider: &str, token: &str) -> Result<&ResourceSpec, AssembleError> {
        self.document(module, provider, token)?
            .resources
            .get(token)
            .ok_or_else(|| AssembleError::shape(module, token, provider, "is absent from provider"))
    }

    /// A template type, by exact upstream token.
    pub fn complex_type(&self, module: &str, provider: &str, token: &str) -> Result<&ComplexTypeSpec, AssembleError> {
        self.document(module, provider, token)?
            .types
            .get(token)
            .ok_or_else(|| AssembleError::shape(module, token, provider, "is absent from provider"))
    }
}

impl FromIterator<Arc<ProviderDescriptor>> for ProviderSet {
    fn from_iter<I: IntoIterator<Item = Arc<ProviderDescriptor>>>(iter: I) -> Self {
        let mut set = Self::new();
        for provider in iter {
            set.insert(provider);
        }
        set
    }
}

// Shorthands shared by the module files.

pub(crate) fn prop(type_spec: TypeSpec, description: &str) -> PropertySpec {
    PropertySpec::new(type_spec, description)
}

pub(crate) fn props<const N: usize>(entries: [(&str, PropertySpec); N]) -> Properties {
    entries
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect()
}

/// Reference to a type of this package.
pub(crate) fn local(name: &str) -> TypeSpec {
    TypeSpec::reference(type_ref(name))
}

/// Reference to an `aws` resource, e.g. `aws_resource("ec2%2fvpc:Vpc")`.
pub(crate) fn aws_resource(suffix: &str) -> TypeSpec {
    TypeSpec::reference(upstream_ref("aws", RefKind::Resources, suffix))
}

/// Reference to an `aws` type.
pub(crate) fn aws_type(suffix: &str) -> TypeSpec {
    TypeSpec::reference(upstream_ref("aws", RefKind::Types, suffix))
}

pub(crate) fn plain_array_of_plain_strings() -> TypeSpec {
    TypeSpec::array_of(TypeSpec::string().plain()).plain()
}

/// Language override renaming a property in one SDK.
pub(crate) fn renamed(name: &str) -> Value {
    json!({ "name": name })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal upstream documents for exercising generators.

    use super::*;
    use serde_json::json;

    pub fn provider(name: &str, version: &str, document: Value) -> Arc<ProviderDescriptor> {
        let document: PackageSpec = serde_json::from_value(document).unwrap();
        Arc::new(ProviderDescriptor {
            name: name.into(),
            version: version.into(),
            document,
        })
    }

    /// A resource whose input properties are plain strings named `inputs`.
    pub fn resource(description: &str, inputs: &[&str]) -> Value {
        let props: serde_json::Map<String, Value> = inputs
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    json!({ "type": "string", "description": format!("The {}.", name) }),
                )
            })
            .collect();
        json!({ "description": description, "inputProperties": props })
    }

    pub fn aws_with(resources: &[(&str, Value)]) -> Arc<ProviderDescriptor> {
        let resources: serde_json::Map<String, Value> = resources
            .iter()
            .map(|(token, spec)| (token.to_string(), spec.clone()))
            .collect();
        provider("aws", "6.0.0", json!({ "name": "aws", "resources": resources }))
    }

    pub fn set(providers: Vec<Arc<ProviderDescriptor>>) -> ProviderSet {
        providers.into_iter().collect()
    }
}
