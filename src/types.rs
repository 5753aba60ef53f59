//! Core types: the package schema wire model and the run-scoped values built
//! around it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AssembleError, NameCollision, Namespace};

/// Name of the package this crate assembles.
pub const PACKAGE_NAME: &str = "awsx";

fn is_false(b: &bool) -> bool {
    !*b
}

/// A type expression: primitive, array, map, reference or union.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<TypeSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<TypeSpec>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<TypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorSpec>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub plain: bool,
}

/// Selects a `oneOf` alternative by the value of one property.
///
/// `mapping` values are references and are rewritten like `$ref`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscriminatorSpec {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mapping: BTreeMap<String, String>,
}

impl TypeSpec {
    pub fn primitive(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::primitive("string")
    }

    pub fn boolean() -> Self {
        Self::primitive("boolean")
    }

    pub fn integer() -> Self {
        Self::primitive("integer")
    }

    pub fn number() -> Self {
        Self::primitive("number")
    }

    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn array_of(items: TypeSpec) -> Self {
        Self {
            kind: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    pub fn map_of(values: TypeSpec) -> Self {
        Self {
            kind: Some("object".to_string()),
            additional_properties: Some(Box::new(values)),
            ..Self::default()
        }
    }

    pub fn one_of(alternatives: Vec<TypeSpec>) -> Self {
        Self {
            one_of: alternatives,
            ..Self::default()
        }
    }

    /// Marks the type as plain (not wrapped in an output at runtime).
    pub fn plain(mut self) -> Self {
        self.plain = true;
        self
    }
}

/// A named property: a type plus documentation and language overrides.
///
/// Fields this crate does not interpret (`secret`, `willReplaceOnChanges`,
/// `deprecationMessage`, ...) round-trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(flatten)]
    pub type_spec: TypeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub language: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PropertySpec {
    pub fn new(type_spec: TypeSpec, description: impl Into<String>) -> Self {
        Self {
            type_spec,
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Adds a per-language override (e.g. a renamed C# property).
    pub fn with_language(mut self, language: &str, settings: Value) -> Self {
        self.language.insert(language.to_string(), settings);
        self
    }
}

/// Object-shaped body shared by resources, complex types and function I/O.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub language: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ObjectTypeSpec {
    pub fn object(description: impl Into<String>, properties: BTreeMap<String, PropertySpec>) -> Self {
        Self {
            description: Some(description.into()),
            properties,
            kind: Some("object".to_string()),
            ..Self::default()
        }
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

/// One allowed literal of an enum-shaped complex type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

impl EnumValueSpec {
    pub fn new(value: &str, description: &str) -> Self {
        Self {
            name: None,
            description: Some(description.to_string()),
            value: Value::String(value.to_string()),
            deprecation_message: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Object-shaped or enum-shaped named type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexTypeSpec {
    #[serde(flatten)]
    pub object: ObjectTypeSpec,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValueSpec>,
}

impl ComplexTypeSpec {
    pub fn object(object: ObjectTypeSpec) -> Self {
        Self {
            object,
            enum_values: Vec::new(),
        }
    }

    /// An enum over string literals; values keep the given order.
    pub fn string_enum(description: Option<&str>, values: Vec<EnumValueSpec>) -> Self {
        Self {
            object: ObjectTypeSpec {
                description: description.map(str::to_string),
                kind: Some("string".to_string()),
                ..ObjectTypeSpec::default()
            },
            enum_values: values,
        }
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Output properties, description and required outputs.
    #[serde(flatten)]
    pub object: ObjectTypeSpec,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_properties: BTreeMap<String, PropertySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_component: bool,
    /// Exposed sub-operations: method name to function token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, String>,
}

impl ResourceSpec {
    /// A component resource with the given outputs and inputs.
    pub fn component(
        object: ObjectTypeSpec,
        input_properties: BTreeMap<String, PropertySpec>,
    ) -> Self {
        Self {
            object,
            input_properties,
            is_component: true,
            ..Self::default()
        }
    }

    pub fn required_inputs(mut self, names: &[&str]) -> Self {
        self.required_inputs = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn method(mut self, name: &str, token: &str) -> Self {
        self.methods.insert(name.to_string(), token.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<ObjectTypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<ObjectTypeSpec>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A complete package schema document.
///
/// Upstream provider documents and the assembled output share this shape.
/// Top-level fields not modelled here (`config`, `provider`, `meta`, ...)
/// pass through `extra` unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Per-language metadata, passed through unmodified.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub language: BTreeMap<String, Value>,
    #[serde(default)]
    pub types: BTreeMap<String, ComplexTypeSpec>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceSpec>,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSpec>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The resources, types and functions contributed by one module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Name of the contributing module, used in error reports.
    pub module: String,
    pub types: BTreeMap<String, ComplexTypeSpec>,
    pub resources: BTreeMap<String, ResourceSpec>,
    pub functions: BTreeMap<String, FunctionSpec>,
}

impl Fragment {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// Adds a type, failing if this fragment already declares the name.
    pub fn insert_type(&mut self, name: &str, spec: ComplexTypeSpec) -> Result<(), AssembleError> {
        insert_new(&self.module, Namespace::Type, &mut self.types, name, spec)
            .map_err(|collision| AssembleError::DuplicateNames { collisions: vec![collision] })
    }

    pub fn insert_resource(&mut self, name: &str, spec: ResourceSpec) -> Result<(), AssembleError> {
        insert_new(&self.module, Namespace::Resource, &mut self.resources, name, spec)
            .map_err(|collision| AssembleError::DuplicateNames { collisions: vec![collision] })
    }

    pub fn insert_function(&mut self, name: &str, spec: FunctionSpec) -> Result<(), AssembleError> {
        insert_new(&self.module, Namespace::Function, &mut self.functions, name, spec)
            .map_err(|collision| AssembleError::DuplicateNames { collisions: vec![collision] })
    }

    /// Adds every type, reporting all names this fragment already declares.
    /// Existing entries are never replaced.
    pub fn extend_types(
        &mut self,
        types: impl IntoIterator<Item = (String, ComplexTypeSpec)>,
    ) -> Result<(), AssembleError> {
        let collisions: Vec<NameCollision> = types
            .into_iter()
            .filter_map(|(name, spec)| insert_new(&self.module, Namespace::Type, &mut self.types, &name, spec).err())
            .collect();
        if collisions.is_empty() {
            Ok(())
        } else {
            Err(AssembleError::DuplicateNames { collisions })
        }
    }

    pub fn with_type(mut self, name: &str, spec: ComplexTypeSpec) -> Result<Self, AssembleError> {
        self.insert_type(name, spec)?;
        Ok(self)
    }

    pub fn with_resource(mut self, name: &str, spec: ResourceSpec) -> Result<Self, AssembleError> {
        self.insert_resource(name, spec)?;
        Ok(self)
    }

    pub fn with_function(mut self, name: &str, spec: FunctionSpec) -> Result<Self, AssembleError> {
        self.insert_function(name, spec)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.resources.is_empty() && self.functions.is_empty()
    }
}

fn insert_new<V>(
    module: &str,
    namespace: Namespace,
    entries: &mut BTreeMap<String, V>,
    name: &str,
    spec: V,
) -> Result<(), NameCollision> {
    if entries.contains_key(name) {
        return Err(NameCollision {
            namespace,
            name: name.to_string(),
            first: module.to_string(),
            second: module.to_string(),
        });
    }
    entries.insert(name.to_string(), spec);
    Ok(())
}

/// An upstream provider resolved for this run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    pub name: String,
    /// Version as declared by the manifest (no leading `v`).
    pub version: String,
    pub document: PackageSpec,
}

impl ProviderDescriptor {
    /// Version segment used in fully qualified references, e.g. `v6.0.0`.
    ///
    /// Taken from the document when it declares one, so references match
    /// what the upstream package publishes.
    pub fn ref_version(&self) -> String {
        match self.document.version.as_deref() {
            Some(v) if !v.is_empty() => {
                if v.starts_with('v') {
                    v.to_string()
                } else {
                    format!("v{}", v)
                }
            }
            _ => format!("v{}", self.version),
        }
    }
}

impl fmt::Display for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_spec_reads_ref_and_keeps_unknown_fields() {
        let prop: PropertySpec = serde_json::from_value(json!({
            "$ref": "#/types/aws:ec2/SecurityGroupIngress:SecurityGroupIngress",
            "description": "ingress rules",
            "willReplaceOnChanges": true
        }))
        .unwrap();

        assert_eq!(
            prop.type_spec.reference.as_deref(),
            Some("#/types/aws:ec2/SecurityGroupIngress:SecurityGroupIngress")
        );
        assert_eq!(prop.extra.get("willReplaceOnChanges"), Some(&json!(true)));
        assert!(!prop.extra.contains_key("$ref"));

        let back = serde_json::to_value(&prop).unwrap();
        assert_eq!(back["willReplaceOnChanges"], json!(true));
        assert_eq!(
            back["$ref"],
            json!("#/types/aws:ec2/SecurityGroupIngress:SecurityGroupIngress")
        );
    }

    #[test]
    fn plain_false_is_not_serialized() {
        let value = serde_json::to_value(TypeSpec::string()).unwrap();
        assert_eq!(value, json!({ "type": "string" }));

        let value = serde_json::to_value(TypeSpec::string().plain()).unwrap();
        assert_eq!(value, json!({ "type": "string", "plain": true }));
    }

    #[test]
    fn resource_spec_splits_inputs_and_outputs() {
        let resource: ResourceSpec = serde_json::from_value(json!({
            "description": "A bucket",
            "properties": { "arn": { "type": "string" } },
            "required": ["arn"],
            "inputProperties": { "acl": { "type": "string" } },
            "isComponent": true,
            "aliases": [{ "type": "aws:s3/bucket:Bucket" }]
        }))
        .unwrap();

        assert!(resource.is_component);
        assert!(resource.object.properties.contains_key("arn"));
        assert!(resource.input_properties.contains_key("acl"));
        assert_eq!(resource.object.required, vec!["arn"]);
        assert!(resource.object.extra.contains_key("aliases"));
    }

    #[test]
    fn enum_type_round_trips_value_order() {
        let spec = ComplexTypeSpec::string_enum(
            Some("tag status"),
            vec![
                EnumValueSpec::new("any", "all"),
                EnumValueSpec::new("untagged", "untagged only"),
            ],
        );
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["enum"][0]["value"], "any");
        assert_eq!(value["enum"][1]["value"], "untagged");
        assert_eq!(value["type"], "string");
        assert!(spec.is_enum());
    }

    #[test]
    fn package_spec_tolerates_missing_sections() {
        let doc: PackageSpec = serde_json::from_value(json!({
            "name": "docker",
            "config": { "variables": {} }
        }))
        .unwrap();
        assert!(doc.resources.is_empty());
        assert!(doc.extra.contains_key("config"));
    }

    #[test]
    fn fragment_rejects_its_own_duplicate() {
        let fragment = Fragment::new("ecs")
            .with_type("awsx:ecs:Args", ComplexTypeSpec::default())
            .unwrap();
        let err = fragment
            .with_type("awsx:ecs:Args", ComplexTypeSpec::default())
            .unwrap_err();

        let AssembleError::DuplicateNames { collisions } = err else {
            panic!("expected duplicate names");
        };
        assert_eq!(collisions[0].namespace, Namespace::Type);
        assert_eq!((collisions[0].first.as_str(), collisions[0].second.as_str()), ("ecs", "ecs"));
    }

    #[test]
    fn extend_types_keeps_existing_entry_and_reports_every_clash() {
        let mut fragment = Fragment::new("ecs");
        fragment
            .insert_type("awsx:ecs:A", ComplexTypeSpec::string_enum(Some("mine"), Vec::new()))
            .unwrap();
        fragment.insert_resource("awsx:ecs:B", ResourceSpec::default()).unwrap();

        let err = fragment
            .extend_types([
                ("awsx:ecs:A".to_string(), ComplexTypeSpec::default()),
                ("awsx:ecs:B".to_string(), ComplexTypeSpec::default()),
            ])
            .unwrap_err();

        let AssembleError::DuplicateNames { collisions } = err else {
            panic!("expected duplicate names");
        };
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].name, "awsx:ecs:A");
        assert_eq!(fragment.types["awsx:ecs:A"].object.description.as_deref(), Some("mine"));
        // Types and resources are separate namespaces.
        assert!(fragment.types.contains_key("awsx:ecs:B"));
    }

    #[test]
    fn nested_discriminator_survives_round_trip() {
        let value = json!({
            "type": "array",
            "items": {
                "oneOf": [
                    { "$ref": "#/types/aws:lb/Http:Http" },
                    { "$ref": "#/types/aws:lb/Tcp:Tcp" }
                ],
                "discriminator": {
                    "propertyName": "protocol",
                    "mapping": {
                        "HTTP": "#/types/aws:lb/Http:Http",
                        "TCP": "#/types/aws:lb/Tcp:Tcp"
                    }
                }
            }
        });
        let spec: TypeSpec = serde_json::from_value(value.clone()).unwrap();

        let discriminator = spec.items.as_ref().unwrap().discriminator.as_ref().unwrap();
        assert_eq!(discriminator.property_name, "protocol");
        assert_eq!(discriminator.mapping["TCP"], "#/types/aws:lb/Tcp:Tcp");
        assert_eq!(serde_json::to_value(&spec).unwrap(), value);
    }

    #[test]
    fn ref_version_prefers_document_version() {
        let mut provider = ProviderDescriptor {
            name: "aws".into(),
            version: "6.0.4".into(),
            document: PackageSpec::default(),
        };
        assert_eq!(provider.ref_version(), "v6.0.4");

        provider.document.version = Some("6.0.5".into());
        assert_eq!(provider.ref_version(), "v6.0.5");

        provider.document.version = Some("v6.0.6".into());
        assert_eq!(provider.ref_version(), "v6.0.6");
    }
}
