//! End-to-end assembly tests against in-memory and on-disk provider documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use awsx_schemagen::modules::{Ecs, ModuleGenerator, ProviderSet};
use awsx_schemagen::{
    assemble, merge, schema_json_bytes, AssembleError, AssembleOptions, ComplexTypeSpec, DependencyManifest,
    DirectorySource, Fragment, MemorySource, Namespace, ObjectTypeSpec, PackageSpec, PropertySpec, ProviderCache,
    ResourceSpec, TypeSpec, VersionResolver,
};
use serde_json::{json, Value};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_document(relative: &str) -> Value {
    let text = std::fs::read_to_string(fixtures().join("providers").join(relative)).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn resolver() -> VersionResolver {
    VersionResolver::new(DependencyManifest::from_entries(
        "package.json",
        [("@pulumi/aws", "6.0.0"), ("@pulumi/docker", "3.6.1")],
    ))
}

/// A module returning a fixed fragment and declaring only `aws`.
struct Fixed {
    name: &'static str,
    fragment: Fragment,
}

impl ModuleGenerator for Fixed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, _providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        Ok(self.fragment.clone())
    }
}

fn fixed(name: &'static str, fragment: Fragment) -> Box<dyn ModuleGenerator> {
    Box::new(Fixed { name, fragment })
}

fn object_type(properties: &[(&str, PropertySpec)]) -> ComplexTypeSpec {
    ComplexTypeSpec::object(ObjectTypeSpec::object(
        "test type",
        properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    ))
}

fn service() -> ResourceSpec {
    ResourceSpec::component(ObjectTypeSpec::object("service", Default::default()), Default::default())
}

fn aws_memory() -> MemorySource {
    MemorySource::new().with_document("aws", "6.0.0", json!({ "name": "aws" }))
}

#[test]
fn upstream_reference_is_anchored_to_provider_version() {
    let a = Fragment::new("a").with_type(
        "pkg:mod:Foo",
        object_type(&[(
            "bar",
            PropertySpec::new(TypeSpec::reference("#/types/aws:svc:Baz"), "bar"),
        )]),
    ).unwrap();
    let b = Fragment::new("b").with_type("pkg:mod:Other", object_type(&[])).unwrap();

    let options = AssembleOptions::new(resolver()).with_modules(vec![fixed("a", a), fixed("b", b)]);
    let document = assemble(&options, &ProviderCache::new(aws_memory())).unwrap();

    assert_eq!(
        document.types["pkg:mod:Foo"].object.properties["bar"]
            .type_spec
            .reference
            .as_deref(),
        Some("/aws/v6.0.0/schema.json#/types/aws:svc:Baz")
    );
    assert!(document.types.contains_key("pkg:mod:Other"));
}

#[test]
fn nested_upstream_reference_is_anchored() {
    let nested = TypeSpec::array_of(TypeSpec::map_of(TypeSpec::one_of(vec![
        TypeSpec::string(),
        TypeSpec::reference("#/resources/aws:ec2%2fvpc:Vpc"),
    ])));
    let fragment = Fragment::new("a").with_type("pkg:mod:Deep", object_type(&[("deep", PropertySpec::new(nested, "deep"))])).unwrap();

    let options = AssembleOptions::new(resolver()).with_modules(vec![fixed("a", fragment)]);
    let document = assemble(&options, &ProviderCache::new(aws_memory())).unwrap();

    let deep = &document.types["pkg:mod:Deep"].object.properties["deep"].type_spec;
    let alternative = &deep.items.as_ref().unwrap().additional_properties.as_ref().unwrap().one_of[1];
    assert_eq!(
        alternative.reference.as_deref(),
        Some("/aws/v6.0.0/schema.json#/resources/aws:ec2%2fvpc:Vpc")
    );
}

#[test]
fn missing_template_property_names_module_and_property() {
    let mut aws = fixture_document("aws/v6.0.0/schema.json");
    aws["resources"]["aws:ecs/taskDefinition:TaskDefinition"]["inputProperties"]
        .as_object_mut()
        .unwrap()
        .remove("cpu");
    let source = MemorySource::new()
        .with_document("aws", "6.0.0", aws)
        .with_document("aws-native", "0.72.0", fixture_document("aws-native/v0.72.0/schema.json"));

    let options = AssembleOptions::new(resolver()).with_modules(vec![Box::new(Ecs)]);
    let err = assemble(&options, &ProviderCache::new(source)).unwrap_err();

    match err {
        AssembleError::SchemaShape {
            module, property, ..
        } => {
            assert_eq!(module, "ecs");
            assert_eq!(property, "cpu");
        }
        other => panic!("expected schema shape error, got {other:?}"),
    }
}

#[test]
fn duplicate_resource_names_both_modules() {
    let options = AssembleOptions::new(resolver()).with_modules(vec![
        fixed("ecs", Fragment::new("ecs").with_resource("pkg:ecs:Service", service()).unwrap()),
        fixed("lb", Fragment::new("lb").with_resource("pkg:ecs:Service", service()).unwrap()),
    ]);
    let err = assemble(&options, &ProviderCache::new(aws_memory())).unwrap_err();

    let AssembleError::DuplicateNames { collisions } = err else {
        panic!("expected duplicate names");
    };
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].namespace, Namespace::Resource);
    assert_eq!(collisions[0].name, "pkg:ecs:Service");
    assert_eq!((collisions[0].first.as_str(), collisions[0].second.as_str()), ("ecs", "lb"));
}

#[test]
fn missing_dependency_fails_before_any_fetch() {
    let source = Arc::new(aws_memory());
    let resolver = VersionResolver::new(DependencyManifest::from_entries(
        "awsx/package.json",
        [("@pulumi/aws", "6.0.0")],
    ));
    // The full module set needs docker, which this manifest doesn't declare.
    let options = AssembleOptions::new(resolver);

    let err = assemble(&options, &ProviderCache::new(Arc::clone(&source))).unwrap_err();
    assert!(matches!(err, AssembleError::MissingDependency { ref provider, .. } if provider == "docker"));
    assert_eq!(source.fetch_count(), 0);
}

#[test]
fn merge_rejects_duplicate_type_in_either_order() {
    let x = || object_type(&[]);
    let first = Fragment::new("first").with_type("X", x()).unwrap();
    let second = Fragment::new("second").with_type("X", x()).unwrap();

    for fragments in [vec![first.clone(), second.clone()], vec![second, first]] {
        let err = merge(PackageSpec::default(), fragments).unwrap_err();
        assert!(matches!(err, AssembleError::DuplicateNames { .. }));
    }
}

#[test]
fn unanchored_reference_to_undeclared_provider_is_rejected() {
    let fragment = Fragment::new("a").with_type(
        "pkg:mod:Foo",
        object_type(&[(
            "bar",
            PropertySpec::new(TypeSpec::reference("#/types/gcp:svc:Baz"), "bar"),
        )]),
    ).unwrap();
    let options = AssembleOptions::new(resolver()).with_modules(vec![fixed("a", fragment)]);
    let err = assemble(&options, &ProviderCache::new(aws_memory())).unwrap_err();

    let AssembleError::InvalidReferences { diagnostics } = err else {
        panic!("expected invalid references");
    };
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].path.starts_with("/types/pkg:mod:Foo/properties/bar"));
}

#[test]
fn full_assembly_from_fixture_directory() {
    let manifest = DependencyManifest::load(&fixtures().join("package.json")).unwrap();
    let options = AssembleOptions::new(VersionResolver::new(manifest)).version("2.0.0");
    let cache = ProviderCache::new(DirectorySource::new(fixtures().join("providers")));

    let document = assemble(&options, &cache).unwrap();
    assert_eq!(cache.len(), 3);
    assert_eq!(document.version.as_deref(), Some("2.0.0"));

    for resource in [
        "awsx:cloudtrail:Trail",
        "awsx:ecs:FargateService",
        "awsx:ecs:FargateTaskDefinition",
        "awsx:ecs:EC2Service",
        "awsx:ecs:EC2TaskDefinition",
        "awsx:lb:ApplicationLoadBalancer",
        "awsx:lb:NetworkLoadBalancer",
        "awsx:lb:TargetGroupAttachment",
        "awsx:ec2:Vpc",
        "awsx:ec2:DefaultVpc",
        "awsx:ecr:Repository",
        "awsx:ecr:Image",
        "awsx:apigatewayv2:HttpApi",
    ] {
        assert!(document.resources.contains_key(resource), "missing {resource}");
    }
    assert!(document.functions.contains_key("awsx:ec2:getDefaultVpc"));
    assert!(document.functions.contains_key("awsx:ecr:Repository/buildAndPushImage"));

    let service = &document.resources["awsx:ecs:FargateService"];
    assert_eq!(
        service.input_properties["networkConfiguration"]
            .type_spec
            .reference
            .as_deref(),
        Some("/aws/v6.0.0/schema.json#/types/aws:ecs/ServiceNetworkConfiguration:ServiceNetworkConfiguration")
    );

    let port_mapping = &document.types["awsx:ecs:TaskDefinitionPortMapping"].object;
    assert!(port_mapping.properties.contains_key("targetGroup"));
    assert!(document.types.contains_key("awsx:ecs:TaskDefinitionSecret"));
    assert!(document.types.contains_key("awsx:ecs:EC2ServiceTaskDefinition"));
    assert!(document.resources["awsx:ecs:EC2Service"].required_inputs.is_empty());
    assert!(!document.types.contains_key("awsx:ecs:ServiceDeploymentController"));
    assert!(document.types.keys().all(|k| !k.starts_with("aws-native:")));

    assert_eq!(document.language["nodejs"]["dependencies"]["@pulumi/docker"], json!("^3.6.1"));
}

#[test]
fn assembled_bytes_are_stable_across_runs() {
    let run = || {
        let manifest = DependencyManifest::load(&fixtures().join("package.json")).unwrap();
        let options = AssembleOptions::new(VersionResolver::new(manifest));
        let cache = ProviderCache::new(DirectorySource::new(fixtures().join("providers")));
        schema_json_bytes(&assemble(&options, &cache).unwrap()).unwrap()
    };
    assert_eq!(run(), run());
}
