//! Reference rewriting over type trees.
//!
//! Every function here takes a tree by value and returns the rewritten tree;
//! nothing is mutated behind the caller's back. At each node the first rule
//! whose prefix matches the `$ref` is applied once, then the walk descends
//! into `items`, `additionalProperties` and each `oneOf` alternative.
//! Discriminator mapping targets are references too.
//!
//! A rule whose prefix occurs nowhere in the tree leaves it unchanged.

use std::collections::BTreeMap;

use crate::refs::RewriteRule;
use crate::types::{
    ComplexTypeSpec, Fragment, FunctionSpec, ObjectTypeSpec, PropertySpec, ResourceSpec, TypeSpec,
};

fn rewrite_reference(reference: String, rules: &[RewriteRule]) -> String {
    rules
        .iter()
        .find_map(|rule| rule.apply(&reference))
        .unwrap_or(reference)
}

/// Rewrite a type expression and everything nested beneath it.
pub fn rewrite_type_spec(mut spec: TypeSpec, rules: &[RewriteRule]) -> TypeSpec {
    spec.reference = spec.reference.map(|r| rewrite_reference(r, rules));
    spec.items = spec
        .items
        .map(|items| Box::new(rewrite_type_spec(*items, rules)));
    spec.additional_properties = spec
        .additional_properties
        .map(|values| Box::new(rewrite_type_spec(*values, rules)));
    spec.one_of = spec
        .one_of
        .into_iter()
        .map(|alt| rewrite_type_spec(alt, rules))
        .collect();
    if let Some(discriminator) = spec.discriminator.as_mut() {
        for target in discriminator.mapping.values_mut() {
            *target = rewrite_reference(std::mem::take(target), rules);
        }
    }
    spec
}

pub fn rewrite_property(mut property: PropertySpec, rules: &[RewriteRule]) -> PropertySpec {
    property.type_spec = rewrite_type_spec(property.type_spec, rules);
    property
}

pub fn rewrite_properties(
    properties: BTreeMap<String, PropertySpec>,
    rules: &[RewriteRule],
) -> BTreeMap<String, PropertySpec> {
    properties
        .into_iter()
        .map(|(name, prop)| (name, rewrite_property(prop, rules)))
        .collect()
}

pub fn rewrite_object(mut object: ObjectTypeSpec, rules: &[RewriteRule]) -> ObjectTypeSpec {
    object.properties = rewrite_properties(object.properties, rules);
    object
}

pub fn rewrite_complex_type(mut spec: ComplexTypeSpec, rules: &[RewriteRule]) -> ComplexTypeSpec {
    spec.object = rewrite_object(spec.object, rules);
    spec
}

/// Rewrite both the input and the output properties of a resource.
pub fn rewrite_resource(mut spec: ResourceSpec, rules: &[RewriteRule]) -> ResourceSpec {
    spec.object = rewrite_object(spec.object, rules);
    spec.input_properties = rewrite_properties(spec.input_properties, rules);
    spec
}

pub fn rewrite_function(mut spec: FunctionSpec, rules: &[RewriteRule]) -> FunctionSpec {
    spec.inputs = spec.inputs.map(|o| rewrite_object(o, rules));
    spec.outputs = spec.outputs.map(|o| rewrite_object(o, rules));
    spec
}

/// Rewrite every reference in a module's contribution.
pub fn rewrite_fragment(fragment: Fragment, rules: &[RewriteRule]) -> Fragment {
    Fragment {
        module: fragment.module,
        types: fragment
            .types
            .into_iter()
            .map(|(k, v)| (k, rewrite_complex_type(v, rules)))
            .collect(),
        resources: fragment
            .resources
            .into_iter()
            .map(|(k, v)| (k, rewrite_resource(v, rules)))
            .collect(),
        functions: fragment
            .functions
            .into_iter()
            .map(|(k, v)| (k, rewrite_function(v, rules)))
            .collect(),
    }
}

/// Collect every `$ref` string reachable from a type expression.
pub(crate) fn collect_type_refs<'a>(spec: &'a TypeSpec, out: &mut Vec<&'a str>) {
    if let Some(reference) = spec.reference.as_deref() {
        out.push(reference);
    }
    if let Some(items) = &spec.items {
        collect_type_refs(items, out);
    }
    if let Some(values) = &spec.additional_properties {
        collect_type_refs(values, out);
    }
    for alt in &spec.one_of {
        collect_type_refs(alt, out);
    }
    if let Some(discriminator) = &spec.discriminator {
        out.extend(discriminator.mapping.values().map(String::as_str));
    }
}

/// Collect every `$ref` string reachable from an object's properties.
pub(crate) fn collect_object_refs(object: &ObjectTypeSpec) -> Vec<&str> {
    let mut out = Vec::new();
    for prop in object.properties.values() {
        collect_type_refs(&prop.type_spec, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscriminatorSpec;

    fn rules(prefix: &str, replacement: &str) -> Vec<RewriteRule> {
        vec![RewriteRule::new(prefix, replacement).unwrap()]
    }

    fn nested(reference: &str) -> TypeSpec {
        // array of map of union
        TypeSpec::array_of(TypeSpec::map_of(TypeSpec::one_of(vec![
            TypeSpec::string(),
            TypeSpec::reference(reference),
        ])))
    }

    fn innermost(spec: &TypeSpec) -> Option<&str> {
        spec.items.as_ref()?.additional_properties.as_ref()?.one_of[1]
            .reference
            .as_deref()
    }

    #[test]
    fn replaces_prefix_and_keeps_suffix() {
        let spec = TypeSpec::reference("#/types/aws:ec2/Tag:Tag");
        let out = rewrite_type_spec(spec, &rules("#/types/aws:", "/aws/v6.0.0/schema.json#/types/aws:"));
        assert_eq!(
            out.reference.as_deref(),
            Some("/aws/v6.0.0/schema.json#/types/aws:ec2/Tag:Tag")
        );
    }

    #[test]
    fn absent_prefix_is_a_no_op() {
        let spec = nested("#/types/awsx:lb:Listener");
        let out = rewrite_type_spec(spec.clone(), &rules("#/types/aws:", "/aws/v6/schema.json#/types/aws:"));
        assert_eq!(out, spec);
    }

    #[test]
    fn rewrites_inside_array_of_map_of_union() {
        let out = rewrite_type_spec(
            nested("#/types/aws:svc:Baz"),
            &rules("#/types/aws:", "/aws/v6.0.0/schema.json#/types/aws:"),
        );
        assert_eq!(
            innermost(&out),
            Some("/aws/v6.0.0/schema.json#/types/aws:svc:Baz")
        );
        // The plain alternative is untouched.
        let alternatives = &out.items.as_ref().unwrap().additional_properties.as_ref().unwrap().one_of;
        assert_eq!(alternatives[0], TypeSpec::string());
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let r = rules("#/types/aws:", "/aws/v6.0.0/schema.json#/types/aws:");
        let once = rewrite_type_spec(nested("#/types/aws:svc:Baz"), &r);
        let twice = rewrite_type_spec(once.clone(), &r);
        assert_eq!(once, twice);
    }

    #[test]
    fn rewrites_discriminator_mapping() {
        let mut spec = TypeSpec::one_of(vec![TypeSpec::reference("#/types/aws:lb/Http:Http")]);
        spec.discriminator = Some(DiscriminatorSpec {
            property_name: "protocol".into(),
            mapping: [("HTTP".to_string(), "#/types/aws:lb/Http:Http".to_string())].into(),
        });

        let out = rewrite_type_spec(spec, &rules("#/types/aws:", "/aws/v6.0.0/schema.json#/types/aws:"));
        assert_eq!(
            out.discriminator.unwrap().mapping["HTTP"],
            "/aws/v6.0.0/schema.json#/types/aws:lb/Http:Http"
        );
        assert_eq!(
            out.one_of[0].reference.as_deref(),
            Some("/aws/v6.0.0/schema.json#/types/aws:lb/Http:Http")
        );
    }

    #[test]
    fn first_matching_rule_wins_once() {
        let r = vec![
            RewriteRule::new("#/types/aws:", "#/types/mid:").unwrap(),
            RewriteRule::new("#/types/mid:", "#/types/end:").unwrap(),
        ];
        let out = rewrite_type_spec(TypeSpec::reference("#/types/aws:x:Y"), &r);
        assert_eq!(out.reference.as_deref(), Some("#/types/mid:x:Y"));
    }

    #[test]
    fn resource_inputs_and_outputs_are_both_rewritten() {
        let mut resource = ResourceSpec::default();
        resource.input_properties.insert(
            "tags".into(),
            PropertySpec::new(TypeSpec::reference("#/types/aws:index/Tags:Tags"), "tags"),
        );
        resource.object.properties.insert(
            "vpc".into(),
            PropertySpec::new(TypeSpec::reference("#/resources/aws:ec2%2fvpc:Vpc"), "vpc"),
        );

        let r = vec![
            RewriteRule::new("#/types/aws:", "/aws/v6/schema.json#/types/aws:").unwrap(),
            RewriteRule::new("#/resources/aws:", "/aws/v6/schema.json#/resources/aws:").unwrap(),
        ];
        let out = rewrite_resource(resource, &r);
        assert_eq!(
            out.input_properties["tags"].type_spec.reference.as_deref(),
            Some("/aws/v6/schema.json#/types/aws:index/Tags:Tags")
        );
        assert_eq!(
            out.object.properties["vpc"].type_spec.reference.as_deref(),
            Some("/aws/v6/schema.json#/resources/aws:ec2%2fvpc:Vpc")
        );
    }

    #[test]
    fn collects_nested_refs() {
        let mut object = ObjectTypeSpec::default();
        object
            .properties
            .insert("a".into(), PropertySpec::new(nested("#/types/x:y:Z"), "a"));
        object.properties.insert(
            "b".into(),
            PropertySpec::new(TypeSpec::reference("#/types/x:y:W"), "b"),
        );
        let refs = collect_object_refs(&object);
        assert_eq!(refs, vec!["#/types/x:y:Z", "#/types/x:y:W"]);
    }
}
