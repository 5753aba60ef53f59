use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, TypeSpec};

use super::{local, prop, props, ModuleGenerator, ProviderSet};

const BUCKET_TEMPLATE: &str = "aws:s3/bucket:Bucket";

/// Bucket argument types shared by components that own a bucket.
pub struct S3;

impl ModuleGenerator for S3 {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        let bucket = providers.resource(self.name(), "aws", BUCKET_TEMPLATE)?;
        let bucket_args = Curation::new(self.name(), BUCKET_TEMPLATE).derive(
            &bucket.input_properties,
            &[
                // Both are unions upstream; components accept serialized JSON.
                Edit::retype("policy", TypeSpec::string()),
                Edit::retype("acl", TypeSpec::string()),
            ],
        )?;

        let existing = || {
            prop(
                local("awsx:awsx:ExistingBucket").plain(),
                "Identity of an existing bucket to use. Cannot be used in combination with `args`.",
            )
        };
        let args = || {
            prop(
                local("awsx:awsx:Bucket").plain(),
                "Arguments to use instead of the default values during creation.",
            )
        };

        Ok(Fragment::new(self.name())
            .with_type(
                "awsx:awsx:DefaultBucket",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Bucket with default setup unless explicitly skipped.",
                    props([
                        ("skip", prop(TypeSpec::boolean().plain(), "Skip creation of the bucket.")),
                        ("existing", existing()),
                        ("args", args()),
                    ]),
                )),
            )?
            .with_type(
                "awsx:awsx:RequiredBucket",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Bucket with default setup.",
                    props([("existing", existing()), ("args", args())]),
                )),
            )?
            .with_type(
                "awsx:awsx:ExistingBucket",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Reference to an existing bucket.",
                    props([
                        (
                            "arn",
                            prop(
                                TypeSpec::string(),
                                "Arn of the bucket. Only one of [arn] or [name] can be specified.",
                            ),
                        ),
                        (
                            "name",
                            prop(
                                TypeSpec::string(),
                                "Name of the bucket. Only one of [arn] or [name] can be specified.",
                            ),
                        ),
                    ]),
                )),
            )?
            .with_type(
                "awsx:awsx:Bucket",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "The set of arguments for constructing a Bucket resource.",
                    bucket_args,
                )),
            )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::*;
    use serde_json::json;

    fn providers(inputs: &[&str]) -> ProviderSet {
        let mut bucket = resource("Provides a S3 bucket resource.", inputs);
        if inputs.contains(&"policy") {
            bucket["inputProperties"]["policy"] = json!({
                "oneOf": [{ "type": "string" }, { "$ref": "#/types/aws:iam/documents:PolicyDocument" }],
                "description": "A valid bucket policy JSON document."
            });
        }
        set(vec![aws_with(&[(BUCKET_TEMPLATE, bucket)])])
    }

    #[test]
    fn bucket_args_retype_policy_and_acl() {
        let fragment = S3.generate(&providers(&["acl", "bucket", "policy"])).unwrap();
        let args = &fragment.types["awsx:awsx:Bucket"].object.properties;
        assert_eq!(args["policy"].type_spec, TypeSpec::string());
        assert_eq!(
            args["policy"].description.as_deref(),
            Some("A valid bucket policy JSON document.")
        );
        assert_eq!(args["acl"].type_spec, TypeSpec::string());
        assert!(args.contains_key("bucket"));
        assert_eq!(fragment.types.len(), 4);
    }

    #[test]
    fn missing_policy_is_shape_error() {
        let err = S3.generate(&providers(&["acl", "bucket"])).unwrap_err();
        assert!(matches!(err, AssembleError::SchemaShape { ref property, .. } if property == "policy"));
    }
}
