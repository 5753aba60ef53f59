use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, ResourceSpec, TypeSpec};

use super::{aws_resource, local, prop, props, renamed, ModuleGenerator, ProviderSet};

const TRAIL_TEMPLATE: &str = "aws:cloudtrail/trail:Trail";

/// A trail that owns its bucket and optional log group.
pub struct Cloudtrail;

impl Cloudtrail {
    fn log_group() -> ComplexTypeSpec {
        ComplexTypeSpec::object(ObjectTypeSpec::object(
            "Defines the log group configuration for the CloudWatch Log Group to send logs to.",
            props([
                ("kmsKeyId", prop(TypeSpec::string(), "The ARN of the KMS Key to use when encrypting log data.")),
                ("namePrefix", prop(TypeSpec::string(), "Creates a unique name beginning with the specified prefix")),
                (
                    "retentionInDays",
                    prop(
                        TypeSpec::integer(),
                        "Specifies the number of days you want to retain log events in the specified log group. Possible values are: 1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1827, 3653, and 0. If you select 0, the events in the log group are always retained and never expire.",
                    ),
                ),
                (
                    "tags",
                    prop(
                        TypeSpec::map_of(TypeSpec::string()),
                        "A map of tags to assign to the resource. If configured with provider defaultTags present, tags with matching keys will overwrite those defined at the provider-level.",
                    ),
                ),
            ]),
        ))
    }
}

impl ModuleGenerator for Cloudtrail {
    fn name(&self) -> &'static str {
        "cloudtrail"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        let template = providers.resource(self.name(), "aws", TRAIL_TEMPLATE)?;
        let inputs = Curation::new(self.name(), TRAIL_TEMPLATE).derive(
            &template.input_properties,
            &[
                Edit::delete("cloudWatchLogsGroupArn"),
                Edit::delete("cloudWatchLogsRoleArn"),
                Edit::delete("s3BucketName"),
                Edit::inject(
                    "s3Bucket",
                    prop(
                        local("awsx:awsx:RequiredBucket").plain(),
                        "S3 bucket designated for publishing log files.",
                    ),
                ),
                Edit::inject(
                    "cloudWatchLogsGroup",
                    prop(
                        local("awsx:awsx:OptionalLogGroup").plain(),
                        "Log group to which CloudTrail logs will be delivered.",
                    ),
                ),
            ],
        )?;

        let outputs = props([
            (
                "bucket",
                prop(aws_resource("s3%2Fbucket:Bucket"), "The managed S3 Bucket where the Trail will place its logs."),
            ),
            (
                "logGroup",
                prop(aws_resource("cloudwatch%2FlogGroup:LogGroup"), "The managed Cloudwatch Log Group."),
            ),
            (
                "trail",
                prop(aws_resource("cloudtrail%2Ftrail:Trail"), "The CloudTrail Trail.")
                    .with_language("csharp", renamed("AwsTrail")),
            ),
        ]);
        let description = template.object.description.clone().unwrap_or_default();

        Ok(Fragment::new(self.name())
            .with_resource(
                "awsx:cloudtrail:Trail",
                ResourceSpec::component(ObjectTypeSpec::object(description, outputs).required(&["trail"]), inputs),
            )?
            .with_type("awsx:cloudtrail:LogGroup", Self::log_group())?)
    }
}
