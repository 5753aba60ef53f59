use crate::curation::{Curation, Edit, Properties};
use crate::error::AssembleError;
use crate::refs::{local_ref, RefKind};
use crate::types::{
    ComplexTypeSpec, EnumValueSpec, Fragment, FunctionSpec, ObjectTypeSpec, ResourceSpec, TypeSpec,
};

use super::{aws_resource, local, prop, props, renamed, ModuleGenerator, ProviderSet};

const REPOSITORY_TEMPLATE: &str = "aws:ecr/repository:Repository";
const REPOSITORY: &str = "awsx:ecr:Repository";
const BUILD_AND_PUSH_IMAGE: &str = "awsx:ecr:Repository/buildAndPushImage";

/// Container registry: repositories with lifecycle policies and image builds.
pub struct Ecr;

/// Inputs accepted wherever an image is built.
fn docker_build_properties() -> Properties {
    props([
        (
            "args",
            prop(
                TypeSpec::map_of(TypeSpec::string()),
                "An optional map of named build-time argument variables to set during the Docker build.  This flag allows you to pass built-time variables that can be accessed like environment variables inside the `RUN` instruction.",
            ),
        ),
        (
            "builderVersion",
            prop(local("awsx:ecr:BuilderVersion").plain(), "The version of the Docker builder."),
        ),
        ("cacheFrom", prop(TypeSpec::array_of(TypeSpec::string()), "Images to consider as cache sources")),
        (
            "context",
            prop(
                TypeSpec::string(),
                "Path to a directory to use for the Docker build context, usually the directory in which the Dockerfile resides (although dockerfile may be used to choose a custom location independent of this choice). If not specified, the context defaults to the current working directory; if a relative path is used, it is relative to the current working directory that Pulumi is evaluating.",
            ),
        ),
        (
            "dockerfile",
            prop(
                TypeSpec::string(),
                "dockerfile may be used to override the default Dockerfile name and/or location.  By default, it is assumed to be a file named Dockerfile in the root of the build context.",
            ),
        ),
        (
            "imageTag",
            prop(TypeSpec::string(), "Custom image tag for the resulting docker image. If omitted a random string will be used"),
        ),
        (
            "platform",
            prop(
                TypeSpec::string(),
                "The architecture of the platform you want to build this image for, e.g. `linux/arm64`.",
            ),
        ),
        ("target", prop(TypeSpec::string(), "The target of the dockerfile to build")),
    ])
}

impl Ecr {
    fn repository(&self, providers: &ProviderSet) -> Result<ResourceSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", REPOSITORY_TEMPLATE)?;
        let inputs = Curation::new(self.name(), REPOSITORY_TEMPLATE).derive(
            &template.input_properties,
            &[Edit::inject(
                "lifecyclePolicy",
                prop(
                    local("awsx:ecr:lifecyclePolicy").plain(),
                    "A lifecycle policy consists of one or more rules that determine which images in a repository should be expired. If not provided, this will default to untagged images expiring after 1 day.",
                ),
            )],
        )?;

        let outputs = props([
            (
                "repository",
                prop(aws_resource("ecr%2frepository:Repository"), "Underlying Repository resource")
                    .with_language("csharp", renamed("AwsRepository")),
            ),
            (
                "url",
                prop(
                    TypeSpec::string(),
                    "The URL of the repository (in the form aws_account_id.dkr.ecr.region.amazonaws.com/repositoryName).\n",
                ),
            ),
            (
                "lifecyclePolicy",
                prop(aws_resource("ecr%2flifecyclePolicy:LifecyclePolicy"), "Underlying repository lifecycle policy"),
            ),
        ]);

        Ok(ResourceSpec::component(
            ObjectTypeSpec::object(
                "A [Repository] represents an [aws.ecr.Repository] along with an associated [LifecyclePolicy] controlling how images are retained in the repo. \n\nDocker images can be built and pushed to the repo using the [buildAndPushImage] method.  This will call into the `@pulumi/docker/buildAndPushImage` function using this repo as the appropriate destination registry.",
                outputs,
            )
            .required(&["repository", "url"]),
            inputs,
        )
        .method("buildAndPushImage", BUILD_AND_PUSH_IMAGE))
    }

    fn build_and_push_image() -> FunctionSpec {
        let mut inputs = docker_build_properties();
        inputs.insert(
            "__self__".to_string(),
            prop(TypeSpec::reference(local_ref(RefKind::Resources, REPOSITORY)), "The repository to push to."),
        );
        FunctionSpec {
            description: Some("Build and push a docker image to ECR".to_string()),
            inputs: Some(ObjectTypeSpec::object("Arguments for building a docker image", inputs).required(&["__self__"])),
            outputs: Some(
                ObjectTypeSpec::object(
                    "Result of building and pushing an image",
                    props([("image", prop(TypeSpec::string(), "Unique identifier of the pushed image"))]),
                )
                .required(&["image"]),
            ),
            ..FunctionSpec::default()
        }
    }

    fn image() -> ResourceSpec {
        let mut inputs = docker_build_properties();
        inputs.insert("repositoryUrl".to_string(), prop(TypeSpec::string(), "Url of the repository"));
        ResourceSpec::component(
            ObjectTypeSpec::object(
                "Builds a docker image and pushes to the ECR repository",
                props([("imageUri", prop(TypeSpec::string(), "Unique identifier of the pushed image"))]),
            )
            .required(&["imageUri"]),
            inputs,
        )
        .required_inputs(&["repositoryUrl"])
    }

    fn lifecycle_policy() -> ComplexTypeSpec {
        ComplexTypeSpec::object(ObjectTypeSpec::object(
            "Simplified lifecycle policy model consisting of one or more rules that determine which images in a repository should be expired. See https://docs.aws.amazon.com/AmazonECR/latest/userguide/lifecycle_policy_examples.html for more details.",
            props([
                (
                    "rules",
                    prop(
                        TypeSpec::array_of(local("awsx:ecr:lifecyclePolicyRule")),
                        "Specifies the rules to determine how images should be retired from this repository. Rules are ordered from lowest priority to highest.  If there is a rule with a `selection` value of `any`, then it will have the highest priority.",
                    ),
                ),
                ("skip", prop(TypeSpec::boolean().plain(), "Skips creation of the policy if set to `true`.")),
            ]),
        ))
    }

    fn lifecycle_policy_rule() -> ComplexTypeSpec {
        ComplexTypeSpec::object(
            ObjectTypeSpec::object(
                "A lifecycle policy rule that determine which images in a repository should be expired.",
                props([
                    ("description", prop(TypeSpec::string(), "Describes the purpose of a rule within a lifecycle policy.")),
                    (
                        "maximumNumberOfImages",
                        prop(
                            TypeSpec::number(),
                            "The maximum number of images that you want to retain in your repository. Either [maximumNumberOfImages] or [maximumAgeLimit] must be provided.",
                        ),
                    ),
                    (
                        "maximumAgeLimit",
                        prop(
                            TypeSpec::number(),
                            "The maximum age limit (in days) for your images. Either [maximumNumberOfImages] or [maximumAgeLimit] must be provided.",
                        ),
                    ),
                    (
                        "tagStatus",
                        prop(
                            local("awsx:ecr:lifecycleTagStatus"),
                            "Determines whether the lifecycle policy rule that you are adding specifies a tag for an image. Acceptable options are tagged, untagged, or any. If you specify any, then all images have the rule evaluated against them. If you specify tagged, then you must also specify a tagPrefixList value. If you specify untagged, then you must omit tagPrefixList.",
                        ),
                    ),
                    (
                        "tagPrefixList",
                        prop(
                            TypeSpec::array_of(TypeSpec::string()),
                            "A list of image tag prefixes on which to take action with your lifecycle policy. Only used if you specified \"tagStatus\": \"tagged\". For example, if your images are tagged as prod, prod1, prod2, and so on, you would use the tag prefix prod to specify all of them. If you specify multiple tags, only the images with all specified tags are selected.",
                        ),
                    ),
                ]),
            )
            .required(&["tagStatus"]),
        )
    }
}

impl ModuleGenerator for Ecr {
    fn name(&self) -> &'static str {
        "ecr"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws", "docker"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        Ok(Fragment::new(self.name())
            .with_resource(REPOSITORY, self.repository(providers)?)?
            .with_resource("awsx:ecr:Image", Self::image())?
            .with_function(BUILD_AND_PUSH_IMAGE, Self::build_and_push_image())?
            .with_type(
                "awsx:ecr:DockerBuild",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Arguments for building a docker image",
                    docker_build_properties(),
                )),
            )?
            .with_type(
                "awsx:ecr:BuilderVersion",
                ComplexTypeSpec::string_enum(
                    Some("The version of the Docker builder"),
                    vec![
                        EnumValueSpec::new("BuilderV1", "The first generation builder for Docker Daemon."),
                        EnumValueSpec::new("BuilderBuildKit", "The builder based on moby/buildkit project"),
                    ],
                ),
            )?
            .with_type("awsx:ecr:lifecyclePolicy", Self::lifecycle_policy())?
            .with_type("awsx:ecr:lifecyclePolicyRule", Self::lifecycle_policy_rule())?
            .with_type(
                "awsx:ecr:lifecycleTagStatus",
                ComplexTypeSpec::string_enum(
                    None,
                    vec![
                        EnumValueSpec::new("any", "Evaluate rule against all images").named("any"),
                        EnumValueSpec::new("untagged", "Only evaluate rule against untagged images").named("untagged"),
                        EnumValueSpec::new("tagged", "Only evaluated rule against images with specified prefixes")
                            .named("tagged"),
                    ],
                ),
            )?)
    }
}
