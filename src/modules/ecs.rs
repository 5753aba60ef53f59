use std::collections::{BTreeMap, BTreeSet};

use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::refs::{type_ref, RewriteRule};
use crate::rewriter::{collect_object_refs, rewrite_complex_type};
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, ResourceSpec, TypeSpec};

use super::{aws_resource, aws_type, local, prop, props, ModuleGenerator, ProviderSet};

const SERVICE_TEMPLATE: &str = "aws:ecs/service:Service";
const TASK_DEFINITION_TEMPLATE: &str = "aws:ecs/taskDefinition:TaskDefinition";

const NATIVE_PREFIX: &str = "aws-native:ecs:";
const LOCAL_PREFIX: &str = "awsx:ecs:";
const CONTAINER_DEFINITION: &str = "TaskDefinitionContainerDefinition";
const PORT_MAPPING: &str = "TaskDefinitionPortMapping";

/// Which ECS launch type a service/task definition pair targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchType {
    Fargate,
    Ec2,
}

impl LaunchType {
    const ALL: [LaunchType; 2] = [LaunchType::Fargate, LaunchType::Ec2];

    fn label(self) -> &'static str {
        match self {
            LaunchType::Fargate => "Fargate",
            LaunchType::Ec2 => "EC2",
        }
    }

    fn service_token(self) -> String {
        format!("{}{}Service", LOCAL_PREFIX, self.label())
    }

    fn task_definition_token(self) -> String {
        format!("{}{}TaskDefinition", LOCAL_PREFIX, self.label())
    }

    fn task_definition_args_token(self) -> String {
        format!("{}{}ServiceTaskDefinition", LOCAL_PREFIX, self.label())
    }

    /// EC2 tasks only need a network configuration in `awsvpc` mode.
    fn required_service_inputs(self) -> &'static [&'static str] {
        match self {
            LaunchType::Fargate => &["networkConfiguration"],
            LaunchType::Ec2 => &[],
        }
    }

    fn task_definition_output_description(self) -> &'static str {
        match self {
            LaunchType::Fargate => "Underlying Fargate component resource if created from args",
            LaunchType::Ec2 => "Underlying EC2 Task definition component resource if created from args",
        }
    }
}

/// Services and task definitions for the Fargate and EC2 launch types.
///
/// Container definitions are borrowed from `aws-native`, whose typed model is
/// richer than the JSON string `aws` accepts. The types are copied into this
/// package rather than referenced so SDKs don't gain an `aws-native`
/// dependency.
pub struct Ecs;

impl Ecs {
    fn task_definition(&self, providers: &ProviderSet) -> Result<ResourceSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", TASK_DEFINITION_TEMPLATE)?;
        let container = || local(&format!("{}{}", LOCAL_PREFIX, CONTAINER_DEFINITION));
        let default_role = || local("awsx:awsx:DefaultRoleWithPolicy").plain();

        let mut edits = Edit::delete_all(&[
            "containerDefinitions",
            "cpu",
            "executionRoleArn",
            "family",
            "memory",
            "taskRoleArn",
        ]);
        edits.extend([
            Edit::inject(
                "container",
                prop(
                    container().plain(),
                    "Single container to make a TaskDefinition from.  Useful for simple cases where there aren't\nmultiple containers, especially when creating a TaskDefinition to call [run] on.\n\nEither [container] or [containers] must be provided.",
                ),
            ),
            Edit::inject(
                "containers",
                prop(
                    TypeSpec::map_of(container()).plain(),
                    "All the containers to make a TaskDefinition from.  Useful when creating a Service that will\ncontain many containers within.\n\nEither [container] or [containers] must be provided.",
                ),
            ),
            Edit::inject(
                "cpu",
                prop(
                    TypeSpec::string(),
                    "The number of cpu units used by the task. If not provided, a default will be computed based on the cumulative needs specified by [containerDefinitions]",
                ),
            ),
            Edit::inject(
                "executionRole",
                prop(
                    default_role(),
                    "The execution role that the Amazon ECS container agent and the Docker daemon can assume.\nWill be created automatically if not defined.",
                ),
            ),
            Edit::inject(
                "family",
                prop(
                    TypeSpec::string(),
                    "An optional unique name for your task definition. If not specified, then a default will be created.",
                ),
            ),
            Edit::inject(
                "logGroup",
                prop(
                    local("awsx:awsx:DefaultLogGroup").plain(),
                    "A set of volume blocks that containers in your task may use.",
                ),
            ),
            Edit::inject(
                "memory",
                prop(
                    TypeSpec::string(),
                    "The amount (in MiB) of memory used by the task.  If not provided, a default will be computed\nbased on the cumulative needs specified by [containerDefinitions]",
                ),
            ),
            Edit::inject(
                "taskRole",
                prop(
                    default_role(),
                    "IAM role that allows your Amazon ECS container task to make calls to other AWS services.\nWill be created automatically if not defined.",
                ),
            ),
        ]);
        let inputs = Curation::new(self.name(), TASK_DEFINITION_TEMPLATE).derive(&template.input_properties, &edits)?;

        let outputs = props([
            (
                "taskDefinition",
                prop(aws_resource("ecs%2FtaskDefinition:TaskDefinition"), "Underlying ECS Task Definition resource"),
            ),
            (
                "logGroup",
                prop(
                    aws_resource("cloudwatch%2FlogGroup:LogGroup"),
                    "Auto-created Log Group resource for use by containers.",
                ),
            ),
            (
                "taskRole",
                prop(
                    aws_resource("iam%2Frole:Role"),
                    "Auto-created IAM role that allows your Amazon ECS container task to make calls to other AWS services.",
                ),
            ),
            (
                "executionRole",
                prop(
                    aws_resource("iam%2Frole:Role"),
                    "Auto-created IAM task execution role that the Amazon ECS container agent and the Docker daemon can assume.",
                ),
            ),
            (
                "loadBalancers",
                prop(
                    TypeSpec::array_of(aws_type("ecs%2FServiceLoadBalancer:ServiceLoadBalancer")),
                    "Computed load balancers from target groups specified of container port mappings.",
                ),
            ),
        ]);

        Ok(ResourceSpec::component(
            ObjectTypeSpec::object(
                "Create a TaskDefinition resource with the given unique name, arguments, and options.\nCreates required log-group and task & execution roles.\nPresents required Service load balancers if target group included in port mappings.",
                outputs,
            )
            .required(&["taskDefinition", "loadBalancers"]),
            inputs,
        ))
    }

    fn service(&self, providers: &ProviderSet, launch: LaunchType) -> Result<ResourceSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", SERVICE_TEMPLATE)?;
        let mut edits = Edit::delete_all(&["launchType", "taskDefinition", "waitForSteadyState"]);
        edits.extend([
            Edit::inject(
                "continueBeforeSteadyState",
                prop(
                    TypeSpec::boolean(),
                    "If `true`, this provider will not wait for the service to reach a steady state (like [`aws ecs wait services-stable`](https://docs.aws.amazon.com/cli/latest/reference/ecs/wait/services-stable.html)) before continuing. Default `false`.",
                ),
            ),
            Edit::inject(
                "taskDefinition",
                prop(
                    TypeSpec::string(),
                    "Family and revision (`family:revision`) or full ARN of the task definition that you want to run in your service. Either [taskDefinition] or [taskDefinitionArgs] must be provided.",
                ),
            ),
            Edit::inject(
                "taskDefinitionArgs",
                prop(
                    local(&launch.task_definition_args_token()),
                    "The args of task definition that you want to run in your service. Either [taskDefinition] or [taskDefinitionArgs] must be provided.",
                ),
            ),
        ]);
        let inputs = Curation::new(self.name(), SERVICE_TEMPLATE).derive(&template.input_properties, &edits)?;

        let outputs = props([
            ("service", prop(aws_resource("ecs%2fservice:Service"), "Underlying ECS Service resource")),
            (
                "taskDefinition",
                prop(
                    aws_resource("ecs%2FtaskDefinition:TaskDefinition"),
                    launch.task_definition_output_description(),
                ),
            ),
        ]);

        Ok(ResourceSpec::component(
            ObjectTypeSpec::object(
                format!(
                    "Create an ECS Service resource for {} with the given unique name, arguments, and options.\nCreates Task definition if `taskDefinitionArgs` is specified.",
                    launch.label()
                ),
                outputs,
            )
            .required(&["service"]),
            inputs,
        )
        .required_inputs(launch.required_service_inputs()))
    }

    /// Copy the container definition type and everything it references in
    /// its own namespace, renamed into this package.
    fn container_definition_types(
        &self,
        providers: &ProviderSet,
    ) -> Result<BTreeMap<String, ComplexTypeSpec>, AssembleError> {
        let rename = [RewriteRule::rename_types(NATIVE_PREFIX, LOCAL_PREFIX)?];
        let native_ref_prefix = type_ref(NATIVE_PREFIX);

        let mut pending = vec![CONTAINER_DEFINITION.to_string()];
        let mut seen = BTreeSet::new();
        let mut types = BTreeMap::new();

        while let Some(short) = pending.pop() {
            if !seen.insert(short.clone()) {
                continue;
            }
            let token = format!("{}{}", NATIVE_PREFIX, short);
            let native = providers.complex_type(self.name(), "aws-native", &token)?;
            pending.extend(
                collect_object_refs(&native.object)
                    .into_iter()
                    .filter_map(|r| r.strip_prefix(native_ref_prefix.as_str()))
                    .map(str::to_string),
            );
            types.insert(
                format!("{}{}", LOCAL_PREFIX, short),
                rewrite_complex_type(native.clone(), &rename),
            );
        }

        let port_mapping = format!("{}{}", LOCAL_PREFIX, PORT_MAPPING);
        let template = format!("{}{}", NATIVE_PREFIX, PORT_MAPPING);
        let mapping = types.get_mut(&port_mapping).ok_or_else(|| {
            AssembleError::shape(self.name(), &template, "aws-native", "is not reachable from the container definition in provider")
        })?;
        mapping.object.properties = Curation::new(self.name(), &template).apply(
            std::mem::take(&mut mapping.object.properties),
            &[Edit::inject(
                "targetGroup",
                prop(aws_resource("lb%2FtargetGroup:TargetGroup"), "Target group to attach the port mapping to."),
            )],
        )?;

        Ok(types)
    }
}

impl ModuleGenerator for Ecs {
    fn name(&self) -> &'static str {
        "ecs"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws", "aws-native"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        // Both launch types share the task definition inputs; the launch
        // type itself is fixed by the component at runtime.
        let task_definition = self.task_definition(providers)?;
        let task_definition_args = ComplexTypeSpec::object(ObjectTypeSpec::object(
            task_definition.object.description.clone().unwrap_or_default(),
            task_definition.input_properties.clone(),
        ));

        let mut fragment = Fragment::new(self.name());
        for launch in LaunchType::ALL {
            fragment.insert_resource(&launch.service_token(), self.service(providers, launch)?)?;
            fragment.insert_resource(&launch.task_definition_token(), task_definition.clone())?;
            fragment.insert_type(&launch.task_definition_args_token(), task_definition_args.clone())?;
        }
        fragment.extend_types(self.container_definition_types(providers)?)?;
        Ok(fragment)
    }
}
