use serde_json::json;

use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, ResourceSpec, TypeSpec};

use super::{aws_resource, local, prop, props, renamed, ModuleGenerator, ProviderSet};

const LOAD_BALANCER_TEMPLATE: &str = "aws:lb/loadBalancer:LoadBalancer";
const LISTENER_TEMPLATE: &str = "aws:lb/listener:Listener";
const TARGET_GROUP_TEMPLATE: &str = "aws:lb/targetGroup:TargetGroup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Application,
    Network,
}

/// Load balancers with default listeners and target groups.
pub struct Lb;

impl Lb {
    fn load_balancer(&self, providers: &ProviderSet, flavor: Flavor) -> Result<ResourceSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", LOAD_BALANCER_TEMPLATE)?;

        let mut edits = vec![
            match flavor {
                Flavor::Application => Edit::delete("enableCrossZoneLoadBalancing"),
                Flavor::Network => Edit::delete("enableHttp2"),
            },
            Edit::delete("loadBalancerType"),
            // Accept subnet resources as well as IDs.
            Edit::rename("subnets", "subnetIds"),
            Edit::inject(
                "subnets",
                prop(
                    TypeSpec::array_of(aws_resource("ec2%2fsubnet:Subnet")),
                    "A list of subnets to attach to the LB. Only one of [subnets], [subnetIds] or [subnetMappings] can be specified",
                ),
            ),
        ];
        // NLB security groups can't be added later, so no default one is offered.
        if flavor == Flavor::Application {
            edits.push(Edit::inject(
                "defaultSecurityGroup",
                prop(
                    local("awsx:awsx:DefaultSecurityGroup").plain(),
                    "Options for creating a default security group if [securityGroups] not specified.",
                ),
            ));
        }
        edits.extend([
            Edit::inject(
                "defaultTargetGroup",
                prop(local("awsx:lb:TargetGroup").plain(), "Options creating a default target group."),
            ),
            Edit::inject(
                "defaultTargetGroupPort",
                prop(
                    TypeSpec::integer(),
                    "Port to use to connect with the target. Valid values are ports 1-65535. Defaults to 80.\n",
                ),
            ),
            Edit::inject(
                "listener",
                prop(
                    local("awsx:lb:Listener").plain(),
                    "A listener to create. Only one of [listener] and [listeners] can be specified.",
                ),
            ),
            Edit::inject(
                "listeners",
                prop(
                    TypeSpec::array_of(local("awsx:lb:Listener").plain()).plain(),
                    "List of listeners to create. Only one of [listener] and [listeners] can be specified.",
                ),
            ),
        ]);
        let inputs = Curation::new(self.name(), LOAD_BALANCER_TEMPLATE).derive(&template.input_properties, &edits)?;

        let mut outputs = props([
            (
                "loadBalancer",
                prop(aws_resource("lb%2floadBalancer:LoadBalancer"), "Underlying Load Balancer resource"),
            ),
            ("vpcId", prop(TypeSpec::string(), "Id of the VPC in which this load balancer is operating")),
            (
                "defaultTargetGroup",
                prop(aws_resource("lb%2ftargetGroup:TargetGroup"), "Default target group, if auto-created"),
            ),
            (
                "listeners",
                prop(
                    TypeSpec::array_of(aws_resource("lb%2flistener:Listener")),
                    "Listeners created as part of this load balancer",
                ),
            ),
        ]);
        let description = match flavor {
            Flavor::Application => {
                outputs.insert(
                    "defaultSecurityGroup".to_string(),
                    prop(
                        aws_resource("ec2%2fsecurityGroup:SecurityGroup"),
                        "Default security group, if auto-created",
                    ),
                );
                "Provides an Application Load Balancer resource with listeners, default target group and default security group."
            }
            Flavor::Network => {
                "Provides a Network Load Balancer resource with listeners and default target group."
            }
        };

        Ok(ResourceSpec::component(
            ObjectTypeSpec::object(description, outputs).required(&["loadBalancer", "defaultTargetGroup"]),
            inputs,
        ))
    }

    fn target_group_attachment() -> ResourceSpec {
        const ONE_TARGET: &str = "Exactly 1 of [instance], [instanceId], [lambda] or [lambdaArn] must be provided.";
        const ONE_GROUP: &str = "Exactly one of [targetGroup] or [targetGroupArn] must be specified.";

        let inputs = props([
            (
                "targetGroup",
                prop(
                    aws_resource("lb%2ftargetGroup:TargetGroup"),
                    &format!("Target Group to attach to. {}", ONE_GROUP),
                ),
            ),
            (
                "targetGroupArn",
                prop(TypeSpec::string(), &format!("ARN of the Target Group to attach to. {}", ONE_GROUP)),
            ),
            (
                "instance",
                prop(
                    aws_resource("ec2%2finstance:Instance"),
                    &format!("EC2 Instance to attach to the Target Group. {}", ONE_TARGET),
                ),
            ),
            (
                "instanceId",
                prop(
                    TypeSpec::string(),
                    &format!("ID of an EC2 Instance to attach to the Target Group. {}", ONE_TARGET),
                ),
            ),
            (
                "lambda",
                prop(
                    aws_resource("lambda%2ffunction:Function"),
                    &format!("Lambda Function to attach to the Target Group. {}", ONE_TARGET),
                )
                .with_language("python", json!({ "name": "function" })),
            ),
            (
                "lambdaArn",
                prop(
                    TypeSpec::string(),
                    &format!("ARN of a Lambda Function to attach to the Target Group. {}", ONE_TARGET),
                ),
            ),
        ]);
        let outputs = props([
            (
                "targetGroupAttachment",
                prop(
                    aws_resource("lb%2ftargetGroupAttachment:TargetGroupAttachment"),
                    "Underlying Target Group Attachment resource",
                )
                .with_language("csharp", renamed("Attachment")),
            ),
            (
                "lambdaPermission",
                prop(
                    aws_resource("lambda%2fpermission:Permission"),
                    "Auto-created Lambda permission, if targeting a Lambda function",
                ),
            ),
        ]);

        ResourceSpec::component(
            ObjectTypeSpec::object(
                "Attach an EC2 instance or Lambda to a Load Balancer. This will create required permissions if attaching to a Lambda Function.",
                outputs,
            )
            .required(&["targetGroupAttachment"]),
            inputs,
        )
    }

    /// An argument type copied from a template resource's inputs, keeping its
    /// description.
    fn args_type(&self, providers: &ProviderSet, token: &str, edits: &[Edit]) -> Result<ComplexTypeSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", token)?;
        let properties = Curation::new(self.name(), token).derive(&template.input_properties, edits)?;
        let description = template.object.description.clone().unwrap_or_default();
        Ok(ComplexTypeSpec::object(ObjectTypeSpec::object(description, properties)))
    }
}

impl ModuleGenerator for Lb {
    fn name(&self) -> &'static str {
        "lb"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        Ok(Fragment::new(self.name())
            .with_resource(
                "awsx:lb:ApplicationLoadBalancer",
                self.load_balancer(providers, Flavor::Application)?,
            )?
            .with_resource(
                "awsx:lb:NetworkLoadBalancer",
                self.load_balancer(providers, Flavor::Network)?,
            )?
            .with_resource("awsx:lb:TargetGroupAttachment", Self::target_group_attachment())?
            .with_type(
                "awsx:lb:Listener",
                self.args_type(providers, LISTENER_TEMPLATE, &[Edit::delete("loadBalancerArn")])?,
            )?
            .with_type("awsx:lb:TargetGroup", self.args_type(providers, TARGET_GROUP_TEMPLATE, &[])?)?)
    }
}
