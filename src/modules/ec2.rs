use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::types::{
    ComplexTypeSpec, EnumValueSpec, Fragment, FunctionSpec, ObjectTypeSpec, ResourceSpec, TypeSpec,
};

use super::{
    aws_resource, local, plain_array_of_plain_strings, prop, props, renamed, ModuleGenerator,
    ProviderSet,
};

const SECURITY_GROUP_TEMPLATE: &str = "aws:ec2/securityGroup:SecurityGroup";
const VPC_TEMPLATE: &str = "aws:ec2/vpc:Vpc";

/// Networking: the VPC component, its layout types and security group args.
pub struct Ec2;

impl Ec2 {
    fn default_security_group() -> ComplexTypeSpec {
        ComplexTypeSpec::object(ObjectTypeSpec::object(
            "Security Group with default setup unless explicitly skipped or an existing security group id provided.",
            props([
                ("skip", prop(TypeSpec::boolean().plain(), "Skips creation of the security group if set to `true`.")),
                (
                    "securityGroupId",
                    prop(
                        TypeSpec::string(),
                        "Id of existing security group to use instead of creating a new security group. Cannot be used in combination with `args` or `opts`.",
                    ),
                ),
                (
                    "args",
                    prop(
                        local("awsx:awsx:SecurityGroup").plain(),
                        "Args to use when creating the security group. Can't be specified if `securityGroupId` is used.",
                    ),
                ),
            ]),
        ))
    }

    fn vpc(&self, providers: &ProviderSet) -> Result<ResourceSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", VPC_TEMPLATE)?;
        // Redefined as plain inputs because the component computes defaults for them.
        let inputs = Curation::new(self.name(), VPC_TEMPLATE).derive(
            &template.input_properties,
            &[
                Edit::override_with(
                    "availabilityZoneNames",
                    prop(
                        plain_array_of_plain_strings(),
                        "A list of availability zone names to which the subnets defined in subnetSpecs will be deployed. Optional, defaults to the first 3 AZs in the current region.",
                    ),
                ),
                Edit::override_with(
                    "numberOfAvailabilityZones",
                    prop(
                        TypeSpec::integer().plain(),
                        "A number of availability zones to which the subnets defined in subnetSpecs will be deployed. Optional, defaults to the first 3 AZs in the current region.",
                    ),
                ),
                Edit::override_with(
                    "cidrBlock",
                    prop(
                        TypeSpec::string().plain(),
                        "The CIDR block for the VPC. Optional. Defaults to 10.0.0.0/16.",
                    ),
                ),
                Edit::override_with(
                    "natGateways",
                    prop(
                        local("awsx:ec2:NatGatewayConfiguration").plain(),
                        "Configuration for NAT Gateways. Optional. If private and public subnets are both specified, defaults to one gateway per availability zone. Otherwise, no gateways will be created.",
                    ),
                ),
                Edit::override_with(
                    "subnetSpecs",
                    prop(
                        TypeSpec::array_of(local("awsx:ec2:SubnetSpec").plain()).plain(),
                        "A list of subnet specs that should be deployed to each AZ specified in availabilityZoneNames. Optional. Defaults to a (smaller) public subnet and a (larger) private subnet based on the size of the CIDR block for the VPC.",
                    ),
                ),
            ],
        )?;

        let subnet_ids = |kind: &str| prop(TypeSpec::array_of(TypeSpec::string()), &format!("The IDs of the {} subnets.", kind));
        let outputs = props([
            ("vpc", prop(aws_resource("ec2%2fvpc:Vpc"), "The VPC.").with_language("csharp", renamed("AwsVpc"))),
            ("vpcId", prop(TypeSpec::string(), "The ID of the VPC.")),
            ("subnets", prop(TypeSpec::array_of(aws_resource("ec2%2fsubnet:Subnet")), "The VPC's subnets.")),
            ("publicSubnetIds", subnet_ids("public")),
            ("privateSubnetIds", subnet_ids("private")),
            ("isolatedSubnetIds", subnet_ids("isolated")),
            (
                "natGateways",
                prop(TypeSpec::array_of(aws_resource("ec2%2fnatGateway:NatGateway")), "The NAT Gateways for the VPC. If no NAT Gateways are specified, this will be an empty list."),
            ),
            (
                "internetGateway",
                prop(aws_resource("ec2%2finternetGateway:InternetGateway"), "The Internet Gateway for the VPC."),
            ),
        ]);
        let mut object = ObjectTypeSpec::object(
            "The VPC component provides a VPC with configured subnets and NAT gateways.",
            outputs,
        );
        // Every output is always set.
        object.required = object.properties.keys().cloned().collect();

        Ok(ResourceSpec::component(object, inputs))
    }

    fn subnet_type() -> ComplexTypeSpec {
        ComplexTypeSpec::string_enum(
            Some("A type of subnet within a VPC."),
            vec![
                EnumValueSpec::new("Public", "A subnet whose hosts can directly communicate with the internet."),
                EnumValueSpec::new(
                    "Private",
                    "A subnet whose hosts can not directly communicate with the internet, but can initiate outbound network traffic via a NAT Gateway.",
                ),
                EnumValueSpec::new("Isolated", "A subnet whose hosts have no connectivity with the internet."),
            ],
        )
    }

    fn nat_gateway_strategy() -> ComplexTypeSpec {
        ComplexTypeSpec::string_enum(
            Some("A strategy for creating NAT Gateways for private subnets within a VPC."),
            vec![
                EnumValueSpec::new(
                    "None",
                    "Do not create any NAT Gateways. Resources in private subnets will not be able to access the internet.",
                ),
                EnumValueSpec::new(
                    "Single",
                    "Create a single NAT Gateway for the entire VPC. This configuration is not recommended for production infrastructure as it creates a single point of failure.",
                ),
                EnumValueSpec::new(
                    "OnePerAz",
                    "Create a NAT Gateway in each availability zone. This is the recommended configuration for production infrastructure.",
                ),
            ],
        )
    }

    fn nat_gateway_configuration() -> ComplexTypeSpec {
        ComplexTypeSpec::object(
            ObjectTypeSpec::object(
                "Configuration for NAT Gateways.",
                props([
                    (
                        "strategy",
                        prop(local("awsx:ec2:NatGatewayStrategy").plain(), "The strategy for deploying NAT Gateways."),
                    ),
                    (
                        "elasticIpAllocationIds",
                        prop(
                            TypeSpec::array_of(TypeSpec::string()).plain(),
                            "A list of EIP allocation IDs to assign to the NAT Gateways. Optional. If specified, the number of supplied values must match the chosen strategy (either one, or the number of availability zones).",
                        ),
                    ),
                ]),
            )
            .required(&["strategy"]),
        )
    }

    fn subnet_spec() -> ComplexTypeSpec {
        ComplexTypeSpec::object(
            ObjectTypeSpec::object(
                "Configuration for a VPC subnet.",
                props([
                    ("type", prop(local("awsx:ec2:SubnetType").plain(), "The type of subnet.")),
                    ("name", prop(TypeSpec::string().plain(), "The subnet's name. Will be templated upon creation.")),
                    ("cidrMask", prop(TypeSpec::integer().plain(), "The bitmask for the subnet's CIDR block.")),
                ]),
            )
            .required(&["type"]),
        )
    }

    fn default_vpc_outputs(description: &str) -> ObjectTypeSpec {
        let ids = |kind: &str| prop(TypeSpec::array_of(TypeSpec::string()), &format!("IDs of the {} subnets of the default VPC.", kind));
        ObjectTypeSpec::object(
            description,
            props([
                ("vpcId", prop(TypeSpec::string(), "ID of the default VPC.")),
                ("publicSubnetIds", ids("public")),
                ("privateSubnetIds", ids("private")),
            ]),
        )
        .required(&["vpcId", "publicSubnetIds", "privateSubnetIds"])
    }

    /// Creates nothing; resolves the account's default VPC at runtime.
    fn default_vpc() -> ResourceSpec {
        ResourceSpec::component(
            Self::default_vpc_outputs(
                "Pseudo resource representing the default VPC and associated subnets for an account and region. This does not create any resources. This will be replaced with `getDefaultVpc` in the future.",
            ),
            Default::default(),
        )
    }

    fn get_default_vpc() -> FunctionSpec {
        FunctionSpec {
            description: Some("Get the Default VPC for a region.".to_string()),
            inputs: Some(ObjectTypeSpec::object("Arguments for the default VPC lookup.", Default::default())),
            outputs: Some(Self::default_vpc_outputs("Outputs from the default VPC configuration.")),
            ..FunctionSpec::default()
        }
    }
}

impl ModuleGenerator for Ec2 {
    fn name(&self) -> &'static str {
        "ec2"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        let security_group = providers.resource(self.name(), "aws", SECURITY_GROUP_TEMPLATE)?;
        let security_group_args = Curation::new(self.name(), SECURITY_GROUP_TEMPLATE)
            .derive(&security_group.input_properties, &[])?;

        Ok(Fragment::new(self.name())
            .with_type("awsx:awsx:DefaultSecurityGroup", Self::default_security_group())?
            .with_type(
                "awsx:awsx:SecurityGroup",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "The set of arguments for constructing a Security Group resource.",
                    security_group_args,
                )),
            )?
            .with_resource("awsx:ec2:Vpc", self.vpc(providers)?)?
            .with_resource("awsx:ec2:DefaultVpc", Self::default_vpc())?
            .with_type("awsx:ec2:SubnetType", Self::subnet_type())?
            .with_type("awsx:ec2:NatGatewayStrategy", Self::nat_gateway_strategy())?
            .with_type("awsx:ec2:NatGatewayConfiguration", Self::nat_gateway_configuration())?
            .with_type("awsx:ec2:SubnetSpec", Self::subnet_spec())?
            .with_function("awsx:ec2:getDefaultVpc", Self::get_default_vpc())?)
    }
}
