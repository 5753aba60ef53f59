use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, TypeSpec};

use super::{local, plain_array_of_plain_strings, prop, props, ModuleGenerator, ProviderSet};

const ROLE_TEMPLATE: &str = "aws:iam/role:Role";

/// Role argument types used by components that create IAM roles.
pub struct Iam;

impl ModuleGenerator for Iam {
    fn name(&self) -> &'static str {
        "iam"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        let role = providers.resource(self.name(), "aws", ROLE_TEMPLATE)?;
        let role_args = Curation::new(self.name(), ROLE_TEMPLATE).derive(
            &role.input_properties,
            &[
                // Its upstream ref does not resolve to a real type; components fill it in.
                Edit::delete("assumeRolePolicy"),
                Edit::inject(
                    "policyArns",
                    prop(
                        plain_array_of_plain_strings(),
                        "ARNs of the policies to attach to the created role.",
                    ),
                ),
            ],
        )?;

        Ok(Fragment::new(self.name())
            .with_type(
                "awsx:awsx:DefaultRoleWithPolicy",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Role and policy attachments with default setup unless explicitly skipped or an existing role ARN provided.",
                    props([
                        ("skip", prop(TypeSpec::boolean().plain(), "Skips creation of the role if set to `true`.")),
                        (
                            "roleArn",
                            prop(
                                TypeSpec::string(),
                                "ARN of existing role to use instead of creating a new role. Cannot be used in combination with `args` or `opts`.",
                            ),
                        ),
                        (
                            "args",
                            prop(
                                local("awsx:awsx:RoleWithPolicy").plain(),
                                "Args to use when creating the role and policies. Can't be specified if `roleArn` is used.",
                            ),
                        ),
                    ]),
                )),
            )?
            .with_type(
                "awsx:awsx:RoleWithPolicy",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "The set of arguments for constructing a Role resource and Policy attachments.",
                    role_args,
                )),
            )?)
    }
}
