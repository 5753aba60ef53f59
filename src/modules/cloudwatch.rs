use crate::error::AssembleError;
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, TypeSpec};

use super::{local, prop, props, ModuleGenerator, ProviderSet};

const LOG_GROUP_TEMPLATE: &str = "aws:cloudwatch/logGroup:LogGroup";

/// Log group argument types.
pub struct Cloudwatch;

impl ModuleGenerator for Cloudwatch {
    fn name(&self) -> &'static str {
        "cloudwatch"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        let log_group = providers.resource(self.name(), "aws", LOG_GROUP_TEMPLATE)?;

        let existing = || {
            prop(
                local("awsx:awsx:ExistingLogGroup").plain(),
                "Identity of an existing log group to use. Cannot be used in combination with `args` or `opts`.",
            )
        };
        let args = || {
            prop(
                local("awsx:awsx:LogGroup").plain(),
                "Arguments to use instead of the default values during creation.",
            )
        };

        Ok(Fragment::new(self.name())
            .with_type(
                "awsx:awsx:DefaultLogGroup",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Log group with default setup unless explicitly skipped.",
                    props([
                        ("skip", prop(TypeSpec::boolean().plain(), "Skip creation of the log group.")),
                        ("existing", existing()),
                        ("args", args()),
                    ]),
                )),
            )?
            .with_type(
                "awsx:awsx:OptionalLogGroup",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "Log group which is only created if enabled.",
                    props([
                        ("enable", prop(TypeSpec::boolean().plain(), "Enable creation of the log group.")),
                        ("existing", existing()),
                        ("args", args()),
                    ]),
                )),
            )?
            .with_type(
                "awsx:awsx:ExistingLogGroup",
                ComplexTypeSpec::object(
                    ObjectTypeSpec::object(
                        "Reference to an existing log group.",
                        props([
                            ("arn", prop(TypeSpec::string(), "Arn of the log group. Only one of [arn] or [name] can be specified.")),
                            ("name", prop(TypeSpec::string(), "Name of the log group. Only one of [arn] or [name] can be specified.")),
                            (
                                "region",
                                prop(
                                    TypeSpec::string(),
                                    "Region of the log group. If not specified, the provider region will be used.",
                                ),
                            ),
                        ]),
                    ),
                ),
            )?
            .with_type(
                "awsx:awsx:LogGroup",
                ComplexTypeSpec::object(ObjectTypeSpec::object(
                    "The set of arguments for constructing a LogGroup resource.",
                    log_group.input_properties.clone(),
                )),
            )?)
    }
}
