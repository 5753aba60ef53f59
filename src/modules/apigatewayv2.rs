use crate::curation::{Curation, Edit};
use crate::error::AssembleError;
use crate::types::{ComplexTypeSpec, Fragment, ObjectTypeSpec, ResourceSpec, TypeSpec};

use super::{aws_resource, local, prop, props, ModuleGenerator, ProviderSet};

const API_TEMPLATE: &str = "aws:apigatewayv2/api:Api";

/// HTTP APIs with routes, integrations and stages declared inline.
pub struct ApiGatewayV2;

/// `{ [key]: T }` with both the map and the values plain.
fn plain_map_of(name: &str) -> TypeSpec {
    TypeSpec::map_of(local(&format!("awsx:apigatewayv2:{}", name)).plain()).plain()
}

fn upstream(name: &str) -> TypeSpec {
    let capitalized = {
        let mut chars = name.chars();
        chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default()
    };
    aws_resource(&format!("apigatewayv2%2F{}:{}", name, capitalized))
}

impl ApiGatewayV2 {
    fn http_api(&self, providers: &ProviderSet) -> Result<ResourceSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", API_TEMPLATE)?;
        let inputs = Curation::new(self.name(), API_TEMPLATE).derive(
            &template.input_properties,
            &[
                // Always HTTP.
                Edit::delete("protocolType"),
                // "Quick create" inputs, replaced by the inline maps below.
                Edit::delete("target"),
                Edit::delete("routeKey"),
                Edit::delete("credentialsArn"),
                Edit::override_with("routes", prop(plain_map_of("HttpRoute"), "The routes for the HTTP API.")),
                Edit::override_with(
                    "integrations",
                    prop(
                        plain_map_of("HttpIntegration"),
                        "A map of integrations keyed by name for the HTTP API routes.",
                    ),
                ),
                Edit::override_with(
                    "authorizers",
                    prop(plain_map_of("HttpAuthorizer"), "The authorizers for the HTTP API routes."),
                ),
                Edit::override_with("stages", prop(plain_map_of("HttpStage"), "The deployment stages for the HTTP API.")),
                Edit::override_with(
                    "domainMappings",
                    prop(plain_map_of("DomainMapping"), "The domain names for the HTTP API."),
                ),
            ],
        )?;

        let many = |name: &str, description: &str| prop(TypeSpec::array_of(upstream(name)), description);
        let outputs = props([
            ("api", prop(upstream("api"), "The underlying API resource.")),
            (
                "routes",
                many(
                    "route",
                    "The routes for the HTTP API. This is a map from route key (for example `GET /pets`) to route arguments.",
                ),
            ),
            (
                "integrations",
                many(
                    "integration",
                    "The integrations for the HTTP API routes. This is a map from integration name to the integration arguments.",
                ),
            ),
            ("authorizers", many("authorizer", "The authorizers for the HTTP API routes.")),
            ("stages", many("stage", "The deployment stages for the HTTP API.")),
            ("deployment", prop(upstream("deployment"), "The deployment for the HTTP API.")),
            ("domainNames", many("domainName", "The domain names for the HTTP API.")),
            ("apiMappings", many("apiMapping", "The API mappings for the HTTP API.")),
        ]);

        Ok(ResourceSpec::component(
            ObjectTypeSpec::object("Creates an HTTP API with associated sub-resources.", outputs).required(&[
                "api",
                "routes",
                "integrations",
                "authorizers",
                "stages",
                "deployment",
                "domainNames",
            ]),
            inputs,
        )
        .required_inputs(&["routes"]))
    }

    /// An argument type derived from a template resource, keeping its
    /// description.
    fn derived(
        &self,
        providers: &ProviderSet,
        token: &str,
        edits: &[Edit],
        required: &[&str],
    ) -> Result<ComplexTypeSpec, AssembleError> {
        let template = providers.resource(self.name(), "aws", token)?;
        let properties = Curation::new(self.name(), token).derive(&template.input_properties, edits)?;
        Ok(ComplexTypeSpec::object(
            ObjectTypeSpec::object(template.object.description.clone().unwrap_or_default(), properties)
                .required(required),
        ))
    }

    fn http_route(&self, providers: &ProviderSet) -> Result<ComplexTypeSpec, AssembleError> {
        let mut edits = Edit::delete_all(&[
            "apiId",
            // Inferred from the map key.
            "routeKey",
            // WebSocket only.
            "requestModels",
            "requestParameters",
            "routeResponseSelectionExpression",
            "modelSelectionExpression",
        ]);
        edits.extend([
            Edit::inject(
                "integration",
                prop(
                    local("awsx:apigatewayv2:HttpIntegration").plain(),
                    "Details of the integration to be created for this route. Only one of `integration`, `integrationName` or `target` can be specified.",
                ),
            ),
            Edit::inject(
                "integrationName",
                prop(
                    TypeSpec::string(),
                    "The name of the target integration for the route specified in the `integrations` property. This is used to automatically calculate the `target` property of the route. Only one of `integration`, `integrationName` or `target` can be specified. This does not need to be prefixed with \"integrations/\".",
                ),
            ),
            Edit::inject(
                "authorizer",
                prop(
                    TypeSpec::string(),
                    "The key of the target authorizer for the route specified in the `authorizers` property. This is used to automatically calculate the `authorizerId` property of the route.",
                ),
            ),
            Edit::describe(
                "target",
                " Only one of `integration`, `integrationName` or `target` can be specified.",
            ),
        ]);
        self.derived(providers, "aws:apigatewayv2/route:Route", &edits, &[])
    }

    fn http_integration(&self, providers: &ProviderSet) -> Result<ComplexTypeSpec, AssembleError> {
        let mut edits = Edit::delete_all(&[
            "apiId",
            // WebSocket only.
            "requestTemplates",
            "contentHandlingStrategy",
            "passthroughBehavior",
            "templateSelectionExpression",
        ]);
        edits.extend([
            Edit::inject(
                "lambdaArn",
                prop(
                    TypeSpec::string(),
                    "The ARN of a lambda function to invoke for the integration. This is used to automatically calculate the `integrationType` and `integrationUri` property of the integration and give permission for the API Gateway to execute the lambda. Exactly one of `lambdaArn` or `integrationUri` must be specified.",
                ),
            ),
            Edit::describe(
                "integrationUri",
                " Exactly one of `lambdaArn` or `integrationUri` must be specified.",
            ),
        ]);
        self.derived(providers, "aws:apigatewayv2/integration:Integration", &edits, &[])
    }

    fn domain_mapping(&self, providers: &ProviderSet) -> Result<ComplexTypeSpec, AssembleError> {
        let edits = [
            Edit::delete("apiId"),
            Edit::delete("domainName"),
            Edit::inject(
                "domainConfiguration",
                prop(
                    local("awsx:apigatewayv2:DomainConfiguration").plain(),
                    "Configuration of the domain name to create. Cannot be specified together with `domainId`.",
                ),
            ),
            Edit::inject(
                "domainId",
                prop(
                    TypeSpec::string(),
                    "Identifier of an existing domain. Cannot be specified together with `domainConfiguration`.",
                ),
            ),
        ];
        self.derived(providers, "aws:apigatewayv2/apiMapping:ApiMapping", &edits, &["stage"])
    }
}

impl ModuleGenerator for ApiGatewayV2 {
    fn name(&self) -> &'static str {
        "apigatewayv2"
    }

    fn providers(&self) -> &'static [&'static str] {
        &["aws"]
    }

    fn generate(&self, providers: &ProviderSet) -> Result<Fragment, AssembleError> {
        let without_api_id = [Edit::delete("apiId")];
        Ok(Fragment::new(self.name())
            .with_resource("awsx:apigatewayv2:HttpApi", self.http_api(providers)?)?
            .with_type("awsx:apigatewayv2:HttpRoute", self.http_route(providers)?)?
            .with_type("awsx:apigatewayv2:HttpIntegration", self.http_integration(providers)?)?
            .with_type(
                "awsx:apigatewayv2:HttpAuthorizer",
                self.derived(
                    providers,
                    "aws:apigatewayv2/authorizer:Authorizer",
                    &without_api_id,
                    &["authorizerType"],
                )?,
            )?
            .with_type(
                "awsx:apigatewayv2:HttpStage",
                self.derived(providers, "aws:apigatewayv2/stage:Stage", &without_api_id, &[])?,
            )?
            .with_type("awsx:apigatewayv2:DomainMapping", self.domain_mapping(providers)?)?
            .with_type(
                "awsx:apigatewayv2:DomainConfiguration",
                self.derived(
                    providers,
                    "aws:apigatewayv2/domainName:DomainName",
                    &[Edit::delete("domainName")],
                    &["domainNameConfiguration"],
                )?,
            )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::*;

    fn providers(api_inputs: &[&str]) -> ProviderSet {
        set(vec![aws_with(&[
            (API_TEMPLATE, resource("Manages an Amazon API Gateway Version 2 API.", api_inputs)),
            (
                "aws:apigatewayv2/route:Route",
                resource(
                    "Manages an Amazon API Gateway Version 2 route.",
                    &[
                        "apiId",
                        "routeKey",
                        "requestModels",
                        "requestParameters",
                        "routeResponseSelectionExpression",
                        "modelSelectionExpression",
                        "target",
                        "authorizationType",
                    ],
                ),
            ),
            (
                "aws:apigatewayv2/integration:Integration",
                resource(
                    "Manages an Amazon API Gateway Version 2 integration.",
                    &[
                        "apiId",
                        "requestTemplates",
                        "contentHandlingStrategy",
                        "passthroughBehavior",
                        "templateSelectionExpression",
                        "integrationUri",
                        "integrationType",
                    ],
                ),
            ),
            (
                "aws:apigatewayv2/authorizer:Authorizer",
                resource("Manages an authorizer.", &["apiId", "authorizerType"]),
            ),
            ("aws:apigatewayv2/stage:Stage", resource("Manages a stage.", &["apiId", "name"])),
            (
                "aws:apigatewayv2/apiMapping:ApiMapping",
                resource("Manages an API mapping.", &["apiId", "domainName", "stage"]),
            ),
            (
                "aws:apigatewayv2/domainName:DomainName",
                resource("Manages a domain name.", &["domainName", "domainNameConfiguration"]),
            ),
        ])])
    }

    const API_INPUTS: &[&str] = &["protocolType", "target", "routeKey", "credentialsArn", "name", "routes"];

    #[test]
    fn http_api_replaces_quick_create_inputs() {
        let fragment = ApiGatewayV2.generate(&providers(API_INPUTS)).unwrap();
        let api = &fragment.resources["awsx:apigatewayv2:HttpApi"];

        for gone in ["protocolType", "target", "routeKey", "credentialsArn"] {
            assert!(!api.input_properties.contains_key(gone), "{gone} should be removed");
        }
        // The inline map wins over a same-named template input.
        assert_eq!(api.input_properties["routes"].type_spec, plain_map_of("HttpRoute"));
        assert!(api.input_properties.contains_key("name"));
        assert_eq!(api.required_inputs, vec!["routes"]);
        assert_eq!(
            api.object.properties["api"].type_spec.reference.as_deref(),
            Some("#/resources/aws:apigatewayv2%2Fapi:Api")
        );
    }

    #[test]
    fn route_target_description_mentions_alternatives() {
        let fragment = ApiGatewayV2.generate(&providers(API_INPUTS)).unwrap();
        let route = &fragment.types["awsx:apigatewayv2:HttpRoute"].object;
        assert_eq!(
            route.properties["target"].description.as_deref(),
            Some("The target. Only one of `integration`, `integrationName` or `target` can be specified.")
        );
        assert!(!route.properties.contains_key("apiId"));
        assert!(route.properties.contains_key("integrationName"));
    }

    #[test]
    fn domain_types_require_their_keys() {
        let fragment = ApiGatewayV2.generate(&providers(API_INPUTS)).unwrap();
        assert_eq!(fragment.types["awsx:apigatewayv2:DomainMapping"].object.required, vec!["stage"]);
        assert_eq!(
            fragment.types["awsx:apigatewayv2:DomainConfiguration"].object.required,
            vec!["domainNameConfiguration"]
        );
        assert_eq!(fragment.types.len(), 6);
    }

    #[test]
    fn api_template_without_credentials_arn_fails() {
        let err = ApiGatewayV2
            .generate(&providers(&["protocolType", "target", "routeKey"]))
            .unwrap_err();
        assert!(err.to_string().ends_with("has no property 'credentialsArn'"));
    }

    #[test]
    fn each_missing_quick_create_input_names_itself() {
        for missing in ["target", "routeKey", "credentialsArn"] {
            let inputs: Vec<&str> = API_INPUTS.iter().copied().filter(|p| *p != missing).collect();
            match ApiGatewayV2.generate(&providers(&inputs)).unwrap_err() {
                AssembleError::SchemaShape {
                    module,
                    template,
                    property,
                    ..
                } => {
                    assert_eq!(module, "apigatewayv2");
                    assert_eq!(template, API_TEMPLATE);
                    assert_eq!(property, missing);
                }
                other => panic!("expected shape error for {missing}, got {other:?}"),
            }
        }
    }
}
