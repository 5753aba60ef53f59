//! Structured type references and the rewrite rules that anchor them.
//!
//! On the wire a reference is a string:
//!
//! | Form | Example |
//! |------|---------|
//! | local | `#/types/awsx:ecr:lifecyclePolicy` |
//! | external | `/aws/v6.0.0/schema.json#/resources/aws:ec2%2fvpc:Vpc` |
//! | builtin | `pulumi.json#/Archive` |
//!
//! The `types`/`resources`/`functions` segment is kept distinct in every
//! form; collapsing it would break lookups against real upstream documents.

use std::fmt;

use crate::error::AssembleError;
use crate::types::ProviderDescriptor;

/// The document mapping a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    Types,
    Resources,
    Functions,
}

impl RefKind {
    pub const ALL: [RefKind; 3] = [RefKind::Types, RefKind::Resources, RefKind::Functions];

    pub fn segment(&self) -> &'static str {
        match self {
            RefKind::Types => "types",
            RefKind::Resources => "resources",
            RefKind::Functions => "functions",
        }
    }

    fn from_segment(s: &str) -> Option<Self> {
        match s {
            "types" => Some(RefKind::Types),
            "resources" => Some(RefKind::Resources),
            "functions" => Some(RefKind::Functions),
            _ => None,
        }
    }
}

/// A parsed reference string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Points into the same document.
    Local { kind: RefKind, name: String },
    /// Points into another package's document at a specific version.
    External {
        package: String,
        version: String,
        kind: RefKind,
        name: String,
    },
    /// Points at a type built into the schema language (`Any`, `Archive`, ...).
    Builtin { name: String },
}

impl Reference {
    pub fn local(kind: RefKind, name: impl Into<String>) -> Self {
        Reference::Local {
            kind,
            name: name.into(),
        }
    }

    /// Parse a wire reference. Returns `None` for strings matching no form.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(name) = s.strip_prefix("pulumi.json#/") {
            return (!name.is_empty()).then(|| Reference::Builtin {
                name: name.to_string(),
            });
        }

        let (location, fragment) = s.split_once('#')?;
        let (kind, name) = fragment.strip_prefix('/')?.split_once('/')?;
        let kind = RefKind::from_segment(kind)?;
        if name.is_empty() {
            return None;
        }

        if location.is_empty() {
            return Some(Reference::local(kind, name));
        }

        // "/<package>/<version>/schema.json"
        let mut parts = location.strip_prefix('/')?.split('/');
        let package = parts.next().filter(|p| !p.is_empty())?;
        let version = parts.next().filter(|v| !v.is_empty())?;
        if parts.next()? != "schema.json" || parts.next().is_some() {
            return None;
        }

        Some(Reference::External {
            package: package.to_string(),
            version: version.to_string(),
            kind,
            name: name.to_string(),
        })
    }

    /// The in-document path (`/types/<name>`), identical across all forms.
    pub fn path(&self) -> String {
        match self {
            Reference::Local { kind, name } | Reference::External { kind, name, .. } => {
                format!("/{}/{}", kind.segment(), name)
            }
            Reference::Builtin { name } => format!("/{}", name),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Local { .. } => write!(f, "#{}", self.path()),
            Reference::External {
                package, version, ..
            } => write!(f, "/{}/{}/schema.json#{}", package, version, self.path()),
            Reference::Builtin { name } => write!(f, "pulumi.json#/{}", name),
        }
    }
}

/// Build a local reference string, e.g. `local_ref(RefKind::Types, "awsx:ecs:Foo")`.
pub fn local_ref(kind: RefKind, name: &str) -> String {
    Reference::local(kind, name).to_string()
}

/// Local type reference string, the most common case in module code.
pub fn type_ref(name: &str) -> String {
    local_ref(RefKind::Types, name)
}

/// Reference to an upstream resource, left for the assembler to anchor.
///
/// `upstream_ref("aws", RefKind::Resources, "ec2%2fvpc:Vpc")` yields
/// `#/resources/aws:ec2%2fvpc:Vpc`.
pub fn upstream_ref(provider: &str, kind: RefKind, suffix: &str) -> String {
    local_ref(kind, &format!("{}:{}", provider, suffix))
}

/// A string-prefix substitution applied to every reference in a tree.
///
/// Constructing a rule checks that the replacement does not itself start with
/// the prefix, which is what makes applying the rule repeatedly safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    prefix: String,
    replacement: String,
}

impl RewriteRule {
    pub fn new(
        prefix: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, AssembleError> {
        let prefix = prefix.into();
        let replacement = replacement.into();
        if prefix.is_empty() || replacement.starts_with(&prefix) {
            return Err(AssembleError::OverlappingRewrite {
                prefix,
                replacement,
            });
        }
        Ok(Self {
            prefix,
            replacement,
        })
    }

    /// Rules anchoring `#/<kind>/<provider>:` to the provider's versioned
    /// document, one per reference kind.
    pub fn anchor(provider: &ProviderDescriptor) -> Result<Vec<Self>, AssembleError> {
        let version = provider.ref_version();
        RefKind::ALL
            .iter()
            .map(|kind| {
                let local = format!("#/{}/{}:", kind.segment(), provider.name);
                let anchored = format!(
                    "/{}/{}/schema.json#/{}/{}:",
                    provider.name,
                    version,
                    kind.segment(),
                    provider.name
                );
                Self::new(local, anchored)
            })
            .collect()
    }

    /// Rule moving types of one module namespace into another, e.g.
    /// `aws-native:ecs:` to `awsx:ecs:`.
    pub fn rename_types(from: &str, to: &str) -> Result<Self, AssembleError> {
        Self::new(format!("#/types/{}", from), format!("#/types/{}", to))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Apply to one reference string; `None` when the prefix does not match.
    pub fn apply(&self, reference: &str) -> Option<String> {
        reference
            .strip_prefix(self.prefix.as_str())
            .map(|suffix| format!("{}{}", self.replacement, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageSpec;

    fn aws(version: &str) -> ProviderDescriptor {
        ProviderDescriptor {
            name: "aws".into(),
            version: version.into(),
            document: PackageSpec::default(),
        }
    }

    #[test]
    fn parse_local_type() {
        assert_eq!(
            Reference::parse("#/types/awsx:ecr:lifecyclePolicy"),
            Some(Reference::local(RefKind::Types, "awsx:ecr:lifecyclePolicy"))
        );
    }

    #[test]
    fn parse_external_resource_keeps_encoded_name() {
        let parsed = Reference::parse("/aws/v6.0.0/schema.json#/resources/aws:ec2%2fvpc:Vpc");
        assert_eq!(
            parsed,
            Some(Reference::External {
                package: "aws".into(),
                version: "v6.0.0".into(),
                kind: RefKind::Resources,
                name: "aws:ec2%2fvpc:Vpc".into(),
            })
        );
    }

    #[test]
    fn parse_builtin() {
        assert_eq!(
            Reference::parse("pulumi.json#/Archive"),
            Some(Reference::Builtin {
                name: "Archive".into()
            })
        );
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(Reference::parse("aws:ec2:Vpc"), None);
        assert_eq!(Reference::parse("#/widgets/aws:ec2:Vpc"), None);
        assert_eq!(Reference::parse("#/types/"), None);
        assert_eq!(Reference::parse("/aws/schema.json#/types/aws:x:Y"), None);
        assert_eq!(Reference::parse("/aws/v1/other.json#/types/aws:x:Y"), None);
    }

    #[test]
    fn display_round_trips_all_three_kinds() {
        for s in [
            "#/types/awsx:awsx:Bucket",
            "#/resources/awsx:ecr:Repository",
            "#/functions/awsx:ec2:getDefaultVpc",
            "/docker/v4.4.0/schema.json#/types/docker:index/DockerBuild:DockerBuild",
            "/aws/v6.0.0/schema.json#/resources/aws:lb%2flistener:Listener",
            "/aws/v6.0.0/schema.json#/functions/aws:ec2/getVpc:getVpc",
            "pulumi.json#/Any",
        ] {
            assert_eq!(Reference::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn anchor_builds_one_rule_per_kind() {
        let rules = RewriteRule::anchor(&aws("6.0.0")).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].prefix(), "#/types/aws:");
        assert_eq!(rules[0].replacement(), "/aws/v6.0.0/schema.json#/types/aws:");
        assert_eq!(rules[1].prefix(), "#/resources/aws:");
        assert_eq!(
            rules[1].replacement(),
            "/aws/v6.0.0/schema.json#/resources/aws:"
        );
    }

    #[test]
    fn rule_rejects_self_prefixed_replacement() {
        let err = RewriteRule::new("#/types/aws:", "#/types/aws:v2:").unwrap_err();
        assert!(matches!(err, AssembleError::OverlappingRewrite { .. }));
        assert!(RewriteRule::new("", "x").is_err());
    }

    #[test]
    fn rule_does_not_match_longer_provider_names() {
        let rules = RewriteRule::anchor(&aws("6.0.0")).unwrap();
        assert_eq!(rules[0].apply("#/types/aws-native:ecs:TaskDefinitionTmpfs"), None);
        assert_eq!(rules[0].apply("#/types/awsx:awsx:Bucket"), None);
    }

    #[test]
    fn upstream_ref_is_prefixed_local_form() {
        assert_eq!(
            upstream_ref("aws", RefKind::Resources, "ec2%2fsubnet:Subnet"),
            "#/resources/aws:ec2%2fsubnet:Subnet"
        );
    }
}
