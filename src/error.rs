//! Error types for schema assembly and SDK dispatch.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::linter::Diagnostic;

/// Errors raised while assembling or emitting the component schema.
///
/// Every variant is fatal for the run: nothing is written once one of these
/// has been returned.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("no version declared for provider '{provider}' in {}", manifest.display())]
    MissingDependency { provider: String, manifest: PathBuf },

    #[error("failed to fetch {provider} v{version} from {location}: {message}")]
    Fetch {
        provider: String,
        version: String,
        location: String,
        message: String,
    },

    #[error("module '{module}': template {template} {message} '{property}'")]
    SchemaShape {
        module: String,
        template: String,
        property: String,
        message: String,
    },

    #[error("{} duplicate name(s): {}", collisions.len(), collisions.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("; "))]
    DuplicateNames { collisions: Vec<NameCollision> },

    #[error("no generator registered for target '{target}'")]
    UnsupportedTarget { target: String },

    #[error("{} invalid reference(s), first: {}", diagnostics.len(), diagnostics.first().map(|d| d.to_string()).unwrap_or_default())]
    InvalidReferences { diagnostics: Vec<Diagnostic> },

    #[error("rewrite replacement '{replacement}' starts with its own prefix '{prefix}'")]
    OverlappingRewrite { prefix: String, replacement: String },

    #[error("invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("invalid JSON in {origin}: {source}")]
    InvalidJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generator for '{target}' failed: {message}")]
    Generator { target: String, message: String },
}

impl AssembleError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Fetch { .. } | Self::Io { .. } => 3,
            Self::UnsupportedTarget { .. } => 4,
            _ => 2,
        }
    }

    pub(crate) fn shape(
        module: &str,
        template: &str,
        property: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaShape {
            module: module.to_string(),
            template: template.to_string(),
            property: property.to_string(),
            message: message.into(),
        }
    }
}

/// Which mapping of the document a name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Resource,
    Type,
    Function,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Namespace::Resource => "resource",
            Namespace::Type => "type",
            Namespace::Function => "function",
        })
    }
}

/// A qualified name declared by two contributors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub namespace: Namespace,
    pub name: String,
    /// Contributor that declared the name first ("base" or a module name).
    pub first: String,
    /// Contributor whose declaration was rejected.
    pub second: String,
}

impl fmt::Display for NameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} declared by both '{}' and '{}'",
            self.namespace, self.name, self.first, self.second
        )
    }
}
