//! Reference checking for assembled schema documents.
//!
//! Every `$ref` reachable from the document must be one of:
//! - a local reference naming an entry of the same document
//! - a builtin reference (`pulumi.json#/...`)
//! - an external reference to a declared provider at its declared version
//!
//! Anything else, most commonly an upstream reference that was never anchored
//! to a provider version, is reported with its JSON path.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::loader::load_json;
use crate::refs::Reference;
use crate::validator::validate_document_shape;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding from checking a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// JSON path to the offending value (e.g. "/types/awsx:ecs:Foo/properties/bar/$ref")
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(code: &str, path: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            path: path.to_string(),
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.path, self.message)
    }
}

/// Outcome of checking one schema file.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub file: PathBuf,
    pub refs_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    /// Returns true if no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Check every reference in `document`.
///
/// `providers` maps provider names to the version segment their references
/// must carry (`"aws" => "v6.0.0"`). With `None`, any well-formed external
/// reference is accepted.
pub fn check_references(document: &Value, providers: Option<&BTreeMap<String, String>>) -> Vec<Diagnostic> {
    let mut checker = Checker {
        root: document,
        providers,
        diagnostics: Vec::new(),
        checked: 0,
    };
    checker.walk(document, "");
    checker.diagnostics
}

/// Load a schema file, check its shape and then its references.
pub fn check_file(file: &Path, providers: Option<&BTreeMap<String, String>>) -> CheckResult {
    let mut diagnostics = Vec::new();
    let mut refs_checked = 0;

    match load_json(file) {
        Err(e) => diagnostics.push(Diagnostic::error("E001", "/", format!("cannot load: {}", e))),
        Ok(document) => {
            if let Err(errors) = validate_document_shape(&document) {
                diagnostics.extend(
                    errors
                        .into_iter()
                        .map(|e| Diagnostic::error("E002", &e.path, e.message)),
                );
            } else {
                let mut checker = Checker {
                    root: &document,
                    providers,
                    diagnostics: Vec::new(),
                    checked: 0,
                };
                checker.walk(&document, "");
                refs_checked = checker.checked;
                diagnostics.extend(checker.diagnostics);
            }
        }
    }

    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    CheckResult {
        file: file.to_path_buf(),
        refs_checked,
        errors,
        warnings: diagnostics.len() - errors,
        diagnostics,
    }
}

struct Checker<'a> {
    root: &'a Value,
    providers: Option<&'a BTreeMap<String, String>>,
    diagnostics: Vec<Diagnostic>,
    checked: usize,
}

impl Checker<'_> {
    fn walk(&mut self, value: &Value, path: &str) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    self.check(reference, &format!("{}/$ref", path));
                }
                for (key, child) in map {
                    if key != "$ref" {
                        self.walk(child, &format!("{}/{}", path, key));
                    }
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, &format!("{}/{}", path, i));
                }
            }
            _ => {}
        }
    }

    fn check(&mut self, reference: &str, path: &str) {
        self.checked += 1;
        match Reference::parse(reference) {
            None => self.diagnostics.push(Diagnostic::error(
                "E003",
                path,
                format!("malformed reference \"{}\"", reference),
            )),
            Some(Reference::Builtin { .. }) => {}
            Some(Reference::Local { kind, name }) => {
                // Upstream tokens are percent-encoded in references only.
                let key = name.replace("%2F", "/").replace("%2f", "/");
                let resolves = self
                    .root
                    .get(kind.segment())
                    .and_then(|entries| entries.get(&key))
                    .is_some();
                if !resolves {
                    self.diagnostics.push(Diagnostic::error(
                        "E004",
                        path,
                        format!("local reference \"{}\" names no entry of this document", reference),
                    ));
                }
            }
            Some(Reference::External { package, version, .. }) => {
                let Some(providers) = self.providers else {
                    return;
                };
                match providers.get(&package) {
                    None => self.diagnostics.push(Diagnostic::error(
                        "E005",
                        path,
                        format!("reference \"{}\" targets undeclared provider '{}'", reference, package),
                    )),
                    Some(expected) if *expected != version => self.diagnostics.push(Diagnostic::error(
                        "E006",
                        path,
                        format!(
                            "reference \"{}\" targets {} {} but {} is declared",
                            reference, package, version, expected
                        ),
                    )),
                    Some(_) => {}
                }
            }
        }
    }
}
