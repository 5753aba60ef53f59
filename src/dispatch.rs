//! Hand-off from an assembled document to the output generators.
//!
//! A generator maps a document to a [`FileSet`]; nothing here inspects the
//! schema beyond serializing it. SDK languages are produced by an external
//! program, invoked once per target.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use log::{debug, info};
use walkdir::WalkDir;

use crate::assemble::schema_json_bytes;
use crate::error::AssembleError;
use crate::types::PackageSpec;

/// Relative path → file contents.
pub type FileSet = BTreeMap<PathBuf, Vec<u8>>;

/// An output target selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Schema,
    Nodejs,
    Python,
    Go,
    Dotnet,
    Java,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::Schema,
        Target::Nodejs,
        Target::Python,
        Target::Go,
        Target::Dotnet,
        Target::Java,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Schema => "schema",
            Target::Nodejs => "nodejs",
            Target::Python => "python",
            Target::Go => "go",
            Target::Dotnet => "dotnet",
            Target::Java => "java",
        }
    }

    /// Whether this target is an SDK language rather than the schema itself.
    pub fn is_sdk(&self) -> bool {
        *self != Target::Schema
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = AssembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AssembleError::UnsupportedTarget {
                target: s.to_string(),
            })
    }
}

/// Produces the files for one target from an assembled document.
pub trait SdkGenerator: Send + Sync {
    fn generate(&self, document: &PackageSpec, version: &str) -> Result<FileSet, AssembleError>;
}

/// Emits `schema.json` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaGenerator;

impl SdkGenerator for SchemaGenerator {
    fn generate(&self, document: &PackageSpec, _version: &str) -> Result<FileSet, AssembleError> {
        let mut files = FileSet::new();
        files.insert(PathBuf::from("schema.json"), schema_json_bytes(document)?);
        Ok(files)
    }
}

/// Runs `<program> <language> <out-dir> <schema-file> <version>` in a scratch
/// directory and collects whatever it writes to `<out-dir>`.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: PathBuf,
    target: Target,
}

impl CommandGenerator {
    pub fn new(program: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            program: program.into(),
            target,
        }
    }

    fn failure(&self, message: impl Into<String>) -> AssembleError {
        AssembleError::Generator {
            target: self.target.to_string(),
            message: message.into(),
        }
    }
}

impl SdkGenerator for CommandGenerator {
    fn generate(&self, document: &PackageSpec, version: &str) -> Result<FileSet, AssembleError> {
        let scratch = tempfile::tempdir().map_err(|e| self.failure(format!("cannot create scratch dir: {}", e)))?;
        let schema_file = scratch.path().join("schema.json");
        let out_dir = scratch.path().join("out");
        fs::write(&schema_file, schema_json_bytes(document)?).map_err(|source| AssembleError::Io {
            path: schema_file.clone(),
            source,
        })?;

        debug!(
            "running {} {} {} {} {}",
            self.program.display(),
            self.target,
            out_dir.display(),
            schema_file.display(),
            version
        );
        let output = Command::new(&self.program)
            .arg(self.target.as_str())
            .arg(&out_dir)
            .arg(&schema_file)
            .arg(version)
            .output()
            .map_err(|e| self.failure(format!("cannot run {}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            return Err(self.failure(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        collect_files(&out_dir)
    }
}

/// Read every file under `root` into a [`FileSet`] keyed by relative path.
fn collect_files(root: &Path) -> Result<FileSet, AssembleError> {
    let mut files = FileSet::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| AssembleError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let contents = fs::read(path).map_err(|source| AssembleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        files.insert(relative, contents);
    }
    Ok(files)
}

/// Generators keyed by target.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<Target, Box<dyn SdkGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `schema` always; SDK targets only when an external program is given.
    pub fn with_defaults(program: Option<&Path>) -> Self {
        let mut registry = Self::new();
        registry.register(Target::Schema, Box::new(SchemaGenerator));
        if let Some(program) = program {
            for target in Target::ALL.into_iter().filter(Target::is_sdk) {
                registry.register(target, Box::new(CommandGenerator::new(program, target)));
            }
        }
        registry
    }

    pub fn register(&mut self, target: Target, generator: Box<dyn SdkGenerator>) {
        self.generators.insert(target, generator);
    }

    pub fn targets(&self) -> impl Iterator<Item = Target> + '_ {
        self.generators.keys().copied()
    }

    /// Produce the file set for `target`.
    ///
    /// # Errors
    ///
    /// `UnsupportedTarget` if `target` is unknown or has no generator.
    pub fn dispatch(&self, document: &PackageSpec, target: &str, version: &str) -> Result<FileSet, AssembleError> {
        let parsed: Target = target.parse()?;
        let generator = self
            .generators
            .get(&parsed)
            .ok_or_else(|| AssembleError::UnsupportedTarget {
                target: target.to_string(),
            })?;
        info!("generating {} output", parsed);
        generator.generate(document, version)
    }
}

/// Write `files` under `out_dir`, creating directories as needed.
/// Returns the number of files written.
pub fn write_file_set(out_dir: &Path, files: &FileSet) -> Result<usize, AssembleError> {
    for (relative, contents) in files {
        let path = out_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| AssembleError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, contents).map_err(|source| AssembleError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {}", path.display());
    }
    info!("wrote {} file(s) to {}", files.len(), out_dir.display());
    Ok(files.len())
}
