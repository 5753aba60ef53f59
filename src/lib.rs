//! AWSX component schema assembly.
//!
//! Builds the `awsx` package schema from upstream provider schemas: each
//! module generator copies and edits template resources from the `aws`,
//! `aws-native` and `docker` documents, every upstream reference is anchored
//! to the provider version in use, and the fragments are merged into one
//! document with explicit collision detection.
//!
//! # Example
//!
//! ```no_run
//! use awsx_schemagen::{
//!     assemble, schema_json_bytes, AssembleOptions, DependencyManifest, DirectorySource,
//!     ProviderCache, VersionResolver,
//! };
//! use std::path::Path;
//!
//! let manifest = DependencyManifest::load(Path::new("awsx/package.json"))?;
//! let options = AssembleOptions::new(VersionResolver::new(manifest)).version("2.0.0");
//! let cache = ProviderCache::new(DirectorySource::new("schemas"));
//!
//! let document = assemble(&options, &cache)?;
//! std::fs::write("schema.json", schema_json_bytes(&document)?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reference forms
//!
//! | Form | Example |
//! |------|---------|
//! | local | `#/types/awsx:ecr:lifecyclePolicy` |
//! | upstream (before anchoring) | `#/resources/aws:ec2%2fvpc:Vpc` |
//! | external | `/aws/v6.0.0/schema.json#/resources/aws:ec2%2fvpc:Vpc` |
//! | builtin | `pulumi.json#/Any` |

mod assemble;
mod cache;
mod curation;
mod dispatch;
mod error;
mod linter;
mod loader;
mod manifest;
mod merge;
pub mod modules;
mod refs;
mod rewriter;
mod types;
mod validator;

pub use assemble::{assemble, base_document, schema_json_bytes, to_sorted_json, AssembleOptions};
#[cfg(feature = "remote")]
pub use cache::HttpSource;
pub use cache::{source_from_str, url_version, DirectorySource, MemorySource, ProviderCache, SchemaSource, DEFAULT_SOURCE};
pub use curation::{Curation, Edit, Properties};
pub use dispatch::{write_file_set, CommandGenerator, FileSet, GeneratorRegistry, SchemaGenerator, SdkGenerator, Target};
pub use error::{AssembleError, NameCollision, Namespace};
pub use linter::{check_file, check_references, CheckResult, Diagnostic, Severity};
#[cfg(feature = "remote")]
pub use loader::{fetch_json, DEFAULT_HTTP_TIMEOUT};
pub use loader::{load_document, load_document_str, load_json, parse_document};
pub use manifest::{package_for, parse_pin, DependencyManifest, VersionResolver, AWS_NATIVE_VERSION};
pub use merge::merge;
pub use refs::{local_ref, type_ref, upstream_ref, RefKind, Reference, RewriteRule};
pub use rewriter::{
    rewrite_complex_type, rewrite_fragment, rewrite_function, rewrite_object, rewrite_properties,
    rewrite_property, rewrite_resource, rewrite_type_spec,
};
pub use types::{
    ComplexTypeSpec, DiscriminatorSpec, EnumValueSpec, Fragment, FunctionSpec, ObjectTypeSpec, PackageSpec, PropertySpec,
    ProviderDescriptor, ResourceSpec, TypeSpec, PACKAGE_NAME,
};
pub use validator::{validate_document_shape, ShapeError};
