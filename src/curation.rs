//! Declarative property edits against a template.
//!
//! Component resources are mostly upstream resources with a handful of
//! properties removed, renamed, retyped or added. Each module lists those
//! changes as [`Edit`]s and hands them to a [`Curation`], which applies them
//! in order and fails with `SchemaShape` the moment an edit names a property
//! the template does not have.

use std::collections::BTreeMap;

use crate::error::AssembleError;
use crate::types::{PropertySpec, TypeSpec};

pub type Properties = BTreeMap<String, PropertySpec>;

/// One change to a property map.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Remove a property the component computes itself.
    Delete(String),
    /// Move a property to a new name, keeping its type and docs.
    Rename { from: String, to: String },
    /// Replace a property's type, keeping its docs.
    Retype { name: String, type_spec: TypeSpec },
    /// Append text to a property's description.
    Describe { name: String, suffix: String },
    /// Add a property the template does not have.
    Inject { name: String, spec: PropertySpec },
    /// Set a property whether or not the template has it.
    Override { name: String, spec: PropertySpec },
}

impl Edit {
    pub fn delete(name: &str) -> Self {
        Edit::Delete(name.to_string())
    }

    pub fn rename(from: &str, to: &str) -> Self {
        Edit::Rename {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn retype(name: &str, type_spec: TypeSpec) -> Self {
        Edit::Retype {
            name: name.to_string(),
            type_spec,
        }
    }

    pub fn describe(name: &str, suffix: &str) -> Self {
        Edit::Describe {
            name: name.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn inject(name: &str, spec: PropertySpec) -> Self {
        Edit::Inject {
            name: name.to_string(),
            spec,
        }
    }

    pub fn override_with(name: &str, spec: PropertySpec) -> Self {
        Edit::Override {
            name: name.to_string(),
            spec,
        }
    }

    /// Delete each of `names`, in order.
    pub fn delete_all(names: &[&str]) -> Vec<Self> {
        names.iter().map(|n| Edit::delete(n)).collect()
    }
}

/// Applies edits on behalf of one module against one template.
#[derive(Debug, Clone, Copy)]
pub struct Curation<'a> {
    module: &'a str,
    template: &'a str,
}

impl<'a> Curation<'a> {
    pub fn new(module: &'a str, template: &'a str) -> Self {
        Self { module, template }
    }

    fn missing(&self, property: &str) -> AssembleError {
        AssembleError::shape(self.module, self.template, property, "has no property")
    }

    fn take(&self, properties: &mut Properties, name: &str) -> Result<PropertySpec, AssembleError> {
        properties.remove(name).ok_or_else(|| self.missing(name))
    }

    /// Apply `edits` to `properties` in order.
    pub fn apply(&self, mut properties: Properties, edits: &[Edit]) -> Result<Properties, AssembleError> {
        for edit in edits {
            match edit {
                Edit::Delete(name) => {
                    self.take(&mut properties, name)?;
                }
                Edit::Rename { from, to } => {
                    let prop = self.take(&mut properties, from)?;
                    if properties.contains_key(to) {
                        return Err(AssembleError::shape(
                            self.module,
                            self.template,
                            to,
                            "already has property",
                        ));
                    }
                    properties.insert(to.clone(), prop);
                }
                Edit::Retype { name, type_spec } => {
                    let prop = properties.get_mut(name).ok_or_else(|| self.missing(name))?;
                    prop.type_spec = type_spec.clone();
                }
                Edit::Describe { name, suffix } => {
                    let prop = properties.get_mut(name).ok_or_else(|| self.missing(name))?;
                    let description = prop.description.get_or_insert_with(String::new);
                    description.push_str(suffix);
                }
                Edit::Inject { name, spec } => {
                    if properties.contains_key(name) {
                        return Err(AssembleError::shape(
                            self.module,
                            self.template,
                            name,
                            "already has property",
                        ));
                    }
                    properties.insert(name.clone(), spec.clone());
                }
                Edit::Override { name, spec } => {
                    properties.insert(name.clone(), spec.clone());
                }
            }
        }
        Ok(properties)
    }

    /// Copy the template's properties and apply `edits` to the copy.
    pub fn derive(&self, template: &Properties, edits: &[Edit]) -> Result<Properties, AssembleError> {
        self.apply(template.clone(), edits)
    }
}
