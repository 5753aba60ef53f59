//! Schema merger.
//!
//! Inserts every fragment's resources, types and functions into the base
//! document. A name that is already present is never overwritten; each one is
//! recorded and the merge fails with all of them once every fragment has been
//! visited.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::{AssembleError, NameCollision, Namespace};
use crate::types::{Fragment, PackageSpec};

const BASE: &str = "base";

/// Tracks which contributor declared each name in one namespace.
struct Ledger {
    namespace: Namespace,
    owners: BTreeMap<String, String>,
}

impl Ledger {
    fn new<V>(namespace: Namespace, existing: &BTreeMap<String, V>) -> Self {
        Self {
            namespace,
            owners: existing.keys().map(|k| (k.clone(), BASE.to_string())).collect(),
        }
    }

    /// Moves `entries` into `target`, recording any name already owned.
    fn absorb<V>(
        &mut self,
        contributor: &str,
        entries: BTreeMap<String, V>,
        target: &mut BTreeMap<String, V>,
        collisions: &mut Vec<NameCollision>,
    ) {
        for (name, spec) in entries {
            if let Some(first) = self.owners.get(&name) {
                collisions.push(NameCollision {
                    namespace: self.namespace,
                    name,
                    first: first.clone(),
                    second: contributor.to_string(),
                });
                continue;
            }
            self.owners.insert(name.clone(), contributor.to_string());
            target.insert(name, spec);
        }
    }
}

/// Merge `fragments` into `base` in the order given.
pub fn merge(mut base: PackageSpec, fragments: Vec<Fragment>) -> Result<PackageSpec, AssembleError> {
    let mut resources = Ledger::new(Namespace::Resource, &base.resources);
    let mut types = Ledger::new(Namespace::Type, &base.types);
    let mut functions = Ledger::new(Namespace::Function, &base.functions);
    let mut collisions = Vec::new();

    for fragment in fragments {
        debug!(
            "merging module '{}': {} resource(s), {} type(s), {} function(s)",
            fragment.module,
            fragment.resources.len(),
            fragment.types.len(),
            fragment.functions.len()
        );
        let module = fragment.module;
        resources.absorb(&module, fragment.resources, &mut base.resources, &mut collisions);
        types.absorb(&module, fragment.types, &mut base.types, &mut collisions);
        functions.absorb(&module, fragment.functions, &mut base.functions, &mut collisions);
    }

    if !collisions.is_empty() {
        return Err(AssembleError::DuplicateNames { collisions });
    }

    info!(
        "merged schema: {} resources, {} types, {} functions",
        base.resources.len(),
        base.types.len(),
        base.functions.len()
    );
    Ok(base)
}
