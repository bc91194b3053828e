// src/resolve/variables.rs

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::errors::{BuildwatchError, Result};
use crate::resolve::reference::{variable_references, Reference};
use crate::types::UndefinedVariablePolicy;

/// Resolves `${name}` references against the variable table.
///
/// The table is pre-resolved once on construction: every value is passed
/// through [`resolve`](Self::resolve) against the *raw* table, so a value may
/// reference another variable one level deep. Longer chains are not followed:
/// with `a = "${b}"`, `b = "${c}"`, `c = "x"` the resolved `a` is `"${c}"`.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct VariableResolver {
    table: BTreeMap<String, String>,
    policy: UndefinedVariablePolicy,
}

impl VariableResolver {
    /// Build a resolver and pre-resolve the table.
    ///
    /// Under the strict policy a value referencing an undefined variable is an
    /// error here.
    pub fn new(raw: BTreeMap<String, String>, policy: UndefinedVariablePolicy) -> Result<Self> {
        let raw = Self { table: raw, policy };

        let mut table = BTreeMap::new();
        for (name, value) in raw.table.iter() {
            let resolved = raw.resolve(value)?;
            if resolved != *value {
                debug!(variable = %name, value = %resolved, "pre-resolved variable");
            }
            table.insert(name.clone(), resolved);
        }

        Ok(Self { table, policy })
    }

    pub fn policy(&self) -> UndefinedVariablePolicy {
        self.policy
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.table.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute every reference token found in `input`.
    ///
    /// Tokens are taken from a single scan of the original string; each one
    /// replaces the first remaining occurrence of that exact token, so
    /// repeated tokens are substituted left to right, once per occurrence.
    pub fn resolve(&self, input: &str) -> Result<String> {
        let mut out = input.to_string();

        for (token, reference) in variable_references(input) {
            let Reference::Variable(name) = reference else {
                continue;
            };
            match self.table.get(name) {
                Some(value) => out = out.replacen(token, value, 1),
                None => match self.policy {
                    UndefinedVariablePolicy::Strict => {
                        return Err(BuildwatchError::UndefinedVariable(name.to_string()));
                    }
                    UndefinedVariablePolicy::Permissive => {
                        warn!(variable = %name, "undefined variable left unresolved");
                    }
                },
            }
        }

        Ok(out)
    }
}
