//! Component checking - strict-dereferences every component of a table and
//! reports which ones cannot be fully resolved.

use log::warn;
use serde::Serialize;

use crate::components::Components;
use crate::error::DereferenceError;
use crate::resolver::dereference_in;

/// Outcome for a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Error,
}

/// Why a component failed.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// `missing-reference`, `inconsistent-combinator` or `cyclic-reference`
    pub code: String,
    /// Location within the component, e.g. `#/properties/owner`
    pub path: String,
    pub message: String,
}

impl From<&DereferenceError> for Diagnostic {
    fn from(err: &DereferenceError) -> Self {
        Self {
            code: err.code().to_string(),
            path: err.path().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentResult {
    pub name: String,
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

/// Result of checking a component table.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub components_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<ComponentResult>,
}

impl CheckReport {
    /// Returns true if every component dereferenced.
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Strict-dereference each component, in table order.
pub fn check_components(components: &Components) -> CheckReport {
    let results: Vec<ComponentResult> = components
        .iter()
        .map(|(name, schema)| match dereference_in(schema, components) {
            Ok(_) => ComponentResult {
                name: name.to_string(),
                status: ComponentStatus::Ok,
                diagnostic: None,
            },
            Err(err) => {
                warn!("component '{}' cannot be dereferenced: {}", name, err);
                ComponentResult {
                    name: name.to_string(),
                    status: ComponentStatus::Error,
                    diagnostic: Some(Diagnostic::from(&err)),
                }
            }
        })
        .collect();

    let failed = results
        .iter()
        .filter(|r| r.status == ComponentStatus::Error)
        .count();

    CheckReport {
        components_checked: results.len(),
        passed: results.len() - failed,
        failed,
        results,
    }
}
