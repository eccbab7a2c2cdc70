//! Registration filter pipeline.
//!
//! Stages run in a fixed order and the first rejection wins:
//! name allowlist, catalog lookup, mutation gate, category allowlist,
//! category denylist, risk ceiling.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, risk_at_most, CapabilityMeta, RiskLevel, ToolCategory};

/// Which discovered tools may be handed to the host.
///
/// Every field is optional; an absent field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeFilterConfig {
    /// Explicit tool names. When non-empty, nothing else gets through.
    pub allowed_tools: Option<Vec<String>>,
    /// Register mutation-class tools.
    pub enable_mutations: bool,
    /// Only these categories, when non-empty.
    pub allowed_categories: Option<Vec<ToolCategory>>,
    /// Never these categories.
    pub denied_categories: Option<Vec<ToolCategory>>,
    /// Highest risk level allowed.
    pub max_risk_level: Option<RiskLevel>,
}

/// Why a tool was kept out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotAllowlisted,
    MutationsDisabled,
    CategoryNotAllowed(ToolCategory),
    CategoryDenied(ToolCategory),
    RiskTooHigh { level: RiskLevel, ceiling: RiskLevel },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotAllowlisted => write!(f, "not in allowed_tools"),
            RejectReason::MutationsDisabled => write!(f, "mutation-class tools are disabled"),
            RejectReason::CategoryNotAllowed(c) => write!(f, "category '{c}' not in allowed_categories"),
            RejectReason::CategoryDenied(c) => write!(f, "category '{c}' is denied"),
            RejectReason::RiskTooHigh { level, ceiling } => {
                write!(f, "risk '{level}' exceeds max '{ceiling}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Register. `meta` is `None` for tools the catalog does not know.
    Allow { meta: Option<CapabilityMeta> },
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FilterDecision::Allow { .. })
    }
}

impl BridgeFilterConfig {
    /// Run a tool name through the pipeline using the compiled-in catalog.
    pub fn evaluate(&self, name: &str) -> FilterDecision {
        self.evaluate_with(name, catalog::lookup(name))
    }

    /// Run the pipeline against explicit catalog metadata.
    pub fn evaluate_with(&self, name: &str, meta: Option<CapabilityMeta>) -> FilterDecision {
        if let Some(allowed) = non_empty(&self.allowed_tools) {
            if !allowed.iter().any(|n| n == name) {
                return FilterDecision::Reject(RejectReason::NotAllowlisted);
            }
        }

        let Some(meta) = meta else {
            return FilterDecision::Allow { meta: None };
        };

        if meta.is_mutation_class() && !self.enable_mutations {
            return FilterDecision::Reject(RejectReason::MutationsDisabled);
        }

        if let Some(allowed) = non_empty(&self.allowed_categories) {
            if !allowed.contains(&meta.category) {
                return FilterDecision::Reject(RejectReason::CategoryNotAllowed(meta.category));
            }
        }

        if let Some(denied) = &self.denied_categories {
            if denied.contains(&meta.category) {
                return FilterDecision::Reject(RejectReason::CategoryDenied(meta.category));
            }
        }

        if let Some(ceiling) = self.max_risk_level {
            if !risk_at_most(meta.risk_level, ceiling) {
                return FilterDecision::Reject(RejectReason::RiskTooHigh {
                    level: meta.risk_level,
                    ceiling,
                });
            }
        }

        FilterDecision::Allow { meta: Some(meta) }
    }
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|l| !l.is_empty())
}
