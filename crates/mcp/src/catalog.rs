//! Compiled-in capability catalog.
//!
//! Maps known sidecar tool names to safety metadata. A tool missing from
//! the catalog is not an error anywhere: sidecars ship new tools before
//! this table learns about them, and unknown tools are treated permissively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What kind of work a tool does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Reads state, changes nothing.
    Read,
    /// Changes state on the remote account.
    Mutation,
    /// Orchestrates several steps, possibly including mutations.
    Composite,
    /// Health, configuration and diagnostics of the sidecar itself.
    Operational,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Read => "read",
            ToolCategory::Mutation => "mutation",
            ToolCategory::Composite => "composite",
            ToolCategory::Operational => "operational",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(ToolCategory::Read),
            "mutation" => Ok(ToolCategory::Mutation),
            "composite" => Ok(ToolCategory::Composite),
            "operational" => Ok(ToolCategory::Operational),
            other => Err(format!("unknown tool category '{other}'")),
        }
    }
}

/// Risk ordering: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

/// Whether `level` is at or below `ceiling`.
pub fn risk_at_most(level: RiskLevel, ceiling: RiskLevel) -> bool {
    level <= ceiling
}

/// Static safety metadata for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMeta {
    pub category: ToolCategory,
    pub risk_level: RiskLevel,
    pub requires_policy_check: bool,
}

impl CapabilityMeta {
    const fn new(category: ToolCategory, risk_level: RiskLevel, requires_policy_check: bool) -> Self {
        Self {
            category,
            risk_level,
            requires_policy_check,
        }
    }

    /// Mutation-class: state-changing tools, and composites that run behind a policy check.
    pub fn is_mutation_class(&self) -> bool {
        match self.category {
            ToolCategory::Mutation => true,
            ToolCategory::Composite => self.requires_policy_check,
            ToolCategory::Read | ToolCategory::Operational => false,
        }
    }
}

use RiskLevel::{High, Low, Medium};
use ToolCategory::{Composite, Mutation, Operational, Read};

/// Every tool name the catalog knows, in table order.
pub const KNOWN_TOOLS: &[&str] = &[
    // read
    "get_timeline",
    "get_mentions",
    "get_post",
    "get_thread",
    "get_user_profile",
    "search_posts",
    "get_followers",
    "get_post_metrics",
    "list_drafts",
    // mutation
    "create_post",
    "reply_to_post",
    "quote_post",
    "delete_post",
    "like_post",
    "repost",
    "follow_user",
    "unfollow_user",
    "upload_media",
    // composite
    "compose_post",
    "generate_reply",
    "compose_and_publish",
    "auto_reply_mentions",
    // operational
    "get_health",
    "get_config",
    "get_rate_limits",
    "get_policy_status",
    "get_capabilities",
];

/// Look up the safety metadata for a tool name.
pub fn lookup(name: &str) -> Option<CapabilityMeta> {
    let meta = match name {
        "get_timeline" => CapabilityMeta::new(Read, Low, false),
        "get_mentions" => CapabilityMeta::new(Read, Low, false),
        "get_post" => CapabilityMeta::new(Read, Low, false),
        "get_thread" => CapabilityMeta::new(Read, Low, false),
        "get_user_profile" => CapabilityMeta::new(Read, Low, false),
        "search_posts" => CapabilityMeta::new(Read, Low, false),
        "get_followers" => CapabilityMeta::new(Read, Low, false),
        "get_post_metrics" => CapabilityMeta::new(Read, Low, false),
        "list_drafts" => CapabilityMeta::new(Read, Low, false),

        "create_post" => CapabilityMeta::new(Mutation, High, true),
        "reply_to_post" => CapabilityMeta::new(Mutation, High, true),
        "quote_post" => CapabilityMeta::new(Mutation, High, true),
        "delete_post" => CapabilityMeta::new(Mutation, High, true),
        "like_post" => CapabilityMeta::new(Mutation, Medium, true),
        "repost" => CapabilityMeta::new(Mutation, Medium, true),
        "follow_user" => CapabilityMeta::new(Mutation, Medium, true),
        "unfollow_user" => CapabilityMeta::new(Mutation, Medium, true),
        "upload_media" => CapabilityMeta::new(Mutation, Medium, false),

        // Draft-only composites never publish; the publishing ones are policy-gated.
        "compose_post" => CapabilityMeta::new(Composite, Low, false),
        "generate_reply" => CapabilityMeta::new(Composite, Medium, false),
        "compose_and_publish" => CapabilityMeta::new(Composite, High, true),
        "auto_reply_mentions" => CapabilityMeta::new(Composite, High, true),

        "get_health" => CapabilityMeta::new(Operational, Low, false),
        "get_config" => CapabilityMeta::new(Operational, Low, false),
        "get_rate_limits" => CapabilityMeta::new(Operational, Low, false),
        "get_policy_status" => CapabilityMeta::new(Operational, Low, false),
        "get_capabilities" => CapabilityMeta::new(Operational, Low, false),

        _ => return None,
    };
    Some(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_tool_has_an_entry() {
        for name in KNOWN_TOOLS {
            assert!(lookup(name).is_some(), "{name} missing from catalog");
        }
    }

    #[test]
    fn test_unknown_tool_has_no_entry() {
        assert!(lookup("brand_new_tool").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_risk_order() {
        assert!(risk_at_most(Low, Low));
        assert!(risk_at_most(Low, High));
        assert!(risk_at_most(Medium, High));
        assert!(!risk_at_most(High, Medium));
        assert!(!risk_at_most(Medium, Low));
    }

    #[test]
    fn test_mutation_class() {
        assert!(lookup("create_post").unwrap().is_mutation_class());
        assert!(lookup("upload_media").unwrap().is_mutation_class());
        assert!(lookup("compose_and_publish").unwrap().is_mutation_class());
        assert!(!lookup("compose_post").unwrap().is_mutation_class());
        assert!(!lookup("get_timeline").unwrap().is_mutation_class());
        assert!(!lookup("get_health").unwrap().is_mutation_class());
    }

    #[test]
    fn test_parse_category_and_risk() {
        assert_eq!("Read".parse::<ToolCategory>().unwrap(), Read);
        assert_eq!(" operational ".parse::<ToolCategory>().unwrap(), Operational);
        assert!("admin".parse::<ToolCategory>().is_err());
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), High);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Composite).unwrap(), "\"composite\"");
        let level: RiskLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(level, Medium);
    }
}
