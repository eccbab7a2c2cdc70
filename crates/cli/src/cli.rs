use clap::Parser;

/// Bridge a tool sidecar into a local tool registry.
///
/// Launches the sidecar, lists what it exposes after filtering, and
/// optionally invokes one tool and prints its outcome as JSON.
#[derive(Parser, Debug)]
#[command(name = "tool-bridge", about = "Bridge an MCP tool sidecar into a tool host")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/tool-bridge/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Sidecar executable (overrides config and TOOL_BRIDGE_SIDECAR_BIN)
    #[arg(long)]
    pub sidecar: Option<String>,

    /// Sidecar config file, passed as `--config <path>`
    #[arg(long)]
    pub sidecar_config: Option<String>,

    /// Register mutation-class tools
    #[arg(long)]
    pub enable_mutations: bool,

    /// Highest risk level to register: low, medium or high
    #[arg(long)]
    pub max_risk: Option<String>,

    /// Only register these tools (repeatable)
    #[arg(long = "allow")]
    pub allow: Vec<String>,

    /// Print the registered tool definitions
    #[arg(long)]
    pub list: bool,

    /// Invoke this tool and print its outcome
    #[arg(long)]
    pub call: Option<String>,

    /// JSON arguments for --call
    #[arg(long, default_value = "{}")]
    pub args: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["tool-bridge"]);
        assert!(args.config.is_none());
        assert!(!args.enable_mutations);
        assert!(args.allow.is_empty());
        assert_eq!(args.args, "{}");
    }

    #[test]
    fn test_call_with_args_and_allowlist() {
        let args = CliArgs::parse_from([
            "tool-bridge",
            "--sidecar",
            "social-sidecar",
            "--allow",
            "get_timeline",
            "--allow",
            "search_posts",
            "--call",
            "search_posts",
            "--args",
            r#"{"query":"rust"}"#,
        ]);
        assert_eq!(args.sidecar.as_deref(), Some("social-sidecar"));
        assert_eq!(args.allow, vec!["get_timeline", "search_posts"]);
        assert_eq!(args.call.as_deref(), Some("search_posts"));
    }
}
