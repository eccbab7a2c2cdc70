//! Host-facing tool contract: definitions, the `Tool` trait, structured
//! outcomes and the registration seam a plugin host implements.

pub mod outcome;
pub mod registry;
pub mod tool;

pub use outcome::{OutcomeMeta, ToolOutcome};
pub use registry::{RegistryError, ToolHost, ToolRegistry};
pub use tool::{Tool, ToolDefinition};
