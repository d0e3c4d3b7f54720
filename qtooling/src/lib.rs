//! Capability layer for registering, validating, and dispatching tools.
//!
//! ```rust
//! use qtooling::{ToolRegistry, ToolSpec};
//! use serde_json::json;
//!
//! let spec = ToolSpec::new(
//!     "word_count",
//!     "Counts words in a passage",
//!     json!({
//!         "type": "object",
//!         "properties": { "text": { "type": "string" } },
//!         "required": ["text"]
//!     }),
//!     |args, _ctx| async move {
//!         let text = args["text"].as_str().unwrap_or_default();
//!         Ok(text.split_whitespace().count().to_string())
//!     },
//! )
//! .expect("schema compiles");
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(spec);
//! assert!(registry.contains("word_count"));
//! ```

mod args;
mod dispatcher;
mod error;
mod hooks;
mod registry;
mod spec;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        FunctionTool, NoopToolDispatchHooks, Tool, ToolDispatchHooks, ToolDispatcher, ToolError,
        ToolErrorKind, ToolExecutionContext, ToolExecutionResult, ToolFuture, ToolRegistry,
        ToolSpec,
    };
}

pub use args::{parse_args, required_string};
pub use dispatcher::ToolDispatcher;
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolDispatchHooks, ToolDispatchHooks};
pub use registry::ToolRegistry;
pub use spec::ToolSpec;
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolExecutionResult};
