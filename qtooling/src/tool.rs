//! Tool trait contract for registry-managed capabilities.
//!
//! ```rust
//! use qprovider::ToolDefinition;
//! use qtooling::{FunctionTool, Tool};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolDefinition {
//!         name: "echo".to_string(),
//!         description: "Echoes input".to_string(),
//!         input_schema: json!({ "type": "object" }),
//!     },
//!     |args, _ctx| async move { Ok(args.to_string()) },
//! );
//!
//! assert_eq!(tool.definition().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use qcommon::BoxFuture;
use qprovider::ToolDefinition;
use serde_json::Value;

use crate::{ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Checks arguments before `invoke`. Tools without a compiled schema accept anything.
    fn validate(&self, _args: &Value) -> Result<(), ToolError> {
        Ok(())
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>>;
}

pub(crate) type ToolHandler = dyn Fn(Value, ToolExecutionContext) -> ToolFuture<'static, Result<String, ToolError>>
    + Send
    + Sync;

pub(crate) fn boxed_handler<F, Fut>(handler: F) -> Arc<ToolHandler>
where
    F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    Arc::new(move |args, context| Box::pin(handler(args, context)))
}

pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            definition,
            handler: boxed_handler(handler),
        }
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        (self.handler)(args.clone(), context.clone())
    }
}
