//! Schema-validated function tools.

use std::future::Future;
use std::sync::Arc;

use qprovider::ToolDefinition;
use serde_json::Value;

use crate::tool::{ToolHandler, boxed_handler};
use crate::{Tool, ToolError, ToolExecutionContext, ToolFuture};

/// A named tool whose arguments are checked against a JSON Schema compiled at
/// construction time.
pub struct ToolSpec {
    definition: ToolDefinition,
    validator: jsonschema::Validator,
    handler: Arc<ToolHandler>,
}

impl ToolSpec {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Result<Self, ToolError>
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let name = name.into();
        let validator = jsonschema::validator_for(&input_schema).map_err(|err| {
            ToolError::invalid_arguments(format!("invalid input schema: {err}"))
                .with_tool_name(name.clone())
        })?;

        Ok(Self {
            definition: ToolDefinition {
                name,
                description: description.into(),
                input_schema,
            },
            validator,
            handler: boxed_handler(handler),
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

impl Tool for ToolSpec {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn validate(&self, args: &Value) -> Result<(), ToolError> {
        let violations = self
            .validator
            .iter_errors(args)
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("at '{path}': {err}")
                }
            })
            .collect::<Vec<_>>();

        if violations.is_empty() {
            return Ok(());
        }

        Err(ToolError::invalid_arguments(format!(
            "invalid arguments for {}: {}",
            self.definition.name,
            violations.join("; ")
        ))
        .with_tool_name(self.definition.name.clone()))
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        (self.handler)(args.clone(), context.clone())
    }
}
