//! Typed argument extraction for tool handlers.
//!
//! ```rust
//! use qtooling::{parse_args, required_string};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct Lookup {
//!     number: i64,
//! }
//!
//! let args = json!({ "number": 3, "title": "Harbor" });
//! let lookup: Lookup = parse_args(&args).expect("args should parse");
//! assert_eq!(lookup.number, 3);
//! assert_eq!(required_string(&args, "title").expect("title present"), "Harbor");
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ToolError;

pub fn parse_args<T>(args: &Value) -> Result<T, ToolError>
where
    T: DeserializeOwned,
{
    T::deserialize(args)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid arguments: {err}")))
}

pub fn required_string(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}
