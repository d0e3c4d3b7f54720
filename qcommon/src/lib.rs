//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use qcommon::{GenerationOptions, MetadataMap, RunId};
//!
//! let run = RunId::from("run-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("conversation".to_string(), "chapters".to_string());
//!
//! let options = GenerationOptions::default().with_temperature(0.7).enable_streaming();
//! assert_eq!(run.as_str(), "run-1");
//! assert!(options.stream);
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use qcommon::BoxFuture;
    //!
    //! fn word_count<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.split_whitespace().count() })
    //! }
    //!
    //! let _future = word_count("once upon a time");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Metadata map and the orchestration run identifier.

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    /// Identifies one orchestration run (one conversation driven to completion).
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct RunId(String);

    impl RunId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for RunId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for RunId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for RunId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Generation settings shared by model requests and chat policy.
    //!
    //! ```rust
    //! use qcommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.7)
    //!     .with_max_tokens(32_768);
    //!
    //! assert_eq!(options.temperature, Some(0.7));
    //! assert_eq!(options.max_tokens, Some(32_768));
    //! assert!(!options.stream);
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
        pub stream: bool,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn with_streaming(mut self, stream: bool) -> Self {
            self.stream = stream;
            self
        }

        pub fn enable_streaming(self) -> Self {
            self.with_streaming(true)
        }
    }
}

pub mod registry {
    //! Ordered registry map used by the tool catalog.
    //!
    //! Iteration follows key order so anything derived from a registry (tool
    //! definitions sent to a model, for instance) is reproducible run to run.
    //!
    //! ```rust
    //! use qcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("update_chapter".to_string(), 2_u32);
    //! registry.insert("create_chapter".to_string(), 1_u32);
    //!
    //! let keys: Vec<_> = registry.keys().cloned().collect();
    //! assert_eq!(keys, vec!["create_chapter", "update_chapter"]);
    //! ```

    use std::borrow::Borrow;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: BTreeMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Ord,
    {
        fn default() -> Self {
            Self {
                items: BTreeMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Ord,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.items.keys()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{MetadataMap, RunId};
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use super::{GenerationOptions, Registry, RunId};

    #[test]
    fn run_id_displays_inner_value() {
        let run = RunId::new("run-7");
        assert_eq!(run.as_str(), "run-7");
        assert_eq!(run.to_string(), "run-7");
        assert_eq!(RunId::from("run-7".to_string()), run);
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_max_tokens(123)
            .enable_streaming();

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(123));
        assert!(options.stream);
    }

    #[test]
    fn registry_iterates_in_key_order() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("list_outlines".to_string(), 3_u32);
        registry.insert("create_chapter".to_string(), 1_u32);
        registry.insert("get_chapter".to_string(), 2_u32);

        let values: Vec<u32> = registry.values().copied().collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert!(registry.contains_key("get_chapter"));

        assert_eq!(registry.remove("get_chapter"), Some(2));
        assert_eq!(registry.len(), 2);
    }
}
