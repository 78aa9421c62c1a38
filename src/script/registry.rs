use super::NodeKind;
use ahash::AHashMap;
use itertools::Itertools;
use serde::de::DeserializeOwned;

/// Builds a [`NodeKind`] from the kind name and persisted storage of a node definition.
pub trait NodeFactory: Send + Sync {
    fn node_type(&self) -> &str;
    fn create(&self, storage: Option<&serde_json::Value>) -> Result<NodeKind, String>;
}

/// Decodes storage a node kind cannot do without.
fn required<T: DeserializeOwned>(
    storage: Option<&serde_json::Value>,
    node_type: &str,
) -> Result<T, String> {
    match storage {
        None | Some(serde_json::Value::Null) => Err(format!("{node_type} requires storage")),
        Some(value) => T::deserialize(value).map_err(|e| e.to_string()),
    }
}

/// Decodes storage, falling back to `T::default()` when there is none.
fn optional<T: DeserializeOwned + Default>(
    storage: Option<&serde_json::Value>,
    _node_type: &str,
) -> Result<T, String> {
    match storage {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(|e| e.to_string()),
    }
}

/// Defines the built-in factories, their registration, and their lookup by name.
macro_rules! define_node_factories {
    ( $( ($struct_name:ident, $node_type:expr, Plain, $variant:path) ),* $(,)? ;
      $( ($st_struct_name:ident, $st_node_type:expr, $decode:ident, $st_variant:path, $storage:ty) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl NodeFactory for $struct_name {
                fn node_type(&self) -> &str { $node_type }
                fn create(&self, _storage: Option<&serde_json::Value>) -> Result<NodeKind, String> {
                    Ok($variant)
                }
            }
        )*
        $(
            struct $st_struct_name;
            impl NodeFactory for $st_struct_name {
                fn node_type(&self) -> &str { $st_node_type }
                fn create(&self, storage: Option<&serde_json::Value>) -> Result<NodeKind, String> {
                    $decode::<$storage>(storage, $st_node_type).map($st_variant)
                }
            }
        )*

        fn register_default_factories(registry: &mut AHashMap<String, Box<dyn NodeFactory>>) {
            $( registry.insert($node_type.to_string(), Box::new($struct_name)); )*
            $( registry.insert($st_node_type.to_string(), Box::new($st_struct_name)); )*
        }

        fn create_factory_by_name(name: &str) -> Option<Box<dyn NodeFactory>> {
            match name {
                $( $node_type => Some(Box::new($struct_name)), )*
                $( $st_node_type => Some(Box::new($st_struct_name)), )*
                _ => None,
            }
        }
    };
}

define_node_factories! {
    (ToStringFactory, "ToString", Plain, NodeKind::ToString),
    (ToIntegerFactory, "ToInteger", Plain, NodeKind::ToInteger),
    (ToDoubleFactory, "ToDouble", Plain, NodeKind::ToDouble),
    (ToFloatFactory, "ToFloat", Plain, NodeKind::ToFloat)

    ;

    (StaticValueFactory, "StaticValue", required, NodeKind::StaticValue, crate::value::Value),
    (LayerPropertyFactory, "LayerProperty", optional, NodeKind::LayerProperty, super::LayerPropertyBinding),
    (DataModelFactory, "DataModel", optional, NodeKind::DataModel, Option<crate::datamodel::DataModelPath>),
    (DataBindingExitFactory, "DataBindingExit", optional, NodeKind::DataBindingExit, super::LayerPropertyBinding)
}

/// Maps kind names to factories. Starts out with every built-in kind.
pub struct NodeRegistry {
    factories: AHashMap<String, Box<dyn NodeFactory>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        let mut factories: AHashMap<String, Box<dyn NodeFactory>> = AHashMap::new();
        register_default_factories(&mut factories);
        Self { factories }
    }

    /// Lets definitions refer to a built-in kind by another name.
    pub fn with_alias(mut self, alias: &str, kind_name: &str) -> Self {
        if let Some(factory) = create_factory_by_name(kind_name) {
            self.factories.insert(alias.to_string(), factory);
        }
        self
    }

    pub fn with_factory(mut self, factory: Box<dyn NodeFactory>) -> Self {
        self.factories.insert(factory.node_type().to_string(), factory);
        self
    }

    pub fn contains(&self, kind_name: &str) -> bool {
        self.factories.contains_key(kind_name)
    }

    /// `None` if no factory is registered under `kind_name`.
    pub fn create(
        &self,
        kind_name: &str,
        storage: Option<&serde_json::Value>,
    ) -> Option<Result<NodeKind, String>> {
        self.factories.get(kind_name).map(|f| f.create(storage))
    }

    pub fn kind_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).sorted().collect()
    }
}
