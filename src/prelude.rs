//! Prelude module for convenient imports
//!
//! Re-exports the types needed to set up modules, build profiles and scripts, and run
//! updates.
//!
//! ```rust
//! use hikari::prelude::*;
//!
//! let modules = ModuleRegistry::new();
//! let mut script = NodeScript::new("Example");
//! let value = script.add_node(NodeKind::StaticValue(Value::Integer(5)));
//! script.evaluate(&modules).unwrap();
//! assert_eq!(script.output_value(value, "Output").unwrap().get_coerced::<i32>(), 5);
//! ```

// Values
pub use crate::value::{Color, TypedValueCell, Value, ValueKind, ValueType};

// Data models and modules
pub use crate::datamodel::{
    DataBindingProperty, DataModel, DataModelEntry, DataModelPath, DataModelResolver,
    LayerProperty, Module, ModuleRegistry,
};

// Node scripts
pub use crate::script::{
    LayerPropertyBinding, NodeId, NodeKind, NodeRegistry, NodeScript, PinDirection, PinId,
    ScriptContext, ScriptDefinition, StructuralChange,
};

// Display conditions
pub use crate::conditions::{
    BooleanOperator, ConditionChange, ConditionOperator, ConditionPart, ConditionTree,
    ListQuantifier,
};

// Profiles
pub use crate::config::EngineConfig;
pub use crate::profile::{ElementId, Profile, ProfileElement};

// Error types
pub use crate::error::{ConfigError, DefinitionError, PrerequisiteError, ScriptError, ValueError};
