use crate::script::{NodeId, PinDirection};
use crate::value::ValueType;
use thiserror::Error;

/// Errors raised by strict typed access to a value cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Type mismatch: cell declared as {expected} cannot hold or be read as {found}")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
}

/// Errors that can occur during a node script evaluation pass.
///
/// None of these are fatal: the pass is skipped and the previous outputs stay in place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script graph contains a cycle through {node}; the evaluation pass was skipped")]
    GraphCycleDetected { node: NodeId },
}

/// Errors that can occur when building a node script from a `ScriptDefinition`.
#[derive(Error, Debug, Clone)]
pub enum DefinitionError {
    #[error("Failed to parse definition JSON: {0}")]
    JsonParseError(String),

    #[error("Node id '{0}' is defined more than once")]
    DuplicateNode(String),

    #[error("Node '{node_id}' has an unregistered node kind: '{kind}'")]
    UnknownNodeKind { node_id: String, kind: String },

    #[error("Node '{node_id}' has invalid storage: {message}")]
    InvalidStorage { node_id: String, message: String },

    #[error(
        "Node '{missing_node_id}' not found, which is required by a connection from node '{source_node_id}'"
    )]
    NodeNotFound {
        missing_node_id: String,
        source_node_id: String,
    },

    #[error("Node '{node_id}' has no {direction} pin named '{pin}'")]
    PinNotFound {
        node_id: String,
        pin: String,
        direction: PinDirection,
    },

    #[error("Connection from '{source_node_id}.{source_pin}' to '{target_node_id}.{target_pin}' was rejected")]
    ConnectionRejected {
        source_node_id: String,
        source_pin: String,
        target_node_id: String,
        target_pin: String,
    },
}

/// Errors that can occur while loading the engine configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse configuration JSON: {0}")]
    Parse(String),
}

/// Errors reported by background prerequisite tasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrerequisiteError {
    #[error("Prerequisite '{0}' is already installing or uninstalling")]
    Busy(String),

    #[error("Prerequisite '{0}' task was cancelled")]
    Cancelled(String),

    #[error("Prerequisite '{prerequisite}' action '{action}' failed: {message}")]
    ActionFailed {
        prerequisite: String,
        action: String,
        message: String,
    },

    #[error("Background task for prerequisite '{prerequisite}' failed: {message}")]
    TaskFailed {
        prerequisite: String,
        message: String,
    },
}
