use crate::conditions::ConditionTree;
use crate::datamodel::LayerProperty;
use crate::error::ScriptError;
use crate::script::{NodeScript, ScriptContext};
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Stable identifier of a profile element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything about an element that changes during an update.
#[derive(Debug, Default)]
pub struct ElementState {
    pub display_condition: ConditionTree,
    pub scripts: Vec<NodeScript>,
    /// Seconds the element has been displayed.
    pub timeline_position: f64,
    pub displayed: bool,
}

/// What one update of an element did.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementUpdate {
    pub element: ElementId,
    pub displayed: bool,
    pub script_errors: Vec<ScriptError>,
}

/// A layer or folder of a profile.
///
/// Updates, evaluation and structural edits all go through the single state lock. Layer
/// properties sit behind their own lock so scripts evaluated under the state lock can
/// still look them up.
#[derive(Debug)]
pub struct ProfileElement {
    id: ElementId,
    name: String,
    layer_properties: RwLock<Vec<Arc<LayerProperty>>>,
    state: Mutex<ElementState>,
}

impl ProfileElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ElementId::new(), name)
    }

    pub fn with_id(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            layer_properties: RwLock::new(Vec::new()),
            state: Mutex::new(ElementState::default()),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Takes the element's exclusive lock. Released when the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock()
    }

    pub fn is_displayed(&self) -> bool {
        self.state.lock().displayed
    }

    /// Adds a layer property, replacing any existing one with the same path.
    pub fn add_layer_property(&self, property: LayerProperty) -> Arc<LayerProperty> {
        let property = Arc::new(property);
        let mut properties = self.layer_properties.write();
        properties.retain(|p| p.path() != property.path());
        properties.push(Arc::clone(&property));
        property
    }

    pub fn remove_layer_property(&self, path: &str) -> bool {
        let mut properties = self.layer_properties.write();
        let before = properties.len();
        properties.retain(|p| p.path() != path);
        before != properties.len()
    }

    pub fn layer_property(&self, path: &str) -> Option<Arc<LayerProperty>> {
        self.layer_properties
            .read()
            .iter()
            .find(|p| p.path() == path)
            .cloned()
    }

    pub fn layer_properties(&self) -> Vec<Arc<LayerProperty>> {
        self.layer_properties.read().clone()
    }

    /// Runs one update under the element lock.
    ///
    /// The display condition decides whether the element is shown. Only a shown element
    /// advances its timeline and evaluates its scripts. A failing script does not stop the
    /// others.
    pub fn update(&self, delta: f64, ctx: &dyn ScriptContext) -> ElementUpdate {
        let mut state = self.state.lock();
        let displayed = state.display_condition.evaluate(ctx.data_models());
        if displayed != state.displayed {
            debug!(element = %self.id, name = %self.name, displayed, "display state changed");
        }
        state.displayed = displayed;

        let mut script_errors = Vec::new();
        if displayed {
            state.timeline_position += delta;
            for script in state.scripts.iter_mut() {
                if let Err(err) = script.evaluate(ctx) {
                    script_errors.push(err);
                }
            }
        }
        trace!(element = %self.id, displayed, errors = script_errors.len(), "element updated");

        ElementUpdate {
            element: self.id,
            displayed,
            script_errors,
        }
    }
}
