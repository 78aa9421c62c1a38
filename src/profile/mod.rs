//! Profiles: the elements being rendered, their display conditions and node scripts.

mod element;

pub use element::{ElementId, ElementState, ElementUpdate, ProfileElement};

use crate::config::EngineConfig;
use crate::datamodel::{DataModelResolver, LayerProperty, ModuleRegistry};
use crate::script::{NodeScript, ScriptContext};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// A set of profile elements sharing one module registry.
#[derive(Debug)]
pub struct Profile {
    name: String,
    modules: Arc<ModuleRegistry>,
    elements: RwLock<Vec<Arc<ProfileElement>>>,
    config: EngineConfig,
}

impl Profile {
    pub fn new(name: impl Into<String>, modules: Arc<ModuleRegistry>) -> Self {
        Self::with_config(name, modules, EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, modules: Arc<ModuleRegistry>, config: EngineConfig) -> Self {
        Self {
            name: name.into(),
            modules,
            elements: RwLock::new(Vec::new()),
            config: config.normalized(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &Arc<ModuleRegistry> {
        &self.modules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A new empty script using this profile's change channel capacity.
    pub fn new_script(&self, name: impl Into<String>) -> NodeScript {
        NodeScript::with_capacity(name, self.config.change_channel_capacity)
    }

    pub fn add_element(&self, element: ProfileElement) -> Arc<ProfileElement> {
        let element = Arc::new(element);
        debug!(profile = %self.name, element = %element.id(), name = element.name(), "element added");
        self.elements.write().push(Arc::clone(&element));
        element
    }

    /// Removes an element. Nodes bound to it drop their binding on their next pass.
    pub fn remove_element(&self, id: ElementId) -> Option<Arc<ProfileElement>> {
        let mut elements = self.elements.write();
        let index = elements.iter().position(|e| e.id() == id)?;
        debug!(profile = %self.name, element = %id, "element removed");
        Some(elements.remove(index))
    }

    pub fn element(&self, id: ElementId) -> Option<Arc<ProfileElement>> {
        self.elements.read().iter().find(|e| e.id() == id).cloned()
    }

    pub fn elements(&self) -> Vec<Arc<ProfileElement>> {
        self.elements.read().clone()
    }

    /// Updates modules, then every element. Elements run in parallel when configured.
    pub fn update(&self, delta: f64) -> Vec<ElementUpdate> {
        self.modules.update(delta);
        let elements = self.elements();
        if self.config.parallel_elements {
            elements.par_iter().map(|e| e.update(delta, self)).collect()
        } else {
            elements.iter().map(|e| e.update(delta, self)).collect()
        }
    }

    /// One update with the configured fixed step.
    pub fn tick(&self) -> Vec<ElementUpdate> {
        self.update(self.config.frame_delta().as_secs_f64())
    }
}

impl ScriptContext for Profile {
    fn data_models(&self) -> &dyn DataModelResolver {
        self.modules.as_ref()
    }

    fn contains_element(&self, element: ElementId) -> bool {
        self.elements.read().iter().any(|e| e.id() == element)
    }

    fn layer_property(&self, element: ElementId, path: &str) -> Option<Arc<LayerProperty>> {
        self.element(element)?.layer_property(path)
    }
}
