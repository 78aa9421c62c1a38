use crate::datamodel::{DataModelResolver, LayerProperty, ModuleRegistry};
use crate::profile::ElementId;
use std::sync::Arc;

/// What a node script can see of the entity hosting it.
///
/// Implemented by `Profile`; a bare `ModuleRegistry` also works as a context that knows
/// no profile elements.
pub trait ScriptContext: Send + Sync {
    fn data_models(&self) -> &dyn DataModelResolver;

    fn contains_element(&self, element: ElementId) -> bool;

    fn layer_property(&self, element: ElementId, path: &str) -> Option<Arc<LayerProperty>>;
}

impl ScriptContext for ModuleRegistry {
    fn data_models(&self) -> &dyn DataModelResolver {
        self
    }

    fn contains_element(&self, _element: ElementId) -> bool {
        false
    }

    fn layer_property(&self, _element: ElementId, _path: &str) -> Option<Arc<LayerProperty>> {
        None
    }
}
