use super::{DataBindingProperty, DataModelEntry, DataModelPath, Module};
use crate::value::TypedValueCell;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Resolution interface the evaluation engine consumes from the data model layer.
///
/// Both methods fail softly: `None` means the value is unavailable for this pass.
pub trait DataModelResolver: Send + Sync {
    fn resolve(&self, path: &DataModelPath) -> Option<TypedValueCell>;
    fn resolve_list(&self, path: &DataModelPath) -> Option<Vec<DataModelEntry>>;
}

/// The set of modules currently known to the application.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: RwLock<Vec<Arc<Module>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module, replacing any module with the same id.
    pub fn add(&self, module: Module) -> Arc<Module> {
        let module = Arc::new(module);
        let mut modules = self.modules.write();
        if let Some(index) = modules.iter().position(|m| m.id() == module.id()) {
            let previous = modules.remove(index);
            previous.disable();
        }
        debug!(module = %module.id(), "module registered");
        modules.push(Arc::clone(&module));
        module
    }

    /// Unregisters a module. It is disabled first so outstanding bindings stop resolving.
    pub fn remove(&self, id: &str) -> bool {
        let mut modules = self.modules.write();
        match modules.iter().position(|m| m.id() == id) {
            Some(index) => {
                let module = modules.remove(index);
                module.disable();
                debug!(module = %id, "module unregistered");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Module>> {
        self.modules.read().iter().find(|m| m.id() == id).cloned()
    }

    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.read().clone()
    }

    /// Runs one update tick on every enabled module.
    pub fn update(&self, delta: f64) {
        for module in self.modules() {
            module.update(delta);
        }
    }

    /// Discovers one data binding property per visible terminal property of a module.
    ///
    /// The getters hold only a weak reference: once the module is disabled or dropped they
    /// report no value.
    pub fn discover_properties(&self, module_id: &str) -> Vec<DataBindingProperty> {
        let Some(module) = self.get(module_id) else {
            return Vec::new();
        };
        let schema = module.data_model().schema();
        schema
            .into_iter()
            .filter(|(path, _)| !module.is_hidden(path))
            .map(|(path, value_type)| {
                let weak: Weak<Module> = Arc::downgrade(&module);
                let lookup = path.clone();
                DataBindingProperty::new(
                    path,
                    value_type,
                    Arc::new(move || {
                        weak.upgrade()?
                            .resolve(&lookup)
                            .and_then(|cell| cell.value().cloned())
                    }),
                )
            })
            .collect()
    }
}

impl DataModelResolver for ModuleRegistry {
    fn resolve(&self, path: &DataModelPath) -> Option<TypedValueCell> {
        self.get(path.module())?.resolve(path.path())
    }

    fn resolve_list(&self, path: &DataModelPath) -> Option<Vec<DataModelEntry>> {
        self.get(path.module())?.resolve_list(path.path())
    }
}
