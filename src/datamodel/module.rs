use super::{DataModel, DataModelEntry, SchemaWalk, split_segments};
use crate::value::TypedValueCell;
use ahash::AHashSet;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, trace};

/// A condition that must hold for a module to be activated, e.g. "a game process is running".
pub trait ActivationRequirement: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self) -> bool;
}

/// How multiple activation requirements are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivationMode {
    #[default]
    Any,
    All,
}

type UpdateHook = Box<dyn Fn(&mut DataModel, f64) + Send + Sync>;

/// A plugin feature that owns a data model.
///
/// Paths into a disabled module never resolve; bindings discovered from it report no value
/// until it is enabled again.
pub struct Module {
    id: String,
    display_name: String,
    enabled: AtomicBool,
    activated: AtomicBool,
    schema_version: AtomicU64,
    data_model: RwLock<DataModel>,
    hidden: RwLock<AHashSet<String>>,
    requirements: Vec<Box<dyn ActivationRequirement>>,
    requirement_mode: ActivationMode,
    update_hook: Option<UpdateHook>,
}

impl Module {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, data_model: DataModel) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            enabled: AtomicBool::new(true),
            activated: AtomicBool::new(false),
            schema_version: AtomicU64::new(0),
            data_model: RwLock::new(data_model),
            hidden: RwLock::new(AHashSet::new()),
            requirements: Vec::new(),
            requirement_mode: ActivationMode::Any,
            update_hook: None,
        }
    }

    pub fn with_requirement(mut self, requirement: Box<dyn ActivationRequirement>) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_requirement_mode(mut self, mode: ActivationMode) -> Self {
        self.requirement_mode = mode;
        self
    }

    /// Sets the hook run on every update while the module is activated.
    pub fn with_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut DataModel, f64) + Send + Sync + 'static,
    {
        self.update_hook = Some(Box::new(hook));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            debug!(module = %self.id, "module enabled");
        }
    }

    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            self.activated.store(false, Ordering::Release);
            debug!(module = %self.id, "module disabled");
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// A module without requirements is always available.
    pub fn is_always_available(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn evaluate_activation_requirements(&self) -> bool {
        if self.is_always_available() {
            return true;
        }
        match self.requirement_mode {
            ActivationMode::Any => self.requirements.iter().any(|r| r.evaluate()),
            ActivationMode::All => self.requirements.iter().all(|r| r.evaluate()),
        }
    }

    /// Re-evaluates activation and runs the update hook while activated.
    pub fn update(&self, delta: f64) {
        if !self.is_enabled() {
            return;
        }
        let active = self.evaluate_activation_requirements();
        if self.activated.swap(active, Ordering::AcqRel) != active {
            debug!(module = %self.id, active, "module activation changed");
        }
        if !active {
            return;
        }
        if let Some(hook) = &self.update_hook {
            let mut model = self.data_model.write();
            hook(&mut *model, delta);
        }
    }

    pub fn data_model(&self) -> RwLockReadGuard<'_, DataModel> {
        self.data_model.read()
    }

    /// Mutates the data model in place without changing its schema version.
    pub fn update_data_model<R>(&self, f: impl FnOnce(&mut DataModel) -> R) -> R {
        let mut model = self.data_model.write();
        f(&mut *model)
    }

    /// Replaces the whole data model, e.g. after a plugin reload, and bumps the schema version.
    pub fn replace_data_model(&self, data_model: DataModel) -> u64 {
        *self.data_model.write() = data_model;
        let version = self.schema_version.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(module = %self.id, version, "data model schema replaced");
        version
    }

    pub fn schema_version(&self) -> u64 {
        self.schema_version.load(Ordering::Acquire)
    }

    pub fn hide_property(&self, path: impl Into<String>) {
        self.hidden.write().insert(path.into());
    }

    pub fn show_property(&self, path: &str) {
        self.hidden.write().remove(path);
    }

    pub fn is_hidden(&self, path: &str) -> bool {
        self.hidden.read().contains(path)
    }

    /// Resolves a terminal property. `None` if disabled or the path does not match.
    pub fn resolve(&self, path: &str) -> Option<TypedValueCell> {
        let entry = self.resolve_entry(path)?;
        match entry {
            DataModelEntry::Property(cell) => Some(cell),
            _ => None,
        }
    }

    /// Resolves a list, returning a snapshot of its items.
    pub fn resolve_list(&self, path: &str) -> Option<Vec<DataModelEntry>> {
        match self.resolve_entry(path)? {
            DataModelEntry::List(items) => Some(items),
            _ => None,
        }
    }

    fn resolve_entry(&self, path: &str) -> Option<DataModelEntry> {
        if !self.is_enabled() {
            trace!(module = %self.id, path, "resolution skipped, module disabled");
            return None;
        }
        let segments = split_segments(path);
        let model = self.data_model.read();
        if segments.is_empty() {
            return Some(DataModelEntry::Model(model.clone()));
        }
        model.walk(&segments).cloned()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("enabled", &self.is_enabled())
            .field("activated", &self.is_activated())
            .field("schema_version", &self.schema_version())
            .finish()
    }
}
