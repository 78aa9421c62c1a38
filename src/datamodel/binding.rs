use crate::value::{TypedValueCell, Value, ValueType, coerce_to};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub type ValueGetter = Arc<dyn Fn() -> Option<Value> + Send + Sync>;
pub type ValueSetter = Arc<dyn Fn(Value) + Send + Sync>;

/// A named, typed accessor into a data model or a layer property.
///
/// The getter returns `None` whenever the value is unavailable, e.g. because the module
/// providing it was disabled. Callers treat that as "no value this pass".
#[derive(Clone)]
pub struct DataBindingProperty {
    display_name: String,
    value_type: ValueType,
    getter: ValueGetter,
    setter: Option<ValueSetter>,
}

impl DataBindingProperty {
    pub fn new(display_name: impl Into<String>, value_type: ValueType, getter: ValueGetter) -> Self {
        Self {
            display_name: display_name.into(),
            value_type,
            getter,
            setter: None,
        }
    }

    pub fn with_setter(mut self, setter: ValueSetter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// The current value, coerced into the declared type.
    pub fn get_value(&self) -> Option<Value> {
        let value = (self.getter)()?;
        coerce_to(Some(&value), self.value_type)
    }

    /// Writes a value through the setter. Returns `false` for read-only properties.
    pub fn set_value(&self, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                if let Some(value) = coerce_to(Some(&value), self.value_type) {
                    setter(value);
                }
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for DataBindingProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBindingProperty")
            .field("display_name", &self.display_name)
            .field("value_type", &self.value_type)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// A property of a layer or folder, such as `Transform.Position`, exposing one data
/// binding property per component it can be bound through.
#[derive(Debug, Clone)]
pub struct LayerProperty {
    path: String,
    properties: Vec<DataBindingProperty>,
}

impl LayerProperty {
    pub fn new(path: impl Into<String>, properties: Vec<DataBindingProperty>) -> Self {
        Self {
            path: path.into(),
            properties,
        }
    }

    /// A layer property backed by its own storage: every component is readable and
    /// writable and starts out with the given value.
    pub fn stored<N: Into<String>>(
        path: impl Into<String>,
        components: impl IntoIterator<Item = (N, Value)>,
    ) -> Self {
        let properties = components
            .into_iter()
            .map(|(name, initial)| {
                let value_type = initial.value_type();
                let storage = Arc::new(RwLock::new(TypedValueCell::zeroed(value_type)));
                storage.write().set_coerced(Some(&initial));

                let read = Arc::clone(&storage);
                let write = Arc::clone(&storage);
                DataBindingProperty::new(
                    name,
                    value_type,
                    Arc::new(move || read.read().value().cloned()),
                )
                .with_setter(Arc::new(move |value| write.write().set_coerced(Some(&value))))
            })
            .collect();
        Self::new(path, properties)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data_binding_properties(&self) -> &[DataBindingProperty] {
        &self.properties
    }

    pub fn property(&self, display_name: &str) -> Option<&DataBindingProperty> {
        self.properties
            .iter()
            .find(|p| p.display_name() == display_name)
    }

    /// Reads a component's current value.
    pub fn value(&self, display_name: &str) -> Option<Value> {
        self.property(display_name)?.get_value()
    }
}
