use super::split_segments;
use crate::value::{TypedValueCell, Value, ValueKind, ValueType};

/// One level of a data model schema.
#[derive(Debug, Clone, PartialEq)]
pub enum DataModelEntry {
    /// A terminal value with its declared type.
    Property(TypedValueCell),
    /// A nested data model.
    Model(DataModel),
    /// A collection; items are walked individually by list-scoped conditions.
    List(Vec<DataModelEntry>),
    /// A nested model that is currently absent.
    Null,
}

/// The schema walk every data model provider exposes to the engine.
pub trait SchemaWalk {
    /// Looks up a direct child by name.
    fn entry(&self, name: &str) -> Option<&DataModelEntry>;

    /// Walks `segments` level by level. Fails softly on null or missing levels and
    /// refuses to descend into lists or terminal values.
    fn walk(&self, segments: &[&str]) -> Option<&DataModelEntry> {
        let (first, rest) = segments.split_first()?;
        let entry = self.entry(first)?;
        entry.walk(rest)
    }
}

impl DataModelEntry {
    pub fn walk(&self, segments: &[&str]) -> Option<&DataModelEntry> {
        if segments.is_empty() {
            return Some(self);
        }
        match self {
            DataModelEntry::Model(model) => model.walk(segments),
            DataModelEntry::Property(_) | DataModelEntry::List(_) | DataModelEntry::Null => None,
        }
    }

    /// Walks a dotted path relative to this entry. An empty path is the entry itself.
    pub fn walk_path(&self, path: &str) -> Option<&DataModelEntry> {
        self.walk(&split_segments(path))
    }

    pub fn as_property(&self) -> Option<&TypedValueCell> {
        match self {
            DataModelEntry::Property(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DataModelEntry]> {
        match self {
            DataModelEntry::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts arbitrary JSON into a data model entry.
    ///
    /// Whole numbers that fit become `Integer`, other numbers `Double`.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => DataModelEntry::Null,
            serde_json::Value::Bool(b) => DataModelEntry::Property(TypedValueCell::of(*b)),
            serde_json::Value::Number(n) => {
                let cell = match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                    Some(i) => TypedValueCell::of(i),
                    None => TypedValueCell::of(n.as_f64().unwrap_or_default()),
                };
                DataModelEntry::Property(cell)
            }
            serde_json::Value::String(s) => DataModelEntry::Property(TypedValueCell::of(s.clone())),
            serde_json::Value::Array(items) => {
                DataModelEntry::List(items.iter().map(DataModelEntry::from_json).collect())
            }
            serde_json::Value::Object(_) => DataModelEntry::Model(DataModel::from_json(json)),
        }
    }
}

/// A dynamically shaped data model, as exposed by a module.
///
/// Entries keep their declaration order so discovered bindings are stable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataModel {
    entries: Vec<(String, DataModelEntry)>,
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: DataModelEntry) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<DataModelEntry> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: DataModelEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn with_value<T: ValueKind>(self, name: impl Into<String>, value: T) -> Self {
        self.with_entry(name, DataModelEntry::Property(TypedValueCell::of(value)))
    }

    /// Declares a property of type `value_type` that currently holds no value.
    pub fn with_empty(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.with_entry(name, DataModelEntry::Property(TypedValueCell::new(value_type)))
    }

    pub fn with_model(self, name: impl Into<String>, model: DataModel) -> Self {
        self.with_entry(name, DataModelEntry::Model(model))
    }

    pub fn with_list(self, name: impl Into<String>, items: Vec<DataModelEntry>) -> Self {
        self.with_entry(name, DataModelEntry::List(items))
    }

    pub fn with_null(self, name: impl Into<String>) -> Self {
        self.with_entry(name, DataModelEntry::Null)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &DataModelEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Mutable access to a terminal property by dotted path.
    pub fn property_mut(&mut self, path: &str) -> Option<&mut TypedValueCell> {
        let segments = split_segments(path);
        let (last, parents) = segments.split_last()?;
        let mut model = self;
        for segment in parents {
            model = match model.entry_mut(segment)? {
                DataModelEntry::Model(inner) => inner,
                _ => return None,
            };
        }
        match model.entry_mut(last)? {
            DataModelEntry::Property(cell) => Some(cell),
            _ => None,
        }
    }

    /// Mutable access to any entry by dotted path.
    pub fn entry_at_mut(&mut self, path: &str) -> Option<&mut DataModelEntry> {
        let segments = split_segments(path);
        let (last, parents) = segments.split_last()?;
        let mut model = self;
        for segment in parents {
            model = match model.entry_mut(segment)? {
                DataModelEntry::Model(inner) => inner,
                _ => return None,
            };
        }
        model.entry_mut(last)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut DataModelEntry> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Lists every terminal property as `(dotted path, declared type)`, depth first.
    ///
    /// Lists are reported as a single `List` property; their items are not expanded.
    pub fn schema(&self) -> Vec<(String, ValueType)> {
        let mut out = Vec::new();
        self.collect_schema("", &mut out);
        out
    }

    fn collect_schema(&self, prefix: &str, out: &mut Vec<(String, ValueType)>) {
        for (name, entry) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match entry {
                DataModelEntry::Property(cell) => out.push((path, cell.declared_type())),
                DataModelEntry::List(_) => out.push((path, ValueType::List)),
                DataModelEntry::Model(model) => model.collect_schema(&path, out),
                DataModelEntry::Null => {}
            }
        }
    }

    /// Builds a data model from a JSON object. Non-object JSON yields an empty model.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let mut model = DataModel::new();
        if let serde_json::Value::Object(map) = json {
            for (name, value) in map {
                model.insert(name.clone(), DataModelEntry::from_json(value));
            }
        }
        model
    }

    /// Reads a terminal property value by dotted path.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.walk(&split_segments(path))?.as_property()?.value()
    }
}

impl SchemaWalk for DataModel {
    fn entry(&self, name: &str) -> Option<&DataModelEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }
}
