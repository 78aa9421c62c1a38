use super::{Node, PinDirection, PinSpec, ScriptContext};
use crate::datamodel::{DataModelPath, LayerProperty};
use crate::profile::ElementId;
use crate::value::{Value, ValueKind, ValueType, coerce_to};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Which layer property of which profile element a node is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPropertyBinding {
    pub element_id: Option<ElementId>,
    pub property_path: Option<String>,
}

impl LayerPropertyBinding {
    pub fn new(element_id: ElementId, property_path: impl Into<String>) -> Self {
        Self {
            element_id: Some(element_id),
            property_path: Some(property_path.into()),
        }
    }

    pub fn resolve(&self, ctx: &dyn ScriptContext) -> Option<Arc<LayerProperty>> {
        let element = self.element_id?;
        let path = self.property_path.as_deref()?;
        ctx.layer_property(element, path)
    }
}

/// The closed set of node kinds. Each variant carries its own configuration and defines
/// its pin layout and evaluate step.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Outputs a configured value.
    StaticValue(Value),
    ToString,
    ToInteger,
    ToDouble,
    ToFloat,
    /// Outputs every data binding property of a layer property, one pin each.
    LayerProperty(LayerPropertyBinding),
    /// Outputs the value at a data model path.
    DataModel(Option<DataModelPath>),
    /// Writes its inputs into the data binding properties of a layer property.
    DataBindingExit(LayerPropertyBinding),
}

impl NodeKind {
    /// The name a kind is registered under.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::StaticValue(_) => "StaticValue",
            NodeKind::ToString => "ToString",
            NodeKind::ToInteger => "ToInteger",
            NodeKind::ToDouble => "ToDouble",
            NodeKind::ToFloat => "ToFloat",
            NodeKind::LayerProperty(_) => "LayerProperty",
            NodeKind::DataModel(_) => "DataModel",
            NodeKind::DataBindingExit(_) => "DataBindingExit",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::StaticValue(_) => "Static Value",
            NodeKind::ToString => "To String",
            NodeKind::ToInteger => "To Integer",
            NodeKind::ToDouble => "To Double",
            NodeKind::ToFloat => "To Float",
            NodeKind::LayerProperty(_) => "Layer/Folder Property",
            NodeKind::DataModel(_) => "Data Model",
            NodeKind::DataBindingExit(_) => "Data Binding Exit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            NodeKind::StaticValue(_) => "Outputs a configured value.",
            NodeKind::ToString => "Converts the input to a string.",
            NodeKind::ToInteger => "Converts the input to an integer.",
            NodeKind::ToDouble => "Converts the input to a double.",
            NodeKind::ToFloat => "Converts the input to a float.",
            NodeKind::LayerProperty(_) => "Outputs the property of a selected layer or folder",
            NodeKind::DataModel(_) => "Outputs a value of a module's data model",
            NodeKind::DataBindingExit(_) => "Writes its inputs into a layer property",
        }
    }

    /// Whether the pin set depends on state outside the script.
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            NodeKind::LayerProperty(_) | NodeKind::DataModel(_) | NodeKind::DataBindingExit(_)
        )
    }

    /// Pins a freshly created node starts with, as `(inputs, outputs)`.
    pub fn initial_layout(&self) -> (Vec<PinSpec>, Vec<PinSpec>) {
        let convert = |output: &str, value_type| {
            (
                vec![PinSpec::new("Input", ValueType::Any)],
                vec![PinSpec::new(output, value_type)],
            )
        };
        match self {
            NodeKind::StaticValue(value) => {
                (Vec::new(), vec![PinSpec::new("Output", value.value_type())])
            }
            NodeKind::ToString => convert("String", ValueType::String),
            NodeKind::ToInteger => convert("Integer", ValueType::Integer),
            NodeKind::ToDouble => convert("Double", ValueType::Double),
            NodeKind::ToFloat => convert("Float", ValueType::Float),
            NodeKind::LayerProperty(_) | NodeKind::DataModel(_) | NodeKind::DataBindingExit(_) => {
                (Vec::new(), Vec::new())
            }
        }
    }

    pub fn storage(&self) -> Option<serde_json::Value> {
        match self {
            NodeKind::StaticValue(value) => serde_json::to_value(value).ok(),
            NodeKind::LayerProperty(binding) | NodeKind::DataBindingExit(binding) => {
                serde_json::to_value(binding).ok()
            }
            NodeKind::DataModel(path) => path.as_ref().and_then(|p| serde_json::to_value(p).ok()),
            NodeKind::ToString | NodeKind::ToInteger | NodeKind::ToDouble | NodeKind::ToFloat => {
                None
            }
        }
    }
}

impl Node {
    /// The pin layout a dynamic node should have right now, or `None` to keep the current one.
    ///
    /// Bindings to elements that no longer exist are cleared here.
    pub(crate) fn desired_layout(
        &mut self,
        ctx: &dyn ScriptContext,
    ) -> Option<(PinDirection, Vec<PinSpec>)> {
        let id = self.id();
        let direction = match self.kind() {
            NodeKind::DataBindingExit(_) => PinDirection::Input,
            _ => PinDirection::Output,
        };
        match self.kind_mut() {
            NodeKind::LayerProperty(binding) | NodeKind::DataBindingExit(binding) => {
                if let Some(element) = binding.element_id {
                    if !ctx.contains_element(element) {
                        debug!(node = %id, %element, "bound element is gone, clearing binding");
                        *binding = LayerPropertyBinding::default();
                    }
                }
                let specs = binding
                    .resolve(ctx)
                    .map(|property| {
                        property
                            .data_binding_properties()
                            .iter()
                            .map(|p| PinSpec::new(p.display_name(), p.value_type()))
                            .collect()
                    })
                    .unwrap_or_default();
                Some((direction, specs))
            }
            NodeKind::DataModel(None) => Some((PinDirection::Output, Vec::new())),
            NodeKind::DataModel(Some(path)) => ctx.data_models().resolve(path).map(|cell| {
                (
                    PinDirection::Output,
                    vec![PinSpec::new("Output", cell.declared_type())],
                )
            }),
            _ => None,
        }
    }

    /// Runs the node's transformation. Inputs must already hold this pass's values.
    pub(crate) fn evaluate(&mut self, ctx: &dyn ScriptContext) {
        match self.kind().clone() {
            NodeKind::StaticValue(value) => self.write_outputs(&[Some(value)]),
            NodeKind::ToString => {
                let input = self.first_input();
                self.write_outputs(&[coerce_to(input.as_ref(), ValueType::String)]);
            }
            NodeKind::ToInteger => self.convert::<i32>(),
            NodeKind::ToDouble => self.convert::<f64>(),
            NodeKind::ToFloat => self.convert::<f32>(),
            NodeKind::LayerProperty(binding) => {
                let values: Vec<Option<Value>> = binding
                    .resolve(ctx)
                    .map(|property| {
                        property
                            .data_binding_properties()
                            .iter()
                            .map(|p| p.get_value())
                            .collect()
                    })
                    .unwrap_or_default();
                self.write_outputs(&values);
            }
            NodeKind::DataModel(path) => {
                let value = path
                    .and_then(|p| ctx.data_models().resolve(&p))
                    .and_then(|cell| cell.value().cloned());
                self.write_outputs(&[value]);
            }
            NodeKind::DataBindingExit(binding) => {
                let Some(property) = binding.resolve(ctx) else {
                    return;
                };
                for (pin, target) in self.inputs().zip(property.data_binding_properties()) {
                    if let Some(value) = pin.cell().value() {
                        target.set_value(value.clone());
                    }
                }
            }
        }
    }

    fn convert<T: ValueKind>(&mut self) {
        let input = self.first_input();
        let converted = T::coerce(input.as_ref()).into_value();
        self.write_outputs(&[Some(converted)]);
    }

    fn first_input(&self) -> Option<Value> {
        self.inputs().next().and_then(|p| p.cell().value().cloned())
    }

    /// Writes values to the output pins by position. Missing values fall back to the
    /// pin's default.
    fn write_outputs(&mut self, values: &[Option<Value>]) {
        let outputs = self
            .pins_mut()
            .iter_mut()
            .filter(|p| p.direction() == PinDirection::Output);
        for (index, pin) in outputs.enumerate() {
            match values.get(index).and_then(|v| v.as_ref()) {
                Some(value) => pin.cell_mut().set_coerced(Some(value)),
                None => pin.reset_to_default(),
            }
        }
    }
}
