//! # Hikari - Lighting Profile Evaluation Engine
//!
//! **Hikari** is the runtime core of an RGB lighting profile engine. Modules expose live
//! data models (game state, system sensors, audio levels), and every update the engine
//! decides which profile elements are shown and feeds that data through node scripts into
//! the properties of layers.
//!
//! ## Core Workflow
//!
//! 1.  **Register Modules**: Add [`datamodel::Module`]s with their data models to a
//!     [`datamodel::ModuleRegistry`].
//! 2.  **Build a Profile**: Create a [`profile::Profile`], add [`profile::ProfileElement`]s
//!     with their layer properties, display conditions and node scripts.
//! 3.  **Update**: Call [`profile::Profile::update`] once per frame. Each displayed element
//!     advances its timeline and evaluates its scripts in topological order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hikari::prelude::*;
//! use std::sync::Arc;
//!
//! // 1. A module exposing a small data model.
//! let modules = Arc::new(ModuleRegistry::new());
//! modules.add(Module::new(
//!     "game",
//!     "Game",
//!     DataModel::new().with_model("Player", DataModel::new().with_value("Health", 80)),
//! ));
//!
//! // 2. An element shown while the player is alive.
//! let profile = Profile::new("Default", Arc::clone(&modules));
//! let element = profile.add_element(ProfileElement::new("Health bar"));
//! element.add_layer_property(LayerProperty::stored("Brightness", [("Brightness", Value::Integer(0))]));
//! {
//!     let mut state = element.lock();
//!     let root = state.display_condition.root();
//!     state.display_condition.insert(
//!         root,
//!         ConditionPart::predicate(
//!             DataModelPath::new("game", "Player.Health"),
//!             ConditionOperator::GreaterThan,
//!             0,
//!         ),
//!     );
//!
//!     // 3. A script feeding the health into the layer property.
//!     let mut script = profile.new_script("Health to brightness");
//!     let health = script.add_node(NodeKind::DataModel(Some(DataModelPath::new("game", "Player.Health"))));
//!     let exit = script.add_node(NodeKind::DataBindingExit(LayerPropertyBinding::new(element.id(), "Brightness")));
//!     script.refresh_pins(&profile);
//!     let output = script.find_pin(health, PinDirection::Output, "Output").unwrap();
//!     let input = script.find_pin(exit, PinDirection::Input, "Brightness").unwrap();
//!     script.connect(output, input);
//!     state.scripts.push(script);
//! }
//!
//! // 4. Run one frame.
//! let updates = profile.tick();
//! assert!(updates[0].displayed);
//! ```

pub mod conditions;
pub mod config;
pub mod datamodel;
pub mod error;
pub mod prelude;
pub mod prerequisite;
pub mod profile;
pub mod script;
pub mod value;
