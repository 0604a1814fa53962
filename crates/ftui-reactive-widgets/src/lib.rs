#![forbid(unsafe_code)]

//! Leaf elements for FrankenTUI reactive components.
//!
//! Instead of one type per element kind, every leaf element is a
//! [`ReactiveElement`] driven by a data-only [`Template`]. The [`elements`]
//! module ships templates for the common kinds; others can be built in code
//! or loaded with [`Template::from_json`].
//!
//! Values are `serde_json::Value`, so one component can mix strings, numbers
//! and structured data from different sources.

pub mod element;
pub mod elements;
pub mod markup;
pub mod template;

pub use element::{ElementComponent, ReactiveElement, value_text};
pub use markup::{ElementWriter, Markup};
pub use template::{FieldMapping, FieldTarget, Template, UnreadyStrategy};
