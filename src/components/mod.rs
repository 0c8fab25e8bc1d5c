//! # Components and their readiness.
//!
//! - [`Component`] - trait for async initialization of one named unit
//! - [`ComponentFn`] - closure-backed component
//! - [`ComponentRef`] - shared reference to a component (`Arc<dyn Component>`)
//! - [`ComponentSpec`] - component bundled with its init retry policy
//! - [`ReadinessToken`] / [`Settler`] - single-settlement readiness handle pair

mod component;
mod component_fn;
mod spec;
mod token;

pub use component::{Component, ComponentRef};
pub use component_fn::ComponentFn;
pub use spec::ComponentSpec;
pub use token::{Readiness, ReadinessToken, Settler};
