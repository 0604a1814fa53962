#![forbid(unsafe_code)]

//! Reactive component instances and the host contract.
//!
//! [`ComponentInstance`] pairs a [`LifecycleAdapter`] with a set of
//! [`RenderPaths`]. The host drives it through [`HostComponent`]: attach
//! (`mount`), replace inputs (`receive_inputs`), detach (`unmount`), and
//! `render` any number of times in between.
//!
//! # Example
//!
//! ```
//! use ftui_reactive::{
//!     ComponentInstance, Declaration, HostComponent, Inputs, Observable, RenderPaths,
//!     RenderView,
//! };
//!
//! struct Counter;
//!
//! impl RenderPaths<i64> for Counter {
//!     type Output = String;
//!
//!     fn unready_render(&self, _view: &RenderView<'_, i64>) -> String {
//!         "…".into()
//!     }
//!
//!     fn ready_render(&self, view: &RenderView<'_, i64>) -> String {
//!         format!("count = {}", view.get("value").copied().unwrap_or_default())
//!     }
//! }
//!
//! let value = Observable::pending();
//! let mut counter = ComponentInstance::new(
//!     Declaration::new().reactive_input("value"),
//!     Inputs::new().with("value", value.clone()),
//!     Counter,
//! )
//! .unwrap();
//!
//! counter.mount().unwrap();
//! assert_eq!(counter.render(), "…");
//!
//! value.set(5);
//! assert_eq!(counter.render(), "count = 5");
//! counter.unmount();
//! ```

use std::fmt;

use crate::config::ReactiveConfig;
use crate::error::Result;
use crate::inputs::Inputs;
use crate::lifecycle::{Declaration, HookCx, LifecycleAdapter, LifecycleEvent, Phase};
use crate::render::{RenderPaths, dispatch};

/// The host-facing lifecycle contract.
pub trait HostComponent {
    type Inputs;
    type Output;

    /// Instance attached.
    fn mount(&mut self) -> Result<()>;

    /// Inputs replaced wholesale.
    fn receive_inputs(&mut self, inputs: Self::Inputs) -> Result<()>;

    /// Instance detached.
    fn unmount(&mut self);

    /// Produce output for the current state.
    fn render(&self) -> Self::Output;

    /// Monotonic counter that advances whenever render state changes.
    fn state_version(&self) -> u64;
}

/// A component whose render state tracks its reactive inputs.
pub struct ComponentInstance<V: Clone + 'static, P> {
    adapter: LifecycleAdapter<V>,
    paths: P,
}

impl<V, P> ComponentInstance<V, P>
where
    V: Clone + PartialEq + 'static,
    P: RenderPaths<V>,
{
    /// Create with configuration read from the environment.
    pub fn new(declaration: Declaration<V>, inputs: Inputs<V>, paths: P) -> Result<Self> {
        Self::with_config(declaration, inputs, paths, ReactiveConfig::from_env())
    }

    pub fn with_config(
        declaration: Declaration<V>,
        inputs: Inputs<V>,
        paths: P,
        config: ReactiveConfig,
    ) -> Result<Self> {
        Ok(Self {
            adapter: LifecycleAdapter::new(declaration, inputs, config)?,
            paths,
        })
    }

    /// Register a hook that runs after the base handling of `event`.
    pub fn on(&mut self, event: LifecycleEvent, hook: impl FnMut(&HookCx<'_, V>) + 'static) {
        self.adapter.register(event, hook);
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.adapter.phase()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.adapter.is_ready()
    }

    #[must_use]
    pub fn adapter(&self) -> &LifecycleAdapter<V> {
        &self.adapter
    }

    #[must_use]
    pub fn paths(&self) -> &P {
        &self.paths
    }

    /// Render through the unready path regardless of readiness.
    pub fn render_unready(&self) -> P::Output {
        self.adapter
            .with_view(|view| self.paths.unready_render(view))
    }
}

impl<V, P> HostComponent for ComponentInstance<V, P>
where
    V: Clone + PartialEq + 'static,
    P: RenderPaths<V>,
{
    type Inputs = Inputs<V>;
    type Output = P::Output;

    fn mount(&mut self) -> Result<()> {
        self.adapter.mount()
    }

    fn receive_inputs(&mut self, inputs: Inputs<V>) -> Result<()> {
        self.adapter.receive_inputs(inputs)
    }

    fn unmount(&mut self) {
        self.adapter.unmount();
    }

    fn render(&self) -> P::Output {
        self.adapter.with_view(|view| dispatch(&self.paths, view))
    }

    fn state_version(&self) -> u64 {
        self.adapter.state_version()
    }
}

impl<V, P> fmt::Debug for ComponentInstance<V, P>
where
    V: Clone + fmt::Debug + 'static,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("adapter", &self.adapter)
            .field("paths", &self.paths)
            .finish()
    }
}
