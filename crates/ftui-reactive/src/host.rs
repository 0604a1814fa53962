#![forbid(unsafe_code)]

//! Minimal single-threaded host.
//!
//! [`Host`] plays the role of the UI framework around a [`HostComponent`]:
//! it performs the initial render and mount, forwards input replacements,
//! and re-renders when the component's state version has advanced or new
//! inputs arrived. Any number of patches between two frames collapse into
//! one render.
//!
//! ```
//! use ftui_reactive::{Declaration, Host, Inputs, Observable, ComponentInstance};
//! use ftui_reactive::render::Blank;
//!
//! let value = Observable::pending();
//! let component = ComponentInstance::new(
//!     Declaration::new().reactive_input("value"),
//!     Inputs::new().with("value", value.clone()),
//!     Blank,
//! )
//! .unwrap();
//! let mut host = Host::attach(component).unwrap();
//! // Mount applied the initial (all-unset) patch.
//! assert!(host.frame().is_some());
//! assert!(host.frame().is_none());
//!
//! value.set(1u8);
//! value.set(2u8);
//! assert!(host.frame().is_some());
//! assert_eq!(host.renders(), 3);
//! host.detach();
//! ```

use crate::component::HostComponent;
use crate::error::Result;

/// Drives one component through its lifecycle.
pub struct Host<C: HostComponent> {
    component: C,
    rendered_version: u64,
    renders: u64,
    last_output: Option<C::Output>,
    /// Inputs were replaced since the last frame.
    inputs_changed: bool,
}

impl<C: HostComponent> Host<C> {
    /// Render once, then mount.
    pub fn attach(mut component: C) -> Result<Self> {
        let initial = component.render();
        let rendered_version = component.state_version();
        component.mount()?;
        tracing::debug!(version = rendered_version, "host attached component");
        Ok(Self {
            component,
            rendered_version,
            renders: 1,
            last_output: Some(initial),
            inputs_changed: false,
        })
    }

    /// Replace the component's inputs. The next [`frame`](Self::frame)
    /// renders even if no patch was applied.
    pub fn update(&mut self, inputs: C::Inputs) -> Result<()> {
        self.component.receive_inputs(inputs)?;
        self.inputs_changed = true;
        Ok(())
    }

    /// Re-render if state or inputs changed since the last frame.
    pub fn frame(&mut self) -> Option<&C::Output> {
        let version = self.component.state_version();
        if version == self.rendered_version && !self.inputs_changed {
            return None;
        }
        self.rendered_version = version;
        self.inputs_changed = false;
        self.renders += 1;
        tracing::trace!(version, renders = self.renders, "host frame");
        self.last_output = Some(self.component.render());
        self.last_output.as_ref()
    }

    /// Render unconditionally.
    pub fn force_frame(&mut self) -> &C::Output {
        self.rendered_version = self.component.state_version();
        self.inputs_changed = false;
        self.renders += 1;
        self.last_output.insert(self.component.render())
    }

    /// Most recent output.
    #[must_use]
    pub fn output(&self) -> Option<&C::Output> {
        self.last_output.as_ref()
    }

    /// Renders performed, including the initial one.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders
    }

    #[must_use]
    pub fn component(&self) -> &C {
        &self.component
    }

    /// Unmount and hand the component back.
    pub fn detach(mut self) -> C {
        self.component.unmount();
        tracing::debug!(renders = self.renders, "host detached component");
        self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchScope;
    use crate::component::ComponentInstance;
    use crate::config::{ReactiveConfig, RebuildPolicy};
    use crate::inputs::Inputs;
    use crate::lifecycle::{Declaration, Phase};
    use crate::observable::Observable;
    use crate::render::{RenderPaths, RenderView};

    struct Sum;

    impl RenderPaths<i32> for Sum {
        type Output = i32;

        fn ready_render(&self, view: &RenderView<'_, i32>) -> i32 {
            view.state().iter().map(|(_, v)| *v).sum()
        }
    }

    fn component(
        sources: &[Observable<i32>],
    ) -> ComponentInstance<i32, Sum> {
        let mut decl = Declaration::new();
        let mut inputs = Inputs::new();
        for (i, s) in sources.iter().enumerate() {
            let key = format!("k{i}");
            decl = decl.reactive_input(key.clone());
            inputs = inputs.with(key, s.clone());
        }
        ComponentInstance::with_config(decl, inputs, Sum, ReactiveConfig::default()).unwrap()
    }

    #[test]
    fn attach_renders_once_before_mount() {
        let sources = vec![Observable::new(1)];
        let host = Host::attach(component(&sources)).unwrap();
        assert_eq!(host.renders(), 1);
        // Initial render ran before the sources were subscribed.
        assert_eq!(host.output(), Some(&0));
        assert_eq!(host.component().phase(), Phase::Mounted);
    }

    #[test]
    fn frame_skips_when_state_unchanged() {
        let sources = vec![Observable::new(1)];
        let mut host = Host::attach(component(&sources)).unwrap();
        assert_eq!(host.frame(), Some(&1));
        assert_eq!(host.frame(), None);
        assert_eq!(host.renders(), 2);
    }

    #[test]
    fn batch_of_emissions_yields_one_patch_and_one_render() {
        let sources: Vec<Observable<i32>> = (0..5).map(|_| Observable::pending()).collect();
        let mut host = Host::attach(component(&sources)).unwrap();
        let _ = host.frame();
        let before_version = host.component().state_version();
        let before_renders = host.renders();

        {
            let _turn = BatchScope::new();
            for (i, s) in sources.iter().enumerate() {
                s.set(i as i32 + 1);
            }
        }

        assert_eq!(host.component().state_version(), before_version + 1);
        assert_eq!(host.frame(), Some(&15));
        assert_eq!(host.renders(), before_renders + 1);
    }

    #[test]
    fn force_frame_always_renders() {
        let sources = vec![Observable::new(3)];
        let mut host = Host::attach(component(&sources)).unwrap();
        assert_eq!(*host.force_frame(), 3);
        assert_eq!(*host.force_frame(), 3);
        assert_eq!(host.renders(), 3);
    }

    #[test]
    fn detach_unmounts() {
        let sources = vec![Observable::new(3)];
        let host = Host::attach(component(&sources)).unwrap();
        let c = host.detach();
        assert_eq!(c.phase(), Phase::Unmounted);
        assert_eq!(sources[0].subscriber_count(), 0);
    }

    #[test]
    fn update_forwards_inputs() {
        let sources = vec![Observable::new(3)];
        let mut host = Host::attach(component(&sources)).unwrap();
        let _ = host.frame();
        host.update(Inputs::new().with_value("k0", 10)).unwrap();
        assert_eq!(host.frame(), Some(&10));
        assert_eq!(sources[0].subscriber_count(), 0);
    }

    /// Renders the raw `label` input, which is not tracked.
    struct Label;

    impl RenderPaths<i32> for Label {
        type Output = Option<i32>;

        fn ready_render(&self, view: &RenderView<'_, i32>) -> Option<i32> {
            view.inputs().value("label").copied()
        }
    }

    #[test]
    fn update_without_reactive_inputs_renders_new_inputs() {
        let c = ComponentInstance::with_config(
            Declaration::new(),
            Inputs::new().with_value("label", 1),
            Label,
            ReactiveConfig::default(),
        )
        .unwrap();
        let mut host = Host::attach(c).unwrap();
        assert_eq!(host.output(), Some(&Some(1)));
        assert_eq!(host.frame(), None);

        host.update(Inputs::new().with_value("label", 2)).unwrap();
        assert_eq!(host.frame(), Some(&Some(2)));
        assert_eq!(host.frame(), None);
    }

    #[test]
    fn update_with_unchanged_bindings_still_renders() {
        let value = Observable::new(5);
        let c = ComponentInstance::with_config(
            Declaration::new().reactive_input("v"),
            Inputs::new().with("v", value.clone()).with_value("label", 1),
            Label,
            ReactiveConfig::default().with_rebuild_policy(RebuildPolicy::SkipUnchanged),
        )
        .unwrap();
        let mut host = Host::attach(c).unwrap();
        assert_eq!(host.frame(), Some(&Some(1)));
        let version = host.component().state_version();

        host.update(Inputs::new().with("v", value.clone()).with_value("label", 2))
            .unwrap();
        assert_eq!(host.component().state_version(), version);
        assert_eq!(host.frame(), Some(&Some(2)));
        assert_eq!(value.subscriber_count(), 1);
    }

    #[test]
    fn rejected_update_does_not_mark_dirty() {
        let sources = vec![Observable::new(3)];
        let mut host = Host::attach(component(&sources)).unwrap();
        let _ = host.frame();
        host.component.unmount();
        assert!(host.update(Inputs::new().with_value("k0", 4)).is_err());
        assert_eq!(host.frame(), None);
    }
}
