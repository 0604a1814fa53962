#![forbid(unsafe_code)]

//! Render dispatch between the ready and unready paths.
//!
//! A specialization implements [`RenderPaths`] and overrides one or both
//! paths. The defaults are deliberately lopsided: `unready_render` yields the
//! empty output and `ready_render` forwards to `unready_render`, so a type
//! that only overrides `unready_render` uses it for both states until it
//! chooses to differentiate.

use crate::inputs::Inputs;
use crate::readiness;
use crate::state::RenderState;

/// Read-only view handed to render paths.
pub struct RenderView<'a, V> {
    state: &'a RenderState<V>,
    inputs: &'a Inputs<V>,
    tracked: &'a [String],
}

impl<'a, V> RenderView<'a, V> {
    #[must_use]
    pub fn new(state: &'a RenderState<V>, inputs: &'a Inputs<V>, tracked: &'a [String]) -> Self {
        Self {
            state,
            inputs,
            tracked,
        }
    }

    /// Render state (reactive values).
    #[must_use]
    pub fn state(&self) -> &'a RenderState<V> {
        self.state
    }

    /// Raw external inputs as last supplied by the host.
    #[must_use]
    pub fn inputs(&self) -> &'a Inputs<V> {
        self.inputs
    }

    /// Tracked keys: reactive input names, then fixed source names.
    #[must_use]
    pub fn tracked_keys(&self) -> &'a [String] {
        self.tracked
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        readiness::is_ready(self.state, self.tracked)
    }

    #[must_use]
    pub fn pending_keys(&self) -> Vec<&'a str> {
        readiness::pending_keys(self.state, self.tracked)
    }

    /// Value for `key` from render state.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a V> {
        self.state.get(key)
    }
}

/// The two render paths of a reactive component.
pub trait RenderPaths<V> {
    type Output: Default;

    /// Output while some tracked key is still unset.
    fn unready_render(&self, _view: &RenderView<'_, V>) -> Self::Output {
        Self::Output::default()
    }

    /// Output once every tracked key is set.
    fn ready_render(&self, view: &RenderView<'_, V>) -> Self::Output {
        self.unready_render(view)
    }
}

/// Invoke the path matching the view's readiness.
pub fn dispatch<V, P>(paths: &P, view: &RenderView<'_, V>) -> P::Output
where
    P: RenderPaths<V> + ?Sized,
{
    if view.is_ready() {
        paths.ready_render(view)
    } else {
        paths.unready_render(view)
    }
}

/// Render paths that always produce the empty output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blank;

impl<V> RenderPaths<V> for Blank {
    type Output = ();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Patch;

    struct UnreadyOnly;

    impl RenderPaths<i32> for UnreadyOnly {
        type Output = String;

        fn unready_render(&self, view: &RenderView<'_, i32>) -> String {
            format!("pending:{}", view.pending_keys().join(","))
        }
    }

    struct BothPaths;

    impl RenderPaths<i32> for BothPaths {
        type Output = String;

        fn unready_render(&self, _view: &RenderView<'_, i32>) -> String {
            "loading".into()
        }

        fn ready_render(&self, view: &RenderView<'_, i32>) -> String {
            format!("value={}", view.get("value").copied().unwrap_or_default())
        }
    }

    struct Defaults;

    impl RenderPaths<i32> for Defaults {
        type Output = Vec<u8>;
    }

    fn tracked() -> Vec<String> {
        vec!["value".into()]
    }

    fn ready_state() -> RenderState<i32> {
        let mut state = RenderState::new();
        state.apply_patch(Patch::new(vec![("value".into(), Some(5))]));
        state
    }

    #[test]
    fn unready_view_uses_unready_path() {
        let state = RenderState::new();
        let inputs = Inputs::new();
        let keys = tracked();
        let view = RenderView::new(&state, &inputs, &keys);
        assert_eq!(dispatch(&BothPaths, &view), "loading");
    }

    #[test]
    fn ready_view_uses_ready_path() {
        let state = ready_state();
        let inputs = Inputs::new();
        let keys = tracked();
        let view = RenderView::new(&state, &inputs, &keys);
        assert_eq!(dispatch(&BothPaths, &view), "value=5");
    }

    #[test]
    fn ready_path_defaults_to_unready_path() {
        let inputs = Inputs::new();
        let keys = tracked();

        let unready = RenderState::new();
        let view = RenderView::new(&unready, &inputs, &keys);
        assert_eq!(dispatch(&UnreadyOnly, &view), "pending:value");

        let ready = ready_state();
        let view = RenderView::new(&ready, &inputs, &keys);
        assert_eq!(dispatch(&UnreadyOnly, &view), "pending:");
    }

    #[test]
    fn default_unready_is_empty_output() {
        let state = RenderState::new();
        let inputs = Inputs::new();
        let keys = tracked();
        let view = RenderView::new(&state, &inputs, &keys);
        assert!(dispatch(&Defaults, &view).is_empty());
        dispatch(&Blank, &view);
    }

    #[test]
    fn view_exposes_raw_inputs() {
        let state = RenderState::new();
        let inputs = Inputs::new().with_value("label", 3);
        let keys: Vec<String> = Vec::new();
        let view = RenderView::new(&state, &inputs, &keys);
        assert!(view.is_ready());
        assert_eq!(view.inputs().value("label"), Some(&3));
        assert!(view.tracked_keys().is_empty());
    }
}
