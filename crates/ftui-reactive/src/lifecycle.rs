#![forbid(unsafe_code)]

//! Lifecycle adapter: owns the consolidated groups of one component.
//!
//! Each component instance has at most two live groups:
//!
//! - the **fixed group**, built once at mount from the sources declared at
//!   construction and disposed once at unmount;
//! - the **input group**, built at mount from the current external inputs at
//!   the declared reactive names, dropped and rebuilt every time new inputs
//!   arrive, and disposed at unmount.
//!
//! # State machine
//!
//! ```text
//!  Pending ──mount──▶ Mounted ──unmount──▶ Unmounted (terminal)
//!     │                 │ ▲
//!     │                 └─┘ receive_inputs
//!     └───────────unmount──────────────────▶ Unmounted
//! ```
//!
//! The adapter always performs its own subscription work first and then runs
//! hooks registered for the event, in registration order. Specializations
//! compose by registering hooks; they cannot skip the base behaviour.
//!
//! # Invariants
//!
//! 1. At most one live group per kind at any time.
//! 2. The old input group is disposed before the new one subscribes.
//! 3. The fixed group is never rebuilt while mounted.
//! 4. After `unmount`, every subscription made by this adapter has been
//!    released exactly once.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::config::{RebuildPolicy, ReactiveConfig};
use crate::consolidate::{Binding, ConsolidatedSubscription, PatchSink};
use crate::error::{ReactiveError, Result};
use crate::inputs::Inputs;
use crate::readiness;
use crate::render::RenderView;
use crate::source::SourceRef;
use crate::state::{Patch, RenderState};

/// Lifecycle phase of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed, not yet attached by the host.
    Pending,
    /// Attached; subscriptions are live.
    Mounted,
    /// Detached for good.
    Unmounted,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Mounted => "mounted",
            Self::Unmounted => "unmounted",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a component tracks: reactive input names and fixed sources.
pub struct Declaration<V> {
    reactive_inputs: Vec<String>,
    fixed_sources: Vec<(String, SourceRef<V>)>,
}

impl<V> Default for Declaration<V> {
    fn default() -> Self {
        Self {
            reactive_inputs: Vec::new(),
            fixed_sources: Vec::new(),
        }
    }
}

impl<V> Clone for Declaration<V> {
    fn clone(&self) -> Self {
        Self {
            reactive_inputs: self.reactive_inputs.clone(),
            fixed_sources: self.fixed_sources.clone(),
        }
    }
}

impl<V> fmt::Debug for Declaration<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("reactive_inputs", &self.reactive_inputs)
            .field(
                "fixed_sources",
                &self.fixed_sources.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<V> Declaration<V> {
    /// Nothing tracked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construction contract: reactive input names plus fixed sources.
    #[must_use]
    pub fn from_parts<N, K>(
        reactive_inputs: impl IntoIterator<Item = N>,
        fixed_sources: impl IntoIterator<Item = (K, SourceRef<V>)>,
    ) -> Self
    where
        N: Into<String>,
        K: Into<String>,
    {
        Self {
            reactive_inputs: reactive_inputs.into_iter().map(Into::into).collect(),
            fixed_sources: fixed_sources
                .into_iter()
                .map(|(k, s)| (k.into(), s))
                .collect(),
        }
    }

    /// Declare an external input whose value may be a reactive source.
    #[must_use]
    pub fn reactive_input(mut self, name: impl Into<String>) -> Self {
        self.reactive_inputs.push(name.into());
        self
    }

    /// Declare a source tracked for the whole mounted lifetime.
    #[must_use]
    pub fn fixed_source(mut self, name: impl Into<String>, source: SourceRef<V>) -> Self {
        self.fixed_sources.push((name.into(), source));
        self
    }

    #[must_use]
    pub fn reactive_inputs(&self) -> &[String] {
        &self.reactive_inputs
    }

    #[must_use]
    pub fn fixed_sources(&self) -> &[(String, SourceRef<V>)] {
        &self.fixed_sources
    }

    /// Reactive input names followed by fixed source names.
    #[must_use]
    pub fn tracked_keys(&self) -> Vec<String> {
        self.reactive_inputs
            .iter()
            .cloned()
            .chain(self.fixed_sources.iter().map(|(k, _)| k.clone()))
            .collect()
    }

    /// Reject a key named twice, within or across groups.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        let names = self
            .reactive_inputs
            .iter()
            .chain(self.fixed_sources.iter().map(|(k, _)| k));
        for name in names {
            if seen.contains(&name.as_str()) {
                return Err(ReactiveError::duplicate(name.as_str()));
            }
            seen.push(name.as_str());
        }
        Ok(())
    }
}

/// Context passed to lifecycle hooks.
///
/// Holds no borrow of render state between calls, so a hook may cause
/// sources to emit without conflicting with the patch sink.
pub struct HookCx<'a, V> {
    phase: Phase,
    state: &'a RefCell<RenderState<V>>,
    inputs: &'a Inputs<V>,
    tracked: &'a [String],
}

impl<V: Clone> HookCx<'_, V> {
    /// Phase after the event was handled.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current external inputs.
    #[must_use]
    pub fn inputs(&self) -> &Inputs<V> {
        self.inputs
    }

    /// Clone of a render-state value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.state.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        readiness::is_ready(&*self.state.borrow(), self.tracked)
    }

    #[must_use]
    pub fn state_version(&self) -> u64 {
        self.state.borrow().version()
    }
}

type Hook<V> = Box<dyn FnMut(&HookCx<'_, V>)>;

/// Lifecycle event a hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Mount,
    Inputs,
    Unmount,
}

struct Hooks<V> {
    mount: Vec<Hook<V>>,
    inputs: Vec<Hook<V>>,
    unmount: Vec<Hook<V>>,
}

impl<V> Default for Hooks<V> {
    fn default() -> Self {
        Self {
            mount: Vec::new(),
            inputs: Vec::new(),
            unmount: Vec::new(),
        }
    }
}

impl<V> Hooks<V> {
    fn slot(&mut self, event: LifecycleEvent) -> &mut Vec<Hook<V>> {
        match event {
            LifecycleEvent::Mount => &mut self.mount,
            LifecycleEvent::Inputs => &mut self.inputs,
            LifecycleEvent::Unmount => &mut self.unmount,
        }
    }
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleStats {
    /// Groups built (fixed and input).
    pub groups_built: u64,
    /// Groups disposed (fixed and input).
    pub groups_disposed: u64,
    /// Input group rebuilds after mount.
    pub input_rebuilds: u64,
    /// Input replacements that kept the live group.
    pub rebuilds_skipped: u64,
}

/// Subscription and state owner for one component instance.
pub struct LifecycleAdapter<V: Clone + 'static> {
    config: ReactiveConfig,
    declaration: Declaration<V>,
    tracked: Vec<String>,
    inputs: Inputs<V>,
    state: Rc<RefCell<RenderState<V>>>,
    fixed_group: Option<ConsolidatedSubscription<V>>,
    input_group: Option<ConsolidatedSubscription<V>>,
    phase: Phase,
    hooks: Hooks<V>,
    stats: LifecycleStats,
}

impl<V: Clone + PartialEq + 'static> LifecycleAdapter<V> {
    /// Create a pending adapter.
    pub fn new(declaration: Declaration<V>, inputs: Inputs<V>, config: ReactiveConfig) -> Result<Self> {
        declaration.validate()?;
        let tracked = declaration.tracked_keys();
        Ok(Self {
            config,
            declaration,
            tracked,
            inputs,
            state: Rc::new(RefCell::new(RenderState::new())),
            fixed_group: None,
            input_group: None,
            phase: Phase::Pending,
            hooks: Hooks::default(),
            stats: LifecycleStats::default(),
        })
    }

    /// Register a hook that runs after the adapter handled `event`.
    pub fn register(&mut self, event: LifecycleEvent, hook: impl FnMut(&HookCx<'_, V>) + 'static) {
        self.hooks.slot(event).push(Box::new(hook));
    }

    /// Attach: build the fixed group and the input group.
    pub fn mount(&mut self) -> Result<()> {
        match self.phase {
            Phase::Pending => {}
            Phase::Mounted => {
                tracing::warn!("mount called on a mounted component");
                return Err(ReactiveError::AlreadyMounted);
            }
            Phase::Unmounted => {
                tracing::warn!("mount called on an unmounted component");
                return Err(ReactiveError::Unmounted);
            }
        }

        let fixed: Vec<(String, Binding<V>)> = self
            .declaration
            .fixed_sources
            .iter()
            .map(|(k, s)| (k.clone(), Binding::Source(s.clone())))
            .collect();
        self.fixed_group = Some(ConsolidatedSubscription::build(fixed, self.sink()));
        self.stats.groups_built += 1;

        let entries = self.input_entries();
        self.input_group = Some(ConsolidatedSubscription::build(entries, self.sink()));
        self.stats.groups_built += 1;

        self.phase = Phase::Mounted;
        tracing::debug!(
            phase = %self.phase,
            tracked = self.tracked.len(),
            ready = self.is_ready(),
            "component mounted"
        );
        self.run_hooks(LifecycleEvent::Mount);
        Ok(())
    }

    /// Replace the external inputs.
    ///
    /// While mounted the input group is dropped and rebuilt (or kept, under
    /// [`RebuildPolicy::SkipUnchanged`] with identical bindings). Before
    /// mount the inputs are only stored.
    pub fn receive_inputs(&mut self, inputs: Inputs<V>) -> Result<()> {
        match self.phase {
            Phase::Pending => {
                self.inputs = inputs;
                return Ok(());
            }
            Phase::Mounted => {}
            Phase::Unmounted => {
                tracing::warn!("inputs received by an unmounted component");
                return Err(ReactiveError::Unmounted);
            }
        }

        self.inputs = inputs;
        let entries = self.input_entries();

        let unchanged = self.config.rebuild_policy == RebuildPolicy::SkipUnchanged
            && self
                .input_group
                .as_ref()
                .is_some_and(|group| group.matches(&entries));

        if unchanged {
            self.stats.rebuilds_skipped += 1;
            tracing::trace!("input bindings unchanged; keeping group");
        } else {
            self.drop_input_group();
            self.input_group = Some(ConsolidatedSubscription::build(entries, self.sink()));
            self.stats.groups_built += 1;
            self.stats.input_rebuilds += 1;
            tracing::debug!(ready = self.is_ready(), "input group rebuilt");
        }

        self.run_hooks(LifecycleEvent::Inputs);
        Ok(())
    }

    /// Detach: dispose both groups. Repeated calls are no-ops.
    pub fn unmount(&mut self) {
        match self.phase {
            Phase::Unmounted => return,
            Phase::Pending => {
                self.phase = Phase::Unmounted;
                tracing::debug!("component unmounted before mount");
                return;
            }
            Phase::Mounted => {}
        }

        self.drop_input_group();
        if let Some(mut group) = self.fixed_group.take() {
            group.dispose();
            self.stats.groups_disposed += 1;
        }
        self.phase = Phase::Unmounted;
        tracing::debug!(phase = %self.phase, "component unmounted");
        self.run_hooks(LifecycleEvent::Unmount);
    }

    fn drop_input_group(&mut self) {
        if let Some(mut group) = self.input_group.take() {
            group.dispose();
            self.stats.groups_disposed += 1;
        }
    }

    fn input_entries(&self) -> Vec<(String, Binding<V>)> {
        self.declaration
            .reactive_inputs
            .iter()
            .map(|k| (k.clone(), Binding::from_input(self.inputs.get(k))))
            .collect()
    }

    fn sink(&self) -> PatchSink<V> {
        let state = Rc::downgrade(&self.state);
        Rc::new(move |patch: Patch<V>| {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().apply_patch(patch);
            }
        })
    }

    fn run_hooks(&mut self, event: LifecycleEvent) {
        let mut hooks = std::mem::take(self.hooks.slot(event));
        if !hooks.is_empty() {
            let cx = HookCx {
                phase: self.phase,
                state: &self.state,
                inputs: &self.inputs,
                tracked: &self.tracked,
            };
            for hook in &mut hooks {
                hook(&cx);
            }
        }
        // Hooks registered while running land after the existing ones.
        let slot = self.hooks.slot(event);
        hooks.append(slot);
        *slot = hooks;
    }
}

impl<V: Clone + 'static> LifecycleAdapter<V> {
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &ReactiveConfig {
        &self.config
    }

    #[must_use]
    pub fn declaration(&self) -> &Declaration<V> {
        &self.declaration
    }

    /// Reactive input names followed by fixed source names.
    #[must_use]
    pub fn tracked_keys(&self) -> &[String] {
        &self.tracked
    }

    #[must_use]
    pub fn inputs(&self) -> &Inputs<V> {
        &self.inputs
    }

    /// Borrow render state. Do not hold the borrow across source emissions.
    #[must_use]
    pub fn state(&self) -> Ref<'_, RenderState<V>> {
        self.state.borrow()
    }

    #[must_use]
    pub fn state_version(&self) -> u64 {
        self.state.borrow().version()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        readiness::is_ready(&*self.state.borrow(), &self.tracked)
    }

    /// Tracked keys that have not received a value yet.
    #[must_use]
    pub fn pending_keys(&self) -> Vec<String> {
        readiness::pending_keys(&*self.state.borrow(), &self.tracked)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> LifecycleStats {
        self.stats
    }

    /// Whether the fixed and input groups are live.
    #[must_use]
    pub fn live_groups(&self) -> (bool, bool) {
        (self.fixed_group.is_some(), self.input_group.is_some())
    }

    /// Run `f` with a read-only render view.
    pub fn with_view<R>(&self, f: impl FnOnce(&RenderView<'_, V>) -> R) -> R {
        let state = self.state.borrow();
        let view = RenderView::new(&state, &self.inputs, &self.tracked);
        f(&view)
    }
}

impl<V: Clone + fmt::Debug + 'static> fmt::Debug for LifecycleAdapter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleAdapter")
            .field("phase", &self.phase)
            .field("tracked", &self.tracked)
            .field("fixed_group", &self.fixed_group)
            .field("input_group", &self.input_group)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::Observable;
    use crate::testing::ProbeSource;
    use std::cell::Cell;

    fn adapter(decl: Declaration<i32>, inputs: Inputs<i32>) -> LifecycleAdapter<i32> {
        LifecycleAdapter::new(decl, inputs, ReactiveConfig::default()).unwrap()
    }

    #[test]
    fn nothing_tracked_is_ready_after_mount() {
        let mut a = adapter(Declaration::new(), Inputs::new());
        a.mount().unwrap();
        assert!(a.is_ready());
        assert_eq!(a.state_version(), 0);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let obs: Observable<i32> = Observable::pending();
        let decl = Declaration::new()
            .reactive_input("time")
            .fixed_source("time", obs.to_source());
        let err = LifecycleAdapter::new(decl, Inputs::new(), ReactiveConfig::default()).unwrap_err();
        assert_eq!(err, ReactiveError::duplicate("time"));
    }

    #[test]
    fn fixed_group_built_once_across_input_changes() {
        let probe = ProbeSource::pending();
        let decl = Declaration::new()
            .reactive_input("value")
            .fixed_source("time", probe.to_source());
        let mut a = adapter(decl, Inputs::new().with_value("value", 1));
        a.mount().unwrap();
        for n in 0..3 {
            a.receive_inputs(Inputs::new().with_value("value", n)).unwrap();
        }
        assert_eq!(probe.subscribes(), 1);
        assert_eq!(probe.outstanding(), 1);
        a.unmount();
        assert_eq!(probe.unsubscribes(), 1);
        assert_eq!(probe.outstanding(), 0);
    }

    #[test]
    fn rebuild_drops_old_source_before_new() {
        let old = ProbeSource::pending();
        let new = ProbeSource::pending();
        let decl = Declaration::new().reactive_input("value");
        let mut a = adapter(decl, Inputs::new().with_source("value", old.to_source()));
        a.mount().unwrap();
        a.receive_inputs(Inputs::new().with_source("value", new.to_source()))
            .unwrap();

        assert_eq!(old.outstanding(), 0);
        assert_eq!(new.outstanding(), 1);

        let before = a.state_version();
        old.emit_to_all_ever(99);
        assert_eq!(a.state_version(), before);
        assert!(a.state().get("value").is_none());
    }

    #[test]
    fn rebinding_to_unresolved_source_unsets_key() {
        let resolved = Observable::new(5);
        let decl = Declaration::new().reactive_input("value");
        let mut a = adapter(decl, Inputs::new().with("value", resolved));
        a.mount().unwrap();
        assert_eq!(a.state().get("value"), Some(&5));

        a.receive_inputs(Inputs::new().with("value", Observable::pending()))
            .unwrap();
        assert!(a.state().get("value").is_none());
        assert!(!a.is_ready());
    }

    #[test]
    fn inputs_before_mount_are_stored_only() {
        let probe = ProbeSource::resolved(3);
        let decl = Declaration::new().reactive_input("value");
        let mut a = adapter(decl, Inputs::new());
        a.receive_inputs(Inputs::new().with_source("value", probe.to_source()))
            .unwrap();
        assert_eq!(probe.subscribes(), 0);
        a.mount().unwrap();
        assert_eq!(probe.subscribes(), 1);
        assert_eq!(a.state().get("value"), Some(&3));
    }

    #[test]
    fn lifecycle_misuse_is_reported() {
        let mut a = adapter(Declaration::new(), Inputs::new());
        a.mount().unwrap();
        assert_eq!(a.mount(), Err(ReactiveError::AlreadyMounted));
        a.unmount();
        a.unmount();
        assert_eq!(a.phase(), Phase::Unmounted);
        assert_eq!(a.mount(), Err(ReactiveError::Unmounted));
        assert_eq!(
            a.receive_inputs(Inputs::new()),
            Err(ReactiveError::Unmounted)
        );
    }

    #[test]
    fn unmount_before_mount_is_terminal() {
        let mut a = adapter(Declaration::new(), Inputs::new());
        a.unmount();
        assert_eq!(a.phase(), Phase::Unmounted);
        assert_eq!(a.stats().groups_built, 0);
    }

    #[test]
    fn hooks_run_after_base_behaviour() {
        let obs = Observable::new(4);
        let decl = Declaration::new().fixed_source("n", obs.to_source());
        let mut a = adapter(decl, Inputs::new());

        let seen = Rc::new(RefCell::new(Vec::new()));
        for event in [LifecycleEvent::Mount, LifecycleEvent::Inputs, LifecycleEvent::Unmount] {
            let seen = Rc::clone(&seen);
            a.register(event, move |cx| {
                seen.borrow_mut().push((cx.phase(), cx.get("n"), cx.is_ready()));
            });
        }

        a.mount().unwrap();
        a.receive_inputs(Inputs::new()).unwrap();
        a.unmount();

        assert_eq!(
            *seen.borrow(),
            vec![
                (Phase::Mounted, Some(4), true),
                (Phase::Mounted, Some(4), true),
                (Phase::Unmounted, Some(4), true),
            ]
        );
    }

    #[test]
    fn hook_may_drive_a_source() {
        let obs = Observable::pending();
        let decl = Declaration::new().fixed_source("n", obs.to_source());
        let mut a = adapter(decl, Inputs::new());
        let driver = obs.clone();
        a.register(LifecycleEvent::Mount, move |_| driver.set(8));
        a.mount().unwrap();
        assert_eq!(a.state().get("n"), Some(&8));
    }

    #[test]
    fn hooks_keep_registration_order() {
        let mut a = adapter(Declaration::new(), Inputs::new());
        let order = Rc::new(RefCell::new(Vec::new()));
        for id in 0..3 {
            let order = Rc::clone(&order);
            a.register(LifecycleEvent::Mount, move |_| order.borrow_mut().push(id));
        }
        a.mount().unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn skip_unchanged_keeps_group_for_same_source() {
        let probe = ProbeSource::resolved(1);
        let source = probe.to_source();
        let decl = Declaration::new().reactive_input("value");
        let config = ReactiveConfig::default().with_rebuild_policy(RebuildPolicy::SkipUnchanged);
        let mut a = LifecycleAdapter::new(
            decl,
            Inputs::new().with_source("value", source.clone()),
            config,
        )
        .unwrap();
        a.mount().unwrap();
        let version = a.state_version();
        a.receive_inputs(Inputs::new().with_source("value", source)).unwrap();

        assert_eq!(probe.subscribes(), 1);
        assert_eq!(a.stats().rebuilds_skipped, 1);
        assert_eq!(a.state_version(), version);
    }

    #[test]
    fn always_policy_rebuilds_for_same_source() {
        let probe = ProbeSource::resolved(1);
        let source = probe.to_source();
        let decl = Declaration::new().reactive_input("value");
        let mut a = adapter(decl, Inputs::new().with_source("value", source.clone()));
        a.mount().unwrap();
        a.receive_inputs(Inputs::new().with_source("value", source)).unwrap();

        assert_eq!(probe.subscribes(), 2);
        assert_eq!(probe.unsubscribes(), 1);
        assert_eq!(probe.outstanding(), 1);
        assert_eq!(a.stats().input_rebuilds, 1);
    }

    #[test]
    fn dropping_mounted_adapter_releases_subscriptions() {
        let probe = ProbeSource::pending();
        let decl = Declaration::new().fixed_source("t", probe.to_source());
        {
            let mut a = adapter(decl, Inputs::new());
            a.mount().unwrap();
            assert_eq!(probe.outstanding(), 1);
        }
        assert_eq!(probe.outstanding(), 0);
        assert_eq!(probe.double_unsubscribes(), 0);
    }

    #[test]
    fn stats_balance_after_unmount() {
        let obs = Observable::pending();
        let decl = Declaration::new()
            .reactive_input("value")
            .fixed_source("t", obs.to_source());
        let mut a = adapter(decl, Inputs::new());
        a.mount().unwrap();
        a.receive_inputs(Inputs::new()).unwrap();
        a.receive_inputs(Inputs::new()).unwrap();
        a.unmount();
        let stats = a.stats();
        assert_eq!(stats.groups_built, 4);
        assert_eq!(stats.groups_disposed, 4);
        assert_eq!(a.live_groups(), (false, false));
    }

    #[test]
    fn with_view_reads_state_and_inputs() {
        let decl = Declaration::new().reactive_input("value");
        let mut a = adapter(decl, Inputs::new().with_value("value", 2).with_value("x", 9));
        a.mount().unwrap();
        let calls = Cell::new(0);
        let (v, x, ready) = a.with_view(|view| {
            calls.set(calls.get() + 1);
            (view.get("value").copied(), view.inputs().value("x").copied(), view.is_ready())
        });
        assert_eq!((v, x, ready), (Some(2), Some(9), true));
        assert_eq!(calls.get(), 1);
    }
}
