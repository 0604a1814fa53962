#![forbid(unsafe_code)]

//! Property tests for template rendering.
//!
//! 1. Source values never inject markup: the only `<` and `>` in the output
//!    belong to the element's own tags.
//! 2. Readiness picks the path: a ready element never carries `aria-busy`.
//! 3. The last emitted value is the one rendered.

use ftui_reactive::testing::ProbeSource;
use ftui_reactive::{HostComponent, Inputs, ReactiveConfig};
use ftui_reactive_widgets::{ElementComponent, ReactiveElement, UnreadyStrategy, elements};
use proptest::prelude::*;
use serde_json::{Value, json};

// ═════════════════════════════════════════════════════════════════════════
// Helpers
// ═════════════════════════════════════════════════════════════════════════

fn stock_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("span"),
        Just("div"),
        Just("label"),
        Just("link"),
        Just("image"),
        Just("progress"),
        Just("time"),
    ]
}

fn mount(name: &str, probe: &ProbeSource<Value>) -> ElementComponent {
    let template = elements::by_name(name, "value")
        .expect("stock template")
        .unready(UnreadyStrategy::Partial);
    let mut inputs = Inputs::new().with_source("value", probe.to_source());
    for extra in template.reactive_keys().into_iter().filter(|k| *k != "value") {
        inputs = inputs.with_value(extra, json!("x"));
    }
    let mut c = ReactiveElement::new(template)
        .expect("valid template")
        .into_component_with_config(inputs, Vec::<(String, _)>::new(), ReactiveConfig::default())
        .expect("valid declaration");
    c.mount().expect("mount");
    c
}

fn tag_brackets(markup: &str) -> usize {
    markup.chars().filter(|c| matches!(c, '<' | '>')).count()
}

// ═════════════════════════════════════════════════════════════════════════
// Properties
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn values_never_inject_markup(name in stock_name(), text in ".{0,40}") {
        let probe = ProbeSource::pending();
        let c = mount(name, &probe);
        probe.emit(json!(text));
        let out = c.render();
        // "<tag ...>" + "</tag>", or "<tag ... />" for void elements.
        let expected = if name == "image" { 2 } else { 4 };
        prop_assert_eq!(tag_brackets(out.as_str()), expected, "{}", out);
    }

    #[test]
    fn ready_output_is_never_busy(name in stock_name(), n in any::<i64>()) {
        let probe = ProbeSource::pending();
        let c = mount(name, &probe);
        prop_assert!(!c.is_ready());
        prop_assert!(c.render().as_str().contains("aria-busy"));

        probe.emit(json!(n));
        prop_assert!(c.is_ready());
        let out = c.render();
        prop_assert!(!out.as_str().contains("aria-busy"));
        prop_assert!(out.as_str().contains(&n.to_string()));
    }

    #[test]
    fn last_emission_wins(values in proptest::collection::vec(0u32..10_000, 1..12)) {
        let probe = ProbeSource::pending();
        let c = mount("span", &probe);
        for v in &values {
            probe.emit(json!(v));
        }
        let last = values.last().copied().unwrap_or_default();
        prop_assert_eq!(c.render().into_string(), format!("<span>{last}</span>"));
    }
}
