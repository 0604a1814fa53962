#![forbid(unsafe_code)]

//! Reactive demo entry point.
//!
//! Attaches a clock element to a [`Host`], ticks a [`Ticker`] fixed source on
//! a fixed interval and prints every frame the host decides to render.
//! Halfway through, the element's label input is replaced to show the input
//! group being rebuilt.

mod cli;

use std::process;
use std::thread;
use std::time::Duration;

use ftui_reactive::{
    Host, Inputs, Observable, ReactiveConfig, ReactiveError, RebuildPolicy, Result, Ticker, batch,
};
use ftui_reactive_widgets::{
    ElementComponent, FieldMapping, ReactiveElement, Template, UnreadyStrategy,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::Opts;

fn main() {
    let opts = Opts::parse();
    init_tracing();
    if let Err(err) = run(&opts) {
        eprintln!("ftui-reactive-demo: {err}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

/// Built-in clock: `<time class="clock" datetime="{time}">{label} {time}</time>`.
fn clock_template() -> Template {
    Template::new("time")
        .static_attr("class", "clock")
        .field(FieldMapping::attr("time", "datetime"))
        .field(FieldMapping::text("label").reactive())
        .field(FieldMapping::text("time"))
        .unready(UnreadyStrategy::Placeholder("--:--".into()))
}

fn load_template(opts: &Opts) -> Result<Template> {
    match &opts.template {
        None => Ok(clock_template()),
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|err| ReactiveError::template(format!("cannot read {path}: {err}")))?;
            Template::from_json(&json)
        }
    }
}

/// Elapsed time for tick `n` as `mm:ss.mmm`.
fn stamp(n: u64, interval_ms: u64) -> Value {
    let ms = (n + 1).saturating_mul(interval_ms);
    json!(format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000))
}

fn build(
    template: Template,
    label: &Observable<Value>,
    ticker: &Ticker<Value>,
    policy: RebuildPolicy,
) -> Result<ElementComponent> {
    ReactiveElement::new(template)?.into_component_with_config(
        Inputs::new().with("label", label.clone()),
        [("time", ticker.to_source())],
        ReactiveConfig::default().with_rebuild_policy(policy),
    )
}

fn run(opts: &Opts) -> Result<()> {
    let started = web_time::Instant::now();
    let interval_ms = opts.interval_ms;
    let ticker = Ticker::new(move |n| stamp(n, interval_ms));
    let label = Observable::new(json!("uptime"));
    let component = build(load_template(opts)?, &label, &ticker, opts.rebuild)?;

    let mut host = Host::attach(component)?;
    if let Some(out) = host.frame() {
        println!("[mount] {out}");
    }

    let halfway = opts.ticks / 2;
    for i in 0..opts.ticks {
        thread::sleep(Duration::from_millis(opts.interval_ms));
        batch(|| {
            ticker.tick();
            label.set_if_changed(json!(if i % 2 == 0 { "uptime" } else { "running" }));
        });
        if i == halfway {
            host.update(Inputs::new().with_value("label", json!("elapsed")))?;
        }
        match host.frame() {
            Some(out) => println!("[tick {i}] {out}"),
            None => tracing::debug!(tick = i, "no state change"),
        }
    }

    let component = host.detach();
    let stats = component.adapter().stats();
    tracing::info!(
        ticks = ticker.ticks(),
        groups_built = stats.groups_built,
        groups_disposed = stats.groups_disposed,
        input_rebuilds = stats.input_rebuilds,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "demo finished"
    );
    debug_assert_eq!(ticker.subscriber_count(), 0);
    debug_assert_eq!(label.subscriber_count(), 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftui_reactive::{HostComponent, Phase};

    #[test]
    fn stamp_formats_elapsed_time() {
        assert_eq!(stamp(0, 200), json!("00:00.200"));
        assert_eq!(stamp(299, 200), json!("01:00.000"));
    }

    #[test]
    fn clock_renders_placeholder_then_time() {
        let ticker = Ticker::new(|n| stamp(n, 1000));
        let label = Observable::new(json!("up"));
        let mut c = build(clock_template(), &label, &ticker, RebuildPolicy::Always).unwrap();
        c.mount().unwrap();
        assert_eq!(
            c.render().as_str(),
            "<time class=\"clock\" aria-busy=\"true\">--:--</time>"
        );

        ticker.tick();
        assert_eq!(
            c.render().as_str(),
            "<time class=\"clock\" datetime=\"00:01.000\">up 00:01.000</time>"
        );
        c.unmount();
        assert_eq!(c.phase(), Phase::Unmounted);
        assert_eq!(ticker.subscriber_count(), 0);
    }

    #[test]
    fn run_completes_without_sleeping() {
        let opts = Opts {
            ticks: 4,
            interval_ms: 0,
            ..Opts::default()
        };
        run(&opts).unwrap();
    }

    #[test]
    fn missing_template_file_is_reported() {
        let opts = Opts {
            template: Some("/nonexistent/clock.json".into()),
            ..Opts::default()
        };
        let err = load_template(&opts).unwrap_err();
        assert!(matches!(err, ReactiveError::Template { .. }));
    }
}
