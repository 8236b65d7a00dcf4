//! Resolve command handler

use healprobe::{fixed_clock, Dom, FixturePage, NodeId, Resolution, ResolveEvent, Resolver, ResolverOptions};

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;
use crate::ResolveArgs;

/// Resolver options from defaults plus command-line overrides
#[must_use]
pub fn options_from_args(args: &ResolveArgs) -> ResolverOptions {
    let mut options = ResolverOptions::new();
    if let Some(max_attempts) = args.max_attempts {
        options = options.with_max_attempts(max_attempts);
    }
    if let Some(interval) = args.retry_interval {
        options = options.with_retry_interval(interval);
    }
    options
}

/// Drive a resolution to completion on a virtual clock starting at zero
pub fn resolve(dom: &mut Dom, args: &ResolveArgs) -> (Resolution, CliResult<NodeId>) {
    let clock = fixed_clock(0);
    let mut resolution = Resolver::with_options(options_from_args(args)).resolution(&args.id, &args.containers);
    let result = resolution.drive(dom, &clock, |_, _| {}).map_err(Into::into);
    (resolution, result)
}

/// One line per trace event
#[must_use]
pub fn describe_event(dom: &Dom, event: &ResolveEvent) -> String {
    match event {
        ResolveEvent::AttemptStarted { attempt, at_ms } => format!("t={at_ms}ms attempt {attempt}"),
        ResolveEvent::Inaccessible { container } => format!("inaccessible {container}"),
        ResolveEvent::Found { node, via, at_ms } => {
            format!("t={at_ms}ms found {} via {via:?}", dom.describe(*node))
        }
        ResolveEvent::Detached { node, at_ms } => format!("t={at_ms}ms detached {node}"),
        ResolveEvent::Activated { node, at_ms } => {
            format!("t={at_ms}ms activated {}", dom.describe(*node))
        }
        ResolveEvent::Rejected { attempts, at_ms } => {
            format!("t={at_ms}ms rejected after {attempts} attempt(s)")
        }
    }
}

/// Execute the resolve command
pub fn execute_resolve(config: &CliConfig, args: &ResolveArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let mut dom = FixturePage::load(&args.fixture)?.build()?;

    let (resolution, result) = resolve(&mut dom, args);
    if args.trace || config.verbosity.is_verbose() {
        for event in resolution.events() {
            reporter.info(&describe_event(&dom, event));
        }
    }
    for container in resolution.inaccessible() {
        reporter.warning(&format!("{container} is cross-origin"));
    }

    let node = result?;
    reporter.success(&format!(
        "resolved '{}' after {} attempt(s)",
        resolution.identifier(),
        resolution.attempts()
    ));
    println!("{}", dom.describe(node));
    Ok(())
}
