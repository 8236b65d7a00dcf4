//! Locate command handler

use healprobe::{augment, BoundaryDescriptor, Dom, FixturePage, LocatorKind, Position, ScopeKind};
use serde::Serialize;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Reporter};
use crate::LocateArgs;

/// Everything `locate` reports about one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocateReport {
    /// Fixture key
    pub key: String,
    /// Locator strategy
    pub kind: LocatorKind,
    /// Expression, boundary-qualified when nested
    pub expression: String,
    /// `XPath` or `JavaScript`
    pub form: &'static str,
    /// Whether an encapsulation boundary separates the node from the document
    pub crosses_boundary: bool,
    /// Scope the locator is rooted in
    pub rooted_in: Option<ScopeKind>,
    /// Rendered offset
    pub position: Position,
    /// Operator-facing rendering
    pub rendered: String,
}

/// Boundary descriptor for `selector`, typed by the scope the node lives in.
/// Top-level nodes have no boundary.
#[must_use]
pub fn boundary_for(dom: &Dom, node: healprobe::NodeId, selector: &str) -> Option<BoundaryDescriptor> {
    let scope = dom.scope_of(node)?;
    match dom.scope_kind(scope)? {
        ScopeKind::ShadowRoot => Some(BoundaryDescriptor::shadow_host(selector)),
        ScopeKind::FrameDocument => Some(BoundaryDescriptor::iframe(selector)),
        ScopeKind::Document => None,
    }
}

/// Locate the node bound to `key`
pub fn locate(dom: &Dom, key: &str, boundary: Option<&str>) -> CliResult<LocateReport> {
    let node = dom
        .by_key(key)
        .ok_or_else(|| CliError::not_found(format!("no fixture node with key '{key}'")))?;
    let context = dom.scope_of(node).unwrap_or_else(|| dom.document());
    let descriptor = boundary.and_then(|selector| boundary_for(dom, node, selector));

    let positioned = augment(dom, Some(node), context, descriptor.as_ref());
    let locator = positioned.locator();
    let kind = locator
        .kind()
        .ok_or_else(|| CliError::not_found(format!("no locator for key '{key}'")))?;

    Ok(LocateReport {
        key: key.to_string(),
        kind,
        expression: locator.expression(),
        form: positioned.form().label(),
        crosses_boundary: locator.crosses_boundary(),
        rooted_in: locator.rooted_in(),
        position: positioned.position(),
        rendered: positioned.rendered(),
    })
}

/// Render a report for stdout
pub fn render_report(report: &LocateReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(report.rendered.clone()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Execute the locate command
pub fn execute_locate(config: &CliConfig, args: &LocateArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let dom = FixturePage::load(&args.fixture)?.build()?;
    let report = locate(&dom, &args.key, args.boundary.as_deref())?;

    if args.boundary.is_some() && !report.crosses_boundary {
        reporter.warning("--boundary ignored: node is in the top-level document");
    }
    if config.verbosity.is_verbose() {
        reporter.info(&format!("{} locator: {}", report.kind, report.expression));
    }
    println!("{}", render_report(&report, args.format.into())?);
    Ok(())
}
