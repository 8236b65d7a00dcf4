//! Run command handler
//!
//! Runs every configured scenario against one fixture, in id order, with a
//! shared store and a status panel subscribed to it.

use healprobe::{
    fixed_clock, Dom, FileSpec, FixturePage, HealConfig, LogNotifier, Resolver, ScenarioId, ScenarioOutcome,
    StatusPanel, UploadFlow, UploadStore,
};
use tracing::debug;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use crate::RunArgs;

/// Result of one scenario, as reported to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioLine {
    /// Scenario id
    pub id: ScenarioId,
    /// Scenario title
    pub title: String,
    /// Whether files were published
    pub published: bool,
    /// Published file count, or the failure and best-guess locator
    pub detail: String,
}

/// Outcome of a full run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// One line per scenario, in id order
    pub lines: Vec<ScenarioLine>,
    /// Final panel rendering
    pub panel: String,
}

impl RunSummary {
    /// Scenarios that published
    #[must_use]
    pub fn published(&self) -> usize {
        self.lines.iter().filter(|l| l.published).count()
    }

    /// Scenarios that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.lines.len() - self.published()
    }
}

/// Run every scenario in `config` against `dom`
pub fn run_scenarios(dom: &mut Dom, config: &HealConfig) -> CliResult<RunSummary> {
    let registry = config.registry()?;
    let clock = fixed_clock(config.clock_options()?.time_ms);
    let mut store = UploadStore::new(config.scenario_ids(), clock.clone());
    let panel = StatusPanel::attach(&mut store, registry.clone());
    let mut flow = UploadFlow::new(Resolver::with_options(config.resolver.clone()), LogNotifier);

    let mut lines = Vec::with_capacity(registry.len());
    for scenario in registry.iter() {
        debug!(scenario = %scenario.id, target = %scenario.target, "running scenario");
        let files = scenario.files.iter().map(FileSpec::to_input).collect();
        let outcome = flow.run(&mut store, dom, &clock, scenario, files, |_, _| {});
        let (published, detail) = match outcome {
            ScenarioOutcome::Published { files, .. } => (true, format!("{} file(s) published", files.len())),
            ScenarioOutcome::Failed { error, best_guess } => (false, format!("{error} (best guess: {best_guess})")),
        };
        lines.push(ScenarioLine {
            id: scenario.id,
            title: scenario.title.clone(),
            published,
            detail,
        });
    }

    Ok(RunSummary {
        lines,
        panel: panel.text(),
    })
}

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let heal_config = HealConfig::load(&args.config)?;
    let mut dom = FixturePage::load(&args.fixture)?.build()?;

    reporter.header("Scenarios");
    let summary = run_scenarios(&mut dom, &heal_config)?;
    for line in &summary.lines {
        let message = format!("[{}] {}: {}", line.id, line.title, line.detail);
        if line.published {
            reporter.success(&message);
        } else {
            reporter.failure(&message);
        }
    }
    reporter.summary(summary.published(), summary.failed());

    println!("{}", summary.panel);

    if args.strict && summary.failed() > 0 {
        return Err(CliError::scenario_failed(format!(
            "{} of {} scenario(s) failed",
            summary.failed(),
            summary.lines.len()
        )));
    }
    Ok(())
}
