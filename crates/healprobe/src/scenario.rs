//! Scenarios and the upload flow.
//!
//! A [`Scenario`] describes one upload control: where it lives, how to find
//! it, and whether its uploads carry a locator. The [`ScenarioRegistry`] is
//! built once at setup and passed to whoever needs to look scenarios up.
//! [`UploadFlow`] is the `change` handler plus the resolve-then-publish path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::augment::augment;
use crate::clock::FakeClock;
use crate::dom::{Dom, NodeId};
use crate::files::{FileChooser, FileInput, UploadedFile};
use crate::locator::{BoundaryDescriptor, LocatorExpr};
use crate::resolver::{CandidateContainer, Resolver};
use crate::result::{HealError, HealResult};
use crate::store::{ScenarioId, UploadStore};

/// A file a scenario selects when run from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// File name
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

impl FileSpec {
    /// Convert to a selectable file
    #[must_use]
    pub fn to_input(&self) -> FileInput {
        FileInput::sized(self.name.clone(), self.size)
    }
}

/// One upload control under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Store key
    pub id: ScenarioId,
    /// Human-readable title
    pub title: String,
    /// Identifier of the file control
    pub target: String,
    /// Containers the control may appear in
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<CandidateContainer>,
    /// Whether uploads carry a positioned locator
    #[serde(default)]
    pub synthesize_locator: bool,
    /// Boundary descriptor for the locator's innermost boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryDescriptor>,
    /// Files selected when the scenario is run from configuration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileSpec>,
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: ScenarioId(id),
            title: title.into(),
            target: target.into(),
            containers: Vec::new(),
            synthesize_locator: false,
            boundary: None,
            files: Vec::new(),
        }
    }

    /// Add a candidate container
    #[must_use]
    pub fn with_container(mut self, container: CandidateContainer) -> Self {
        self.containers.push(container);
        self
    }

    /// Attach locators to uploads
    #[must_use]
    pub const fn with_locator(mut self, synthesize: bool) -> Self {
        self.synthesize_locator = synthesize;
        self
    }

    /// Set the boundary descriptor
    #[must_use]
    pub fn with_boundary(mut self, boundary: BoundaryDescriptor) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Add a file to select
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, size: u64) -> Self {
        self.files.push(FileSpec {
            name: name.into(),
            size,
        });
        self
    }

    /// Locator to report when the control was never found
    #[must_use]
    pub fn best_guess_locator(&self) -> String {
        LocatorExpr::Id(self.target.clone()).xpath()
    }
}

/// Scenarios by id, built once at setup
#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    scenarios: BTreeMap<ScenarioId, Scenario>,
}

impl ScenarioRegistry {
    /// Build a registry
    ///
    /// # Errors
    ///
    /// Returns a configuration error on duplicate ids
    pub fn new(scenarios: impl IntoIterator<Item = Scenario>) -> HealResult<Self> {
        let mut map = BTreeMap::new();
        for scenario in scenarios {
            let id = scenario.id;
            if map.insert(id, scenario).is_some() {
                return Err(HealError::config(format!("duplicate scenario id {id}")));
            }
        }
        Ok(Self { scenarios: map })
    }

    /// Scenario by id
    #[must_use]
    pub fn get(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(&id)
    }

    /// Title of a scenario, falling back to `Scenario <id>`
    #[must_use]
    pub fn title(&self, id: ScenarioId) -> String {
        self.get(id)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| format!("Scenario {id}"))
    }

    /// Scenarios in id order
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    /// Number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Surfaces failures to the person running the fixture
pub trait UserNotifier {
    /// Show a blocking message
    fn alert(&mut self, message: &str);
}

/// Keeps alerts for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Vec<String>,
}

impl RecordingNotifier {
    /// Create an empty notifier
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts raised so far
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl UserNotifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Sends alerts to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn alert(&mut self, message: &str) {
        warn!(alert = %message, "user alert");
    }
}

/// Result of running one scenario
#[derive(Debug)]
pub enum ScenarioOutcome {
    /// Control found, files published to the store
    Published {
        /// The file control
        element: NodeId,
        /// Files recorded
        files: Vec<UploadedFile>,
    },
    /// Control never found; the store was not touched
    Failed {
        /// Resolution error
        error: HealError,
        /// Locator logged in place of a real one
        best_guess: String,
    },
}

impl ScenarioOutcome {
    /// Whether files were published
    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Upload handling for scenarios
#[derive(Debug, Clone, Default)]
pub struct UploadFlow<N> {
    resolver: Resolver,
    notifier: N,
}

impl<N: UserNotifier> UploadFlow<N> {
    /// Create a flow
    #[must_use]
    pub const fn new(resolver: Resolver, notifier: N) -> Self {
        Self { resolver, notifier }
    }

    /// The notifier, for inspecting recorded alerts
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// `change` handler: apply the control's selection rules, attach the
    /// positioned locator when the scenario asks for one, and publish.
    pub fn on_files_selected(
        &mut self,
        store: &mut UploadStore,
        dom: &Dom,
        scenario: &Scenario,
        element: NodeId,
        files: Vec<FileInput>,
    ) -> Vec<UploadedFile> {
        let chooser = dom
            .element(element)
            .map(FileChooser::for_element)
            .unwrap_or_default();
        let selected = chooser.select(files);

        let locator = if scenario.synthesize_locator {
            let context = dom.scope_of(element).unwrap_or_else(|| dom.document());
            augment(dom, Some(element), context, scenario.boundary.as_ref()).rendered()
        } else {
            String::new()
        };

        let uploaded: Vec<UploadedFile> = selected
            .iter()
            .map(|f| UploadedFile::from_input(f).with_locator(locator.clone()))
            .collect();
        store.update_status(scenario.id, uploaded.clone());
        uploaded
    }

    /// Resolve the scenario's control, activate it, and publish `files`.
    ///
    /// A failure alerts the user and logs a best-guess locator; the store
    /// and its other subscribers are left alone.
    pub fn run<F>(
        &mut self,
        store: &mut UploadStore,
        dom: &mut Dom,
        clock: &FakeClock,
        scenario: &Scenario,
        files: Vec<FileInput>,
        on_tick: F,
    ) -> ScenarioOutcome
    where
        F: FnMut(&mut Dom, u64),
    {
        match self
            .resolver
            .find_and_activate(dom, clock, &scenario.target, &scenario.containers, on_tick)
        {
            Ok(element) => {
                let files = self.on_files_selected(store, dom, scenario, element, files);
                ScenarioOutcome::Published { element, files }
            }
            Err(error) => {
                let best_guess = scenario.best_guess_locator();
                self.notifier
                    .alert(&format!("{}: {error}", scenario.title));
                warn!(
                    scenario = %scenario.id,
                    best_guess = %best_guess,
                    "upload control not found"
                );
                ScenarioOutcome::Failed { error, best_guess }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::fixed_clock;
    use crate::dom::Position;
    use crate::resolver::ResolverOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn page() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let html = dom.create_element("html");
        let body = dom.create_element("body");
        dom.append_child(dom.document(), html).unwrap();
        dom.append_child(html, body).unwrap();
        (dom, body)
    }

    fn file_input(dom: &mut Dom, parent: NodeId, id: &str) -> NodeId {
        let input = dom.create_element("input");
        dom.set_attribute(input, "type", "file").unwrap();
        dom.set_attribute(input, "id", id).unwrap();
        dom.append_child(parent, input).unwrap();
        input
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_duplicate_ids_rejected() {
            let result = ScenarioRegistry::new([Scenario::new(1, "a", "x"), Scenario::new(1, "b", "y")]);
            assert!(matches!(result, Err(HealError::Config { .. })));
        }

        #[test]
        fn test_title_fallback() {
            let registry = ScenarioRegistry::new([Scenario::new(2, "Shadow upload", "x")]).unwrap();
            assert_eq!(registry.title(ScenarioId(2)), "Shadow upload");
            assert_eq!(registry.title(ScenarioId(9)), "Scenario 9");
            assert_eq!(registry.len(), 1);
        }

        #[test]
        fn test_scenario_yaml_shape() {
            let yaml = r##"
id: 3
title: Nested frame
target: iframe-input-3
containers:
  - { id: frame-3, kind: frame }
synthesize_locator: true
boundary: { kind: frame, selector: "#frame-3" }
files:
  - { name: a.png, size: 1024 }
"##;
            let scenario: Scenario = serde_yaml_ng::from_str(yaml).unwrap();
            assert_eq!(scenario.id, ScenarioId(3));
            assert_eq!(scenario.containers, vec![CandidateContainer::frame("frame-3")]);
            assert_eq!(scenario.boundary, Some(BoundaryDescriptor::iframe("#frame-3")));
            assert_eq!(scenario.files[0].to_input().mime_type, "image/png");
        }

        #[test]
        fn test_best_guess_locator() {
            assert_eq!(Scenario::new(1, "t", "shadow-input-1").best_guess_locator(), r#"//*[@id="shadow-input-1"]"#);
        }
    }

    mod flow_tests {
        use super::*;

        #[test]
        fn test_selection_publishes_with_locator() {
            let (mut dom, body) = page();
            let input = file_input(&mut dom, body, "upload-1");
            dom.set_offset(input, Position::new(40, 12)).unwrap();
            let mut store = UploadStore::new(1..=3, fixed_clock(5_000));
            let scenario = Scenario::new(1, "Basic", "upload-1").with_locator(true);
            let mut flow = UploadFlow::new(Resolver::new(), RecordingNotifier::new());

            let files = flow.on_files_selected(&mut store, &dom, &scenario, input, vec![FileInput::sized("a.png", 1024)]);

            assert_eq!(files.len(), 1);
            let record = store.status(ScenarioId(1)).unwrap();
            assert!(record.uploaded);
            assert_eq!(
                record.files[0].locator.as_deref(),
                Some(r#"XPath: //*[@id="upload-1"] [position: top=40px, left=12px]"#)
            );
        }

        #[test]
        fn test_selection_without_locator() {
            let (mut dom, body) = page();
            let input = file_input(&mut dom, body, "plain");
            let mut store = UploadStore::new(1..=1, fixed_clock(0));
            let scenario = Scenario::new(1, "Plain", "plain");
            let mut flow = UploadFlow::new(Resolver::new(), LogNotifier);

            flow.on_files_selected(&mut store, &dom, &scenario, input, vec![FileInput::sized("a.txt", 3)]);
            assert_eq!(store.status(ScenarioId(1)).unwrap().files[0].locator, None);
        }

        #[test]
        fn test_run_resolves_shadow_control_and_publishes() {
            let (mut dom, body) = page();
            let host = dom.create_element("div");
            dom.set_attribute(host, "id", "host-1").unwrap();
            dom.append_child(body, host).unwrap();
            let root = dom.attach_shadow(host).unwrap();
            let clock = fixed_clock(0);
            let mut store = UploadStore::new(1..=2, Arc::clone(&clock));
            let scenario = Scenario::new(2, "Shadow", "shadow-input-2")
                .with_container(CandidateContainer::shadow_host("host-1"))
                .with_locator(true)
                .with_boundary(BoundaryDescriptor::shadow_host("#host-1"));
            let mut flow = UploadFlow::new(Resolver::new(), RecordingNotifier::new());

            let outcome = flow.run(
                &mut store,
                &mut dom,
                &clock,
                &scenario,
                vec![FileInput::sized("doc.pdf", 2048)],
                |dom, now| {
                    if now == 1_000 {
                        let input = dom.create_element("input");
                        dom.set_attribute(input, "type", "file").unwrap();
                        dom.set_attribute(input, "id", "shadow-input-2").unwrap();
                        dom.append_child(root, input).unwrap();
                    }
                },
            );

            assert!(outcome.is_published());
            let record = store.status(ScenarioId(2)).unwrap();
            let locator = record.files[0].locator.clone().unwrap();
            assert!(locator.starts_with("JavaScript: document.querySelector(\"#host-1\").shadowRoot"));
            assert_eq!(store.most_recent(), Some(ScenarioId(2)));
        }

        #[test]
        fn test_run_failure_alerts_and_leaves_store_alone() {
            let (mut dom, _) = page();
            let clock = fixed_clock(0);
            let mut store = UploadStore::new(1..=2, Arc::clone(&clock));
            store.update_status(ScenarioId(1), vec![UploadedFile::new("keep.txt", 1)]);
            let scenario = Scenario::new(2, "Missing", "nowhere");
            let resolver = Resolver::with_options(ResolverOptions::new().with_max_attempts(2));
            let mut flow = UploadFlow::new(resolver, RecordingNotifier::new());
            let notified = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&notified);
            store.subscribe(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

            let outcome = flow.run(&mut store, &mut dom, &clock, &scenario, vec![FileInput::sized("a", 1)], |_, _| {});

            match outcome {
                ScenarioOutcome::Failed { error, best_guess } => {
                    assert!(error.is_not_found());
                    assert_eq!(best_guess, r#"//*[@id="nowhere"]"#);
                }
                ScenarioOutcome::Published { .. } => panic!("expected failure"),
            }
            assert_eq!(
                flow.notifier().messages(),
                &["Missing: Element 'nowhere' not found after 2 attempts".to_string()]
            );
            assert!(store.status(ScenarioId(1)).unwrap().uploaded);
            let missing = store.status(ScenarioId(2)).unwrap();
            assert!(!missing.uploaded);
            assert!(missing.files.is_empty());
            assert_eq!(store.most_recent(), Some(ScenarioId(1)));
            assert_eq!(notified.load(Ordering::SeqCst), 0);
        }
    }
}
