//! Resilient element resolution.
//!
//! Elements in fixtures attach late: frame documents are written by script,
//! shadow roots are populated after a delay. A single lookup is not enough,
//! so resolution is a bounded polling loop modelled as an explicit state
//! machine ([`Resolution`]) and driven by the virtual clock.
//!
//! Each attempt searches, in order:
//!
//! 1. the top-level document, by id
//! 2. every candidate container, by id
//! 3. every candidate container, among controls of the expected type, by id or name
//! 4. a container holding exactly one such control, when the identifier
//!    carries a known fallback prefix
//!
//! After the last attempt one extra pass matches controls whose id merely
//! contains the identifier with its prefix stripped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::FakeClock;
use crate::dom::{Dom, Element, NodeId};
use crate::result::{HealError, HealResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default number of search passes
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay between passes in milliseconds
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;

/// Default delay between scroll and activation in milliseconds
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Identifier prefixes that allow the sole-control fallback
pub const DEFAULT_FALLBACK_PREFIXES: [&str; 4] = ["shadow-", "iframe-", "nested-", "slot-"];

// =============================================================================
// OPTIONS
// =============================================================================

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Same interval every time
    #[default]
    Fixed,
    /// Interval multiplied by `factor` after each attempt, capped
    Exponential {
        /// Growth factor
        factor: f64,
        /// Upper bound in milliseconds
        max_interval_ms: u64,
    },
}

/// Control type a resolution expects to activate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedControl {
    /// Tag name
    pub tag: String,
    /// Required `type` attribute, compared ASCII case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
}

impl ExpectedControl {
    /// `<input type="file">`
    #[must_use]
    pub fn file_input() -> Self {
        Self {
            tag: "input".to_string(),
            input_type: Some("file".to_string()),
        }
    }

    /// Whether an element is a control of this type
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        element.tag() == self.tag
            && self.input_type.as_deref().map_or(true, |t| {
                element
                    .attribute("type")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case(t))
            })
    }
}

impl Default for ExpectedControl {
    fn default() -> Self {
        Self::file_input()
    }
}

impl fmt::Display for ExpectedControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.input_type {
            Some(t) => write!(f, "{}[type={t}]", self.tag),
            None => f.write_str(&self.tag),
        }
    }
}

/// Options for a resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Number of search passes before the final partial-token pass
    pub max_attempts: u32,
    /// Delay after the first failed pass in milliseconds
    pub retry_interval_ms: u64,
    /// Delay between scroll-into-view and activation in milliseconds
    pub settle_delay_ms: u64,
    /// Delay growth
    pub backoff: Backoff,
    /// Prefixes that allow the sole-control fallback and are stripped for
    /// the partial-token pass
    pub fallback_prefixes: Vec<String>,
    /// Control type to look for inside containers
    pub control: ExpectedControl,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            backoff: Backoff::Fixed,
            fallback_prefixes: DEFAULT_FALLBACK_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            control: ExpectedControl::default(),
        }
    }
}

impl ResolverOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the retry interval in milliseconds
    #[must_use]
    pub const fn with_retry_interval(mut self, retry_interval_ms: u64) -> Self {
        self.retry_interval_ms = retry_interval_ms;
        self
    }

    /// Set the settle delay in milliseconds
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay_ms: u64) -> Self {
        self.settle_delay_ms = settle_delay_ms;
        self
    }

    /// Set the backoff policy
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the expected control type
    #[must_use]
    pub fn with_control(mut self, control: ExpectedControl) -> Self {
        self.control = control;
        self
    }

    /// Replace the fallback prefixes
    #[must_use]
    pub fn with_fallback_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Retry interval as a Duration
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Delay before attempt `attempt + 1`, `attempt` being 1-based
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> u64 {
        match self.backoff {
            Backoff::Fixed => self.retry_interval_ms,
            Backoff::Exponential {
                factor,
                max_interval_ms,
            } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let scaled = self.retry_interval_ms as f64 * factor.max(1.0).powi(exponent);
                if scaled >= max_interval_ms as f64 {
                    max_interval_ms
                } else {
                    scaled.round() as u64
                }
            }
        }
    }

    /// Identifier with the first matching fallback prefix removed
    #[must_use]
    pub fn partial_token<'a>(&self, identifier: &'a str) -> &'a str {
        self.fallback_prefixes
            .iter()
            .find_map(|p| identifier.strip_prefix(p.as_str()))
            .unwrap_or(identifier)
    }

    fn has_fallback_prefix(&self, identifier: &str) -> bool {
        self.fallback_prefixes.iter().any(|p| identifier.starts_with(p.as_str()))
    }
}

// =============================================================================
// CONTAINERS
// =============================================================================

/// How a candidate container is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Search the shadow root of the host
    ShadowHost,
    /// Search the content document of the iframe
    Frame,
    /// Search the light-DOM subtree under the element
    Subtree,
}

/// A container the target may appear in, looked up by id on every attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateContainer {
    /// Id of the host, iframe, or subtree root in the top-level document
    pub id: String,
    /// How to enter it
    pub kind: ContainerKind,
}

impl CandidateContainer {
    /// Shadow host container
    #[must_use]
    pub fn shadow_host(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ContainerKind::ShadowHost,
        }
    }

    /// Iframe container
    #[must_use]
    pub fn frame(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ContainerKind::Frame,
        }
    }

    /// Light-DOM subtree container
    #[must_use]
    pub fn subtree(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ContainerKind::Subtree,
        }
    }
}

impl fmt::Display for CandidateContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ContainerKind::ShadowHost => "shadow",
            ContainerKind::Frame => "frame",
            ContainerKind::Subtree => "subtree",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

impl FromStr for CandidateContainer {
    type Err = HealError;

    /// Parse `shadow:<id>`, `frame:<id>` or `subtree:<id>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| HealError::config(format!("container '{s}' is not <kind>:<id>")))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(HealError::config(format!("container '{s}' has an empty id")));
        }
        match kind.trim() {
            "shadow" => Ok(Self::shadow_host(id)),
            "frame" | "iframe" => Ok(Self::frame(id)),
            "subtree" => Ok(Self::subtree(id)),
            other => Err(HealError::config(format!("unknown container kind '{other}'"))),
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Which search step found the element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoundVia {
    /// Id lookup in the top-level document
    Document,
    /// Id lookup inside a container
    ContainerId,
    /// Id or name match among the container's controls
    ContainerControl,
    /// The container's only control, prefix heuristic
    SoleControl,
    /// Partial-token match after the last attempt
    PartialToken,
}

/// One transition of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolveEvent {
    /// A search pass began
    AttemptStarted {
        /// 1-based attempt number
        attempt: u32,
        /// Virtual time
        at_ms: u64,
    },
    /// A container could not be entered
    Inaccessible {
        /// Container description
        container: String,
    },
    /// Target found and scrolled into view
    Found {
        /// Element
        node: NodeId,
        /// Search step
        via: FoundVia,
        /// Virtual time
        at_ms: u64,
    },
    /// Target detached during the settle delay
    Detached {
        /// Element
        node: NodeId,
        /// Virtual time
        at_ms: u64,
    },
    /// Target activated
    Activated {
        /// Element
        node: NodeId,
        /// Virtual time
        at_ms: u64,
    },
    /// Budget exhausted
    Rejected {
        /// Passes performed
        attempts: u32,
        /// Virtual time
        at_ms: u64,
    },
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Outcome of one [`Resolution::advance`] call
#[derive(Debug)]
pub enum ResolveStep {
    /// Nothing more to do before `wake_at`
    Pending {
        /// Virtual time of the next transition
        wake_at: u64,
    },
    /// Element found and activated
    Resolved(NodeId),
    /// Budget exhausted
    Rejected(HealError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Searching { next_at: Option<u64> },
    Settling { element: NodeId, activate_at: u64 },
    Resolved(NodeId),
    Rejected,
}

/// One in-flight `find_and_activate` operation
#[derive(Debug, Clone)]
pub struct Resolution {
    trace_id: Uuid,
    identifier: String,
    containers: Vec<CandidateContainer>,
    options: ResolverOptions,
    phase: Phase,
    attempts: u32,
    final_pass_done: bool,
    inaccessible: Vec<String>,
    inaccessible_frames: Vec<NodeId>,
    events: Vec<ResolveEvent>,
}

impl Resolution {
    /// Start a resolution; the first attempt runs on the first `advance`
    #[must_use]
    pub fn new(identifier: impl Into<String>, containers: Vec<CandidateContainer>, options: ResolverOptions) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            identifier: identifier.into(),
            containers,
            options,
            phase: Phase::Searching { next_at: None },
            attempts: 0,
            final_pass_done: false,
            inaccessible: Vec::new(),
            inaccessible_frames: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Correlation id carried on every log event of this resolution
    #[must_use]
    pub const fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Identifier being searched for
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Search passes performed so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Transition trace
    #[must_use]
    pub fn events(&self) -> &[ResolveEvent] {
        &self.events
    }

    /// Containers found to be inaccessible
    #[must_use]
    pub fn inaccessible(&self) -> &[String] {
        &self.inaccessible
    }

    /// Whether the resolution reached a terminal state
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Resolved(_) | Phase::Rejected)
    }

    /// Perform all work due at `now_ms`
    pub fn advance(&mut self, dom: &mut Dom, now_ms: u64) -> ResolveStep {
        loop {
            match self.phase {
                Phase::Resolved(node) => return ResolveStep::Resolved(node),
                Phase::Rejected => return ResolveStep::Rejected(self.not_found()),
                Phase::Settling { element, activate_at } => {
                    if now_ms < activate_at {
                        return ResolveStep::Pending { wake_at: activate_at };
                    }
                    self.settle(dom, element, now_ms);
                }
                Phase::Searching { next_at } => {
                    let due = next_at.unwrap_or(now_ms);
                    if now_ms < due {
                        return ResolveStep::Pending { wake_at: due };
                    }
                    self.search_pass(dom, now_ms);
                }
            }
        }
    }

    /// Run to completion against `clock`, calling `on_tick` after every
    /// wake-up so callers can mutate the document between attempts.
    ///
    /// An installed clock is advanced directly; a system clock is slept on.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` once the attempt budget is exhausted
    pub fn drive<F>(&mut self, dom: &mut Dom, clock: &FakeClock, mut on_tick: F) -> HealResult<NodeId>
    where
        F: FnMut(&mut Dom, u64),
    {
        loop {
            match self.advance(dom, clock.now_ms()) {
                ResolveStep::Resolved(node) => return Ok(node),
                ResolveStep::Rejected(err) => return Err(err),
                ResolveStep::Pending { wake_at } => {
                    if clock.is_installed() {
                        clock.advance_to(wake_at);
                    } else {
                        let wait = wake_at.saturating_sub(clock.now_ms());
                        std::thread::sleep(Duration::from_millis(wait));
                    }
                    on_tick(dom, clock.now_ms());
                }
            }
        }
    }

    fn search_pass(&mut self, dom: &mut Dom, now_ms: u64) {
        if self.attempts >= self.options.max_attempts {
            self.exhausted(dom, now_ms);
            return;
        }
        self.attempts += 1;
        self.events.push(ResolveEvent::AttemptStarted {
            attempt: self.attempts,
            at_ms: now_ms,
        });
        debug!(
            trace = %self.trace_id,
            identifier = %self.identifier,
            attempt = self.attempts,
            max_attempts = self.options.max_attempts,
            "searching"
        );

        match self.search(dom) {
            Some((node, via)) => self.found(dom, node, via, now_ms),
            None if self.attempts >= self.options.max_attempts => self.exhausted(dom, now_ms),
            None => {
                let next = now_ms + self.options.delay_after(self.attempts);
                self.phase = Phase::Searching { next_at: Some(next) };
            }
        }
    }

    fn exhausted(&mut self, dom: &mut Dom, now_ms: u64) {
        if !self.final_pass_done {
            self.final_pass_done = true;
            if let Some(node) = self.partial_match(dom) {
                self.found(dom, node, FoundVia::PartialToken, now_ms);
                return;
            }
        }
        self.events.push(ResolveEvent::Rejected {
            attempts: self.attempts,
            at_ms: now_ms,
        });
        warn!(
            trace = %self.trace_id,
            identifier = %self.identifier,
            attempts = self.attempts,
            inaccessible = ?self.inaccessible,
            "element not found"
        );
        self.phase = Phase::Rejected;
    }

    fn found(&mut self, dom: &mut Dom, node: NodeId, via: FoundVia, now_ms: u64) {
        debug!(trace = %self.trace_id, node = %dom.describe(node), ?via, "found");
        self.events.push(ResolveEvent::Found { node, via, at_ms: now_ms });
        // The node came from a live query, so it is an element.
        let _ = dom.scroll_into_view(node);
        self.phase = Phase::Settling {
            element: node,
            activate_at: now_ms + self.options.settle_delay_ms,
        };
    }

    fn settle(&mut self, dom: &mut Dom, node: NodeId, now_ms: u64) {
        if dom.is_connected(node) && dom.activate(node).is_ok() {
            self.events.push(ResolveEvent::Activated { node, at_ms: now_ms });
            info!(
                trace = %self.trace_id,
                identifier = %self.identifier,
                node = %dom.describe(node),
                attempts = self.attempts,
                "resolved"
            );
            self.phase = Phase::Resolved(node);
            return;
        }
        self.events.push(ResolveEvent::Detached { node, at_ms: now_ms });
        debug!(trace = %self.trace_id, node = %node, "detached before activation");
        let next = if self.attempts >= self.options.max_attempts {
            now_ms
        } else {
            now_ms + self.options.delay_after(self.attempts)
        };
        self.phase = Phase::Searching { next_at: Some(next) };
    }

    fn search(&mut self, dom: &Dom) -> Option<(NodeId, FoundVia)> {
        if let Some(node) = dom.get_element_by_id(dom.document(), &self.identifier) {
            return Some((node, FoundVia::Document));
        }

        let scopes = self.container_scopes(dom);
        let identifier = self.identifier.as_str();
        let control = &self.options.control;

        if let Some(node) = scopes.iter().find_map(|s| dom.get_element_by_id(*s, identifier)) {
            return Some((node, FoundVia::ContainerId));
        }

        let matches_control = |e: &Element| {
            control.matches(e) && (e.attribute("id") == Some(identifier) || e.attribute("name") == Some(identifier))
        };
        if let Some(node) = scopes.iter().find_map(|s| dom.query(*s, matches_control)) {
            return Some((node, FoundVia::ContainerControl));
        }

        if self.options.has_fallback_prefix(identifier) {
            for scope in &scopes {
                let controls = dom.query_all(*scope, |e| control.matches(e));
                if let [only] = controls.as_slice() {
                    debug!(trace = %self.trace_id, node = %dom.describe(*only), "sole-control fallback");
                    return Some((*only, FoundVia::SoleControl));
                }
            }
        }
        None
    }

    fn container_scopes(&mut self, dom: &Dom) -> Vec<NodeId> {
        let mut scopes = Vec::new();
        for container in self.containers.clone() {
            let Some(host) = dom.get_element_by_id(dom.document(), &container.id) else {
                continue;
            };
            match container.kind {
                ContainerKind::ShadowHost => scopes.extend(dom.shadow_root(host)),
                ContainerKind::Subtree => scopes.push(host),
                ContainerKind::Frame => match dom.content_document(host) {
                    Ok(doc) => scopes.extend(doc),
                    Err(_) => self.mark_inaccessible(host, container.to_string()),
                },
            }
        }
        scopes
    }

    fn partial_match(&mut self, dom: &Dom) -> Option<NodeId> {
        let token = self.options.partial_token(&self.identifier).to_string();
        if token.is_empty() {
            return None;
        }
        let control = self.options.control.clone();
        self.reachable_scopes(dom).into_iter().find_map(|scope| {
            dom.query(scope, |e| {
                control.matches(e) && e.stable_id().is_some_and(|id| id.contains(token.as_str()))
            })
        })
    }

    fn reachable_scopes(&mut self, dom: &Dom) -> Vec<NodeId> {
        let mut scopes = vec![dom.document()];
        let mut i = 0;
        while let Some(scope) = scopes.get(i).copied() {
            for node in dom.descendants(scope) {
                scopes.extend(dom.shadow_root(node));
                if dom.tag(node) == Some("iframe") {
                    match dom.content_document(node) {
                        Ok(doc) => scopes.extend(doc),
                        Err(_) => self.mark_inaccessible(node, dom.describe(node)),
                    }
                }
            }
            i += 1;
        }
        scopes
    }

    // One entry per frame element, whichever pass reaches it first.
    fn mark_inaccessible(&mut self, frame: NodeId, container: String) {
        if self.inaccessible_frames.contains(&frame) {
            return;
        }
        self.inaccessible_frames.push(frame);
        warn!(trace = %self.trace_id, container = %container, "container is cross-origin, skipping");
        self.events.push(ResolveEvent::Inaccessible {
            container: container.clone(),
        });
        self.inaccessible.push(container);
    }

    fn not_found(&self) -> HealError {
        HealError::NotFound {
            identifier: self.identifier.clone(),
            attempts: self.attempts,
            inaccessible: self.inaccessible.clone(),
        }
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Factory for resolutions sharing one set of options
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolverOptions,
}

impl Resolver {
    /// Create a resolver with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[must_use]
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Start a resolution without driving it
    #[must_use]
    pub fn resolution(&self, identifier: &str, containers: &[CandidateContainer]) -> Resolution {
        Resolution::new(identifier, containers.to_vec(), self.options.clone())
    }

    /// Find `identifier`, scroll it into view, wait the settle delay, and
    /// activate it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` after `max_attempts` passes and the partial-token pass
    pub fn find_and_activate<F>(
        &self,
        dom: &mut Dom,
        clock: &FakeClock,
        identifier: &str,
        containers: &[CandidateContainer],
        on_tick: F,
    ) -> HealResult<NodeId>
    where
        F: FnMut(&mut Dom, u64),
    {
        self.resolution(identifier, containers).drive(dom, clock, on_tick)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn page() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let html = dom.create_element("html");
        let body = dom.create_element("body");
        dom.append_child(dom.document(), html).unwrap();
        dom.append_child(html, body).unwrap();
        (dom, body)
    }

    fn child(dom: &mut Dom, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = dom.create_element(tag);
        for (k, v) in attrs {
            dom.set_attribute(node, k, v).unwrap();
        }
        dom.append_child(parent, node).unwrap();
        node
    }

    fn attempt_times(events: &[ResolveEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                ResolveEvent::AttemptStarted { at_ms, .. } => Some(*at_ms),
                _ => None,
            })
            .collect()
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = ResolverOptions::default();
            assert_eq!(options.max_attempts, 10);
            assert_eq!(options.retry_interval(), Duration::from_millis(500));
            assert_eq!(options.settle_delay_ms, 100);
            assert_eq!(options.control.to_string(), "input[type=file]");
        }

        #[test]
        fn test_exponential_delay_is_capped() {
            let options = ResolverOptions::new().with_retry_interval(100).with_backoff(Backoff::Exponential {
                factor: 2.0,
                max_interval_ms: 500,
            });
            let delays: Vec<u64> = (1..=5).map(|k| options.delay_after(k)).collect();
            assert_eq!(delays, vec![100, 200, 400, 500, 500]);
        }

        #[test]
        fn test_partial_token_strips_first_matching_prefix() {
            let options = ResolverOptions::default();
            assert_eq!(options.partial_token("shadow-input-3"), "input-3");
            assert_eq!(options.partial_token("plain"), "plain");
        }

        #[test]
        fn test_container_parse() {
            let c: CandidateContainer = "shadow:host-1".parse().unwrap();
            assert_eq!(c, CandidateContainer::shadow_host("host-1"));
            assert_eq!(c.to_string(), "shadow:host-1");
            assert!("bogus:x".parse::<CandidateContainer>().is_err());
            assert!("frame:".parse::<CandidateContainer>().is_err());
            assert!("nocolon".parse::<CandidateContainer>().is_err());
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn test_document_lookup_scrolls_then_activates_after_settle() {
            let (mut dom, body) = page();
            let input = child(&mut dom, body, "input", &[("id", "upload"), ("type", "file")]);
            let clock = FakeClock::fixed(1_000);

            let found = Resolver::new()
                .find_and_activate(&mut dom, &clock, "upload", &[], |_, _| {})
                .unwrap();

            assert_eq!(found, input);
            assert_eq!(dom.element(input).unwrap().scroll_count(), 1);
            assert_eq!(dom.element(input).unwrap().activation_count(), 1);
            assert_eq!(clock.now_ms(), 1_100);
        }

        #[test]
        fn test_container_id_lookup_in_shadow_root() {
            let (mut dom, body) = page();
            let host = child(&mut dom, body, "div", &[("id", "host-1")]);
            let root = dom.attach_shadow(host).unwrap();
            let input = child(&mut dom, root, "input", &[("id", "shadow-input-1"), ("type", "file")]);

            let mut resolution =
                Resolver::new().resolution("shadow-input-1", &[CandidateContainer::shadow_host("host-1")]);
            let clock = FakeClock::fixed(0);
            assert_eq!(resolution.drive(&mut dom, &clock, |_, _| {}).unwrap(), input);
            assert!(resolution
                .events()
                .iter()
                .any(|e| matches!(e, ResolveEvent::Found { via: FoundVia::ContainerId, .. })));
        }

        #[test]
        fn test_control_matched_by_name() {
            let (mut dom, body) = page();
            let frame = child(&mut dom, body, "iframe", &[("id", "frame-a")]);
            let doc = dom.attach_frame_document(frame, false).unwrap();
            child(&mut dom, doc, "input", &[("type", "file"), ("name", "other")]);
            let input = child(&mut dom, doc, "input", &[("type", "file"), ("name", "doc-upload")]);

            let mut resolution = Resolver::new().resolution("doc-upload", &[CandidateContainer::frame("frame-a")]);
            let clock = FakeClock::fixed(0);
            assert_eq!(resolution.drive(&mut dom, &clock, |_, _| {}).unwrap(), input);
        }

        #[test]
        fn test_sole_control_fallback_requires_prefix() {
            let (mut dom, body) = page();
            let host = child(&mut dom, body, "div", &[("id", "host-2")]);
            let root = dom.attach_shadow(host).unwrap();
            let only = child(&mut dom, root, "input", &[("type", "file")]);
            let containers = [CandidateContainer::shadow_host("host-2")];
            let clock = FakeClock::fixed(0);

            let resolver = Resolver::with_options(ResolverOptions::new().with_max_attempts(1));
            assert_eq!(
                resolver.find_and_activate(&mut dom, &clock, "shadow-anything", &containers, |_, _| {}).unwrap(),
                only
            );
            assert!(resolver
                .find_and_activate(&mut dom, &clock, "anything", &containers, |_, _| {})
                .is_err());
        }

        #[test]
        fn test_partial_token_after_exhaustion() {
            let (mut dom, body) = page();
            let input = child(&mut dom, body, "input", &[("type", "file"), ("id", "upload-input-7-v2")]);
            let clock = FakeClock::fixed(0);
            let mut resolution = Resolver::with_options(ResolverOptions::new().with_max_attempts(3))
                .resolution("nested-input-7", &[]);

            assert_eq!(resolution.drive(&mut dom, &clock, |_, _| {}).unwrap(), input);
            assert_eq!(resolution.attempts(), 3);
            assert!(resolution
                .events()
                .iter()
                .any(|e| matches!(e, ResolveEvent::Found { via: FoundVia::PartialToken, .. })));
        }
    }

    mod timing_tests {
        use super::*;

        #[test]
        fn test_rejects_after_exactly_max_attempts() {
            let (mut dom, _) = page();
            let clock = FakeClock::fixed(10_000);
            let mut resolution = Resolver::with_options(ResolverOptions::new().with_max_attempts(4))
                .resolution("never-there", &[]);

            let err = resolution.drive(&mut dom, &clock, |_, _| {}).unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(resolution.attempts(), 4);
            assert_eq!(attempt_times(resolution.events()), vec![10_000, 10_500, 11_000, 11_500]);
            assert_eq!(clock.now_ms(), 11_500);
        }

        #[test]
        fn test_advance_reports_pending_until_due() {
            let (mut dom, _) = page();
            let mut resolution = Resolution::new("missing", Vec::new(), ResolverOptions::new().with_max_attempts(2));

            assert!(matches!(resolution.advance(&mut dom, 0), ResolveStep::Pending { wake_at: 500 }));
            assert!(matches!(resolution.advance(&mut dom, 499), ResolveStep::Pending { wake_at: 500 }));
            assert_eq!(resolution.attempts(), 1);
            assert!(matches!(resolution.advance(&mut dom, 500), ResolveStep::Rejected(_)));
            assert!(resolution.is_finished());
            assert!(matches!(resolution.advance(&mut dom, 9_999), ResolveStep::Rejected(_)));
        }

        #[test]
        fn test_late_attachment_is_found_on_later_attempt() {
            let (mut dom, body) = page();
            let clock = FakeClock::fixed(0);
            let mut resolution = Resolver::new().resolution("late", &[]);

            let found = resolution
                .drive(&mut dom, &clock, |dom, now| {
                    if now == 1_000 && dom.get_element_by_id(dom.document(), "late").is_none() {
                        let input = dom.create_element("input");
                        dom.set_attribute(input, "id", "late").unwrap();
                        dom.append_child(body, input).unwrap();
                    }
                })
                .unwrap();

            assert_eq!(dom.attribute(found, "id"), Some("late"));
            assert_eq!(resolution.attempts(), 3);
        }

        #[test]
        fn test_detached_during_settle_returns_to_searching() {
            let (mut dom, body) = page();
            let input = child(&mut dom, body, "input", &[("id", "flaky")]);
            let clock = FakeClock::fixed(0);
            let mut resolution = Resolver::with_options(ResolverOptions::new().with_max_attempts(3))
                .resolution("flaky", &[]);

            let mut removed = false;
            let result = resolution.drive(&mut dom, &clock, |dom, _| {
                if !removed {
                    dom.remove(input).unwrap();
                    removed = true;
                }
            });

            assert!(result.is_err());
            assert!(resolution
                .events()
                .iter()
                .any(|e| matches!(e, ResolveEvent::Detached { .. })));
            assert_eq!(resolution.attempts(), 3);
        }
    }

    mod boundary_tests {
        use super::*;

        #[test]
        fn test_cross_origin_frame_recorded_once() {
            let (mut dom, body) = page();
            let frame = child(&mut dom, body, "iframe", &[("id", "remote")]);
            dom.attach_frame_document(frame, true).unwrap();
            let clock = FakeClock::fixed(0);
            let mut resolution = Resolver::with_options(ResolverOptions::new().with_max_attempts(3))
                .resolution("iframe-input", &[CandidateContainer::frame("remote")]);

            let err = resolution.drive(&mut dom, &clock, |_, _| {}).unwrap_err();
            match err {
                HealError::NotFound { attempts, inaccessible, .. } => {
                    assert_eq!(attempts, 3);
                    assert_eq!(inaccessible, vec!["frame:remote".to_string()]);
                }
                other => panic!("unexpected error: {other}"),
            }
            let warnings = resolution
                .events()
                .iter()
                .filter(|e| matches!(e, ResolveEvent::Inaccessible { .. }))
                .count();
            assert_eq!(warnings, 1);
        }

        #[test]
        fn test_unlisted_cross_origin_frame_reported_by_partial_pass() {
            let (mut dom, body) = page();
            let frame = child(&mut dom, body, "iframe", &[("id", "remote")]);
            dom.attach_frame_document(frame, true).unwrap();
            let clock = FakeClock::fixed(0);
            let mut resolution = Resolver::with_options(ResolverOptions::new().with_max_attempts(2))
                .resolution("iframe-input", &[]);

            assert!(resolution.drive(&mut dom, &clock, |_, _| {}).is_err());
            assert_eq!(resolution.inaccessible(), &["iframe#remote".to_string()]);
        }

        #[test]
        fn test_container_attached_late_is_searched() {
            let (mut dom, body) = page();
            let clock = FakeClock::fixed(0);
            let containers = [CandidateContainer::shadow_host("host-late")];
            let mut resolution = Resolver::new().resolution("slot-input", &containers);

            let found = resolution
                .drive(&mut dom, &clock, |dom, now| {
                    if now == 500 {
                        let host = dom.create_element("div");
                        dom.set_attribute(host, "id", "host-late").unwrap();
                        dom.append_child(body, host).unwrap();
                        let root = dom.attach_shadow(host).unwrap();
                        let input = dom.create_element("input");
                        dom.set_attribute(input, "type", "file").unwrap();
                        dom.append_child(root, input).unwrap();
                    }
                })
                .unwrap();

            assert_eq!(dom.tag(found), Some("input"));
            assert_eq!(resolution.attempts(), 2);
        }
    }
}
