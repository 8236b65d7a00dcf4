//! Healprobe: self-healing element location for web fixtures
//!
//! Healprobe builds a deterministic in-memory DOM (shadow roots and iframes
//! included), synthesizes the most stable locator it can for an element,
//! augments that locator with the element's position, and re-finds elements
//! that render late or move behind encapsulation boundaries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    HEALPROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Fixture    │    │ Resolver   │    │ Synthesize │            │
//! │   │ (YAML/DOM) │───►│ (retry +   │───►│ + Augment  │            │
//! │   │            │    │  fallback) │    │            │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                     ┌────────────┐    ┌────────────┐            │
//! │                     │ Status     │◄───│ Upload     │            │
//! │                     │ Panel      │    │ Store      │            │
//! │                     └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use healprobe::prelude::*;
//!
//! let page = FixturePage::new("demo").with_node(shadow_host(
//!     "host-1",
//!     vec![FixtureNode::file_input().with_key("target")],
//! ));
//! let dom = page.build().unwrap();
//! let target = dom.by_key("target").unwrap();
//! let scope = dom.scope_of(target).unwrap();
//!
//! let positioned = augment(&dom, Some(target), scope, None);
//! assert_eq!(positioned.form(), LocatorForm::JavaScript);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod result;

/// Virtual and system clocks
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod clock;

mod size;

/// Arena DOM with shadow roots and frame documents
///
/// Queries never pierce a scope root; crossing a boundary is always an
/// explicit step.
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod dom;

#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod locator;

mod synth;

mod augment;

/// Resilient element resolution
///
/// Retries with a configurable backoff, waits for late-rendered elements
/// to settle, then falls back to shadow hosts, frames and partial tokens.
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod resolver;

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod files;

/// Upload status store
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod store;

mod scenario;

/// Status panel rendering
pub mod panel;

mod config;

/// Declarative DOM fixtures and pathological layout generators
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod fixture;

/// Fixture strategies for property-based testing
pub mod strategies;

pub use augment::{augment, augment_at, script_chain};
pub use clock::{fixed_clock, system_clock, Clock, ClockOptions, ClockState, FakeClock};
pub use config::{HealConfig, DEFAULT_SCENARIO_COUNT};
pub use dom::{Dom, Element, NodeId, Position, ScopeKind};
pub use files::{guess_mime_type, FileChooser, FileInput, UploadedFile};
pub use fixture::{
    deep_nesting, iframe_host, portal, shadow_host, slotted, wide_branching, FixtureFrame,
    FixtureNode, FixturePage,
};
pub use locator::{
    css_id, xpath_literal, BoundaryDescriptor, BoundaryKind, ChainStep, Locator, LocatorExpr,
    LocatorForm, LocatorKind, PathStep, PositionedLocator, ScriptChain,
};
pub use panel::{StatusPanel, EMPTY_PANEL};
pub use resolver::{
    Backoff, CandidateContainer, ContainerKind, ExpectedControl, FoundVia, ResolveEvent,
    ResolveStep, Resolution, Resolver, ResolverOptions, DEFAULT_FALLBACK_PREFIXES,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS, DEFAULT_SETTLE_DELAY_MS,
};
pub use result::{HealError, HealResult};
pub use scenario::{
    FileSpec, LogNotifier, RecordingNotifier, Scenario, ScenarioOutcome, ScenarioRegistry,
    UploadFlow, UserNotifier,
};
pub use size::format_size;
pub use store::{
    RecordState, ScenarioId, StatusMap, StoreSnapshot, Subscription, UploadRecord, UploadStore,
};
pub use synth::{descriptor_for, expression_for, structural_steps, synthesize, synthesize_with};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::augment::*;
    pub use super::clock::*;
    pub use super::config::*;
    pub use super::dom::*;
    pub use super::files::*;
    pub use super::fixture::*;
    pub use super::locator::*;
    pub use super::panel::{StatusPanel, EMPTY_PANEL};
    pub use super::resolver::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::size::*;
    pub use super::store::*;
    pub use super::synth::*;
}
