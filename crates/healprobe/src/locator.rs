//! Locator data types.
//!
//! A [`Locator`] says how to find one element again: a strategy
//! ([`LocatorKind`]), an expression, and whether reaching the element means
//! crossing a shadow-root or iframe boundary. Expressions are typed rather
//! than concatenated strings; they render to XPath for logs and replay, to
//! CSS for script chains, and can be re-resolved against a [`Dom`] with
//! first-match-in-document-order semantics.
//!
//! # Design Philosophy
//!
//! - **Explicit emptiness**: an absent element yields [`Locator::empty`], never a guess
//! - **Context-qualified paths**: a path rooted in a nested scope always carries a marker
//! - **Executable chains**: boundary-crossing locators render as lookup chains

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::dom::{Dom, NodeId, Position, ScopeKind};

/// Selection strategy, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocatorKind {
    /// Stable `id` attribute
    Id,
    /// Stable `name` attribute
    Name,
    /// `<input type="file">` type predicate
    Type,
    /// Tag names, sibling indices, and class lists
    StructuralPath,
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Id => "ID",
            Self::Name => "NAME",
            Self::Type => "TYPE",
            Self::StructuralPath => "STRUCTURAL_PATH",
        };
        f.write_str(label)
    }
}

/// One level of a structural path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    /// Lower-case tag name
    pub tag: String,
    /// 1-based index among same-tag siblings, only when earlier ones exist
    pub index: Option<usize>,
    /// Class list predicate
    pub classes: Option<String>,
}

impl PathStep {
    /// Create a step
    #[must_use]
    pub fn new(tag: impl Into<String>, index: Option<usize>, classes: Option<String>) -> Self {
        Self {
            tag: tag.into(),
            index,
            classes,
        }
    }

    fn xpath(&self) -> String {
        let mut out = self.tag.clone();
        if let Some(index) = self.index {
            out.push_str(&format!("[{index}]"));
        }
        if let Some(classes) = &self.classes {
            out.push_str(&format!("[@class={}]", xpath_literal(classes)));
        }
        out
    }

    fn css(&self) -> String {
        let mut out = self.tag.clone();
        if let Some(classes) = &self.classes {
            for class in classes.split_whitespace() {
                out.push('.');
                out.push_str(&css_ident_or_escape(class));
            }
        }
        out.push_str(&format!(":nth-of-type({})", self.index.unwrap_or(1)));
        out
    }
}

/// Typed locator expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LocatorExpr {
    /// `//*[@id="…"]`
    Id(String),
    /// `//*[@name="…"]`
    Name(String),
    /// `//input[@type="file"]`
    FileInput,
    /// `/tag[n][@class="…"]/…`, relative to a scope root
    Path(Vec<PathStep>),
}

impl LocatorExpr {
    /// Strategy this expression implements
    #[must_use]
    pub const fn kind(&self) -> LocatorKind {
        match self {
            Self::Id(_) => LocatorKind::Id,
            Self::Name(_) => LocatorKind::Name,
            Self::FileInput => LocatorKind::Type,
            Self::Path(_) => LocatorKind::StructuralPath,
        }
    }

    /// XPath rendering
    #[must_use]
    pub fn xpath(&self) -> String {
        match self {
            Self::Id(id) => format!("//*[@id={}]", xpath_literal(id)),
            Self::Name(name) => format!("//*[@name={}]", xpath_literal(name)),
            Self::FileInput => r#"//input[@type="file"]"#.to_string(),
            Self::Path(steps) => steps.iter().fold(String::new(), |mut acc, step| {
                acc.push('/');
                acc.push_str(&step.xpath());
                acc
            }),
        }
    }

    /// XPath rendering relative to a context node (`./…` or `.//…`)
    #[must_use]
    pub fn relative_xpath(&self) -> String {
        format!(".{}", self.xpath())
    }

    /// CSS rendering for `querySelector`. Structural paths render as a
    /// child-combinator chain of `:nth-of-type` steps.
    #[must_use]
    pub fn css(&self) -> String {
        match self {
            Self::Id(id) => css_id(id),
            Self::Name(name) => format!("[name={}]", css_string(name)),
            Self::FileInput => r#"input[type="file"]"#.to_string(),
            Self::Path(steps) => steps
                .iter()
                .map(PathStep::css)
                .collect::<Vec<_>>()
                .join(" > "),
        }
    }

    /// First element in document order under `scope` matching this expression
    #[must_use]
    pub fn resolve(&self, dom: &Dom, scope: NodeId) -> Option<NodeId> {
        match self {
            Self::Id(id) => dom.get_element_by_id(scope, id),
            Self::Name(name) => dom.query(scope, |e| e.attribute("name") == Some(name.as_str())),
            Self::FileInput => dom.query(scope, |e| e.is_file_input()),
            Self::Path(steps) => resolve_steps(dom, scope, steps),
        }
    }
}

impl fmt::Display for LocatorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xpath())
    }
}

fn resolve_steps(dom: &Dom, parent: NodeId, steps: &[PathStep]) -> Option<NodeId> {
    let (step, rest) = steps.split_first()?;
    let same_tag: Vec<NodeId> = dom
        .children(parent)
        .iter()
        .copied()
        .filter(|c| dom.tag(*c) == Some(step.tag.as_str()))
        .collect();
    let candidates: Vec<NodeId> = match step.index {
        Some(index) => same_tag.get(index.checked_sub(1)?).copied().into_iter().collect(),
        None => same_tag,
    };

    candidates
        .into_iter()
        .filter(|c| match &step.classes {
            Some(classes) => dom.element(*c).and_then(|e| e.class_name()).as_deref() == Some(classes),
            None => true,
        })
        .find_map(|c| {
            if rest.is_empty() {
                Some(c)
            } else {
                resolve_steps(dom, c, rest)
            }
        })
}

/// Which encapsulation boundary a descriptor names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Shadow host element
    Shadow,
    /// Iframe element
    Frame,
}

/// How to reach a boundary: a selector for the shadow host or iframe
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundaryDescriptor {
    /// Boundary kind
    pub kind: BoundaryKind,
    /// CSS selector of the host element, e.g. `#host-1`
    pub selector: String,
}

impl BoundaryDescriptor {
    /// Descriptor for a shadow host
    #[must_use]
    pub fn shadow_host(selector: impl Into<String>) -> Self {
        Self {
            kind: BoundaryKind::Shadow,
            selector: selector.into(),
        }
    }

    /// Descriptor for an iframe
    #[must_use]
    pub fn iframe(selector: impl Into<String>) -> Self {
        Self {
            kind: BoundaryKind::Frame,
            selector: selector.into(),
        }
    }
}

impl fmt::Display for BoundaryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}

/// A strategy plus expression for re-finding one element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locator {
    expr: Option<LocatorExpr>,
    rooted_in: Option<ScopeKind>,
    crosses_boundary: bool,
    boundary: Option<BoundaryDescriptor>,
}

impl Locator {
    /// The explicit empty result for an absent element
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Locator rooted in the top-level document
    #[must_use]
    pub fn top_level(expr: LocatorExpr) -> Self {
        Self {
            expr: Some(expr),
            rooted_in: Some(ScopeKind::Document),
            crosses_boundary: false,
            boundary: None,
        }
    }

    /// Locator rooted in a nested scope
    #[must_use]
    pub fn nested(expr: LocatorExpr, rooted_in: ScopeKind, boundary: Option<BoundaryDescriptor>) -> Self {
        Self {
            expr: Some(expr),
            rooted_in: Some(rooted_in),
            crosses_boundary: true,
            boundary,
        }
    }

    /// Replace the boundary descriptor
    #[must_use]
    pub fn with_boundary(mut self, boundary: Option<BoundaryDescriptor>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Whether this is the empty locator
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Strategy, `None` for the empty locator
    #[must_use]
    pub fn kind(&self) -> Option<LocatorKind> {
        self.expr.as_ref().map(LocatorExpr::kind)
    }

    /// Typed expression
    #[must_use]
    pub const fn expr(&self) -> Option<&LocatorExpr> {
        self.expr.as_ref()
    }

    /// Whether the element lives behind a shadow root or in a frame document
    #[must_use]
    pub const fn crosses_boundary(&self) -> bool {
        self.crosses_boundary
    }

    /// Kind of scope the expression is rooted in
    #[must_use]
    pub const fn rooted_in(&self) -> Option<ScopeKind> {
        self.rooted_in
    }

    /// How to reach the boundary
    #[must_use]
    pub const fn boundary(&self) -> Option<&BoundaryDescriptor> {
        self.boundary.as_ref()
    }

    /// Expression without the boundary marker
    #[must_use]
    pub fn raw_expression(&self) -> String {
        self.expr.as_ref().map(LocatorExpr::xpath).unwrap_or_default()
    }

    /// Expression as published: nested-scope paths carry a
    /// `shadow-root(<host>)::` or `iframe-document(<frame>)::` prefix
    #[must_use]
    pub fn expression(&self) -> String {
        let raw = self.raw_expression();
        if raw.is_empty() || !self.crosses_boundary {
            return raw;
        }
        let marker = self.rooted_in.unwrap_or(ScopeKind::ShadowRoot).marker();
        match &self.boundary {
            Some(boundary) => format!("{marker}({boundary})::{raw}"),
            None => format!("{marker}::{raw}"),
        }
    }

    /// Re-resolve against a scope root
    #[must_use]
    pub fn resolve(&self, dom: &Dom, scope: NodeId) -> Option<NodeId> {
        self.expr.as_ref()?.resolve(dom, scope)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

/// One step of a script-executable lookup chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", content = "arg", rename_all = "snake_case")]
pub enum ChainStep {
    /// Find an element with a typed expression in the current scope
    Find(LocatorExpr),
    /// Find an element with a caller-supplied CSS selector
    Select(String),
    /// Enter the shadow root of the current element
    ShadowRoot,
    /// Enter the content document of the current iframe
    ContentDocument,
}

/// Script-executable locator: lookups that name each boundary crossing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptChain {
    steps: Vec<ChainStep>,
}

impl ScriptChain {
    /// Create an empty chain (starts at `document`)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    #[must_use]
    pub fn then(mut self, step: ChainStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    /// Render as a JavaScript expression starting at `document`.
    ///
    /// Structural paths become `<document>.evaluate(<path>, <scope>, ...)`,
    /// where `<document>` is the innermost document entered so far.
    #[must_use]
    pub fn render(&self) -> String {
        let start = ("document".to_string(), "document".to_string());
        let (expression, _) = self.steps.iter().fold(start, |(acc, doc), step| match step {
            ChainStep::Find(LocatorExpr::Path(steps)) => {
                let path = js_string(&LocatorExpr::Path(steps.clone()).relative_xpath());
                let lookup = format!(
                    "{doc}.evaluate({path}, {acc}, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
                );
                (lookup, doc)
            }
            ChainStep::Find(expr) => (format!("{acc}.querySelector({})", js_string(&expr.css())), doc),
            ChainStep::Select(css) => (format!("{acc}.querySelector({})", js_string(css)), doc),
            ChainStep::ShadowRoot => (format!("{acc}.shadowRoot"), doc),
            ChainStep::ContentDocument => {
                let entered = format!("{acc}.contentDocument");
                (entered.clone(), entered)
            }
        });
        expression
    }

    /// Execute the chain against a [`Dom`]. Caller-supplied selectors are
    /// understood in their `#id` form only.
    #[must_use]
    pub fn resolve(&self, dom: &Dom) -> Option<NodeId> {
        self.steps.iter().try_fold(dom.document(), |current, step| match step {
            ChainStep::Find(expr) => expr.resolve(dom, current),
            ChainStep::Select(css) => {
                let id = css.strip_prefix('#')?;
                dom.get_element_by_id(current, id)
            }
            ChainStep::ShadowRoot => dom.shadow_root(current),
            ChainStep::ContentDocument => dom.content_document(current).ok().flatten(),
        })
    }
}

impl fmt::Display for ScriptChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Output form of a positioned locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorForm {
    /// Passive path, same-document elements
    XPath,
    /// Executable lookup chain, elements behind a boundary
    JavaScript,
}

impl LocatorForm {
    /// Label used in rendered output
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::XPath => "XPath",
            Self::JavaScript => "JavaScript",
        }
    }
}

/// A locator plus the element's position at the moment of use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedLocator {
    locator: Locator,
    position: Position,
    form: LocatorForm,
    script: Option<ScriptChain>,
}

impl PositionedLocator {
    /// Empty result for an absent element; renders as the empty string
    #[must_use]
    pub fn empty() -> Self {
        Self {
            locator: Locator::empty(),
            position: Position::default(),
            form: LocatorForm::XPath,
            script: None,
        }
    }

    /// Same-document form
    #[must_use]
    pub fn xpath(locator: Locator, position: Position) -> Self {
        Self {
            locator,
            position,
            form: LocatorForm::XPath,
            script: None,
        }
    }

    /// Boundary-crossing form
    #[must_use]
    pub fn script(locator: Locator, script: ScriptChain, position: Position) -> Self {
        Self {
            locator,
            position,
            form: LocatorForm::JavaScript,
            script: Some(script),
        }
    }

    /// Underlying locator
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Position captured at call time
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Output form
    #[must_use]
    pub const fn form(&self) -> LocatorForm {
        self.form
    }

    /// Lookup chain, present for the JavaScript form
    #[must_use]
    pub const fn script_chain(&self) -> Option<&ScriptChain> {
        self.script.as_ref()
    }

    /// Whether this is the empty result
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.locator.is_empty()
    }

    /// `XPath: <expr> [position: top=Npx, left=Mpx]` or
    /// `JavaScript: <chain> [position: top=Npx, left=Mpx]`
    #[must_use]
    pub fn rendered(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let body = match &self.script {
            Some(chain) => chain.render(),
            None => self.locator.expression(),
        };
        format!("{}: {body} [position: {}]", self.form.label(), self.position)
    }
}

impl fmt::Display for PositionedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered())
    }
}

/// XPath 1.0 string literal; XPath has no escapes, so values holding both
/// quote kinds are spliced with `concat()`
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let parts: Vec<String> = value.split('"').map(|p| format!("\"{p}\"")).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// JavaScript string literal (JSON string syntax)
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn is_css_ident(value: &str) -> bool {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

fn css_ident_or_escape(value: &str) -> String {
    if is_css_ident(value) {
        value.to_string()
    } else {
        value
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_string()
                } else {
                    format!("\\{c}")
                }
            })
            .collect()
    }
}

/// CSS selector for an id: `#ident` when safe, `[id="…"]` otherwise
#[must_use]
pub fn css_id(id: &str) -> String {
    if is_css_ident(id) {
        format!("#{id}")
    } else {
        format!("[id={}]", css_string(id))
    }
}
