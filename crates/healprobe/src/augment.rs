//! Position-augmented locators.
//!
//! Same-document elements get the plain XPath form with the live position
//! appended. Elements behind a shadow root or inside a frame document get a
//! script chain instead, since a passive path cannot be evaluated from
//! outside the boundary.

use crate::dom::{Dom, NodeId, Position, ScopeKind};
use crate::locator::{BoundaryDescriptor, ChainStep, LocatorExpr, PositionedLocator, ScriptChain};
use crate::synth::{expression_for, structural_steps, synthesize_with};

/// Augment with the element's offset as rendered right now.
///
/// The position is read from the [`Dom`] on every call and never cached.
#[must_use]
pub fn augment(
    dom: &Dom,
    element: Option<NodeId>,
    context: NodeId,
    boundary: Option<&BoundaryDescriptor>,
) -> PositionedLocator {
    match element.and_then(|e| dom.offset(e)) {
        Some(position) => augment_at(dom, element, position, context, boundary),
        None => PositionedLocator::empty(),
    }
}

/// Augment with an explicit position
#[must_use]
pub fn augment_at(
    dom: &Dom,
    element: Option<NodeId>,
    position: Position,
    context: NodeId,
    boundary: Option<&BoundaryDescriptor>,
) -> PositionedLocator {
    let Some(element) = element else {
        return PositionedLocator::empty();
    };
    let locator = synthesize_with(dom, Some(element), context, boundary.cloned());
    if locator.is_empty() {
        return PositionedLocator::empty();
    }
    if !locator.crosses_boundary() {
        return PositionedLocator::xpath(locator, position);
    }
    let chain = script_chain(dom, element, boundary);
    PositionedLocator::script(locator, chain, position)
}

/// Lookup chain from `document` to `element`: one host lookup plus enter
/// step per boundary, outermost first, then the element lookup.
///
/// `boundary` replaces the host lookup of the innermost boundary only.
#[must_use]
pub fn script_chain(dom: &Dom, element: NodeId, boundary: Option<&BoundaryDescriptor>) -> ScriptChain {
    let roots = dom.boundary_chain(element);
    let last = roots.len().saturating_sub(1);
    let mut chain = ScriptChain::new();

    for (i, root) in roots.iter().enumerate() {
        let Some(host) = dom.host_of(*root) else {
            continue;
        };
        let lookup = match boundary {
            Some(descriptor) if i == last => ChainStep::Select(descriptor.selector.clone()),
            _ => ChainStep::Find(host_expression(dom, host)),
        };
        let enter = match dom.scope_kind(*root) {
            Some(ScopeKind::FrameDocument) => ChainStep::ContentDocument,
            _ => ChainStep::ShadowRoot,
        };
        chain = chain.then(lookup).then(enter);
    }

    match expression_for(dom, element) {
        Some(expr) => chain.then(ChainStep::Find(expr)),
        None => chain,
    }
}

// Hosts never use the type predicate.
fn host_expression(dom: &Dom, host: NodeId) -> LocatorExpr {
    let el = dom.element(host);
    if let Some(id) = el.and_then(|e| e.stable_id()) {
        LocatorExpr::Id(id.to_string())
    } else if let Some(name) = el.and_then(|e| e.stable_name()) {
        LocatorExpr::Name(name.to_string())
    } else {
        LocatorExpr::Path(structural_steps(dom, host))
    }
}
