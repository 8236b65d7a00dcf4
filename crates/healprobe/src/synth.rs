//! Locator synthesis.
//!
//! Strict priority, first match wins: stable `id`, stable `name`, file-input
//! type predicate, then a structural path walked up to the element's own
//! scope root. Nested-scope results always carry a boundary marker.

use tracing::debug;

use crate::dom::{Dom, NodeId, ScopeKind};
use crate::locator::{css_id, BoundaryDescriptor, Locator, LocatorExpr, PathStep};

/// Build the best available locator for `element` searched within `context`.
///
/// `context` is a scope root: the document, a shadow root, or a frame
/// document. An absent element yields [`Locator::empty`].
#[must_use]
pub fn synthesize(dom: &Dom, element: Option<NodeId>, context: NodeId) -> Locator {
    synthesize_with(dom, element, context, None)
}

/// [`synthesize`] with a caller-supplied boundary descriptor.
///
/// Without one, the descriptor is derived from the host or frame element of
/// the innermost boundary.
#[must_use]
pub fn synthesize_with(
    dom: &Dom,
    element: Option<NodeId>,
    context: NodeId,
    boundary: Option<BoundaryDescriptor>,
) -> Locator {
    let Some(element) = element else {
        return Locator::empty();
    };
    let Some(expr) = expression_for(dom, element) else {
        return Locator::empty();
    };

    let own_scope = dom.scope_of(element).and_then(|root| dom.scope_kind(root));
    let context_kind = dom.scope_kind(context).unwrap_or(ScopeKind::Document);
    let rooted_in = match own_scope {
        Some(kind) if kind != ScopeKind::Document => kind,
        _ => context_kind,
    };

    let kind = expr.kind();
    let locator = if rooted_in == ScopeKind::Document {
        Locator::top_level(expr)
    } else {
        let boundary = boundary.or_else(|| {
            let root = dom.boundary_chain(element).last().copied().unwrap_or(context);
            descriptor_for(dom, root)
        });
        Locator::nested(expr, rooted_in, boundary)
    };

    debug!(
        kind = %kind,
        element = %dom.describe(element),
        crosses_boundary = locator.crosses_boundary(),
        "synthesized locator"
    );
    locator
}

/// Highest-priority expression for an element, `None` for non-elements
#[must_use]
pub fn expression_for(dom: &Dom, element: NodeId) -> Option<LocatorExpr> {
    let el = dom.element(element)?;
    let expr = if let Some(id) = el.stable_id() {
        LocatorExpr::Id(id.to_string())
    } else if let Some(name) = el.stable_name() {
        LocatorExpr::Name(name.to_string())
    } else if el.is_file_input() {
        LocatorExpr::FileInput
    } else {
        LocatorExpr::Path(structural_steps(dom, element))
    };
    Some(expr)
}

/// Path steps from the element's scope root (or detached root) down to it
#[must_use]
pub fn structural_steps(dom: &Dom, element: NodeId) -> Vec<PathStep> {
    let mut steps = Vec::new();
    let mut cursor = Some(element);
    while let Some(node) = cursor {
        let Some(el) = dom.element(node) else {
            break;
        };
        let preceding = dom.preceding_same_tag(node);
        let index = (preceding > 0).then_some(preceding + 1);
        steps.push(PathStep::new(el.tag(), index, el.class_name()));
        cursor = dom.parent(node);
    }
    steps.reverse();
    steps
}

/// Descriptor naming the host or frame element of a nested scope root
#[must_use]
pub fn descriptor_for(dom: &Dom, root: NodeId) -> Option<BoundaryDescriptor> {
    let host = dom.host_of(root)?;
    let selector = match dom.element(host).and_then(|e| e.stable_id()) {
        Some(id) => css_id(id),
        None => LocatorExpr::Path(structural_steps(dom, host)).css(),
    };
    match dom.scope_kind(root)? {
        ScopeKind::ShadowRoot => Some(BoundaryDescriptor::shadow_host(selector)),
        ScopeKind::FrameDocument => Some(BoundaryDescriptor::iframe(selector)),
        ScopeKind::Document => None,
    }
}
