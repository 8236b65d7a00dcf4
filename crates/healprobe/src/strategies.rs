//! Fixture generators for property-based testing.
//!
//! [`standard_pages`] is a fixed set covering every pathological layout.
//! With the `proptest` feature, `arb_*` strategies generate random trees of
//! anonymous elements (no `id`, no `name`, no file inputs), which is the
//! case where locators must fall back to structural paths.

use crate::fixture::{
    deep_nesting, iframe_host, portal, shadow_host, slotted, wide_branching, FixtureNode, FixturePage,
};

#[cfg(any(test, feature = "proptest"))]
use proptest::prelude::*;

/// One page per pathological layout, each with a node keyed `target`
#[must_use]
pub fn standard_pages() -> Vec<FixturePage> {
    let portal_page = portal("menu", FixtureNode::file_input().with_key("target"))
        .into_iter()
        .fold(FixturePage::new("portal"), FixturePage::with_node);

    vec![
        FixturePage::new("deep").with_node(deep_nesting(
            50,
            FixtureNode::new("input").with_id("x").with_key("target"),
        )),
        FixturePage::new("wide").with_node(wide_branching(200, 137)),
        FixturePage::new("shadow").with_node(shadow_host(
            "host-1",
            vec![FixtureNode::new("div").with_child(FixtureNode::file_input().with_key("target"))],
        )),
        FixturePage::new("iframe").with_node(iframe_host(
            "frame-1",
            false,
            vec![FixtureNode::new("input").with_attr("name", "doc").with_key("target")],
        )),
        FixturePage::new("slotted").with_node(slotted("slot-host", FixtureNode::file_input().with_key("target"))),
        portal_page,
    ]
}

#[cfg(any(test, feature = "proptest"))]
fn anonymous(tag: &str, classes: Option<&str>) -> FixtureNode {
    let node = FixtureNode::new(tag);
    match classes {
        Some(c) => node.with_attr("class", c),
        None => node,
    }
}

/// Tag names for anonymous elements
#[cfg(any(test, feature = "proptest"))]
pub fn arb_tag() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["div", "span", "section", "p", "ul", "li", "button"])
}

/// Optional class lists, sometimes shared between siblings
#[cfg(any(test, feature = "proptest"))]
pub fn arb_classes() -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(prop::sample::select(vec!["a", "b", "a b", "card", "card wide"]))
}

/// Random tree of anonymous elements
#[cfg(any(test, feature = "proptest"))]
pub fn arb_anonymous_tree() -> impl Strategy<Value = FixtureNode> {
    let leaf = (arb_tag(), arb_classes()).prop_map(|(tag, classes)| anonymous(tag, classes));
    leaf.prop_recursive(4, 64, 6, |inner| {
        (arb_tag(), arb_classes(), prop::collection::vec(inner, 0..6)).prop_map(|(tag, classes, children)| {
            let mut node = anonymous(tag, classes);
            node.children = children;
            node
        })
    })
}

/// Random page of anonymous trees
#[cfg(any(test, feature = "proptest"))]
pub fn arb_anonymous_page() -> impl Strategy<Value = FixturePage> {
    prop::collection::vec(arb_anonymous_tree(), 1..4).prop_map(|body| FixturePage {
        title: "generated".to_string(),
        body,
    })
}

/// Random page whose last body child is a shadow host or same-origin
/// iframe holding anonymous trees
#[cfg(any(test, feature = "proptest"))]
pub fn arb_nested_page() -> impl Strategy<Value = FixturePage> {
    (
        arb_anonymous_page(),
        prop::collection::vec(arb_anonymous_tree(), 1..3),
        any::<bool>(),
    )
        .prop_map(|(page, inner, use_frame)| {
            let container = if use_frame {
                iframe_host("frame-p", false, inner)
            } else {
                shadow_host("host-p", inner)
            };
            page.with_node(container)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::augment::augment;
    use crate::dom::{Dom, NodeId};
    use crate::locator::LocatorForm;
    use crate::synth::synthesize;

    fn nested_elements(dom: &Dom) -> Vec<NodeId> {
        let mut out = Vec::new();
        for host in dom.descendants(dom.document()) {
            if let Some(root) = dom.shadow_root(host) {
                out.extend(dom.descendants(root));
            }
            if let Ok(Some(doc)) = dom.content_document(host) {
                out.extend(dom.descendants(doc));
            }
        }
        out
    }

    #[test]
    fn test_standard_pages_build_with_targets() {
        for page in standard_pages() {
            let dom = page.build().unwrap();
            assert!(dom.by_key("target").is_some(), "{} has no target", page.title);
        }
    }

    #[test]
    fn test_deep_page_id_short_circuits_depth() {
        let dom = standard_pages()[0].build().unwrap();
        let target = dom.by_key("target").unwrap();
        assert_eq!(synthesize(&dom, Some(target), dom.document()).expression(), r#"//*[@id="x"]"#);
    }

    mod proptest_tests {
        use super::*;

        proptest! {
            #[test]
            fn prop_structural_path_identifies_original(page in arb_anonymous_page()) {
                let dom = page.build().unwrap();
                for node in dom.descendants(dom.document()) {
                    let locator = synthesize(&dom, Some(node), dom.document());
                    prop_assert!(!locator.expression().is_empty());
                    prop_assert_eq!(locator.resolve(&dom, dom.document()), Some(node));
                }
            }

            #[test]
            fn prop_id_always_wins(page in arb_anonymous_page(), pick in any::<prop::sample::Index>()) {
                let mut dom = page.build().unwrap();
                let nodes = dom.descendants(dom.document());
                let node = nodes[pick.index(nodes.len())];
                dom.set_attribute(node, "id", "picked").unwrap();
                let locator = synthesize(&dom, Some(node), dom.document());
                prop_assert_eq!(locator.expression(), r#"//*[@id="picked"]"#.to_string());
            }

            #[test]
            fn prop_top_level_never_scripted(page in arb_anonymous_page()) {
                let dom = page.build().unwrap();
                for node in dom.descendants(dom.document()) {
                    let positioned = augment(&dom, Some(node), dom.document(), None);
                    prop_assert_eq!(positioned.form(), LocatorForm::XPath);
                    prop_assert!(positioned.rendered().starts_with("XPath: "));
                }
            }

            #[test]
            fn prop_nested_always_scripted_and_executable(page in arb_nested_page()) {
                let dom = page.build().unwrap();
                for node in nested_elements(&dom) {
                    let context = dom.scope_of(node).unwrap();
                    let positioned = augment(&dom, Some(node), context, None);
                    prop_assert_eq!(positioned.form(), LocatorForm::JavaScript);
                    prop_assert!(positioned.rendered().starts_with("JavaScript: document."));
                    let chain = positioned.script_chain().unwrap();
                    prop_assert_eq!(chain.resolve(&dom), Some(node));
                    prop_assert_eq!(positioned.locator().resolve(&dom, context), Some(node));
                }
            }
        }
    }
}
