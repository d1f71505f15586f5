//! DOM construction and node helpers.
//!
//! Parsing and the attribute accessors follow the substrate conventions:
//! nodes are shared `Handle`s owned by the document, and helpers only borrow
//! them. Attribute writing returns a `Result` because callers may hold stale
//! handles to nodes that no longer support the operation.

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, TendrilSink};
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use super::error::DomError;

/// Parses HTML bytes into a DOM, honoring the declared document encoding.
pub fn html_to_dom(data: &[u8], document_encoding: String) -> RcDom {
    let s: String;

    if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        s = string.to_string();
    } else {
        s = String::from_utf8_lossy(data).to_string();
    }

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .unwrap()
}

/// Creates a detached element node in `dom`.
pub fn new_element(dom: &RcDom, name: &str, attributes: &[(&str, &str)]) -> Handle {
    create_element(
        dom,
        QualName::new(None, ns!(html), LocalName::from(name)),
        attributes
            .iter()
            .map(|(attr_name, attr_value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*attr_name)),
                value: format_tendril!("{}", attr_value),
            })
            .collect(),
    )
}

/// Creates a detached text node.
pub fn new_text(content: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: std::cell::RefCell::new(format_tendril!("{}", content)),
    })
}

/// Returns the tag name of an element node.
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Returns the first child element with the given tag name.
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// Returns an attribute value of an element node.
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// Sets (or, with `None`, removes) an attribute on an element node.
///
/// Fails with `InvalidStateError` when the handle does not refer to an
/// element, which is what a caller holding a stale reference observes.
pub fn set_attr(node: &Handle, attr_name: &str, attr_value: Option<&str>) -> Result<(), DomError> {
    let NodeData::Element { ref attrs, .. } = node.data else {
        return Err(DomError::InvalidState(format!(
            "Cannot set attribute '{attr_name}' on a non-element node."
        )));
    };

    let attrs_mut = &mut attrs.borrow_mut();
    let mut i = 0;
    let mut found_existing_attr: bool = false;

    while i < attrs_mut.len() {
        if &attrs_mut[i].name.local == attr_name {
            found_existing_attr = true;

            if let Some(attr_value) = attr_value {
                attrs_mut[i].value.clear();
                attrs_mut[i].value.push_slice(attr_value);
            } else {
                // Remove attr completely if attr_value is not defined
                attrs_mut.remove(i);
                continue;
            }
        }

        i += 1;
    }

    if !found_existing_attr {
        // Add new attribute (since originally the target node didn't have it)
        if let Some(attr_value) = attr_value {
            let name = LocalName::from(attr_name);

            attrs_mut.push(Attribute {
                name: QualName::new(None, ns!(), name),
                value: format_tendril!("{}", attr_value),
            });
        }
    }

    Ok(())
}

/// Concatenated content of every text node under `node`, inclusive.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { ref contents } = node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Visits `node` and every descendant, depth-first.
pub fn for_each_node(node: &Handle, visit: &mut dyn FnMut(&Handle)) {
    visit(node);
    let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
    for child in children {
        for_each_node(&child, visit);
    }
}

/// The observation root of a document: `body` when present, otherwise the
/// document element, otherwise the document node itself.
pub fn body_or_root(dom: &RcDom) -> Handle {
    if let Some(html) = get_child_node_by_name(&dom.document, "html") {
        if let Some(body) = get_child_node_by_name(&html, "body") {
            return body;
        }
        return html;
    }
    dom.document.clone()
}
