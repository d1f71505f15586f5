//! DOM serialization, used by diagnostics and structural test assertions.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

/// Serializes a whole document back to HTML.
pub fn serialize_document(dom: &RcDom) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .expect("Unable to serialize DOM into buffer");
    String::from_utf8_lossy(&buf).to_string()
}

/// Serializes one node including its own tag, for subtree snapshots.
pub fn serialize_node(node: &Handle) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    serialize(
        &mut buf,
        &serializable,
        SerializeOpts {
            traversal_scope: TraversalScope::IncludeNode,
            ..SerializeOpts::default()
        },
    )
    .expect("Unable to serialize DOM into buffer");
    String::from_utf8_lossy(&buf).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tree::{body_or_root, get_child_node_by_name, html_to_dom};

    #[test]
    fn node_snapshot_includes_the_node_itself() {
        let dom = html_to_dom(
            b"<html><body><div id=\"r\"><span>Hello</span></div></body></html>",
            "utf-8".to_string(),
        );
        let body = body_or_root(&dom);
        let div = get_child_node_by_name(&body, "div").unwrap();
        assert_eq!(serialize_node(&div), "<div id=\"r\"><span>Hello</span></div>");
    }
}
