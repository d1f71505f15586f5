//! Raw structural primitives of the DOM substrate.
//!
//! These functions implement the standard, *unforgiving* contract: callers
//! whose view of the tree is stale get a [`DomError`] with browser-phrased
//! messages. The guard layer wraps exactly these operations; its captured
//! "originals" are the functions in this module.
//!
//! Every landed mutation is reported to the change-notification feed in
//! [`super::observer`].

use std::rc::Rc;

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};

use super::error::DomError;
use super::observer;

/// Position of `child` within `parent`'s child list, by node identity.
pub fn position_of(parent: &Handle, child: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|c| Rc::ptr_eq(c, child))
}

/// Returns the parent of `node`, restoring the weak link afterwards.
pub fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

/// True when `node` is `root` or a descendant of it (inclusive containment,
/// same as the platform's `Node.contains`).
pub fn contains(root: &Handle, node: &Handle) -> bool {
    let mut cursor = Some(node.clone());
    while let Some(current) = cursor {
        if Rc::ptr_eq(root, &current) {
            return true;
        }
        cursor = parent_of(&current);
    }
    false
}

/// Detaches `node` from its current parent, if any, reporting the removal.
fn detach(node: &Handle) {
    if let Some(parent) = parent_of(node) {
        if let Some(position) = position_of(&parent, node) {
            parent.children.borrow_mut().remove(position);
            node.parent.set(None);
            observer::queue_child_list(&parent, Vec::new(), vec![node.clone()]);
        }
    }
}

/// Removes `child` from `parent`.
///
/// Fails with `NotFoundError` when `child` is not currently a child of
/// `parent` — the stale-reference case the guard layer exists to absorb.
pub fn remove_child(parent: &Handle, child: &Handle) -> Result<Handle, DomError> {
    let position = position_of(parent, child)
        .ok_or_else(|| DomError::not_a_child("removeChild", "The node to be removed"))?;
    parent.children.borrow_mut().remove(position);
    child.parent.set(None);
    observer::queue_child_list(parent, Vec::new(), vec![child.clone()]);
    Ok(child.clone())
}

/// Appends `node` as the last child of `parent`, detaching it from any
/// previous parent first (standard move semantics).
pub fn append_child(parent: &Handle, node: &Handle) -> Result<Handle, DomError> {
    if contains(node, parent) {
        return Err(DomError::hierarchy(
            "appendChild",
            "The new child element contains the parent.",
        ));
    }
    detach(node);
    parent.children.borrow_mut().push(node.clone());
    node.parent.set(Some(Rc::downgrade(parent)));
    observer::queue_child_list(parent, vec![node.clone()], Vec::new());
    Ok(node.clone())
}

/// Inserts `node` into `parent` before `reference`.
///
/// A missing reference is an error here; degrading it to an append is the
/// guard layer's policy, not the substrate's.
pub fn insert_before(
    parent: &Handle,
    node: &Handle,
    reference: Option<&Handle>,
) -> Result<Handle, DomError> {
    let Some(reference) = reference else {
        return append_child(parent, node);
    };
    if contains(node, parent) {
        return Err(DomError::hierarchy(
            "insertBefore",
            "The new child element contains the parent.",
        ));
    }
    if position_of(parent, reference).is_none() {
        return Err(DomError::not_a_child(
            "insertBefore",
            "The node before which the new node is to be inserted",
        ));
    }
    detach(node);
    // Recompute after the detach: removing `node` from this same parent may
    // have shifted the reference position.
    let position = position_of(parent, reference)
        .ok_or_else(|| DomError::not_a_child("insertBefore", "The reference node"))?;
    parent.children.borrow_mut().insert(position, node.clone());
    node.parent.set(Some(Rc::downgrade(parent)));
    observer::queue_child_list(parent, vec![node.clone()], Vec::new());
    Ok(node.clone())
}

/// Replaces `old_child` with `new_child` inside `parent`.
pub fn replace_child(
    parent: &Handle,
    new_child: &Handle,
    old_child: &Handle,
) -> Result<Handle, DomError> {
    if position_of(parent, old_child).is_none() {
        return Err(DomError::not_a_child(
            "replaceChild",
            "The node to be replaced",
        ));
    }
    if contains(new_child, parent) {
        return Err(DomError::hierarchy(
            "replaceChild",
            "The new child element contains the parent.",
        ));
    }
    detach(new_child);
    let position = position_of(parent, old_child)
        .ok_or_else(|| DomError::not_a_child("replaceChild", "The node to be replaced"))?;
    {
        let mut children = parent.children.borrow_mut();
        children[position] = new_child.clone();
    }
    old_child.parent.set(None);
    new_child.parent.set(Some(Rc::downgrade(parent)));
    observer::queue_child_list(parent, vec![new_child.clone()], vec![old_child.clone()]);
    Ok(old_child.clone())
}

/// Overwrites the content of a text node, reporting the previous value.
pub fn set_text(node: &Handle, value: &str) -> Result<(), DomError> {
    let NodeData::Text { ref contents } = node.data else {
        return Err(DomError::InvalidState(
            "Cannot set character data on a non-text node.".to_string(),
        ));
    };
    let old_value = contents.borrow().to_string();
    {
        let mut contents = contents.borrow_mut();
        contents.clear();
        contents.push_slice(value);
    }
    observer::queue_character_data(node, &old_value);
    Ok(())
}

/// Coalesces adjacent text nodes and drops empty ones, recursively.
///
/// This is the substrate's plain `normalize`; the guard layer decides when
/// it must *not* run.
pub fn normalize(node: &Handle) -> Result<(), DomError> {
    let mut index = 0;
    loop {
        let child = node.children.borrow().get(index).cloned();
        let Some(child) = child else {
            break;
        };
        match child.data {
            NodeData::Text { ref contents } => {
                if contents.borrow().is_empty() {
                    remove_child(node, &child)?;
                    continue;
                }
                // Merge every directly following text sibling into this one.
                loop {
                    let next = node.children.borrow().get(index + 1).cloned();
                    let Some(next) = next else {
                        break;
                    };
                    let NodeData::Text { contents: ref next_contents } = next.data else {
                        break;
                    };
                    let merged: StrTendril = next_contents.borrow().clone();
                    let old_value = contents.borrow().to_string();
                    contents.borrow_mut().push_tendril(&merged);
                    observer::queue_character_data(&child, &old_value);
                    remove_child(node, &next)?;
                }
                index += 1;
            }
            NodeData::Element { .. } | NodeData::Document => {
                normalize(&child)?;
                index += 1;
            }
            _ => index += 1,
        }
    }
    Ok(())
}
