//! Host DOM substrate.
//!
//! This module owns everything the guard layer treats as "the platform":
//! parsing, serialization, node helpers, the raw structural primitives with
//! their standard erroring contract, and the change-notification feed.
//!
//! The five structural operations are reachable through the [`DomApi`]
//! trait, which is the substrate's single access point for tree mutation.
//! Interception works by swapping the implementation behind that access
//! point — a proxy that still delegates to the functions in [`raw`] — so the
//! originals stay reachable for as long as the page lives.

pub mod error;
pub mod observer;
pub mod raw;
pub mod serialize;
pub mod tree;

pub use error::DomError;
pub use markup5ever_rcdom::{Handle, RcDom, WeakHandle};
pub use observer::{MutationObserver, MutationRecord, ObserveOptions};
pub use serialize::{serialize_document, serialize_node};
pub use tree::{
    body_or_root, get_child_node_by_name, get_node_attr, get_node_name, html_to_dom, new_element,
    new_text, set_attr, text_content,
};

/// The five intercepted structural primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    RemoveChild,
    InsertBefore,
    ReplaceChild,
    AppendChild,
    Normalize,
}

impl Primitive {
    /// The platform-facing name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::RemoveChild => "removeChild",
            Primitive::InsertBefore => "insertBefore",
            Primitive::ReplaceChild => "replaceChild",
            Primitive::AppendChild => "appendChild",
            Primitive::Normalize => "normalize",
        }
    }

    /// All intercepted primitives, in a stable order.
    pub const ALL: [Primitive; 5] = [
        Primitive::RemoveChild,
        Primitive::InsertBefore,
        Primitive::ReplaceChild,
        Primitive::AppendChild,
        Primitive::Normalize,
    ];
}

/// Access point for the structural mutation primitives.
///
/// `identity` returns a textual marker for each operation, mirroring how a
/// page can stringify a (possibly patched) platform function to tell what is
/// currently installed.
pub trait DomApi {
    fn remove_child(&self, parent: &Handle, child: &Handle) -> Result<Handle, DomError>;
    fn insert_before(
        &self,
        parent: &Handle,
        node: &Handle,
        reference: Option<&Handle>,
    ) -> Result<Handle, DomError>;
    fn replace_child(
        &self,
        parent: &Handle,
        new_child: &Handle,
        old_child: &Handle,
    ) -> Result<Handle, DomError>;
    fn append_child(&self, parent: &Handle, node: &Handle) -> Result<Handle, DomError>;
    fn normalize(&self, node: &Handle) -> Result<(), DomError>;
    fn identity(&self, primitive: Primitive) -> String;
}

/// The unpatched access point: straight delegation to [`raw`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RawDom;

impl DomApi for RawDom {
    fn remove_child(&self, parent: &Handle, child: &Handle) -> Result<Handle, DomError> {
        raw::remove_child(parent, child)
    }

    fn insert_before(
        &self,
        parent: &Handle,
        node: &Handle,
        reference: Option<&Handle>,
    ) -> Result<Handle, DomError> {
        raw::insert_before(parent, node, reference)
    }

    fn replace_child(
        &self,
        parent: &Handle,
        new_child: &Handle,
        old_child: &Handle,
    ) -> Result<Handle, DomError> {
        raw::replace_child(parent, new_child, old_child)
    }

    fn append_child(&self, parent: &Handle, node: &Handle) -> Result<Handle, DomError> {
        raw::append_child(parent, node)
    }

    fn normalize(&self, node: &Handle) -> Result<(), DomError> {
        raw::normalize(node)
    }

    fn identity(&self, primitive: Primitive) -> String {
        format!("function {}() {{ [native code] }}", primitive.name())
    }
}
