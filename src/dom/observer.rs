//! Change-notification feed of the DOM substrate.
//!
//! The raw structural primitives queue a [`MutationRecord`] for every landed
//! mutation; observers receive them later, in batches, via
//! [`MutationObserver::take_records`]. Delivery is therefore always
//! after-the-fact: by the time a record is seen the tree has already changed.
//!
//! Registration is scoped to the current thread, which is the substrate's
//! analogue of a single page realm. There is no unsubscription; an observer
//! stays registered for the lifetime of the realm.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use super::raw;

/// What a [`MutationObserver`] wants to be notified about.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObserveOptions {
    /// Notify about added/removed children of the target.
    pub child_list: bool,
    /// Extend `child_list` and `character_data` to the whole subtree.
    pub subtree: bool,
    /// Notify about text content changes.
    pub character_data: bool,
    /// Include the previous text in character-data records.
    pub character_data_old_value: bool,
}

impl ObserveOptions {
    /// The full-subtree configuration used for reconciliation observers.
    pub fn subtree_with_text() -> ObserveOptions {
        ObserveOptions {
            child_list: true,
            subtree: true,
            character_data: true,
            character_data_old_value: true,
        }
    }
}

/// One landed mutation, as reported by the substrate.
#[derive(Clone)]
pub enum MutationRecord {
    /// Children were added to and/or removed from `target`.
    ChildList {
        target: Handle,
        added_nodes: Vec<Handle>,
        removed_nodes: Vec<Handle>,
    },
    /// The text content of `target` changed.
    CharacterData {
        target: Handle,
        /// Previous content, present when the observer asked for it.
        old_value: Option<String>,
    },
}

struct ObserverState {
    target: Handle,
    options: ObserveOptions,
    queue: RefCell<VecDeque<MutationRecord>>,
}

impl ObserverState {
    fn watches(&self, node: &Handle) -> bool {
        Rc::ptr_eq(&self.target, node) || (self.options.subtree && raw::contains(&self.target, node))
    }
}

thread_local! {
    static REGISTRY: RefCell<Vec<Rc<ObserverState>>> = RefCell::new(Vec::new());
}

/// Handle to one registered change-notification subscription.
pub struct MutationObserver {
    state: Rc<ObserverState>,
}

impl MutationObserver {
    /// Registers a new observer on `target` and returns its handle.
    pub fn observe(target: &Handle, options: ObserveOptions) -> MutationObserver {
        let state = Rc::new(ObserverState {
            target: target.clone(),
            options,
            queue: RefCell::new(VecDeque::new()),
        });
        REGISTRY.with(|registry| registry.borrow_mut().push(state.clone()));
        MutationObserver { state }
    }

    /// Drains and returns every record queued since the last call.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        self.state.queue.borrow_mut().drain(..).collect()
    }

    /// Number of records currently queued.
    pub fn pending(&self) -> usize {
        self.state.queue.borrow().len()
    }
}

/// Queues a child-list record with every observer watching `target`.
pub(crate) fn queue_child_list(target: &Handle, added: Vec<Handle>, removed: Vec<Handle>) {
    REGISTRY.with(|registry| {
        for observer in registry.borrow().iter() {
            if observer.options.child_list && observer.watches(target) {
                observer.queue.borrow_mut().push_back(MutationRecord::ChildList {
                    target: target.clone(),
                    added_nodes: added.clone(),
                    removed_nodes: removed.clone(),
                });
            }
        }
    });
}

/// Queues a character-data record with every observer watching `target`.
pub(crate) fn queue_character_data(target: &Handle, old_value: &str) {
    REGISTRY.with(|registry| {
        for observer in registry.borrow().iter() {
            if observer.options.character_data && observer.watches(target) {
                let old_value = observer
                    .options
                    .character_data_old_value
                    .then(|| old_value.to_string());
                observer
                    .queue
                    .borrow_mut()
                    .push_back(MutationRecord::CharacterData {
                        target: target.clone(),
                        old_value,
                    });
            }
        }
    });
}
