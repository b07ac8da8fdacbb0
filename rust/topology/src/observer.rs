// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notifications for code that mirrors the topology.
//!
//! Observers are registered with [`Topology::subscribe`] and are invoked
//! synchronously, in subscription order, every time a vertex, edge or face
//! is created, modified or deleted. They receive a shared reference to the
//! topology, so they can read any element but cannot mutate the topology
//! from inside a callback. Nested mutation is therefore ruled out at
//! compile time.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::arena::Topology;
use crate::keys::TopologyKey;

/// What happened to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Created,
    Modified,
    Deleted,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Created => "created",
            Action::Modified => "modified",
            Action::Deleted => "deleted",
        })
    }
}

/// A single change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub action: Action,
    pub element: TopologyKey,
}

/// Receiver of topology change notifications.
///
/// Deletions are announced while the element is still in the arena, so an
/// observer can read its data one last time.
pub trait TopologyObserver {
    fn on_created(&mut self, _topology: &Topology, _element: TopologyKey) {}
    fn on_modified(&mut self, _topology: &Topology, _element: TopologyKey) {}
    fn on_deleted(&mut self, _topology: &Topology, _element: TopologyKey) {}

    /// Routes a notification to the matching callback.
    fn notify(&mut self, topology: &Topology, notification: Notification) {
        match notification.action {
            Action::Created => self.on_created(topology, notification.element),
            Action::Modified => self.on_modified(topology, notification.element),
            Action::Deleted => self.on_deleted(topology, notification.element),
        }
    }
}

/// Handle returned by [`Topology::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl Topology {
    /// Registers an observer. Observers are notified in subscription order.
    pub fn subscribe(&mut self, observer: Rc<RefCell<dyn TopologyObserver>>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Invokes every observer with `{action, element}`.
    ///
    /// An observer that is already mutably borrowed elsewhere (for example
    /// the host holds a `borrow_mut` across a topology call) is skipped with
    /// a warning rather than panicking.
    pub fn notify(&self, action: Action, element: impl Into<TopologyKey>) {
        let notification = Notification {
            action,
            element: element.into(),
        };
        tracing::trace!(
            %action,
            element = ?self.element_id(notification.element),
            "notify"
        );
        for (id, observer) in &self.observers {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.notify(self, notification),
                Err(_) => tracing::warn!(
                    observer = ?id,
                    %action,
                    "observer is busy, notification dropped"
                ),
            }
        }
    }
}
