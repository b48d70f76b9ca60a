// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, ViewId};
use super::store::ViewStore;

/// An iterator over the direct children of a view, front to back.
///
/// Created by [`ViewStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a ViewStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a ViewStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ViewId;

    fn next(&mut self) -> Option<ViewId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// A pre-order iterator over a view and all of its descendants.
///
/// Created by [`ViewStore::descendants`]. Parents are yielded before their
/// children, and siblings in front-to-back order.
#[derive(Debug)]
pub struct Descendants<'a> {
    store: &'a ViewStore,
    root: u32,
    current: u32,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(store: &'a ViewStore, root: u32) -> Self {
        Self {
            store,
            root,
            current: root,
        }
    }
}

impl Iterator for Descendants<'_> {
    type Item = ViewId;

    fn next(&mut self) -> Option<ViewId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        let store = self.store;

        self.current = if store.first_child[idx as usize] != INVALID {
            store.first_child[idx as usize]
        } else {
            // Climb until a next sibling exists, never leaving the root.
            let mut up = idx;
            loop {
                if up == self.root {
                    break INVALID;
                }
                let next = store.next_sibling[up as usize];
                if next != INVALID {
                    break next;
                }
                up = store.parent[up as usize];
                if up == INVALID {
                    break INVALID;
                }
            }
        };
        Some(store.id_at(idx))
    }
}
