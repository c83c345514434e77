// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result};
use std::rc::Rc;

use crate::util::bit_vec::Idx;

/// The abstract object standing for every runtime object created at one
/// allocation site. Only meaningful together with the `SiteCache` that
/// produced it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl Idx for NodeId {
    #[inline]
    fn new(idx: usize) -> Self {
        NodeId(u32::new(idx))
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Interns allocation-site labels (e.g. source lines) into dense `NodeId`s.
#[derive(Debug, Default, Clone)]
pub struct SiteCache {
    site_list: Vec<Rc<str>>,
    site_to_index_map: HashMap<Rc<str>, NodeId>,
}

impl SiteCache {
    pub fn new() -> SiteCache {
        SiteCache {
            site_list: Vec::new(),
            site_to_index_map: HashMap::new(),
        }
    }

    /// Returns the node for `label`, creating it on first use.
    pub fn get_node_id(&mut self, label: &str) -> NodeId {
        if let Some(id) = self.site_to_index_map.get(label) {
            *id
        } else {
            let id = NodeId::new(self.site_list.len());
            let label: Rc<str> = Rc::from(label);
            self.site_list.push(label.clone());
            self.site_to_index_map.insert(label, id);
            id
        }
    }

    /// Looks up an already interned label.
    pub fn find_node_id(&self, label: &str) -> Option<NodeId> {
        self.site_to_index_map.get(label).copied()
    }

    /// Returns the label a node was interned from.
    pub fn site_label(&self, id: NodeId) -> Option<&str> {
        self.site_list.get(id.index()).map(|label| &**label)
    }

    /// Wraps a node so that it prints as its site label.
    pub fn display(&self, id: NodeId) -> SiteDisplay<'_> {
        SiteDisplay { sites: self, id }
    }

    pub fn len(&self) -> usize {
        self.site_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.site_list.is_empty()
    }
}

pub struct SiteDisplay<'a> {
    sites: &'a SiteCache,
    id: NodeId,
}

impl Display for SiteDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.sites.site_label(self.id) {
            Some(label) => write!(f, "({})", label),
            None => write!(f, "{:?}", self.id),
        }
    }
}
