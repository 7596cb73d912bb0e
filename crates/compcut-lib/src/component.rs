//! Connected components of the k-mer graph
//!
//! A component holds its members directly while it is small. Once a
//! traversal finds it larger than the size bound it switches to an
//! [`ComponentBody::Overflowed`] body: the member list is dropped and only a
//! derived [`VertexIndex`] of the vertices surviving the next frequency
//! threshold is kept for further refinement.

use crate::index::VertexIndex;
use std::cmp::Ordering;

/// Storage of a component's vertices
#[derive(Debug, Clone)]
pub enum ComponentBody {
    /// Member k-mer codes in discovery order
    Members(Vec<u64>),
    /// Sub-index seeding the next refinement round
    Overflowed(VertexIndex),
}

/// A connected component of the k-mer graph
#[derive(Debug, Clone)]
pub struct ConnectedComponent {
    /// 1-based ordinal, 0 if not assigned yet
    pub id: u32,
    /// Number of k-mers (may exceed the member count once overflowed)
    pub size: u64,
    /// Sum of the original frequencies of all added k-mers
    pub weight: u64,
    /// Frequency threshold active when the component was formed (0 if none)
    pub used_freq_threshold: u32,
    body: ComponentBody,
}

impl Default for ConnectedComponent {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ConnectedComponent {
    /// Create an empty component formed at the given threshold
    pub fn new(used_freq_threshold: u32) -> Self {
        Self {
            id: 0,
            size: 0,
            weight: 0,
            used_freq_threshold,
            body: ComponentBody::Members(Vec::new()),
        }
    }

    /// Build a component from a list of members and a known weight
    pub fn from_members(members: Vec<u64>, weight: u64) -> Self {
        Self {
            id: 0,
            size: members.len() as u64,
            weight,
            used_freq_threshold: 0,
            body: ComponentBody::Members(members),
        }
    }

    /// Add a k-mer with its frequency
    ///
    /// On an overflowed component only the counters are updated.
    #[inline]
    pub fn add(&mut self, kmer: u64, weight: u64) {
        if let ComponentBody::Members(members) = &mut self.body {
            members.push(kmer);
        }
        self.size += 1;
        self.weight += weight;
    }

    /// Add a k-mer without weight
    #[inline]
    pub fn add_unweighted(&mut self, kmer: u64) {
        self.add(kmer, 0);
    }

    /// Switch to the overflowed representation, dropping the member list
    ///
    /// Returns the members that were held so the caller can seed the derived
    /// index from them.
    pub fn overflow(&mut self, derived: VertexIndex) -> Vec<u64> {
        match std::mem::replace(&mut self.body, ComponentBody::Overflowed(derived)) {
            ComponentBody::Members(members) => members,
            ComponentBody::Overflowed(_) => Vec::new(),
        }
    }

    /// Body of the component
    pub fn body(&self) -> &ComponentBody {
        &self.body
    }

    /// Member codes, `None` once overflowed
    pub fn members(&self) -> Option<&[u64]> {
        match &self.body {
            ComponentBody::Members(members) => Some(members),
            ComponentBody::Overflowed(_) => None,
        }
    }

    /// Mutable access to the derived index of an overflowed component
    pub fn derived_index_mut(&mut self) -> Option<&mut VertexIndex> {
        match &mut self.body {
            ComponentBody::Overflowed(index) => Some(index),
            ComponentBody::Members(_) => None,
        }
    }

    /// Derived index of an overflowed component
    pub fn derived_index(&self) -> Option<&VertexIndex> {
        match &self.body {
            ComponentBody::Overflowed(index) => Some(index),
            ComponentBody::Members(_) => None,
        }
    }

    /// Take ownership of the derived index, leaving an empty member list
    pub fn take_derived_index(&mut self) -> Option<VertexIndex> {
        match std::mem::replace(&mut self.body, ComponentBody::Members(Vec::new())) {
            ComponentBody::Overflowed(index) => Some(index),
            members => {
                self.body = members;
                None
            }
        }
    }

    /// Whether the component switched to the derived index
    pub fn is_overflowed(&self) -> bool {
        matches!(self.body, ComponentBody::Overflowed(_))
    }

    /// Significance ordering: ascending threshold, then descending weight,
    /// then descending size
    pub fn significance_cmp(&self, other: &Self) -> Ordering {
        self.used_freq_threshold
            .cmp(&other.used_freq_threshold)
            .then_with(|| other.weight.cmp(&self.weight))
            .then_with(|| other.size.cmp(&self.size))
    }
}

/// Sort components by significance (see [`ConnectedComponent::significance_cmp`])
pub fn sort_by_significance(components: &mut [ConnectedComponent]) {
    components.sort_by(ConnectedComponent::significance_cmp);
}

/// Assign 1-based ordinals in list order
pub fn assign_ids(components: &mut [ConnectedComponent]) {
    for (i, component) in components.iter_mut().enumerate() {
        component.id = (i + 1) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_overflow() {
        let mut comp = ConnectedComponent::new(1);
        comp.add(10, 5);
        comp.add(11, 3);
        assert_eq!(comp.size, 2);
        assert_eq!(comp.weight, 8);
        assert_eq!(comp.members(), Some(&[10u64, 11][..]));
        assert!(!comp.is_overflowed());

        let held = comp.overflow(VertexIndex::new());
        assert_eq!(held, vec![10, 11]);
        assert!(comp.is_overflowed());
        assert!(comp.members().is_none());

        comp.add(12, 2);
        assert_eq!(comp.size, 3);
        assert_eq!(comp.weight, 10);

        comp.derived_index_mut().unwrap().insert(12, 2);
        let derived = comp.take_derived_index().unwrap();
        assert_eq!(derived.len(), 1);
        assert!(!comp.is_overflowed());
    }

    #[test]
    fn test_take_derived_index_on_small_component() {
        let mut comp = ConnectedComponent::from_members(vec![1, 2, 3], 6);
        assert!(comp.take_derived_index().is_none());
        assert_eq!(comp.members(), Some(&[1u64, 2, 3][..]));
    }

    #[test]
    fn test_significance_order() {
        let mut a = ConnectedComponent::from_members(vec![1, 2], 10);
        a.used_freq_threshold = 2;
        let mut b = ConnectedComponent::from_members(vec![3, 4, 5], 10);
        b.used_freq_threshold = 1;
        let mut c = ConnectedComponent::from_members(vec![6], 10);
        c.used_freq_threshold = 1;
        let mut d = ConnectedComponent::from_members(vec![7], 30);
        d.used_freq_threshold = 1;

        let mut comps = vec![a, b, c, d];
        sort_by_significance(&mut comps);
        assign_ids(&mut comps);

        let order: Vec<(u32, u64, u64)> = comps
            .iter()
            .map(|c| (c.used_freq_threshold, c.weight, c.size))
            .collect();
        assert_eq!(order, vec![(1, 30, 1), (1, 10, 3), (1, 10, 1), (2, 10, 2)]);
        assert_eq!(comps.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
