//! Connected components of a neighbour relation restricted to a vertex subset.

use std::cmp::Ordering;

use crate::neighbours::adjacency::AdjacencyRelation;

/// Disjoint-set forest with path halving and union by size.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        UnionFind { parent: (0..n).collect(), size: vec![1; n] }
    }

    #[inline]
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets of `a` and `b`; returns false if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}

/// Largest first, then by smallest member index.
#[inline]
fn component_order(a: &[usize], b: &[usize]) -> Ordering {
    b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first()))
}

/// Connected components over the particles with `active[p] == true`.
///
/// Only edges joining two active particles are followed. Each component is
/// sorted ascending; components come largest first, ties broken by the
/// smaller lowest member. Runs in O(V + E).
pub fn connected_components(relation: &AdjacencyRelation, active: &[bool]) -> Vec<Vec<usize>> {
    let n = relation.n_particles().min(active.len());
    let mut uf = UnionFind::new(n);
    for i in (0..n).filter(|&i| active[i]) {
        for &j in relation.neighbours_of(i) {
            if j > i && j < n && active[j] {
                uf.union(i, j);
            }
        }
    }

    // ascending scan keeps members sorted and orders roots by first member
    let mut slot = vec![usize::MAX; n];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for i in (0..n).filter(|&i| active[i]) {
        let root = uf.find(i);
        if slot[root] == usize::MAX {
            slot[root] = components.len();
            components.push(Vec::new());
        }
        components[slot[root]].push(i);
    }

    components.sort_by(|a, b| component_order(a, b));
    components
}

/// The largest connected component over the active particles, empty if none are active.
pub fn largest_component(relation: &AdjacencyRelation, active: &[bool]) -> Vec<usize> {
    connected_components(relation, active).into_iter().next().unwrap_or_default()
}
