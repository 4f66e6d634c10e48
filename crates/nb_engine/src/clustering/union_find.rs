/// Index-backed disjoint-set forest with union by rank and path compression.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    /// `len` singleton sets, `0..len`.
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `x`'s set. Panics when `x` is not tracked.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merges the sets holding `a` and `b`. Returns the surviving root, or
    /// `None` when both were already in one set.
    pub fn union(&mut self, a: usize, b: usize) -> Option<usize> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return None;
        }
        let root = match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => {
                self.parent[ra] = rb;
                rb
            }
            std::cmp::Ordering::Greater => {
                self.parent[rb] = ra;
                ra
            }
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
                ra
            }
        };
        Some(root)
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// All sets, each sorted ascending, ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot_for_root = vec![usize::MAX; self.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for x in 0..self.len() {
            let root = self.find(x);
            if slot_for_root[root] == usize::MAX {
                slot_for_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_for_root[root]].push(x);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_as_singletons() {
        let mut set = DisjointSet::new(3);
        assert_eq!(set.groups(), vec![vec![0], vec![1], vec![2]]);
        assert!(!set.connected(0, 1));
    }

    #[test]
    fn test_union_is_transitive() {
        let mut set = DisjointSet::new(5);
        assert!(set.union(0, 3).is_some());
        assert!(set.union(3, 4).is_some());
        assert!(set.union(0, 4).is_none());
        assert!(set.connected(0, 4));
        assert_eq!(set.groups(), vec![vec![0, 3, 4], vec![1], vec![2]]);
    }

    #[test]
    fn test_partition_ignores_union_order() {
        let pairs = [(0, 1), (2, 3), (1, 2), (5, 6)];
        let mut forward = DisjointSet::new(7);
        let mut backward = DisjointSet::new(7);
        for &(a, b) in &pairs {
            forward.union(a, b);
        }
        for &(a, b) in pairs.iter().rev() {
            backward.union(b, a);
        }
        assert_eq!(forward.groups(), backward.groups());
    }

    #[test]
    fn test_empty() {
        let mut set = DisjointSet::new(0);
        assert!(set.is_empty());
        assert!(set.groups().is_empty());
    }
}
