use {
    bitvec::{bitvec, vec::BitVec},
    num::Zero,
    std::{cmp::Ordering, collections::BinaryHeap, iter::from_fn, ops::Add},
};

pub const INVALID_INDEX: u32 = u32::MAX;

/// An element in the open set of a search, sorted by cost.
pub struct OpenSetElement<V, C>(pub V, pub C);

impl<V, C: Eq> PartialEq for OpenSetElement<V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<V, C: Eq> Eq for OpenSetElement<V, C> {}

impl<V, C: Ord> PartialOrd for OpenSetElement<V, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, C: Ord> Ord for OpenSetElement<V, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse the cost ordering so that `BinaryHeap`, a max-heap, pops cheap elements first.
        other.1.cmp(&self.1)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum NodeStatus {
    #[default]
    Unvisited,
    Frontier,
    Settled,
}

#[cfg_attr(test, derive(Debug, PartialEq))]
#[derive(Clone, Copy)]
struct PredecessorLink {
    vertex: u32,
    next: u32,
}

/// The output of a run: per-vertex distances, statuses, and optimal predecessor sets.
///
/// Predecessor sets are singly-linked chains through one shared arena, so clearing the tree for
/// another run frees nothing.
#[cfg_attr(test, derive(Debug, PartialEq))]
#[derive(Clone)]
pub struct ShortestPathTree<C> {
    distances: Vec<Option<C>>,
    statuses: Vec<NodeStatus>,
    predecessor_heads: Vec<u32>,
    predecessor_links: Vec<PredecessorLink>,
    source: u32,
}

// Manual impl: the derive would demand `C: Default`, but no field holds a bare `C`.
impl<C> Default for ShortestPathTree<C> {
    fn default() -> Self {
        Self {
            distances: Vec::new(),
            statuses: Vec::new(),
            predecessor_heads: Vec::new(),
            predecessor_links: Vec::new(),
            source: u32::default(),
        }
    }
}

impl<C: Copy + Ord + Zero> ShortestPathTree<C> {
    pub fn vertex_count(&self) -> usize {
        self.statuses.len()
    }

    pub fn source(&self) -> u32 {
        self.source
    }

    pub fn distance(&self, vertex: u32) -> Option<C> {
        self.distances[vertex as usize]
    }

    pub fn status(&self, vertex: u32) -> NodeStatus {
        self.statuses[vertex as usize]
    }

    pub fn iter_predecessors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
        let mut link: u32 = self.predecessor_heads[vertex as usize];

        from_fn(move || {
            (link != INVALID_INDEX).then(|| {
                let predecessor_link: PredecessorLink = self.predecessor_links[link as usize];

                link = predecessor_link.next;

                predecessor_link.vertex
            })
        })
    }

    /// The smallest finite distance over `vertices`, with all vertices that attain it in
    /// iteration order. `None` when every queried vertex is unreachable.
    pub fn try_min_distance_and_vertices<I: IntoIterator<Item = u32>>(
        &self,
        vertices: I,
    ) -> Option<(C, Vec<u32>)> {
        let mut best: Option<(C, Vec<u32>)> = None;

        for vertex in vertices {
            if let Some(distance) = self.distance(vertex) {
                match &mut best {
                    Some((best_distance, best_vertices)) => {
                        if distance < *best_distance {
                            *best_distance = distance;
                            best_vertices.clear();
                            best_vertices.push(vertex);
                        } else if distance == *best_distance {
                            best_vertices.push(vertex);
                        }
                    }
                    None => best = Some((distance, vec![vertex])),
                }
            }
        }

        best
    }

    fn reset(&mut self, vertex_count: usize, source: u32) {
        self.distances.clear();
        self.distances.resize(vertex_count, None);
        self.statuses.clear();
        self.statuses.resize(vertex_count, NodeStatus::Unvisited);
        self.predecessor_heads.clear();
        self.predecessor_heads.resize(vertex_count, INVALID_INDEX);
        self.predecessor_links.clear();
        self.source = source;
        self.distances[source as usize] = Some(C::zero());
    }

    fn push_link(&mut self, vertex: u32, next: u32) -> u32 {
        let link: u32 = self.predecessor_links.len() as u32;

        self.predecessor_links.push(PredecessorLink { vertex, next });

        link
    }

    /// An improvement invalidates every predecessor found at the old distance. The old chain is
    /// left orphaned in the arena.
    fn replace_predecessors(&mut self, vertex: u32, predecessor: u32) {
        self.predecessor_heads[vertex as usize] = self.push_link(predecessor, INVALID_INDEX);
    }

    fn push_predecessor(&mut self, vertex: u32, predecessor: u32) {
        let head: u32 = self.predecessor_heads[vertex as usize];

        self.predecessor_heads[vertex as usize] = self.push_link(predecessor, head);
    }
}

/// Scratch allocations that survive across runs.
pub struct ShortestPathState<C> {
    open_set_heap: BinaryHeap<OpenSetElement<u32, C>>,
    neighbors: Vec<OpenSetElement<u32, C>>,
}

// Manual impl: the derive would demand `C: Default`, but no field holds a bare `C`. `C: Ord` is
// what `BinaryHeap::new` itself requires.
impl<C: Ord> Default for ShortestPathState<C> {
    fn default() -> Self {
        Self {
            open_set_heap: BinaryHeap::new(),
            neighbors: Vec::new(),
        }
    }
}

impl<C> ShortestPathState<C> {
    fn clear(&mut self) {
        self.open_set_heap.clear();
        self.neighbors.clear();
    }
}

/// A graph over dense `u32` vertex indices, searchable by Dijkstra's algorithm.
///
/// Edge costs must be strictly positive: settling a vertex assumes no later relaxation can tie
/// into it.
pub trait ShortestPathGraph {
    type Cost: Add<Output = Self::Cost> + Copy + Ord + Zero;

    fn vertex_count(&self) -> usize;

    fn source(&self) -> u32;

    /// Pushes each neighbor of `vertex` along with the cost of the edge from `vertex` to it.
    /// Implementations should clear `neighbors` before extending it.
    fn neighbors(&self, vertex: u32, neighbors: &mut Vec<OpenSetElement<u32, Self::Cost>>);

    /// Runs the search to exhaustion, settling every vertex reachable from the source. There is
    /// no early out: the resulting tree answers distance and predecessor queries for all
    /// vertices at once.
    fn run_internal(
        &self,
        state: &mut ShortestPathState<Self::Cost>,
        tree: &mut ShortestPathTree<Self::Cost>,
    ) {
        state.clear();
        tree.reset(self.vertex_count(), self.source());

        state
            .open_set_heap
            .push(OpenSetElement(tree.source, Self::Cost::zero()));
        tree.statuses[tree.source as usize] = NodeStatus::Frontier;

        while let Some(OpenSetElement(current, _)) = state.open_set_heap.pop() {
            if tree.statuses[current as usize] == NodeStatus::Settled {
                // A stale heap entry pushed before a later improvement.
                continue;
            }

            tree.statuses[current as usize] = NodeStatus::Settled;

            let source_to_current: Self::Cost = match tree.distances[current as usize] {
                Some(distance) => distance,
                None => continue,
            };

            self.neighbors(current, &mut state.neighbors);

            for OpenSetElement(neighbor, edge_cost) in state.neighbors.drain(..) {
                if tree.statuses[neighbor as usize] == NodeStatus::Settled {
                    continue;
                }

                let source_to_neighbor: Self::Cost = source_to_current + edge_cost;

                match tree.distances[neighbor as usize] {
                    Some(distance) if source_to_neighbor > distance => {}
                    Some(distance) if source_to_neighbor == distance => {
                        tree.push_predecessor(neighbor, current);
                    }
                    _ => {
                        tree.distances[neighbor as usize] = Some(source_to_neighbor);
                        tree.replace_predecessors(neighbor, current);
                        tree.statuses[neighbor as usize] = NodeStatus::Frontier;
                        state
                            .open_set_heap
                            .push(OpenSetElement(neighbor, source_to_neighbor));
                    }
                }
            }
        }
    }

    fn run(&self) -> ShortestPathTree<Self::Cost> {
        let mut tree: ShortestPathTree<Self::Cost> = ShortestPathTree::default();

        self.run_internal(&mut ShortestPathState::default(), &mut tree);

        tree
    }
}

/// Walks the predecessor sets of a tree backward from a set of seed vertices.
///
/// Seeds are typically the vertices tying for the best distance at a target, so unions and path
/// enumerations cover every optimal route at once.
pub struct PathReconstructor<'t, C> {
    tree: &'t ShortestPathTree<C>,
    seeds: &'t [u32],
}

impl<'t, C: Copy + Ord + Zero> PathReconstructor<'t, C> {
    pub fn new(tree: &'t ShortestPathTree<C>, seeds: &'t [u32]) -> Self {
        Self { tree, seeds }
    }

    /// The set of vertices lying on at least one optimal path from the source to a seed.
    pub fn visited_vertices(&self) -> BitVec {
        let mut visited: BitVec = bitvec![0; self.tree.vertex_count()];
        let mut stack: Vec<u32> = Vec::new();

        for &seed in self.seeds {
            if self.tree.status(seed) == NodeStatus::Settled && !visited[seed as usize] {
                visited.set(seed as usize, true);
                stack.push(seed);
            }
        }

        while let Some(vertex) = stack.pop() {
            for predecessor in self.tree.iter_predecessors(vertex) {
                if !visited[predecessor as usize] {
                    visited.set(predecessor as usize, true);
                    stack.push(predecessor);
                }
            }
        }

        visited
    }

    /// Lazily enumerates every optimal path, source first, one `Vec` per path. Paths are grouped
    /// by seed, in seed order.
    pub fn iter_paths(&self) -> PathIter<'t, C> {
        PathIter {
            tree: self.tree,
            seeds: self.seeds,
            seed_index: 0_usize,
            stack: Vec::new(),
        }
    }
}

struct PathFrame {
    vertex: u32,

    /// The index of the arena link that selected `vertex`, or `INVALID_INDEX` for a seed frame.
    link: u32,
}

/// Depth-first enumeration over the branching predecessor chains, using an explicit frame stack
/// rather than copying partial paths.
pub struct PathIter<'t, C> {
    tree: &'t ShortestPathTree<C>,
    seeds: &'t [u32],
    seed_index: usize,
    stack: Vec<PathFrame>,
}

impl<'t, C> PathIter<'t, C> {
    fn descend_from(&mut self, mut vertex: u32) {
        let mut link: u32 = self.tree.predecessor_heads[vertex as usize];

        while link != INVALID_INDEX {
            vertex = self.tree.predecessor_links[link as usize].vertex;
            self.stack.push(PathFrame { vertex, link });
            link = self.tree.predecessor_heads[vertex as usize];
        }
    }

    /// Backtracks to the deepest frame with an unexplored sibling predecessor, then descends
    /// again. Returns false when the current seed is exhausted.
    fn advance(&mut self) -> bool {
        while let Some(frame) = self.stack.pop() {
            if frame.link != INVALID_INDEX {
                let next: u32 = self.tree.predecessor_links[frame.link as usize].next;

                if next != INVALID_INDEX {
                    let vertex: u32 = self.tree.predecessor_links[next as usize].vertex;

                    self.stack.push(PathFrame { vertex, link: next });
                    self.descend_from(vertex);

                    return true;
                }
            }
        }

        false
    }
}

impl<'t, C> Iterator for PathIter<'t, C> {
    type Item = Vec<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.stack.is_empty() {
                let seed: u32 = *self.seeds.get(self.seed_index)?;

                self.seed_index += 1_usize;
                self.stack.push(PathFrame {
                    vertex: seed,
                    link: INVALID_INDEX,
                });
                self.descend_from(seed);
            } else if !self.advance() {
                continue;
            }

            // Chains that dead-end away from the source come from unsettled seeds and are
            // skipped.
            if self
                .stack
                .last()
                .map_or(false, |frame| frame.vertex == self.tree.source)
            {
                return Some(self.stack.iter().rev().map(|frame| frame.vertex).collect());
            }
        }
    }
}
