use bitvec::prelude::*;
use core::mem;
use num::{NumCast, ToPrimitive};
use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

/// Set of vertices over a fixed universe `0..len`, stored one bit per vertex.
///
/// All binary operations expect both operands to share the same universe. Bits past the
/// universe are never set, so word-level comparisons stay exact.
#[derive(Clone, Default)]
pub struct VertexSet {
    cardinality: usize,
    bit_vec: BitVec,
}

impl Ord for VertexSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl PartialOrd for VertexSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for VertexSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl PartialEq for VertexSet {
    fn eq(&self, other: &Self) -> bool {
        self.cardinality == other.cardinality && self.as_slice() == other.as_slice()
    }
}
impl Eq for VertexSet {}

impl Hash for VertexSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

const fn block_size() -> usize {
    mem::size_of::<usize>() * 8
}

impl VertexSet {
    #[inline]
    pub fn new(size: usize) -> Self {
        Self {
            cardinality: 0,
            bit_vec: bitvec![0; size],
        }
    }

    /// Set containing every vertex of the universe.
    pub fn new_all_set(size: usize) -> Self {
        let mut set = Self::new(size);
        for v in 0..size {
            set.bit_vec.set(v, true);
        }
        set.cardinality = size;
        set
    }

    pub fn from_slice<T: ToPrimitive + Copy>(size: usize, slice: &[T]) -> Self {
        let mut set = Self::new(size);
        for i in slice {
            if let Some(v) = <usize as NumCast>::from(*i) {
                set.insert(v);
            }
        }
        set
    }

    pub fn from_iter<I: IntoIterator<Item = usize>>(size: usize, iter: I) -> Self {
        let mut set = Self::new(size);
        for v in iter {
            set.insert(v);
        }
        set
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Size of the universe.
    #[inline]
    pub fn len(&self) -> usize {
        self.bit_vec.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        self.bit_vec.as_slice()
    }

    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        idx < self.bit_vec.len() && self.bit_vec[idx]
    }

    /// Returns `true` if `idx` was not present before.
    #[inline]
    pub fn insert(&mut self, idx: usize) -> bool {
        if self.bit_vec[idx] {
            false
        } else {
            self.bit_vec.set(idx, true);
            self.cardinality += 1;
            true
        }
    }

    /// Returns `true` if `idx` was present before.
    #[inline]
    pub fn remove(&mut self, idx: usize) -> bool {
        if self.contains(idx) {
            self.bit_vec.set(idx, false);
            self.cardinality -= 1;
            true
        } else {
            false
        }
    }

    /// Grows the universe. Shrinking is not supported.
    pub fn grow(&mut self, size: usize) {
        if size > self.bit_vec.len() {
            self.bit_vec.resize(size, false);
        }
    }

    #[inline]
    pub fn union_with(&mut self, other: &VertexSet) {
        if other.len() > self.len() {
            self.grow(other.len());
        }
        for (x, y) in self
            .bit_vec
            .as_mut_slice()
            .iter_mut()
            .zip(other.as_slice().iter())
        {
            *x |= y;
        }
        self.cardinality = self.bit_vec.count_ones();
    }

    #[inline]
    pub fn intersect_with(&mut self, other: &VertexSet) {
        let words = other.as_slice();
        for (i, x) in self.bit_vec.as_mut_slice().iter_mut().enumerate() {
            *x &= words.get(i).copied().unwrap_or(0);
        }
        self.cardinality = self.bit_vec.count_ones();
    }

    #[inline]
    pub fn difference_with(&mut self, other: &VertexSet) {
        for (x, y) in self
            .bit_vec
            .as_mut_slice()
            .iter_mut()
            .zip(other.as_slice().iter())
        {
            *x &= !y;
        }
        self.cardinality = self.bit_vec.count_ones();
    }

    pub fn union(&self, other: &VertexSet) -> VertexSet {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    pub fn intersection(&self, other: &VertexSet) -> VertexSet {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    pub fn difference(&self, other: &VertexSet) -> VertexSet {
        let mut result = self.clone();
        result.difference_with(other);
        result
    }

    #[inline]
    pub fn intersection_cardinality(&self, other: &VertexSet) -> usize {
        self.as_slice()
            .iter()
            .zip(other.as_slice().iter())
            .map(|(x, y)| (x & y).count_ones() as usize)
            .sum()
    }

    #[inline]
    pub fn union_cardinality(&self, other: &VertexSet) -> usize {
        self.cardinality + other.cardinality - self.intersection_cardinality(other)
    }

    #[inline]
    pub fn is_disjoint_with(&self, other: &VertexSet) -> bool {
        self.as_slice()
            .iter()
            .zip(other.as_slice().iter())
            .all(|(x, y)| x & y == 0)
    }

    #[inline]
    pub fn is_subset_of(&self, other: &VertexSet) -> bool {
        if self.cardinality > other.cardinality {
            return false;
        }
        let words = other.as_slice();
        self.as_slice()
            .iter()
            .enumerate()
            .all(|(i, x)| x & !words.get(i).copied().unwrap_or(0) == 0)
    }

    #[inline]
    pub fn first(&self) -> Option<usize> {
        if self.cardinality == 0 {
            None
        } else {
            self.next_from(0)
        }
    }

    /// Smallest member that is `>= idx`.
    pub fn next_from(&self, idx: usize) -> Option<usize> {
        if idx >= self.bit_vec.len() {
            return None;
        }
        let words = self.as_slice();
        let mut block_idx = idx / block_size();
        let mut block = words[block_idx] & (usize::MAX << (idx % block_size()));
        while block == 0 {
            block_idx += 1;
            if block_idx >= words.len() {
                return None;
            }
            block = words[block_idx];
        }
        let v = block_idx * block_size() + block.trailing_zeros() as usize;
        if v >= self.bit_vec.len() {
            None
        } else {
            Some(v)
        }
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    #[inline]
    pub fn iter(&self) -> VertexSetIterator {
        let words = self.as_slice();
        VertexSetIterator {
            words,
            block_idx: 0,
            block: words.first().copied().unwrap_or(0),
            size: self.bit_vec.len(),
        }
    }
}

pub struct VertexSetIterator<'a> {
    words: &'a [usize],
    block_idx: usize,
    block: usize,
    size: usize,
}

impl<'a> Iterator for VertexSetIterator<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.block != 0 {
                let offset = self.block.trailing_zeros() as usize;
                self.block &= self.block - 1;
                let v = self.block_idx * block_size() + offset;
                return if v < self.size { Some(v) } else { None };
            }
            self.block_idx += 1;
            if self.block_idx >= self.words.len() {
                return None;
            }
            self.block = self.words[self.block_idx];
        }
    }
}

impl<'a> IntoIterator for &'a VertexSet {
    type Item = usize;
    type IntoIter = VertexSetIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Indexed binary min-heap over the elements `0..capacity`.
///
/// Ties on the priority are broken by the smaller element, so the pop order is fully
/// determined by the priorities.
pub struct BinaryQueue<P: Ord + Copy> {
    heap: Vec<usize>,
    values: Vec<Option<P>>,
    indices: Vec<usize>,
}

enum ChildType {
    First,
    Second,
}

impl<P: Ord + Copy> BinaryQueue<P> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            values: vec![None; capacity],
            indices: vec![0; capacity],
        }
    }

    #[inline]
    pub fn contains(&self, element: usize) -> bool {
        self.values[element].is_some()
    }

    /// Inserts `element`, or updates its priority if already queued.
    pub fn insert(&mut self, element: usize, priority: P) {
        if self.values[element].is_some() {
            self.values[element] = Some(priority);
            let idx = self.indices[element];
            self.up(idx);
            let idx = self.indices[element];
            self.down(idx);
        } else {
            self.values[element] = Some(priority);
            self.indices[element] = self.heap.len();
            self.heap.push(element);
            self.up(self.heap.len() - 1);
        }
    }

    pub fn pop_min(&mut self) -> Option<(usize, P)> {
        let k = *self.heap.first()?;
        let v = self.values[k].take()?;
        let last = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.indices[last] = 0;
            self.down(0);
        }
        Some((k, v))
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        (self.values[a], a) < (self.values[b], b)
    }

    fn up(&mut self, mut idx: usize) {
        let x = self.heap[idx];
        while let Some(p) = self.parent(idx) {
            if self.less(x, self.heap[p]) {
                self.heap[idx] = self.heap[p];
                self.indices[self.heap[p]] = idx;
                idx = p;
            } else {
                break;
            }
        }
        self.heap[idx] = x;
        self.indices[x] = idx;
    }

    fn down(&mut self, idx: usize) {
        let mut current = idx;
        let value = self.heap[current];

        while let Some(mut first) = self.child(current, ChildType::First) {
            if let Some(second) = self.child(current, ChildType::Second) {
                if self.less(self.heap[second], self.heap[first]) {
                    first = second;
                }
            }
            if self.less(self.heap[first], value) {
                self.heap[current] = self.heap[first];
                self.indices[self.heap[current]] = current;
                current = first
            } else {
                break;
            }
        }
        self.heap[current] = value;
        self.indices[value] = current
    }

    fn parent(&self, idx: usize) -> Option<usize> {
        if idx == 0 {
            None
        } else {
            Some((idx - 1) / 2)
        }
    }

    fn child(&self, idx: usize, child_type: ChildType) -> Option<usize> {
        let off = match child_type {
            ChildType::First => 1,
            ChildType::Second => 2,
        };
        let idx = idx * 2 + off;
        if idx >= self.heap.len() {
            None
        } else {
            Some(idx)
        }
    }
}

/// Disjoint set union with path compression and union by rank.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }
        root
    }

    pub fn union(&mut self, left: usize, right: usize) -> usize {
        let mut left = self.find(left);
        let mut right = self.find(right);
        if left == right {
            return left;
        }
        if self.rank[left] < self.rank[right] {
            mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if self.rank[left] == self.rank[right] {
            self.rank[left] = self.rank[left].saturating_add(1);
        }
        left
    }
}
