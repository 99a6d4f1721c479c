//! Ordered candidate/result structures for the layer walk.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// An immutable `(distance, entity id)` pair. Ordered ascending by
/// distance, ties broken by id so heap pops and top-k ordering never
/// depend on insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapElement {
    pub distance: f64,
    pub id: u64,
}

impl HeapElement {
    pub fn new(distance: f64, id: u64) -> Self {
        Self { distance, id }
    }
}

impl Eq for HeapElement {}

impl PartialOrd for HeapElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapElement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A min-heap over [`HeapElement`], closest first. `BinaryHeap` is a
/// max-heap in std, so elements are kept wrapped in `Reverse` internally.
pub struct MinHeap {
    inner: BinaryHeap<Reverse<HeapElement>>,
}

impl MinHeap {
    pub fn new() -> Self {
        Self {
            inner: BinaryHeap::new(),
        }
    }

    pub fn from_vec(elements: Vec<HeapElement>) -> Self {
        Self {
            inner: elements.into_iter().map(Reverse).collect(),
        }
    }

    pub fn push(&mut self, element: HeapElement) {
        self.inner.push(Reverse(element));
    }

    pub fn pop(&mut self) -> Option<HeapElement> {
        self.inner.pop().map(|Reverse(e)| e)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for MinHeap {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert `element` into the ascending vector `nns`, keeping it sorted.
/// Callers are responsible for truncating to the desired bound afterward
/// (see `layer_search::search_layer`).
pub fn insort_bounded(nns: &mut Vec<HeapElement>, element: HeapElement) {
    let pos = nns.partition_point(|e| *e < element);
    nns.insert(pos, element);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_heap_pops_closest_first() {
        let mut heap = MinHeap::new();
        heap.push(HeapElement::new(3.0, 1));
        heap.push(HeapElement::new(1.0, 2));
        heap.push(HeapElement::new(2.0, 3));

        assert_eq!(heap.pop().unwrap().id, 2);
        assert_eq!(heap.pop().unwrap().id, 3);
        assert_eq!(heap.pop().unwrap().id, 1);
        assert!(heap.pop().is_none());
    }

    #[test]
    fn insort_keeps_ascending_order() {
        let mut nns = vec![HeapElement::new(1.0, 1), HeapElement::new(3.0, 2)];
        insort_bounded(&mut nns, HeapElement::new(2.0, 3));
        let distances: Vec<f64> = nns.iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_break_on_id() {
        let mut nns = vec![HeapElement::new(1.0, 5)];
        insort_bounded(&mut nns, HeapElement::new(1.0, 2));
        assert_eq!(nns[0].id, 2);
        assert_eq!(nns[1].id, 5);
    }
}
