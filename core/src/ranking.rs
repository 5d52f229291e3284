use crate::index::DocId;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::warn;

/// A scored document drained from a `RankingQueue`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<T = DocId> {
    pub score: f64,
    pub doc: T,
}

#[derive(Debug)]
struct HeapItem<T> {
    score: OrderedFloat<f64>,
    // earlier insertions win ties
    seq: Reverse<u64>,
    doc: T,
}

impl<T> PartialEq for HeapItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for HeapItem<T> {}

impl<T> PartialOrd for HeapItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapItem<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score).then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Max-priority queue of (score, document) pairs. Reads are destructive:
/// `get_top` drains what it returns.
#[derive(Debug)]
pub struct RankingQueue<T = DocId> {
    heap: BinaryHeap<HeapItem<T>>,
    next_seq: u64,
}

impl<T> Default for RankingQueue<T> {
    fn default() -> Self {
        Self { heap: BinaryHeap::new(), next_seq: 0 }
    }
}

impl<T> RankingQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(log n). NaN scores have no place in the order and are dropped.
    pub fn insert(&mut self, score: f64, doc: T) {
        if score.is_nan() {
            warn!("dropping NaN score from ranking");
            return;
        }
        let seq = Reverse(self.next_seq);
        self.next_seq += 1;
        self.heap.push(HeapItem { score: OrderedFloat(score), seq, doc });
    }

    /// Remove and return up to `k` highest-scoring entries, best first.
    pub fn get_top(&mut self, k: usize) -> Vec<RankedEntry<T>> {
        let mut out = Vec::with_capacity(k.min(self.heap.len()));
        while out.len() < k {
            match self.pop() {
                Some(entry) => out.push(entry),
                None => break,
            }
        }
        out
    }

    pub fn pop(&mut self) -> Option<RankedEntry<T>> {
        self.heap.pop().map(|item| RankedEntry { score: item.score.into_inner(), doc: item.doc })
    }

    pub fn peek(&self) -> Option<(f64, &T)> {
        self.heap.peek().map(|item| (item.score.into_inner(), &item.doc))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Extend<(f64, T)> for RankingQueue<T> {
    fn extend<I: IntoIterator<Item = (f64, T)>>(&mut self, iter: I) {
        for (score, doc) in iter {
            self.insert(score, doc);
        }
    }
}
