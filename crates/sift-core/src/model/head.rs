//! Classifier heads: map a document vector to label probabilities.
//!
//! Two heads share one trait. The flat softmax scores every label with one
//! matrix-vector product. The hierarchical softmax walks a Huffman tree built
//! from label frequencies, so top-k search only visits promising branches.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use ndarray::{Array2, ArrayView1};

use crate::math::{rank_order, sigmoid, softmax_in_place};

use super::args::Loss;

/// Scores a hidden vector against every label.
///
/// Results are `(label_id, probability)` pairs. Ranked results always follow
/// [`rank_order`]: probability descending, label id ascending.
pub trait ClassifierHead: Send + Sync + fmt::Debug {
    /// Number of labels this head distinguishes.
    fn num_labels(&self) -> usize;

    /// Output weight matrix as stored in the model file.
    fn weights(&self) -> &Array2<f32>;

    /// Probability of every label, in label-id order.
    fn scores(&self, hidden: ArrayView1<'_, f32>) -> Vec<(usize, f64)>;

    /// The `k` best labels with probability at least `threshold`, ranked.
    fn top_k(&self, hidden: ArrayView1<'_, f32>, k: usize, threshold: f64) -> Vec<(usize, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored = self.scores(hidden);
        scored.retain(|&(_, p)| p >= threshold);
        if k < scored.len() {
            scored.select_nth_unstable_by(k, rank_order);
            scored.truncate(k);
        }
        scored.sort_by(rank_order);
        scored
    }
}

/// Output rows a head of this kind needs for `nlabels` labels.
pub fn expected_output_rows(loss: Loss, nlabels: usize) -> usize {
    if loss.is_hierarchical() {
        nlabels.saturating_sub(1)
    } else {
        nlabels
    }
}

/// Build the head selected by `loss`.
///
/// `weights` must already have [`expected_output_rows`] rows.
pub fn build(loss: Loss, weights: Array2<f32>, label_counts: &[u64]) -> Box<dyn ClassifierHead> {
    match loss {
        Loss::HierarchicalSoftmax => Box::new(HierarchicalSoftmax::new(weights, label_counts)),
        Loss::Softmax | Loss::NegativeSampling => Box::new(FlatSoftmax::new(weights)),
    }
}

/// Dense linear layer followed by softmax.
#[derive(Debug, Clone)]
pub struct FlatSoftmax {
    weights: Array2<f32>,
}

impl FlatSoftmax {
    pub fn new(weights: Array2<f32>) -> Self {
        Self { weights }
    }
}

impl ClassifierHead for FlatSoftmax {
    fn num_labels(&self) -> usize {
        self.weights.nrows()
    }

    fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    fn scores(&self, hidden: ArrayView1<'_, f32>) -> Vec<(usize, f64)> {
        let mut probs: Vec<f64> = self
            .weights
            .dot(&hidden)
            .iter()
            .map(|&x| f64::from(x))
            .collect();
        softmax_in_place(&mut probs);
        probs.into_iter().enumerate().collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct TreeNode {
    /// `(left, right)` for internal nodes, `None` for leaves.
    children: Option<(usize, usize)>,
}

/// Binary tree over labels; each internal node owns one output row.
///
/// Nodes `0..nlabels` are leaves (one per label). Internal nodes follow in
/// creation order, so node `i` uses output row `i - nlabels`.
#[derive(Debug, Clone)]
pub struct HierarchicalSoftmax {
    weights: Array2<f32>,
    tree: Vec<TreeNode>,
    nlabels: usize,
}

/// Search candidate. Orders worst-first so a max-heap pops the weakest.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    label: usize,
    log_p: f64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(&(self.label, self.log_p), &(other.label, other.log_p))
    }
}

impl HierarchicalSoftmax {
    /// Build the Huffman tree from label counts.
    ///
    /// The two least frequent nodes are merged first; ties go to the lower
    /// node id, so the tree is identical on every load.
    pub fn new(weights: Array2<f32>, label_counts: &[u64]) -> Self {
        let nlabels = label_counts.len();
        let mut tree = vec![TreeNode { children: None }; nlabels];
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = label_counts
            .iter()
            .enumerate()
            .map(|(id, &count)| Reverse((count, id)))
            .collect();

        while let (Some(Reverse((c1, left))), Some(Reverse((c2, right)))) = (heap.pop(), heap.pop())
        {
            let id = tree.len();
            tree.push(TreeNode {
                children: Some((left, right)),
            });
            heap.push(Reverse((c1.saturating_add(c2), id)));
        }

        Self {
            weights,
            tree,
            nlabels,
        }
    }

    fn root(&self) -> usize {
        self.tree.len() - 1
    }

    /// Log-probabilities of going left and right at an internal node.
    fn branch(&self, node: usize, hidden: ArrayView1<'_, f32>) -> (f64, f64) {
        let logit = f64::from(self.weights.row(node - self.nlabels).dot(&hidden));
        (sigmoid(-logit).ln(), sigmoid(logit).ln())
    }

    fn collect_all(&self, node: usize, log_p: f64, hidden: ArrayView1<'_, f32>, out: &mut [f64]) {
        match self.tree[node].children {
            None => out[node] = log_p.exp(),
            Some((left, right)) => {
                let (go_left, go_right) = self.branch(node, hidden);
                self.collect_all(left, log_p + go_left, hidden, out);
                self.collect_all(right, log_p + go_right, hidden, out);
            }
        }
    }

    /// Depth-first search keeping the `k` best leaves.
    ///
    /// Path log-probabilities only decrease with depth, so a subtree whose
    /// root is already strictly worse than the current k-th best is skipped.
    fn search(
        &self,
        node: usize,
        log_p: f64,
        hidden: ArrayView1<'_, f32>,
        k: usize,
        min_log_p: f64,
        best: &mut BinaryHeap<Candidate>,
    ) {
        if log_p < min_log_p {
            return;
        }
        if best.len() == k {
            if let Some(worst) = best.peek() {
                if log_p < worst.log_p {
                    return;
                }
            }
        }

        match self.tree[node].children {
            None => {
                best.push(Candidate { label: node, log_p });
                if best.len() > k {
                    best.pop();
                }
            }
            Some((left, right)) => {
                let (go_left, go_right) = self.branch(node, hidden);
                self.search(left, log_p + go_left, hidden, k, min_log_p, best);
                self.search(right, log_p + go_right, hidden, k, min_log_p, best);
            }
        }
    }
}

impl ClassifierHead for HierarchicalSoftmax {
    fn num_labels(&self) -> usize {
        self.nlabels
    }

    fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    fn scores(&self, hidden: ArrayView1<'_, f32>) -> Vec<(usize, f64)> {
        let mut probs = vec![0.0; self.nlabels];
        if self.nlabels > 0 {
            self.collect_all(self.root(), 0.0, hidden, &mut probs);
        }
        probs.into_iter().enumerate().collect()
    }

    fn top_k(&self, hidden: ArrayView1<'_, f32>, k: usize, threshold: f64) -> Vec<(usize, f64)> {
        if k == 0 || self.nlabels == 0 {
            return Vec::new();
        }
        let mut best = BinaryHeap::with_capacity(k + 1);
        self.search(self.root(), 0.0, hidden, k, threshold.ln(), &mut best);
        best.into_sorted_vec()
            .into_iter()
            .map(|c| (c.label, c.log_p.exp()))
            .collect()
    }
}
