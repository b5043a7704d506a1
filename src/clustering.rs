// clustering.rs

use ndarray::Array2;

/// A single merge of the Ward dendrogram. `left` and `right` are the leaf
/// indices that represent the two merged clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
}

/// Full Ward merge history for one set of observations.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    n_leaves: usize,
    merges: Vec<Merge>,
}

/// Outcome of the silhouette-driven search over the distance grid.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdSearch {
    /// Every grid value gave a scorable labeling; `distance` has the highest
    /// mean silhouette (lowest distance wins ties).
    Best { distance: u64, score: f64 },
    /// The labeling at `distance` had 1 cluster or one cluster per sample.
    Degenerate { distance: u64, n_clusters: usize },
    EmptyGrid,
}

/// Pairwise Euclidean distances between the rows of `data`.
pub fn euclidean_distances(data: &Array2<f64>) -> Array2<f64> {
    let n_rows = data.nrows();
    let mut distances = Array2::<f64>::zeros((n_rows, n_rows));
    for i in 0..n_rows {
        for j in (i + 1)..n_rows {
            let squared: f64 = data
                .row(i)
                .iter()
                .zip(data.row(j).iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            let distance = squared.sqrt();
            distances[[i, j]] = distance;
            distances[[j, i]] = distance;
        }
    }
    distances
}

/// Agglomerative clustering with Ward linkage over a Euclidean distance matrix.
///
/// Merge heights follow the Lance-Williams Ward recurrence on squared
/// distances, so a merge of clusters `a` and `b` has height
/// `sqrt(2 * n_a * n_b / (n_a + n_b)) * |c_a - c_b|`.
pub fn ward_linkage(distances: &Array2<f64>) -> Dendrogram {
    let n_leaves = distances.nrows();
    let mut squared = distances.mapv(|d| d * d);
    let mut sizes = vec![1usize; n_leaves];
    let mut active: Vec<usize> = (0..n_leaves).collect();
    let mut merges = Vec::with_capacity(n_leaves.saturating_sub(1));

    while active.len() > 1 {
        let mut best_squared = f64::INFINITY;
        let mut best_a = active[0];
        let mut best_b = active[1];
        for (ai, &a) in active.iter().enumerate() {
            for &b in &active[ai + 1..] {
                if squared[[a, b]] < best_squared {
                    best_squared = squared[[a, b]];
                    best_a = a;
                    best_b = b;
                }
            }
        }

        let size_a = sizes[best_a] as f64;
        let size_b = sizes[best_b] as f64;
        for &k in &active {
            if k == best_a || k == best_b {
                continue;
            }
            let size_k = sizes[k] as f64;
            let updated = ((size_a + size_k) * squared[[best_a, k]]
                + (size_b + size_k) * squared[[best_b, k]]
                - size_k * best_squared)
                / (size_a + size_b + size_k);
            squared[[best_a, k]] = updated;
            squared[[k, best_a]] = updated;
        }

        sizes[best_a] += sizes[best_b];
        merges.push(Merge {
            left: best_a,
            right: best_b,
            height: best_squared.max(0.0).sqrt(),
        });
        active.retain(|&c| c != best_b);
    }

    Dendrogram { n_leaves, merges }
}

fn find_root(parents: &mut [usize], mut node: usize) -> usize {
    while parents[node] != node {
        parents[node] = parents[parents[node]];
        node = parents[node];
    }
    node
}

impl Dendrogram {
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Flat labels after applying every merge lower than `threshold`.
    /// Labels are numbered in order of first appearance among the leaves.
    pub fn cut(&self, threshold: f64) -> Vec<usize> {
        let mut parents: Vec<usize> = (0..self.n_leaves).collect();
        for merge in self.merges.iter().filter(|m| m.height < threshold) {
            let left_root = find_root(&mut parents, merge.left);
            let right_root = find_root(&mut parents, merge.right);
            if left_root != right_root {
                parents[right_root] = left_root;
            }
        }

        let mut root_labels: Vec<Option<usize>> = vec![None; self.n_leaves];
        let mut next_label = 0;
        (0..self.n_leaves)
            .map(|leaf| {
                let root = find_root(&mut parents, leaf);
                *root_labels[root].get_or_insert_with(|| {
                    next_label += 1;
                    next_label - 1
                })
            })
            .collect()
    }
}

pub fn count_clusters(labels: &[usize]) -> usize {
    labels.iter().max().map_or(0, |&max_label| max_label + 1)
}

/// Mean silhouette coefficient over all samples.
///
/// Labels must be numbered `0..k`. Returns `None` when the labeling has fewer
/// than 2 clusters or as many clusters as samples. Samples alone in their
/// cluster score 0.
pub fn silhouette_score(distances: &Array2<f64>, labels: &[usize]) -> Option<f64> {
    let n_samples = labels.len();
    let n_clusters = count_clusters(labels);
    if n_clusters < 2 || n_clusters >= n_samples {
        return None;
    }

    let mut cluster_sizes = vec![0usize; n_clusters];
    for &label in labels {
        cluster_sizes[label] += 1;
    }

    let mut total = 0.0;
    let mut distance_sums = vec![0.0f64; n_clusters];
    for i in 0..n_samples {
        distance_sums.iter_mut().for_each(|sum| *sum = 0.0);
        for j in 0..n_samples {
            distance_sums[labels[j]] += distances[[i, j]];
        }

        let own = labels[i];
        if cluster_sizes[own] <= 1 {
            continue;
        }
        let intra = distance_sums[own] / (cluster_sizes[own] - 1) as f64;
        let nearest_other = (0..n_clusters)
            .filter(|&c| c != own && cluster_sizes[c] > 0)
            .map(|c| distance_sums[c] / cluster_sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denominator = intra.max(nearest_other);
        if denominator > 0.0 {
            total += (nearest_other - intra) / denominator;
        }
    }
    Some(total / n_samples as f64)
}

/// Scores every grid distance and keeps the first maximum. The search stops at
/// the first grid value whose labeling cannot be scored.
pub fn search_distance_threshold(
    dendrogram: &Dendrogram,
    distances: &Array2<f64>,
    grid: &[u64],
) -> ThresholdSearch {
    let mut scores = Vec::with_capacity(grid.len());
    for &distance in grid {
        let labels = dendrogram.cut(distance as f64);
        match silhouette_score(distances, &labels) {
            Some(score) => scores.push(score),
            None => {
                return ThresholdSearch::Degenerate {
                    distance,
                    n_clusters: count_clusters(&labels),
                }
            }
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }
    match best {
        Some((idx, score)) => ThresholdSearch::Best {
            distance: grid[idx],
            score,
        },
        None => ThresholdSearch::EmptyGrid,
    }
}
