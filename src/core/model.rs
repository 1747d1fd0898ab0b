//! The trained artifact: a bag-of-words vectorizer feeding a seeded random forest.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::features::tokenize;
use crate::utils::error::{Result, ServiceError};

pub const N_ESTIMATORS: usize = 100;
pub const MAX_DEPTH: usize = 10;
pub const RANDOM_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: N_ESTIMATORS,
            max_depth: MAX_DEPTH,
            seed: RANDOM_SEED,
        }
    }
}

/// Token counts over a vocabulary sorted lexicographically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    pub fn fit(documents: &[String]) -> Result<Self> {
        let terms: BTreeSet<String> = documents.iter().flat_map(|doc| tokenize(doc)).collect();
        if terms.is_empty() {
            return Err(ServiceError::retraining(
                "empty vocabulary; the documents only contain stop words",
            ));
        }

        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();
        Ok(Self { vocabulary })
    }

    fn len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Terms outside the vocabulary are ignored.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut counts = vec![0.0; self.vocabulary.len()];
        for token in tokenize(document) {
            if let Some(&index) = self.vocabulary.get(&token) {
                counts[index] += 1.0;
            }
        }
        counts
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = vec![false; self.vocabulary.len()];
        for (term, &index) in &self.vocabulary {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(format!("vocabulary index {} for '{}' is invalid", index, term)),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

/// CART tree with Gini impurity. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct TreeBuilder<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    max_depth: usize,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &sample in samples {
            counts[self.labels[sample]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let distribution = counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let total = samples.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if pure || depth >= self.max_depth || total < 2 {
            return self.leaf(&counts, total);
        }

        let Some((feature, threshold)) = self.best_split(&samples) else {
            return self.leaf(&counts, total);
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.features[s][feature] <= threshold);

        // Parent index precedes its children; validation relies on it.
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let left = self.build(left_samples, depth + 1);
        let right = self.build(right_samples, depth + 1);
        self.nodes[index] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        index
    }

    /// Tries features in random order, skipping ones constant within the node,
    /// until `max_features` non-constant features have been evaluated.
    fn best_split(&mut self, samples: &[usize]) -> Option<(usize, f64)> {
        let n_features = self.features.first().map_or(0, Vec::len);
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(&mut self.rng);

        let parent_counts = self.class_counts(samples);
        let total = samples.len() as f64;
        let mut best: Option<(f64, usize, f64)> = None;
        let mut evaluated = 0;

        for feature in order {
            if evaluated >= self.max_features {
                break;
            }

            let mut sorted: Vec<(f64, usize)> = samples
                .iter()
                .map(|&s| (self.features[s][feature], self.labels[s]))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (first, last) = (sorted[0].0, sorted[sorted.len() - 1].0);
            if first == last {
                continue;
            }
            evaluated += 1;

            let mut left_counts = vec![0usize; self.n_classes];
            for i in 0..sorted.len() - 1 {
                left_counts[sorted[i].1] += 1;
                if sorted[i].0 == sorted[i + 1].0 {
                    continue;
                }
                let n_left = (i + 1) as f64;
                let n_right = total - n_left;
                let right_counts = parent_counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(p, l)| p - l);
                let impurity = (n_left * gini(left_counts.iter().copied(), n_left)
                    + n_right * gini(right_counts, n_right))
                    / total;

                if best.map_or(true, |(score, _, _)| impurity < score) {
                    let threshold = (sorted[i].0 + sorted[i + 1].0) / 2.0;
                    best = Some((impurity, feature, threshold));
                }
            }
        }

        best.map(|(_, feature, threshold)| (feature, threshold))
    }
}

fn gini(counts: impl Iterator<Item = usize>, total: f64) -> f64 {
    1.0 - counts
        .map(|c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

impl DecisionTree {
    fn predict_proba(&self, features: &[f64]) -> Result<&[f64]> {
        let mut index = 0;
        // Depth is bounded by validation, but a corrupt tree must not loop forever.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { distribution }) => return Ok(distribution.as_slice()),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ServiceError::inference(format!("feature index {} out of range", feature))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ServiceError::inference(format!(
                        "tree node {} does not exist",
                        index
                    )))
                }
            }
        }
        Err(ServiceError::inference("tree traversal did not reach a leaf"))
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { distribution } if distribution.len() != n_classes => {
                    return Err(format!(
                        "leaf {} has {} classes, expected {}",
                        index,
                        distribution.len(),
                        n_classes
                    ))
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("split {} uses unknown feature {}", index, feature));
                    }
                    // Children are always built after their parent.
                    let in_range = |child: usize| child > index && child < self.nodes.len();
                    if !in_range(*left) || !in_range(*right) {
                        return Err(format!("split {} has invalid children", index));
                    }
                }
                Node::Leaf { distribution } => {
                    let in_unit = distribution.iter().all(|p| (0.0..=1.0).contains(p));
                    let sum: f64 = distribution.iter().sum();
                    if !in_unit || (sum - 1.0).abs() > 1e-6 {
                        return Err(format!("leaf {} is not a probability distribution", index));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> Self {
        let n_samples = features.len();
        let n_features = features.first().map_or(0, Vec::len);
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut master = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_estimators)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let mut builder = TreeBuilder {
                    features,
                    labels,
                    n_classes,
                    max_depth: params.max_depth,
                    max_features,
                    rng,
                    nodes: Vec::new(),
                };
                builder.build(bootstrap, 0);
                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Self { trees, n_classes }
    }

    /// Mean of the leaf class distributions across all trees.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let mut totals = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let distribution = tree.predict_proba(features)?;
            for (total, p) in totals.iter_mut().zip(distribution) {
                *total += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(totals.into_iter().map(|t| t / n_trees).collect())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Serialized model bundle: vectorizer, forest, and the classes the forest can predict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerModel {
    vectorizer: CountVectorizer,
    forest: RandomForest,
    classes: Vec<String>,
}

impl CareerModel {
    /// Fits on feature strings and their labels. Classes come out sorted.
    pub fn fit(documents: &[String], labels: &[String], params: ForestParams) -> Result<Self> {
        if documents.is_empty() {
            return Err(ServiceError::retraining("dataset has no rows"));
        }
        if documents.len() != labels.len() {
            return Err(ServiceError::retraining(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let vectorizer = CountVectorizer::fit(documents)?;
        let features: Vec<Vec<f64>> = documents.iter().map(|d| vectorizer.transform(d)).collect();
        let forest = RandomForest::fit(&features, &encoded, classes.len(), params);

        Ok(Self {
            vectorizer,
            forest,
            classes,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.len()
    }

    pub fn n_trees(&self) -> usize {
        self.forest.n_trees()
    }

    /// One probability per entry of [`CareerModel::classes`], in the same order.
    pub fn predict_proba(&self, text: &str) -> Result<Vec<f64>> {
        let features = self.vectorizer.transform(text);
        self.forest.predict_proba(&features)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes and structurally checks an artifact before it can be served.
    pub fn from_bytes(artifact: &str, data: &[u8]) -> Result<Self> {
        let load_failure = |message: String| ServiceError::ArtifactLoadFailure {
            artifact: artifact.to_string(),
            message,
        };
        let model: Self =
            serde_json::from_slice(data).map_err(|e| load_failure(e.to_string()))?;
        model.validate().map_err(load_failure)?;
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.classes.is_empty() {
            return Err("artifact has no classes".to_string());
        }
        if self.forest.n_classes != self.classes.len() {
            return Err(format!(
                "forest predicts {} classes but artifact lists {}",
                self.forest.n_classes,
                self.classes.len()
            ));
        }
        if self.forest.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        self.vectorizer.validate()?;
        for (index, tree) in self.forest.trees.iter().enumerate() {
            tree.validate(self.vectorizer.len(), self.classes.len())
                .map_err(|e| format!("tree {}: {}", index, e))?;
        }
        Ok(())
    }
}
