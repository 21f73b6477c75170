//! TF-IDF similarity index over knowledge base questions.

use super::stop_words::is_stop_word;
use std::collections::HashMap;

/// Read-only TF-IDF model fitted once over a fixed set of documents.
///
/// Tokens are lowercased runs of two or more word characters with English stop
/// words removed. Weights use raw term counts and smoothed idf
/// `ln((1 + n) / (1 + df)) + 1`, and every document vector is L2-normalized so
/// cosine similarity reduces to a dot product.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<Vec<(usize, f64)>>,
}

impl SimilarityIndex {
    /// Fits the vocabulary and idf weights over `documents`.
    pub fn fit<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenized: Vec<Vec<String>> = documents.into_iter().map(tokenize).collect();

        let mut vocabulary = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen = Vec::new();
            for token in tokens {
                let next = vocabulary.len();
                let id = *vocabulary.entry(token.clone()).or_insert(next);
                if id == df.len() {
                    df.push(0);
                }
                if !seen.contains(&id) {
                    seen.push(id);
                    df[id] += 1;
                }
            }
        }

        let n = tokenized.len() as f64;
        let idf = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            documents: Vec::new(),
        };
        let documents = tokenized.iter().map(|t| index.vectorize(t)).collect();
        index.documents = documents;
        index
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Cosine similarity of `text` against every fitted document, in fit order.
    pub fn scores(&self, text: &str) -> Vec<f64> {
        let query = self.vectorize(&tokenize(text));
        self.documents
            .iter()
            .map(|doc| dot(&query, doc).clamp(0.0, 1.0))
            .collect()
    }

    /// Index and score of the closest document. Ties go to the lowest index.
    /// Returns `None` only when the index holds no documents.
    pub fn best(&self, text: &str) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, score) in self.scores(text).into_iter().enumerate() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }
        best
    }

    /// Sparse L2-normalized tf-idf vector sorted by term id; unknown terms are dropped.
    fn vectorize(&self, tokens: &[String]) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.vocabulary.get(token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        weights.sort_unstable_by_key(|&(id, _)| id);

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        weights
    }
}

/// Lowercases `text` and splits it into word tokens of length >= 2, minus stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

fn dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
