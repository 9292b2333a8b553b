//! One-hot encoding of categorical weather labels.

use anyhow::{Result, anyhow, bail};
use std::collections::BTreeSet;

/// Category used for empty cells.
pub const MISSING_CATEGORY: &str = "nan";

/// Labels are kept exactly as read; only an empty cell is missing.
fn category_of(label: &str) -> &str {
    if label.is_empty() { MISSING_CATEGORY } else { label }
}

/// Sort key placing the missing category after every real label.
fn category_key(category: &str) -> (bool, &str) {
    (category == MISSING_CATEGORY, category)
}

/// An encoder fitted on one categorical matrix.
///
/// Each feature (variable) gets its observed categories in ascending order,
/// with [`MISSING_CATEGORY`] last.
/// Transforming a label that was not seen during [`OneHotEncoder::fit`] fails.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    features: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learns the categories of each feature column.
    ///
    /// `columns[f][row]` is the label of feature `f` at `row`.
    pub fn fit(features: &[String], columns: &[Vec<&str>]) -> Result<Self> {
        if features.len() != columns.len() {
            bail!(
                "{} feature names for {} categorical columns",
                features.len(),
                columns.len()
            );
        }

        let categories = columns
            .iter()
            .map(|col| {
                let mut cats: Vec<String> = col
                    .iter()
                    .map(|l| category_of(l))
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                cats.sort_by(|a, b| category_key(a).cmp(&category_key(b)));
                cats
            })
            .collect();

        Ok(Self {
            features: features.to_vec(),
            categories,
        })
    }

    /// Categories learned for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Output column names, `{feature}_{category}`.
    pub fn feature_names_out(&self) -> Vec<String> {
        self.features
            .iter()
            .zip(&self.categories)
            .flat_map(|(feature, cats)| cats.iter().map(move |c| format!("{}_{}", feature, c)))
            .collect()
    }

    /// Dense 0/1 matrix, one row per input row.
    pub fn transform(&self, columns: &[Vec<&str>]) -> Result<Vec<Vec<f64>>> {
        if columns.len() != self.features.len() {
            bail!(
                "encoder fitted on {} features, got {}",
                self.features.len(),
                columns.len()
            );
        }

        let n_rows = columns.first().map_or(0, Vec::len);
        let width: usize = self.categories.iter().map(Vec::len).sum();
        let mut out = vec![vec![0.0; width]; n_rows];

        let mut offset = 0;
        for ((feature, cats), col) in self.features.iter().zip(&self.categories).zip(columns) {
            if col.len() != n_rows {
                bail!("feature '{}' has {} rows, expected {}", feature, col.len(), n_rows);
            }
            for (row, label) in col.iter().enumerate() {
                let category = category_of(label);
                let pos = cats
                    .binary_search_by(|c| category_key(c).cmp(&category_key(category)))
                    .map_err(|_| anyhow!("unknown category '{}' for feature '{}'", category, feature))?;
                out[row][offset + pos] = 1.0;
            }
            offset += cats.len();
        }

        Ok(out)
    }

    /// Fits on `columns` and encodes them in one pass.
    pub fn fit_transform(features: &[String], columns: &[Vec<&str>]) -> Result<(Self, Vec<Vec<f64>>)> {
        let encoder = Self::fit(features, columns)?;
        let encoded = encoder.transform(columns)?;
        Ok((encoder, encoded))
    }
}
