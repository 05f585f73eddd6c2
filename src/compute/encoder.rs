// Feature encoding for car records

use crate::error::{PricingError, Result};
use crate::types::{CarRecord, ColumnKind, FeatureValue};
use serde::{Deserialize, Serialize};

/// Dense row-major feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Creates a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Creates a matrix from rows of equal width
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(PricingError::FeatureMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Gets one row
    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.data[index * self.cols..(index + 1) * self.cols]
    }

    /// Iterates over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| self.row(i))
    }
}

/// One transformer of the column transformer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderStep {
    /// One indicator column per known level
    OneHot {
        #[serde(default = "default_one_hot_name")]
        name: String,
        columns: Vec<String>,
        /// Known levels per column, in fitted order
        categories: Vec<Vec<String>>,
        /// Level dropped per column (`drop="first"` style), if any
        #[serde(default)]
        drop: Option<Vec<Option<String>>>,
    },
    /// Standardization `(x - mean) / scale`
    Standard {
        #[serde(default = "default_standard_name")]
        name: String,
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// Values copied as-is, booleans as 0/1
    Passthrough {
        #[serde(default = "default_passthrough_name")]
        name: String,
        columns: Vec<String>,
    },
}

fn default_one_hot_name() -> String {
    "cat".to_string()
}

fn default_standard_name() -> String {
    "num".to_string()
}

fn default_passthrough_name() -> String {
    "remainder".to_string()
}

impl EncoderStep {
    pub fn name(&self) -> &str {
        match self {
            EncoderStep::OneHot { name, .. }
            | EncoderStep::Standard { name, .. }
            | EncoderStep::Passthrough { name, .. } => name,
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            EncoderStep::OneHot { columns, .. }
            | EncoderStep::Standard { columns, .. }
            | EncoderStep::Passthrough { columns, .. } => columns,
        }
    }

    /// Levels kept for column `index` of a one-hot step
    fn kept_levels(&self, index: usize) -> Vec<&str> {
        match self {
            EncoderStep::OneHot { categories, drop, .. } => {
                let dropped = dropped_level(drop, index);
                categories[index]
                    .iter()
                    .map(String::as_str)
                    .filter(|level| Some(*level) != dropped)
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        match self {
            EncoderStep::OneHot { columns, .. } => {
                (0..columns.len()).map(|i| self.kept_levels(i).len()).sum()
            }
            EncoderStep::Standard { columns, .. } | EncoderStep::Passthrough { columns, .. } => {
                columns.len()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for column in self.columns() {
            let kind = CarRecord::column_kind(column)
                .ok_or_else(|| PricingError::UnknownColumn(column.clone()))?;
            let accepted = match self {
                EncoderStep::OneHot { .. } => kind == ColumnKind::Categorical,
                _ => kind != ColumnKind::Categorical,
            };
            if !accepted {
                return Err(PricingError::InvalidArtifact(format!(
                    "step '{}' cannot encode {:?} column '{}'",
                    self.name(),
                    kind,
                    column
                )));
            }
        }

        match self {
            EncoderStep::OneHot { columns, categories, drop, name } => {
                if categories.len() != columns.len() {
                    return Err(PricingError::InvalidArtifact(format!(
                        "step '{}' has {} category lists for {} columns",
                        name,
                        categories.len(),
                        columns.len()
                    )));
                }
                if let Some(drop) = drop {
                    if drop.len() != columns.len() {
                        return Err(PricingError::InvalidArtifact(format!(
                            "step '{}' has {} drop entries for {} columns",
                            name,
                            drop.len(),
                            columns.len()
                        )));
                    }
                    for (level, known) in drop.iter().zip(categories) {
                        if let Some(level) = level {
                            if !known.contains(level) {
                                return Err(PricingError::InvalidArtifact(format!(
                                    "step '{}' drops unknown level '{}'",
                                    name, level
                                )));
                            }
                        }
                    }
                }
            }
            EncoderStep::Standard { columns, mean, scale, name } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(PricingError::InvalidArtifact(format!(
                        "step '{}' has {} means and {} scales for {} columns",
                        name,
                        mean.len(),
                        scale.len(),
                        columns.len()
                    )));
                }
            }
            EncoderStep::Passthrough { .. } => {}
        }
        Ok(())
    }

    /// Writes this step's encoding of `record` into `out`
    fn encode(&self, record: &CarRecord, out: &mut [f64]) -> Result<()> {
        match self {
            EncoderStep::OneHot { columns, .. } => {
                let mut offset = 0;
                for (i, column) in columns.iter().enumerate() {
                    let levels = self.kept_levels(i);
                    let value = read(record, column)?;
                    // Unknown and dropped levels stay all-zero
                    if let Some(pos) = value
                        .as_category()
                        .and_then(|v| levels.iter().position(|l| *l == v))
                    {
                        out[offset + pos] = 1.0;
                    }
                    offset += levels.len();
                }
            }
            EncoderStep::Standard { columns, mean, scale, .. } => {
                for (i, column) in columns.iter().enumerate() {
                    let x = numeric(record, column)?;
                    out[i] = (x - mean[i]) / effective_scale(scale[i]);
                }
            }
            EncoderStep::Passthrough { columns, .. } => {
                for (i, column) in columns.iter().enumerate() {
                    out[i] = numeric(record, column)?;
                }
            }
        }
        Ok(())
    }

    /// Decodes this step's slice of an encoded row
    fn decode(&self, encoded: &[f64], out: &mut Vec<(String, Option<FeatureValue>)>) {
        match self {
            EncoderStep::OneHot { columns, drop, .. } => {
                let mut offset = 0;
                for (i, column) in columns.iter().enumerate() {
                    let levels = self.kept_levels(i);
                    let slice = &encoded[offset..offset + levels.len()];
                    let active = slice
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| **v > 0.5)
                        .max_by(|a, b| a.1.total_cmp(b.1))
                        .map(|(pos, _)| levels[pos]);
                    let level = active.or_else(|| dropped_level(drop, i));
                    out.push((
                        column.clone(),
                        level.map(|l| FeatureValue::Category(l.to_string())),
                    ));
                    offset += levels.len();
                }
            }
            EncoderStep::Standard { columns, mean, scale, .. } => {
                for (i, column) in columns.iter().enumerate() {
                    let x = encoded[i] * effective_scale(scale[i]) + mean[i];
                    out.push((column.clone(), Some(restore(column, x))));
                }
            }
            EncoderStep::Passthrough { columns, .. } => {
                for (i, column) in columns.iter().enumerate() {
                    out.push((column.clone(), Some(restore(column, encoded[i]))));
                }
            }
        }
    }

    fn feature_names(&self, out: &mut Vec<String>) {
        let prefix = self.name();
        match self {
            EncoderStep::OneHot { columns, .. } => {
                for (i, column) in columns.iter().enumerate() {
                    for level in self.kept_levels(i) {
                        out.push(format!("{}__{}_{}", prefix, column, level));
                    }
                }
            }
            _ => {
                for column in self.columns() {
                    out.push(format!("{}__{}", prefix, column));
                }
            }
        }
    }
}

fn dropped_level(drop: &Option<Vec<Option<String>>>, index: usize) -> Option<&str> {
    drop.as_ref()
        .and_then(|d| d.get(index))
        .and_then(|l| l.as_deref())
}

fn effective_scale(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

fn read(record: &CarRecord, column: &str) -> Result<FeatureValue> {
    record
        .value(column)
        .ok_or_else(|| PricingError::UnknownColumn(column.to_string()))
}

fn numeric(record: &CarRecord, column: &str) -> Result<f64> {
    read(record, column)?.as_f64().ok_or_else(|| {
        PricingError::Inference(format!("column '{}' is not numeric", column))
    })
}

/// Maps a decoded number back onto the column's kind
fn restore(column: &str, x: f64) -> FeatureValue {
    match CarRecord::column_kind(column) {
        Some(ColumnKind::Boolean) => FeatureValue::Flag(x > 0.5),
        _ => FeatureValue::Number(x),
    }
}

/// Column transformer turning car records into model features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub steps: Vec<EncoderStep>,
}

impl FeatureEncoder {
    /// Creates an encoder from its steps
    pub fn new(steps: Vec<EncoderStep>) -> Self {
        Self { steps }
    }

    /// Checks columns, kinds and fitted parameter lengths
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(PricingError::InvalidArtifact(
                "feature encoder has no steps".to_string(),
            ));
        }
        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }

    /// Output width
    pub fn n_features(&self) -> usize {
        self.steps.iter().map(EncoderStep::width).sum()
    }

    /// Output feature names, `<step>__<column>[_<level>]`
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features());
        for step in &self.steps {
            step.feature_names(&mut names);
        }
        names
    }

    /// Encodes a batch of records into one matrix
    pub fn transform(&self, records: &[CarRecord]) -> Result<FeatureMatrix> {
        let mut matrix = FeatureMatrix::zeros(records.len(), self.n_features());
        for (i, record) in records.iter().enumerate() {
            let row = matrix.row_mut(i);
            let mut offset = 0;
            for step in &self.steps {
                let width = step.width();
                step.encode(record, &mut row[offset..offset + width])?;
                offset += width;
            }
        }
        Ok(matrix)
    }

    /// Decodes one encoded row back into column values.
    ///
    /// One-hot columns whose encoding is all zeros decode to the dropped
    /// level when there is one, otherwise to `None`.
    pub fn inverse_transform(&self, row: &[f64]) -> Result<Vec<(String, Option<FeatureValue>)>> {
        let expected = self.n_features();
        if row.len() != expected {
            return Err(PricingError::FeatureMismatch {
                expected,
                actual: row.len(),
            });
        }

        let mut decoded = Vec::new();
        let mut offset = 0;
        for step in &self.steps {
            let width = step.width();
            step.decode(&row[offset..offset + width], &mut decoded);
            offset += width;
        }
        Ok(decoded)
    }
}
