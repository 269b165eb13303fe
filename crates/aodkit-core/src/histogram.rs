//! # Histogram Registry
//!
//! Named 1-D and 2-D binned counters, defined once at task initialization
//! and filled afterwards.
//!
//! Bin storage follows the usual convention: index 0 is the underflow bin,
//! `1..=n` are the regular bins and `n + 1` is the overflow bin. Values that
//! are not below the upper edge (including NaN) land in overflow.

use crate::primitives::{MAX_AXIS_BINS, MAX_HISTOGRAM_NAME_LENGTH};
use crate::AodError;
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// AXIS
// =============================================================================

/// Binning of one histogram axis.
///
/// Only built through [`Axis::uniform`] and [`Axis::variable`], so the edges
/// always hold at least two strictly increasing finite values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    /// Bin edges, strictly increasing, length = n_bins + 1.
    edges: Vec<f64>,
    label: String,
    /// Optional per-bin labels, indexed from the first regular bin.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bin_labels: Vec<String>,
}

impl Axis {
    /// `n_bins` equal-width bins over `[min, max)`.
    pub fn uniform(
        n_bins: usize,
        min: f64,
        max: f64,
        label: impl Into<String>,
    ) -> Result<Self, AodError> {
        if n_bins == 0 || n_bins > MAX_AXIS_BINS {
            return Err(AodError::InvalidAxis(format!(
                "bin count {n_bins} outside 1..={MAX_AXIS_BINS}"
            )));
        }
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(AodError::InvalidAxis(format!(
                "range [{min}, {max}) is empty or not finite"
            )));
        }
        let width = (max - min) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| min + width * i as f64).collect();
        edges.push(max);
        Ok(Self {
            edges,
            label: label.into(),
            bin_labels: Vec::new(),
        })
    }

    /// `n_bins` bins of equal width in log10 over `[min, max)`. `min` must be
    /// positive.
    pub fn logarithmic(
        n_bins: usize,
        min: f64,
        max: f64,
        label: impl Into<String>,
    ) -> Result<Self, AodError> {
        if !(min > 0.0) {
            return Err(AodError::InvalidAxis(format!(
                "logarithmic axis needs a positive lower edge, got {min}"
            )));
        }
        let linear = Self::uniform(n_bins, min.log10(), max.log10(), label)?;
        let edges = linear.edges.iter().map(|e| 10f64.powf(*e)).collect();
        Self::variable(edges, linear.label)
    }

    /// Variable-width bins from explicit edges.
    pub fn variable(edges: Vec<f64>, label: impl Into<String>) -> Result<Self, AodError> {
        if edges.len() < 2 || edges.len() > MAX_AXIS_BINS + 1 {
            return Err(AodError::InvalidAxis(format!(
                "{} edges given, need 2..={}",
                edges.len(),
                MAX_AXIS_BINS + 1
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(AodError::InvalidAxis("edges must be finite".to_string()));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AodError::InvalidAxis(
                "edges must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            edges,
            label: label.into(),
            bin_labels: Vec::new(),
        })
    }

    /// Bin edges.
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Axis title.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Per-bin labels, starting at the first regular bin.
    #[must_use]
    pub fn bin_labels(&self) -> &[String] {
        &self.bin_labels
    }

    /// Number of regular bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Lower edge of the first bin.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.edges.first().copied().unwrap_or(0.0)
    }

    /// Upper edge of the last bin.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.edges.last().copied().unwrap_or(0.0)
    }

    /// Storage index of a value: 0 underflow, `1..=n` regular, `n + 1` overflow.
    #[must_use]
    pub fn find_bin(&self, x: f64) -> usize {
        if x < self.min() {
            return 0;
        }
        if !(x < self.max()) {
            return self.n_bins() + 1;
        }
        // First edge strictly greater than x; x >= edges[0] so this is >= 1.
        self.edges.partition_point(|&e| e <= x)
    }

    /// Center of a regular bin (1-based).
    #[must_use]
    pub fn bin_center(&self, bin: usize) -> Option<f64> {
        if bin == 0 || bin > self.n_bins() {
            return None;
        }
        Some(0.5 * (self.edges[bin - 1] + self.edges[bin]))
    }

    /// Regular bin (1-based) carrying the given label.
    #[must_use]
    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.bin_labels
            .iter()
            .position(|l| l == label)
            .map(|i| i + 1)
    }
}

// =============================================================================
// HISTOGRAM
// =============================================================================

/// Dimensionality of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistogramKind {
    H1,
    H2,
}

impl HistogramKind {
    /// Number of axes.
    #[must_use]
    pub const fn dimension(self) -> usize {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
        }
    }
}

/// A binned counter.
///
/// The binning and the cell storage are fixed at construction; only the
/// contents and the entry count change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub name: String,
    pub title: String,
    kind: HistogramKind,
    x: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<Axis>,
    /// Sum of weights per cell, including under/overflow. For 2-D
    /// histograms the layout is `iy * (nx + 2) + ix`.
    contents: Vec<f64>,
    /// Number of fill calls.
    pub entries: u64,
}

impl Histogram {
    /// A 1-D histogram.
    #[must_use]
    pub fn new_1d(name: impl Into<String>, title: impl Into<String>, x: Axis) -> Self {
        let cells = x.n_bins() + 2;
        Self {
            name: name.into(),
            title: title.into(),
            kind: HistogramKind::H1,
            x,
            y: None,
            contents: vec![0.0; cells],
            entries: 0,
        }
    }

    /// A 2-D histogram.
    #[must_use]
    pub fn new_2d(name: impl Into<String>, title: impl Into<String>, x: Axis, y: Axis) -> Self {
        let cells = (x.n_bins() + 2) * (y.n_bins() + 2);
        Self {
            name: name.into(),
            title: title.into(),
            kind: HistogramKind::H2,
            x,
            y: Some(y),
            contents: vec![0.0; cells],
            entries: 0,
        }
    }

    /// Dimensionality.
    #[must_use]
    pub fn kind(&self) -> HistogramKind {
        self.kind
    }

    /// The x axis.
    #[must_use]
    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    /// The y axis of a 2-D histogram.
    #[must_use]
    pub fn y_axis(&self) -> Option<&Axis> {
        self.y.as_ref()
    }

    /// Raw cell contents, flows included.
    #[must_use]
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    fn cell(&self, ix: usize, iy: usize) -> usize {
        iy * (self.x.n_bins() + 2) + ix
    }

    /// Add `weight` at `x`.
    pub fn fill(&mut self, x: f64, weight: f64) -> Result<(), AodError> {
        if self.kind != HistogramKind::H1 {
            return Err(self.dimension_mismatch(1));
        }
        let bin = self.x.find_bin(x);
        self.contents[bin] += weight;
        self.entries = self.entries.saturating_add(1);
        Ok(())
    }

    /// Add `weight` at `(x, y)`.
    pub fn fill2(&mut self, x: f64, y: f64, weight: f64) -> Result<(), AodError> {
        let Some(y_axis) = &self.y else {
            return Err(self.dimension_mismatch(2));
        };
        let iy = y_axis.find_bin(y);
        let ix = self.x.find_bin(x);
        let cell = self.cell(ix, iy);
        self.contents[cell] += weight;
        self.entries = self.entries.saturating_add(1);
        Ok(())
    }

    /// Add `weight` to the x bin carrying `label`. Unknown labels go to
    /// overflow.
    pub fn fill_label(&mut self, label: &str, weight: f64) -> Result<(), AodError> {
        if self.kind != HistogramKind::H1 {
            return Err(self.dimension_mismatch(1));
        }
        let bin = self.x.find_label(label).unwrap_or(self.x.n_bins() + 1);
        self.contents[bin] += weight;
        self.entries = self.entries.saturating_add(1);
        Ok(())
    }

    /// Content of a 1-D storage bin (0 underflow, `n + 1` overflow).
    #[must_use]
    pub fn bin_content(&self, bin: usize) -> f64 {
        self.contents.get(bin).copied().unwrap_or(0.0)
    }

    /// Content of a 2-D storage cell.
    #[must_use]
    pub fn bin_content2(&self, ix: usize, iy: usize) -> f64 {
        if ix > self.x.n_bins() + 1 {
            return 0.0;
        }
        self.contents.get(self.cell(ix, iy)).copied().unwrap_or(0.0)
    }

    /// Underflow content of a 1-D histogram.
    #[must_use]
    pub fn underflow(&self) -> f64 {
        self.bin_content(0)
    }

    /// Overflow content of a 1-D histogram.
    #[must_use]
    pub fn overflow(&self) -> f64 {
        self.bin_content(self.x.n_bins() + 1)
    }

    /// Sum over regular bins only.
    #[must_use]
    pub fn integral(&self) -> f64 {
        let nx = self.x.n_bins();
        match &self.y {
            None => self.contents[1..=nx].iter().sum(),
            Some(y) => (1..=y.n_bins())
                .map(|iy| {
                    let start = self.cell(1, iy);
                    self.contents[start..start + nx].iter().sum::<f64>()
                })
                .sum(),
        }
    }

    /// Zero all contents, keeping the definition.
    pub fn reset(&mut self) {
        self.contents.iter_mut().for_each(|c| *c = 0.0);
        self.entries = 0;
    }

    fn dimension_mismatch(&self, found: usize) -> AodError {
        AodError::DimensionMismatch {
            name: self.name.clone(),
            expected: self.kind.dimension(),
            found,
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// The histograms of one analysis task, in definition order.
///
/// Definitions are added during initialization; after [`freeze`] the set of
/// histograms and their binning can no longer change, only their contents.
///
/// [`freeze`]: HistogramRegistry::freeze
#[derive(Debug, Clone, Serialize)]
pub struct HistogramRegistry {
    name: String,
    histograms: Vec<Histogram>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
    #[serde(skip)]
    frozen: bool,
}

impl HistogramRegistry {
    /// An empty, open registry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            histograms: Vec::new(),
            index: BTreeMap::new(),
            frozen: false,
        }
    }

    /// Registry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn insert(&mut self, histogram: Histogram) -> Result<(), AodError> {
        if self.frozen {
            return Err(AodError::RegistryFrozen(self.name.clone()));
        }
        if histogram.name.is_empty() || histogram.name.len() > MAX_HISTOGRAM_NAME_LENGTH {
            return Err(AodError::InvalidConfig(format!(
                "histogram name length must be 1..={MAX_HISTOGRAM_NAME_LENGTH}"
            )));
        }
        if self.index.contains_key(&histogram.name) {
            return Err(AodError::DuplicateHistogram(histogram.name));
        }
        self.index
            .insert(histogram.name.clone(), self.histograms.len());
        self.histograms.push(histogram);
        Ok(())
    }

    /// Define a 1-D histogram.
    pub fn add_1d(&mut self, name: &str, title: &str, x: Axis) -> Result<(), AodError> {
        self.insert(Histogram::new_1d(name, title, x))
    }

    /// Define a 2-D histogram.
    pub fn add_2d(&mut self, name: &str, title: &str, x: Axis, y: Axis) -> Result<(), AodError> {
        self.insert(Histogram::new_2d(name, title, x, y))
    }

    /// Label the x bins of a histogram, starting at the first regular bin.
    pub fn set_bin_labels(&mut self, name: &str, labels: &[&str]) -> Result<(), AodError> {
        if self.frozen {
            return Err(AodError::RegistryFrozen(self.name.clone()));
        }
        let histogram = self.get_mut(name)?;
        if labels.len() > histogram.x.n_bins() {
            return Err(AodError::InvalidAxis(format!(
                "{} labels for {} bins of {name}",
                labels.len(),
                histogram.x.n_bins()
            )));
        }
        histogram.x.bin_labels = labels.iter().map(|l| (*l).to_string()).collect();
        Ok(())
    }

    /// End initialization.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether initialization is over.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Look up a histogram.
    pub fn get(&self, name: &str) -> Result<&Histogram, AodError> {
        self.index
            .get(name)
            .map(|&i| &self.histograms[i])
            .ok_or_else(|| AodError::HistogramNotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Histogram, AodError> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.histograms[i]),
            None => Err(AodError::HistogramNotFound(name.to_string())),
        }
    }

    /// Whether a histogram with this name is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Count one entry at `x`.
    pub fn fill(&mut self, name: &str, x: impl Into<f64>) -> Result<(), AodError> {
        self.get_mut(name)?.fill(x.into(), 1.0)
    }

    /// Add `weight` at `x`.
    pub fn fill_weighted(
        &mut self,
        name: &str,
        x: impl Into<f64>,
        weight: f64,
    ) -> Result<(), AodError> {
        self.get_mut(name)?.fill(x.into(), weight)
    }

    /// Count one entry at `(x, y)`.
    pub fn fill2(
        &mut self,
        name: &str,
        x: impl Into<f64>,
        y: impl Into<f64>,
    ) -> Result<(), AodError> {
        self.get_mut(name)?.fill2(x.into(), y.into(), 1.0)
    }

    /// Count one entry in the bin carrying `label`.
    pub fn fill_label(&mut self, name: &str, label: &str) -> Result<(), AodError> {
        self.get_mut(name)?.fill_label(label, 1.0)
    }

    /// Histograms in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms.iter()
    }

    /// Number of defined histograms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Whether no histogram is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Zero every histogram, keeping definitions.
    pub fn reset(&mut self) {
        self.histograms.iter_mut().for_each(Histogram::reset);
    }
}

// =============================================================================
// TESTS
// =============================================================================
