//! Metric capability, metric values and metric registries.

use crate::error::MlError;
use crate::registry::{NamingPolicy, Registry, RegistrySpec, normalize};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// A captured metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Vector(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Vector(v)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v:.4}"),
            Self::Vector(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| format!("{v:.4}")).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Which way a scalar metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Direction {
    /// `Some(true)` if `a` beats `b`, `Some(false)` if `b` beats `a`, `None` on a tie
    /// or when either side is not a comparable scalar.
    pub fn better(self, a: &MetricValue, b: &MetricValue) -> Option<bool> {
        let ord = a.as_scalar()?.partial_cmp(&b.as_scalar()?)?;
        match ord {
            Ordering::Equal => None,
            Ordering::Greater => Some(self == Self::HigherIsBetter),
            Ordering::Less => Some(self == Self::LowerIsBetter),
        }
    }
}

/// A metric that accumulates predictions and can rank its own values.
///
/// Implementations are used through `Box<dyn Metric>`; the capability is
/// checked by the type system when a metric enters a registry.
pub trait Metric: Send + Sync + fmt::Debug {
    /// Key of the model output this metric reads.
    fn pred_name(&self) -> &str;

    /// Key of the batch field holding labels, if the metric needs labels.
    fn label_name(&self) -> Option<&str>;

    /// Current value over everything added since the last reset.
    fn value(&self) -> MetricValue;

    /// Three-way comparison: is `a` better than `b`? `None` means a tie.
    fn better(&self, a: &MetricValue, b: &MetricValue) -> Option<bool>;

    /// Accumulate a batch of predictions (and labels when `label_name` is set).
    fn add(&mut self, predicted: Vec<Value>, labels: Option<Vec<Value>>) -> Result<(), MlError>;

    fn reset(&mut self);

    fn clone_box(&self) -> Box<dyn Metric>;

    /// Fully qualified name of the implementing type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Type name without module path or generic arguments, e.g. `Accuracy`.
    fn short_type_name(&self) -> &'static str {
        short_type_name(self.type_name())
    }
}

impl Clone for Box<dyn Metric> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

pub type MetricRegistry = Registry<Box<dyn Metric>>;

/// Metric keys default to the metric type; clashes are split by what each
/// metric reads (`{name}_{pred_name}[_{label_name}]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricNaming;

impl NamingPolicy<Box<dyn Metric>> for MetricNaming {
    fn default_name(&self, _index: usize, metric: &Box<dyn Metric>) -> String {
        metric.short_type_name().to_string()
    }

    fn unambiguous_name(&self, name: &str, metric: &Box<dyn Metric>, _count: usize) -> String {
        match metric.label_name() {
            Some(label) => format!("{name}_{}_{label}", metric.pred_name()),
            None => format!("{name}_{}", metric.pred_name()),
        }
    }
}

/// Normalize a metric spec into a [`MetricRegistry`].
///
/// Metric order decides comparison priority, so keyed input must already be
/// order-preserving.
pub fn to_metric_dict(spec: RegistrySpec<Box<dyn Metric>>) -> Result<MetricRegistry, MlError> {
    if let RegistrySpec::Unordered(map) = &spec {
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        return Err(MlError::config(format!(
            "Metrics dictionary must be an order-preserving mapping (IndexMap), got an unordered map with keys {keys:?}"
        )));
    }
    normalize(spec, &MetricNaming)
}

fn numeric(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn values_match(a: &Value, b: &Value) -> bool {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn default_preds() -> String {
    "preds".to_string()
}

fn default_labels() -> Option<String> {
    Some("labels".to_string())
}

/// Fraction of predictions equal to their labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accuracy {
    #[serde(default = "default_preds")]
    pub pred_name: String,
    #[serde(default = "default_labels")]
    pub label_name: Option<String>,
    #[serde(skip)]
    correct: usize,
    #[serde(skip)]
    total: usize,
}

impl Accuracy {
    pub fn new(pred_name: impl Into<String>, label_name: impl Into<String>) -> Self {
        Self {
            pred_name: pred_name.into(),
            label_name: Some(label_name.into()),
            correct: 0,
            total: 0,
        }
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::new("preds", "labels")
    }
}

impl Metric for Accuracy {
    fn pred_name(&self) -> &str {
        &self.pred_name
    }

    fn label_name(&self) -> Option<&str> {
        self.label_name.as_deref()
    }

    fn value(&self) -> MetricValue {
        if self.total == 0 {
            return MetricValue::Scalar(0.0);
        }
        MetricValue::Scalar(self.correct as f64 / self.total as f64)
    }

    fn better(&self, a: &MetricValue, b: &MetricValue) -> Option<bool> {
        Direction::HigherIsBetter.better(a, b)
    }

    fn add(&mut self, predicted: Vec<Value>, labels: Option<Vec<Value>>) -> Result<(), MlError> {
        let labels = labels.ok_or_else(|| {
            MlError::config(format!("Accuracy over '{}' requires labels", self.pred_name))
        })?;
        if labels.len() != predicted.len() {
            return Err(MlError::config(format!(
                "Accuracy got {} predictions but {} labels",
                predicted.len(),
                labels.len()
            )));
        }
        self.correct += predicted
            .iter()
            .zip(&labels)
            .filter(|(p, l)| values_match(p, l))
            .count();
        self.total += predicted.len();
        Ok(())
    }

    fn reset(&mut self) {
        self.correct = 0;
        self.total = 0;
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }
}

fn default_loss() -> String {
    "loss".to_string()
}

fn default_direction() -> Direction {
    Direction::LowerIsBetter
}

/// Mean of numeric predictions, typically a loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningAverage {
    #[serde(default = "default_loss")]
    pub pred_name: String,
    #[serde(default = "default_direction")]
    pub direction: Direction,
    #[serde(skip)]
    sum: f64,
    #[serde(skip)]
    count: usize,
}

impl RunningAverage {
    pub fn new(pred_name: impl Into<String>, direction: Direction) -> Self {
        Self {
            pred_name: pred_name.into(),
            direction,
            sum: 0.0,
            count: 0,
        }
    }
}

impl Default for RunningAverage {
    fn default() -> Self {
        Self::new(default_loss(), default_direction())
    }
}

impl Metric for RunningAverage {
    fn pred_name(&self) -> &str {
        &self.pred_name
    }

    fn label_name(&self) -> Option<&str> {
        None
    }

    fn value(&self) -> MetricValue {
        if self.count == 0 {
            return MetricValue::Scalar(0.0);
        }
        MetricValue::Scalar(self.sum / self.count as f64)
    }

    fn better(&self, a: &MetricValue, b: &MetricValue) -> Option<bool> {
        self.direction.better(a, b)
    }

    fn add(&mut self, predicted: Vec<Value>, _labels: Option<Vec<Value>>) -> Result<(), MlError> {
        let values = predicted
            .iter()
            .map(|v| {
                numeric(v).ok_or_else(|| {
                    MlError::type_error(format!(
                        "RunningAverage over '{}' expects numbers, got {v}",
                        self.pred_name
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        self.sum += values.iter().sum::<f64>();
        self.count += values.len();
        Ok(())
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }
}
