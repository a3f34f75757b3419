//! Point-in-time metric values and the "is it better" ordering over them.

use crate::error::MlError;
use crate::training::metrics::{MetricRegistry, MetricValue};
use indexmap::IndexMap;
use std::sync::Arc;

/// Values of a metric registry captured at one evaluation point.
///
/// Two snapshots compare only when they were built from registries with the
/// same keys, in the same order, holding the same metric types. The first
/// registered metric is the primary criterion; later metrics break ties.
#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    metrics: Arc<MetricRegistry>,
    values: IndexMap<String, MetricValue>,
}

impl MetricSnapshot {
    /// Capture the live value of every metric.
    pub fn capture(metrics: Arc<MetricRegistry>) -> Self {
        let values = metrics
            .iter()
            .map(|(name, metric)| (name.to_string(), metric.value()))
            .collect();
        Self { metrics, values }
    }

    /// Pair a registry with externally supplied values.
    ///
    /// The values must cover exactly the registry's keys; they are stored in
    /// registry order.
    pub fn with_values(
        metrics: Arc<MetricRegistry>,
        mut values: IndexMap<String, MetricValue>,
    ) -> Result<Self, MlError> {
        let mut ordered = IndexMap::with_capacity(metrics.len());
        for name in metrics.keys() {
            let value = values.shift_remove(name).ok_or_else(|| {
                MlError::config(format!("no value supplied for metric '{name}'"))
            })?;
            ordered.insert(name.to_string(), value);
        }
        if !values.is_empty() {
            let extra: Vec<&str> = values.keys().map(String::as_str).collect();
            return Err(MlError::config(format!(
                "values supplied for unknown metrics: {extra:?}"
            )));
        }
        Ok(Self {
            metrics,
            values: ordered,
        })
    }

    pub fn metrics(&self) -> &MetricRegistry {
        &self.metrics
    }

    pub fn values(&self) -> &IndexMap<String, MetricValue> {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&MetricValue> {
        self.values.get(name)
    }

    /// Fail unless `other` was built from a registry of the same shape.
    pub fn ensure_compatible(&self, other: &MetricSnapshot) -> Result<(), MlError> {
        if Arc::ptr_eq(&self.metrics, &other.metrics) {
            return Ok(());
        }
        if self.metrics.len() != other.metrics.len() {
            return Err(MlError::config(format!(
                "Cannot compare metric snapshots with different base metrics: {} vs {} metrics",
                self.metrics.len(),
                other.metrics.len()
            )));
        }
        for ((name, metric), (other_name, other_metric)) in
            self.metrics.iter().zip(other.metrics.iter())
        {
            if name != other_name || metric.type_name() != other_metric.type_name() {
                return Err(MlError::config(format!(
                    "Cannot compare metric snapshots with different base metrics: \
                     '{name}' ({}) vs '{other_name}' ({})",
                    metric.short_type_name(),
                    other_metric.short_type_name()
                )));
            }
        }
        Ok(())
    }

    /// Whether every metric holds an equal value in both snapshots.
    pub fn try_eq(&self, other: &MetricSnapshot) -> Result<bool, MlError> {
        self.ensure_compatible(other)?;
        Ok(self
            .values
            .iter()
            .all(|(name, value)| other.values.get(name) == Some(value)))
    }

    /// Whether this snapshot is strictly better than `other`.
    ///
    /// Metrics are consulted in registry order and the first one that is not a
    /// tie decides. If every metric ties, the answer is `false`.
    pub fn is_better_than(&self, other: &MetricSnapshot) -> Result<bool, MlError> {
        self.ensure_compatible(other)?;
        for (name, metric) in self.metrics.iter() {
            let (Some(mine), Some(theirs)) = (self.values.get(name), other.values.get(name)) else {
                continue;
            };
            if let Some(better) = metric.better(mine, theirs) {
                return Ok(better);
            }
        }
        Ok(false)
    }
}
