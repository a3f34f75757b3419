//! Feeding model outputs and batch labels into metrics.

use crate::error::MlError;
use crate::training::metrics::MetricRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A dense row-major numeric array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl TensorData {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, MlError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(MlError::config(format!(
                "tensor of shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// A 0-dimensional tensor.
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// A 1-dimensional tensor.
    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Convert to nested JSON arrays; a 0-d tensor becomes a bare number.
    pub fn to_nested(&self) -> Value {
        nest(&self.shape, &self.data)
    }
}

fn number(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn nest(shape: &[usize], data: &[f64]) -> Value {
    match shape.split_first() {
        None => data.first().copied().map_or(Value::Null, number),
        Some((&dim, rest)) => {
            let stride: usize = rest.iter().product();
            Value::Array(
                (0..dim)
                    .map(|i| nest(rest, &data[i * stride..(i + 1) * stride]))
                    .collect(),
            )
        }
    }
}

/// A field of a model output or data batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Tensor(TensorData),
    Plain(Value),
}

impl FieldValue {
    /// Flatten into the list shape metrics consume: arrays stay as they are,
    /// null becomes empty, anything else becomes a one-element list.
    pub fn to_list(&self) -> Vec<Value> {
        let value = match self {
            Self::Tensor(t) => t.to_nested(),
            Self::Plain(v) => v.clone(),
        };
        match value {
            Value::Array(xs) => xs,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }
}

impl From<TensorData> for FieldValue {
    fn from(t: TensorData) -> Self {
        Self::Tensor(t)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Plain(v)
    }
}

/// Named fields of a model output or a data batch.
pub type Record = IndexMap<String, FieldValue>;

/// Feed every metric the predictions (and labels) it asks for.
///
/// All inputs are looked up before any metric is touched, so a missing field
/// leaves every metric unchanged.
pub fn update_metrics(
    outputs: &Record,
    batch: &Record,
    metrics: &mut MetricRegistry,
) -> Result<(), MlError> {
    let mut inputs = Vec::with_capacity(metrics.len());
    for (name, metric) in metrics.iter() {
        let preds = outputs.get(metric.pred_name()).ok_or_else(|| {
            MlError::config(format!(
                "Return dictionary from model does not contain '{}' entry, which was required for metric '{name}'",
                metric.pred_name()
            ))
        })?;
        let labels = match metric.label_name() {
            Some(label_name) => {
                let labels = batch.get(label_name).ok_or_else(|| {
                    MlError::config(format!(
                        "Data batch does not contain '{label_name}' entry, which was required for metric '{name}'"
                    ))
                })?;
                Some(labels.to_list())
            }
            None => None,
        };
        inputs.push((preds.to_list(), labels));
    }

    for ((name, metric), (preds, labels)) in metrics.iter_mut().zip(inputs) {
        tracing::trace!(metric = name, count = preds.len(), "Updating metric");
        metric.add(preds, labels)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistrySpec;
    use crate::training::metrics::{Accuracy, Metric, MetricValue, RunningAverage, to_metric_dict};
    use serde_json::json;

    fn record(fields: Vec<(&str, FieldValue)>) -> Record {
        fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_tensor_to_nested() {
        let t = TensorData::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(t.to_nested(), json!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        assert_eq!(TensorData::scalar(2.5).to_nested(), json!(2.5));
        assert_eq!(TensorData::new(vec![0, 4], vec![]).unwrap().to_nested(), json!([]));
    }

    #[test]
    fn test_tensor_shape_mismatch() {
        assert!(TensorData::new(vec![2, 2], vec![1.0]).unwrap_err().is_config());
    }

    #[test]
    fn test_field_to_list() {
        assert_eq!(FieldValue::Plain(json!(null)).to_list(), Vec::<Value>::new());
        assert_eq!(FieldValue::Plain(json!(3)).to_list(), vec![json!(3)]);
        assert_eq!(FieldValue::Plain(json!([1, 2])).to_list(), vec![json!(1), json!(2)]);
        assert_eq!(FieldValue::Tensor(TensorData::scalar(1.0)).to_list(), vec![json!(1.0)]);
    }

    #[test]
    fn test_update_metrics_feeds_preds_and_labels() {
        let spec: RegistrySpec<Box<dyn Metric>> = RegistrySpec::items([
            Box::new(Accuracy::new("class", "gold")) as Box<dyn Metric>,
            Box::new(RunningAverage::default()),
        ]);
        let mut metrics = to_metric_dict(spec).unwrap();
        let outputs = record(vec![
            ("class", TensorData::vector(vec![1.0, 0.0, 1.0, 1.0]).into()),
            ("loss", json!(0.5).into()),
        ]);
        let batch = record(vec![("gold", json!([1, 1, 1, 1]).into())]);

        update_metrics(&outputs, &batch, &mut metrics).unwrap();

        assert_eq!(metrics["Accuracy"].value(), MetricValue::Scalar(0.75));
        assert_eq!(metrics["RunningAverage"].value(), MetricValue::Scalar(0.5));
    }

    #[test]
    fn test_missing_prediction_names_metric() {
        let mut metrics =
            to_metric_dict(RegistrySpec::single(Box::new(RunningAverage::default()) as Box<dyn Metric>))
                .unwrap();
        let err = update_metrics(&Record::new(), &Record::new(), &mut metrics).unwrap_err();
        assert!(err.is_config());
        let msg = err.to_string();
        assert!(msg.contains("'loss'") && msg.contains("'RunningAverage'"));
    }

    #[test]
    fn test_missing_label_leaves_metrics_untouched() {
        let spec: RegistrySpec<Box<dyn Metric>> = RegistrySpec::items([
            Box::new(RunningAverage::default()) as Box<dyn Metric>,
            Box::new(Accuracy::default()),
        ]);
        let mut metrics = to_metric_dict(spec).unwrap();
        let outputs = record(vec![("loss", json!([2.0]).into()), ("preds", json!([1]).into())]);

        let err = update_metrics(&outputs, &Record::new(), &mut metrics).unwrap_err();
        assert!(err.to_string().contains("Data batch does not contain 'labels'"));
        assert_eq!(metrics["RunningAverage"].value(), MetricValue::Scalar(0.0));
    }
}
