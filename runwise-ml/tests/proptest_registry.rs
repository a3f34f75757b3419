//! Property-based tests for registry normalization and snapshot comparison.

use indexmap::IndexMap;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use runwise_ml::registry::{Named, RegistrySpec, to_dict};
use runwise_ml::training::{Accuracy, Metric, MetricSnapshot, MetricValue, RunningAverage, to_metric_dict};

fn items() -> impl Strategy<Value = Vec<(Option<String>, i32)>> {
    prop::collection::vec(
        (prop::option::of(prop::sample::select(vec!["a", "b", "c"])), any::<i32>())
            .prop_map(|(name, v)| (name.map(str::to_string), v)),
        0..30,
    )
}

fn spec(items: &[(Option<String>, i32)]) -> RegistrySpec<i32> {
    RegistrySpec::Sequence(
        items
            .iter()
            .map(|(name, v)| Named {
                name: name.clone(),
                value: *v,
            })
            .collect(),
    )
}

// --- Normalization properties ---

proptest! {
    #[test]
    fn normalize_keeps_every_item(items in items()) {
        let registry = to_dict(spec(&items), None).unwrap();
        prop_assert_eq!(registry.len(), items.len());
        let keys: HashSet<&str> = registry.keys().collect();
        prop_assert_eq!(keys.len(), items.len());

        let mut expected: Vec<i32> = items.iter().map(|(_, v)| *v).collect();
        let mut actual: Vec<i32> = registry.values().copied().collect();
        expected.sort_unstable();
        actual.sort_unstable();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn normalize_is_idempotent(items in items()) {
        let first = to_dict(spec(&items), None).unwrap();
        let second = to_dict(spec(&items), None).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn collided_names_are_replaced(items in items()) {
        let registry = to_dict(spec(&items), None).unwrap();
        for name in ["a", "b", "c"] {
            let count = items.iter().filter(|(n, _)| n.as_deref() == Some(name)).count();
            prop_assert_eq!(registry.contains_key(name), count == 1);
            for i in 1..=count {
                let key = format!("{name}.{i}");
                prop_assert_eq!(registry.contains_key(&key), count > 1);
            }
        }
    }

    #[test]
    fn fixed_default_name_numbers_items(values in prop::collection::vec(any::<u8>(), 2..20)) {
        let registry = to_dict(RegistrySpec::items(values.clone()), Some("m")).unwrap();
        let expected: Vec<String> = (1..=values.len()).map(|i| format!("m.{i}")).collect();
        prop_assert_eq!(registry.keys().collect::<Vec<_>>(), expected);
        prop_assert_eq!(registry.values().copied().collect::<Vec<_>>(), values);
    }

    #[test]
    fn ordered_map_passes_through(entries in prop::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..20)) {
        let map: IndexMap<String, i64> = entries.into_iter().collect();
        let registry = to_dict(RegistrySpec::Ordered(map.clone()), None).unwrap();
        prop_assert_eq!(registry.into_inner(), map);
    }
}

// --- Snapshot properties ---

fn metrics() -> Arc<runwise_ml::MetricRegistry> {
    let spec: RegistrySpec<Box<dyn Metric>> = RegistrySpec::items([
        Box::new(Accuracy::default()) as Box<dyn Metric>,
        Box::new(RunningAverage::default()),
    ]);
    Arc::new(to_metric_dict(spec).unwrap())
}

fn snapshot(metrics: &Arc<runwise_ml::MetricRegistry>, acc: f64, loss: f64) -> MetricSnapshot {
    let mut values = IndexMap::new();
    values.insert("Accuracy".to_string(), MetricValue::Scalar(acc));
    values.insert("RunningAverage".to_string(), MetricValue::Scalar(loss));
    MetricSnapshot::with_values(metrics.clone(), values).unwrap()
}

proptest! {
    #[test]
    fn snapshot_equality_reflexive_and_symmetric(
        a in (0.0f64..1.0, 0.0f64..10.0),
        b in (0.0f64..1.0, 0.0f64..10.0),
    ) {
        let m = metrics();
        let x = snapshot(&m, a.0, a.1);
        let y = snapshot(&m, b.0, b.1);
        prop_assert!(x.try_eq(&x).unwrap());
        prop_assert_eq!(x.try_eq(&y).unwrap(), y.try_eq(&x).unwrap());
    }

    #[test]
    fn better_is_asymmetric(
        a in (0.0f64..1.0, 0.0f64..10.0),
        b in (0.0f64..1.0, 0.0f64..10.0),
    ) {
        let m = metrics();
        let x = snapshot(&m, a.0, a.1);
        let y = snapshot(&m, b.0, b.1);
        prop_assert!(!(x.is_better_than(&y).unwrap() && y.is_better_than(&x).unwrap()));
        prop_assert!(!x.is_better_than(&x).unwrap());
    }

    #[test]
    fn accuracy_is_primary_criterion(
        acc in (0.0f64..1.0, 0.0f64..1.0),
        loss in (0.0f64..10.0, 0.0f64..10.0),
    ) {
        prop_assume!(acc.0 != acc.1);
        let m = metrics();
        let x = snapshot(&m, acc.0, loss.0);
        let y = snapshot(&m, acc.1, loss.1);
        prop_assert_eq!(x.is_better_than(&y).unwrap(), acc.0 > acc.1);
    }
}
