//! Windowed, weighted running averages.

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::hash::Hash;

/// Weighted average of a scalar over the last `window` records (or all of them).
#[derive(Debug, Clone, Default)]
pub struct SingleAverageRecorder {
    window: Option<usize>,
    records: VecDeque<(f64, f64)>,
    sum: f64,
    weight_sum: f64,
}

impl SingleAverageRecorder {
    /// A `window` of `None` or `Some(0)` keeps every record.
    pub fn new(window: Option<usize>) -> Self {
        Self {
            window: window.filter(|&w| w > 0),
            ..Self::default()
        }
    }

    /// Add a record with weight 1 and return the updated average.
    pub fn add(&mut self, record: f64) -> f64 {
        self.add_weighted(record, 1.0)
    }

    /// Add a weighted record and return the updated average.
    pub fn add_weighted(&mut self, record: f64, weight: f64) -> f64 {
        self.sum += record * weight;
        self.weight_sum += weight;
        if let Some(window) = self.window {
            self.records.push_back((record, weight));
            if self.records.len() > window
                && let Some((old, old_weight)) = self.records.pop_front()
            {
                self.sum -= old * old_weight;
                self.weight_sum -= old_weight;
            }
        }
        self.avg()
    }

    /// Current average; 0 while the total weight is 0.
    pub fn avg(&self) -> f64 {
        if self.weight_sum == 0.0 {
            return 0.0;
        }
        self.sum / self.weight_sum
    }

    pub fn reset(&mut self) {
        self.records.clear();
        self.sum = 0.0;
        self.weight_sum = 0.0;
    }
}

/// One [`SingleAverageRecorder`] per key.
///
/// Each `add` only touches the keys it is given; the returned map holds the
/// current averages of every key seen so far, in first-seen order.
#[derive(Debug, Clone)]
pub struct AverageRecorder<K = usize> {
    window: Option<usize>,
    recorders: IndexMap<K, SingleAverageRecorder>,
}

impl<K: Hash + Eq + Clone> AverageRecorder<K> {
    pub fn new(window: Option<usize>) -> Self {
        Self {
            window,
            recorders: IndexMap::new(),
        }
    }

    pub fn add(&mut self, records: impl IntoIterator<Item = (K, f64)>) -> IndexMap<K, f64> {
        self.add_weighted(records, 1.0)
    }

    pub fn add_weighted(
        &mut self,
        records: impl IntoIterator<Item = (K, f64)>,
        weight: f64,
    ) -> IndexMap<K, f64> {
        for (key, record) in records {
            let window = self.window;
            self.recorders
                .entry(key)
                .or_insert_with(|| SingleAverageRecorder::new(window))
                .add_weighted(record, weight);
        }
        self.avg_all()
    }

    pub fn avg(&self, key: &K) -> Option<f64> {
        self.recorders.get(key).map(SingleAverageRecorder::avg)
    }

    /// Averages for the requested keys that have been recorded.
    pub fn avg_many<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> IndexMap<K, f64>
    where
        K: 'a,
    {
        keys.into_iter()
            .filter_map(|k| self.avg(k).map(|v| (k.clone(), v)))
            .collect()
    }

    pub fn avg_all(&self) -> IndexMap<K, f64> {
        self.recorders
            .iter()
            .map(|(k, r)| (k.clone(), r.avg()))
            .collect()
    }

    pub fn reset(&mut self) {
        self.recorders.clear();
    }
}

impl AverageRecorder<usize> {
    /// Add positional records; element `i` goes to key `i`.
    pub fn add_values(&mut self, records: &[f64]) -> Vec<f64> {
        self.add(records.iter().copied().enumerate());
        self.avg_values()
    }

    /// Averages in key order for the positional form.
    pub fn avg_values(&self) -> Vec<f64> {
        let mut entries: Vec<(usize, f64)> = self.avg_all().into_iter().collect();
        entries.sort_by_key(|(k, _)| *k);
        entries.into_iter().map(|(_, v)| v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground_truth(n: usize) -> f64 {
        // window of 5, record i with weight i
        let lb = n.saturating_sub(4);
        let (sum, w) = (lb..=n).fold((0.0, 0.0), |(s, w), i| {
            let i = i as f64;
            (s + i * i, w + i)
        });
        if w == 0.0 { 0.0 } else { sum / w }
    }

    #[test]
    fn test_constant_records() {
        for window in [Some(5), None] {
            let mut r = SingleAverageRecorder::new(window);
            for _ in 0..100 {
                assert_eq!(r.add(1.0), 1.0);
                assert_eq!(r.avg(), 1.0);
            }
        }
    }

    #[test]
    fn test_weighted_window() {
        let mut r = SingleAverageRecorder::new(Some(5));
        for i in 0..100 {
            let avg = r.add_weighted(i as f64, i as f64);
            assert!((avg - ground_truth(i)).abs() < 1e-9, "i={i}: {avg}");
        }
    }

    #[test]
    fn test_zero_weight_average_is_zero() {
        let mut r = SingleAverageRecorder::new(None);
        assert_eq!(r.add_weighted(7.0, 0.0), 0.0);
        r.reset();
        assert_eq!(r.avg(), 0.0);
    }

    #[test]
    fn test_positional_recorder() {
        let mut r: AverageRecorder = AverageRecorder::new(Some(5));
        for _ in 0..100 {
            assert_eq!(r.add_values(&[1.0, 2.0]), vec![1.0, 2.0]);
            assert_eq!(r.add_values(&[1.0]), vec![1.0, 2.0]);
            assert_eq!(r.avg(&0), Some(1.0));
            assert_eq!(r.avg(&1), Some(2.0));
        }
    }

    #[test]
    fn test_keyed_recorder() {
        let mut r: AverageRecorder<&str> = AverageRecorder::new(None);
        for _ in 0..100 {
            let all = r.add([("1", 1.0), ("2", 2.0)]);
            assert_eq!(all.get("1"), Some(&1.0));
            let all = r.add([("1", 1.0)]);
            assert_eq!(all.get("2"), Some(&2.0));
        }
        let picked = r.avg_many(&["2", "missing"]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked.get("2"), Some(&2.0));
    }
}
