//! Equi-width selectivity histograms, used by a query planner (out of
//! scope here) to estimate predicate selectivity without scanning data.

use crate::predicate::Op;

pub struct IntHistogram {
    min: i32,
    max: i32,
    buckets: Vec<u64>,
    width: f64,
    total: u64,
}

impl IntHistogram {
    pub fn new(num_buckets: usize, min: i32, max: i32) -> IntHistogram {
        let width = ((max - min) as f64 / num_buckets as f64).max(1.0);
        IntHistogram {
            min,
            max,
            buckets: vec![0; num_buckets.max(1)],
            width,
            total: 0,
        }
    }

    fn bucket_of(&self, v: i32) -> usize {
        let idx = ((v - self.min) as f64 / self.width) as usize;
        idx.min(self.buckets.len() - 1)
    }

    pub fn add_value(&mut self, v: i32) {
        let b = self.bucket_of(v);
        self.buckets[b] += 1;
        self.total += 1;
    }

    pub fn estimate_selectivity(&self, op: Op, v: i32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        match op {
            Op::Equals => self.equals(v),
            Op::NotEquals => 1.0 - self.equals(v),
            Op::LessThan => self.less_than(v),
            Op::LessThanOrEq => self.less_than(v),
            Op::GreaterThan => self.greater_than(v),
            Op::GreaterThanOrEq => self.greater_than(v),
        }
    }

    fn equals(&self, v: i32) -> f64 {
        if v < self.min || v > self.max {
            return 0.0;
        }
        let b = self.bucket_of(v);
        self.buckets[b] as f64 / (self.width * self.total as f64)
    }

    fn less_than(&self, v: i32) -> f64 {
        if v <= self.min {
            return 0.0;
        }
        if v > self.max {
            return 1.0;
        }
        let b = self.bucket_of(v);
        let bucket_start = b as f64 * self.width + self.min as f64;
        let frac = (v as f64 - bucket_start) / self.width;
        let mut sel = self.buckets[b] as f64 / self.total as f64 * frac;
        for i in 0..b {
            sel += self.buckets[i] as f64 / self.total as f64;
        }
        sel
    }

    fn greater_than(&self, v: i32) -> f64 {
        if v < self.min {
            return 1.0;
        }
        if v >= self.max {
            return 0.0;
        }
        1.0 - self.less_than(v) - self.equals(v)
    }
}

/// Defers to an integer histogram over a hash of each string's first few
/// characters, weighted by position, into a bounded integer range.
pub struct StringHistogram {
    inner: IntHistogram,
}

const STRING_HISTOGRAM_MIN: i32 = 0;
const STRING_HISTOGRAM_MAX: i32 = i32::MAX;

impl StringHistogram {
    pub fn new(num_buckets: usize) -> StringHistogram {
        StringHistogram {
            inner: IntHistogram::new(num_buckets, STRING_HISTOGRAM_MIN, STRING_HISTOGRAM_MAX),
        }
    }

    /// Hashes the first 4 characters, most-significant first, into a
    /// value in `[0, i32::MAX]`.
    fn hash(s: &str) -> i32 {
        let mut value: i64 = 0;
        for (i, c) in s.chars().take(4).enumerate() {
            let weight = 1i64 << (8 * (3 - i));
            value += (c as i64) * weight;
        }
        (value.rem_euclid(i32::MAX as i64)) as i32
    }

    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(Self::hash(s));
    }

    pub fn estimate_selectivity(&self, op: Op, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, Self::hash(s))
    }
}
