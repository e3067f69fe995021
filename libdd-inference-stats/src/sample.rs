// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The numeric representations the robust statistics operate on.

use std::cmp::Ordering;
use std::ops::Add;
use std::time::Duration;

/// A value that can be sorted, summed and averaged.
///
/// Means are always accumulated as `f64` and converted back with [`Sample::from_f64`], so
/// integer-backed samples truncate toward zero and never overflow while averaging.
pub trait Sample: Copy + PartialOrd + Default + Add<Output = Self> {
    /// Lossy widening into `f64`.
    fn to_f64(self) -> f64;

    /// Narrowing from `f64`. Integer representations truncate toward zero and saturate.
    fn from_f64(value: f64) -> Self;

    /// Total ordering used when sorting samples.
    fn cmp_sample(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

macro_rules! impl_integer_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn cmp_sample(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }
            }
        )*
    };
}

impl_integer_sample!(i32, i64, u32, u64);

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn cmp_sample(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn cmp_sample(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

/// Durations are averaged at nanosecond resolution.
impl Sample for Duration {
    #[inline]
    fn to_f64(self) -> f64 {
        self.as_nanos() as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        Duration::from_nanos(value.max(0.0) as u64)
    }

    #[inline]
    fn cmp_sample(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_from_f64_truncates() {
        assert_eq!(i64::from_f64(5.9), 5);
        assert_eq!(i64::from_f64(-5.9), -5);
        assert_eq!(u64::from_f64(-1.0), 0);
    }

    #[test]
    fn duration_round_trips_through_nanos() {
        let d = Duration::from_micros(1500);
        assert_eq!(Duration::from_f64(d.to_f64()), d);
        assert_eq!(Duration::from_f64(-3.0), Duration::ZERO);
    }

    #[test]
    fn float_ordering_is_total() {
        assert_eq!(f64::NAN.cmp_sample(&1.0), Ordering::Greater);
        assert_eq!(1.0f64.cmp_sample(&2.0), Ordering::Less);
    }
}
