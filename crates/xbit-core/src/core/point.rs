use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One candidate input vector for the external simulation.
///
/// Points are immutable once created and cheap to clone; equality and hashing are defined on
/// the bit patterns of the coordinates (with `-0.0` folded onto `0.0`), so a point is
/// identified purely by its values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterPoint {
    values: Arc<[f64]>,
}

impl ParameterPoint {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into().into(),
        }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn canonical_bits(&self) -> impl Iterator<Item = u64> + '_ {
        self.values
            .iter()
            .map(|&v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
    }
}

impl PartialEq for ParameterPoint {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.canonical_bits().eq(other.canonical_bits())
    }
}

impl Eq for ParameterPoint {}

impl Hash for ParameterPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for bits in self.canonical_bits() {
            bits.hash(state);
        }
    }
}

impl From<Vec<f64>> for ParameterPoint {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[f64]> for ParameterPoint {
    fn from(values: &[f64]) -> Self {
        Self::new(values.to_vec())
    }
}

/// Renders a single number the way every record file of a scan does: the shortest
/// representation that round-trips, always carrying a decimal point or exponent.
pub fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

/// Joins numbers with single spaces using [`format_value`].
pub fn join_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|&v| format_value(v))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_values(&self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn points_with_equal_values_are_equal_and_hash_alike() {
        let a = ParameterPoint::new(vec![1.0, 2.5]);
        let b = ParameterPoint::from(&[1.0, 2.5][..]);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn negative_zero_is_identified_with_zero() {
        assert_eq!(
            ParameterPoint::new(vec![-0.0, 1.0]),
            ParameterPoint::new(vec![0.0, 1.0])
        );
    }

    #[test]
    fn points_of_different_length_differ() {
        assert_ne!(
            ParameterPoint::new(vec![1.0]),
            ParameterPoint::new(vec![1.0, 0.0])
        );
    }

    #[test]
    fn display_keeps_decimal_point_for_integral_values() {
        let point = ParameterPoint::new(vec![1.0, 2.0, -0.25]);
        assert_eq!(point.to_string(), "1.0 2.0 -0.25");
    }

    #[test]
    fn join_values_of_empty_slice_is_empty() {
        assert_eq!(join_values(&[]), "");
    }
}
