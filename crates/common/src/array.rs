// Dense n-dimensional numeric arrays.
//
// Analyses carry clustering labels, embedding coordinates and sample indices
// as shaped numeric arrays. Over HTTP they travel as plain nested JSON lists,
// so the array keeps its shape next to row-major data and converts explicitly.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("array of shape {shape:?} needs {expected} elements, got {actual}")]
    LengthMismatch { shape: Vec<usize>, expected: usize, actual: usize },

    #[error("ragged nested array at depth {depth}")]
    Ragged { depth: usize },

    #[error("array element is not a number: {0}")]
    NotNumeric(String),

    #[error("integer array element {0} does not fit in a signed 64-bit integer")]
    IntegerOverflow(u64),
}

/// Row-major element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Elements {
    fn len(&self) -> usize {
        match self {
            Self::Int(values) => values.len(),
            Self::Float(values) => values.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    elements: Elements,
}

impl NdArray {
    pub fn from_ints(shape: Vec<usize>, values: Vec<i64>) -> Result<Self, ShapeError> {
        Self::new(shape, Elements::Int(values))
    }

    pub fn from_floats(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, ShapeError> {
        Self::new(shape, Elements::Float(values))
    }

    /// One-dimensional integer array, e.g. cluster labels or sample indices.
    pub fn int_vector(values: Vec<i64>) -> Self {
        Self { shape: vec![values.len()], elements: Elements::Int(values) }
    }

    /// Two-dimensional float array built from equally sized rows.
    pub fn float_matrix(rows: Vec<Vec<f64>>) -> Result<Self, ShapeError> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(ShapeError::Ragged { depth: 1 });
        }
        let height = rows.len();
        Self::from_floats(vec![height, width], rows.into_iter().flatten().collect())
    }

    fn new(shape: Vec<usize>, elements: Elements) -> Result<Self, ShapeError> {
        let expected: usize = shape.iter().product();
        if expected != elements.len() {
            return Err(ShapeError::LengthMismatch { shape, expected, actual: elements.len() });
        }
        Ok(Self { shape, elements })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    /// Render the array as nested JSON lists following its shape.
    ///
    /// A zero-dimensional array renders as a bare number. Non-finite floats
    /// have no JSON representation and render as `null`.
    pub fn to_nested(&self) -> Value {
        let leaves: Vec<Value> = match &self.elements {
            Elements::Int(values) => values.iter().map(|&value| Value::from(value)).collect(),
            Elements::Float(values) => values
                .iter()
                .map(|&value| Number::from_f64(value).map_or(Value::Null, Value::Number))
                .collect(),
        };

        if self.shape.is_empty() {
            return leaves.into_iter().next().unwrap_or(Value::Null);
        }

        let mut level = leaves;
        for axis in (1..self.shape.len()).rev() {
            let width = self.shape[axis];
            let groups: usize = self.shape[..axis].iter().product();
            let mut values = level.into_iter();
            level = (0..groups).map(|_| Value::Array(values.by_ref().take(width).collect())).collect();
        }
        Value::Array(level)
    }

    /// Parse a nested JSON list into an array, inferring the shape from the
    /// first element at every depth. Integers stay integers unless any element
    /// is fractional; integers beyond `i64` are rejected rather than rounded.
    pub fn from_nested(value: &Value) -> Result<Self, ShapeError> {
        let mut shape = Vec::new();
        let mut cursor = value;
        while let Value::Array(items) = cursor {
            shape.push(items.len());
            match items.first() {
                Some(first) => cursor = first,
                None => break,
            }
        }

        let mut leaves = Vec::new();
        collect_leaves(value, &shape, 0, &mut leaves)?;

        let too_large = leaves
            .iter()
            .filter_map(|number| number.as_u64())
            .find(|&value| i64::try_from(value).is_err());
        if let Some(value) = too_large {
            return Err(ShapeError::IntegerOverflow(value));
        }

        let elements = if leaves.iter().all(|number| number.as_i64().is_some()) {
            Elements::Int(leaves.iter().filter_map(|number| number.as_i64()).collect())
        } else {
            Elements::Float(leaves.iter().filter_map(|number| number.as_f64()).collect())
        };

        Self::new(shape, elements)
    }
}

fn collect_leaves<'a>(
    value: &'a Value,
    shape: &[usize],
    depth: usize,
    out: &mut Vec<&'a Number>,
) -> Result<(), ShapeError> {
    match (value, shape.get(depth)) {
        (Value::Array(items), Some(&expected)) => {
            if items.len() != expected {
                return Err(ShapeError::Ragged { depth });
            }
            items.iter().try_for_each(|item| collect_leaves(item, shape, depth + 1, out))
        }
        (Value::Number(number), None) => {
            out.push(number);
            Ok(())
        }
        (Value::Array(_), None) | (Value::Number(_), Some(_)) => Err(ShapeError::Ragged { depth }),
        (other, _) => Err(ShapeError::NotNumeric(other.to_string())),
    }
}

impl<'de> Deserialize<'de> for NdArray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_nested(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_vector_renders_flat_list() {
        let labels = NdArray::int_vector(vec![0, 1, 1, 2]);
        assert_eq!(labels.shape(), &[4]);
        assert_eq!(labels.to_nested(), json!([0, 1, 1, 2]));
    }

    #[test]
    fn float_matrix_renders_rows() {
        let coordinates =
            NdArray::float_matrix(vec![vec![0.5, -1.0], vec![2.25, 3.0], vec![4.0, 5.5]])
                .expect("rows are rectangular");
        assert_eq!(coordinates.shape(), &[3, 2]);
        assert_eq!(coordinates.to_nested(), json!([[0.5, -1.0], [2.25, 3.0], [4.0, 5.5]]));
    }

    #[test]
    fn three_dimensional_array_nests_in_row_major_order() {
        let array = NdArray::from_ints(vec![2, 2, 2], (0..8).collect()).expect("shape matches");
        assert_eq!(array.to_nested(), json!([[[0, 1], [2, 3]], [[4, 5], [6, 7]]]));
    }

    #[test]
    fn empty_inner_axis_keeps_outer_groups() {
        let array = NdArray::from_floats(vec![2, 0], Vec::new()).expect("shape matches");
        assert_eq!(array.to_nested(), json!([[], []]));
    }

    #[test]
    fn scalar_renders_as_bare_number() {
        let array = NdArray::from_ints(Vec::new(), vec![7]).expect("scalar shape");
        assert_eq!(array.ndim(), 0);
        assert_eq!(array.to_nested(), json!(7));
    }

    #[test]
    fn non_finite_floats_render_as_null() {
        let array = NdArray::from_floats(vec![2], vec![f64::NAN, 1.5]).expect("shape matches");
        assert_eq!(array.to_nested(), json!([null, 1.5]));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let error = NdArray::from_ints(vec![2, 3], vec![1, 2, 3]).expect_err("5 != 6");
        assert_eq!(
            error,
            ShapeError::LengthMismatch { shape: vec![2, 3], expected: 6, actual: 3 }
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = NdArray::float_matrix(vec![vec![1.0, 2.0], vec![3.0]]).expect_err("ragged");
        assert_eq!(error, ShapeError::Ragged { depth: 1 });
    }

    #[test]
    fn from_nested_infers_shape_and_integer_kind() {
        let array = NdArray::from_nested(&json!([[1, 2, 3], [4, 5, 6]])).expect("rectangular");
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.elements(), &Elements::Int(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn from_nested_promotes_to_float_when_any_element_is_fractional() {
        let array = NdArray::from_nested(&json!([1, 2.5])).expect("flat list");
        assert_eq!(array.elements(), &Elements::Float(vec![1.0, 2.5]));
    }

    #[test]
    fn from_nested_rejects_ragged_and_non_numeric_input() {
        assert_eq!(
            NdArray::from_nested(&json!([[1, 2], [3]])),
            Err(ShapeError::Ragged { depth: 1 })
        );
        assert_eq!(NdArray::from_nested(&json!([[1, 2], 3])), Err(ShapeError::Ragged { depth: 1 }));
        assert!(matches!(
            NdArray::from_nested(&json!(["a"])),
            Err(ShapeError::NotNumeric(_))
        ));
    }

    #[test]
    fn integers_beyond_i64_are_rejected_instead_of_rounded() {
        assert_eq!(
            NdArray::from_nested(&json!([1, u64::MAX])),
            Err(ShapeError::IntegerOverflow(u64::MAX))
        );
        let largest = NdArray::from_nested(&json!([i64::MAX])).expect("fits in i64");
        assert_eq!(largest.elements(), &Elements::Int(vec![i64::MAX]));
    }

    #[test]
    fn empty_list_parses_as_empty_vector() {
        let array = NdArray::from_nested(&json!([])).expect("empty list");
        assert_eq!(array.shape(), &[0]);
        assert!(array.is_empty());
    }

    #[test]
    fn deserializes_through_serde() {
        let array: NdArray = serde_json::from_str("[[0.0, 1.0], [1.0, 0.0]]").expect("valid json");
        assert_eq!(array.shape(), &[2, 2]);
    }
}
