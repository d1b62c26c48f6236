// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Open attribute maps carried by graph nodes.

use shape_core::{DType, Dim, PartialShape, TensorValue};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map of a node. Ordered so that iteration, display and
/// comparison are deterministic.
pub type Attrs = BTreeMap<String, AttrValue>;

/// A single attribute value.
///
/// Serialized untagged, so a JSON description can write
/// `"transpose_b": true` or `"perm": [1, 0]` directly. Shapes are stored as
/// [`AttrValue::Ints`] with `-1` for dynamic dimensions, data types as
/// [`AttrValue::Str`]; see [`AttrValue::shape`] and [`AttrValue::dtype`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Value(TensorValue),
}

impl AttrValue {
    /// Encodes a ranked shape as an integer list.
    ///
    /// Returns `None` for an unknown rank, or a dimension beyond `i64`,
    /// neither of which has an attribute form.
    pub fn shape(shape: &PartialShape) -> Option<AttrValue> {
        let dims = shape.dims()?;
        dims.iter()
            .map(|&d| i64::try_from(d).ok())
            .collect::<Option<Vec<_>>>()
            .map(AttrValue::Ints)
    }

    /// Encodes a data type by its label.
    pub fn dtype(dtype: DType) -> AttrValue {
        AttrValue::Str(dtype.as_str().to_string())
    }

    /// Short name of the variant, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::Ints(_) => "int list",
            AttrValue::Floats(_) => "float list",
            AttrValue::Value(_) => "tensor",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            AttrValue::Ints(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&TensorValue> {
        match self {
            AttrValue::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Decodes an integer list (with `-1` as dynamic) into a shape.
    pub fn as_shape(&self) -> Option<PartialShape> {
        let dims: Option<Vec<Dim>> = self
            .as_ints()?
            .iter()
            .map(|&d| Dim::try_from(d).ok())
            .collect();
        dims.map(PartialShape::Ranked)
    }

    /// Decodes a data-type label.
    pub fn as_dtype(&self) -> Option<DType> {
        DType::parse(self.as_str()?)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<DType> for AttrValue {
    fn from(v: DType) -> Self {
        AttrValue::dtype(v)
    }
}

impl From<TensorValue> for AttrValue {
    fn from(v: TensorValue) -> Self {
        AttrValue::Value(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(v) => write!(f, "{v:?}"),
            AttrValue::Ints(v) => write!(f, "{v:?}"),
            AttrValue::Floats(v) => write!(f, "{v:?}"),
            AttrValue::Value(v) => write!(f, "{v}"),
        }
    }
}
