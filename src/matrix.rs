use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::{PointSet, ServiceError};

/// Named matrices carried by requests and responses.
pub type Matrices = BTreeMap<String, Matrix>;

//

/// Flattened matrix
///
/// A row-major data buffer and its shape:
/// `[]` for a scalar, `[n]` for a vector and `[k, n]` for a matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix
{
    pub data: Vec<f64>,
    pub shape: Vec<usize>,
}

impl Matrix
{
    /// Scalar, shape `[]`.
    pub fn scalar(v: f64) -> Self
    {
        Matrix {
            data: vec![v],
            shape: Vec::new(),
        }
    }

    /// Vector, shape `[n]`.
    pub fn vector(v: Vec<f64>) -> Self
    {
        let n = v.len();

        Matrix {
            data: v,
            shape: vec![n],
        }
    }

    /// Matrix of the points, shape `[k, n]`.
    pub fn from_points(points: &PointSet) -> Self
    {
        Matrix {
            data: points.as_slice().to_vec(),
            shape: vec![points.len(), points.dim()],
        }
    }

    /// Number of elements the shape declares, `None` on overflow.
    pub fn shape_len(&self) -> Option<usize>
    {
        self.shape.iter().try_fold(1_usize, |acc, d| acc.checked_mul(*d))
    }

    /// Checks that the buffer length matches the shape.
    ///
    /// Returns `Err` with [`ServiceError::MalformedRequest`] on mismatch.
    pub fn validate(&self) -> Result<(), ServiceError>
    {
        let expected = self.shape_len().ok_or_else(|| {
            ServiceError::MalformedRequest(format!("shape {:?} overflows", self.shape))
        })?;

        if self.data.len() != expected {
            return Err(ServiceError::MalformedRequest(format!(
                "data length {} does not match shape {:?} ({} elements)",
                self.data.len(), self.shape, expected
            )));
        }

        Ok(())
    }

    /// Scalar value if the shape is `[]`.
    pub fn as_scalar(&self) -> Option<f64>
    {
        if self.shape.is_empty() && self.data.len() == 1 {
            Some(self.data[0])
        }
        else {
            None
        }
    }

    /// Reshapes the matrix into a [`PointSet`], one row per point.
    ///
    /// Returns `Err` with [`ServiceError::MalformedRequest`] if the buffer does not match
    /// the shape or the shape is not two-dimensional,
    /// or [`ServiceError::InvalidInput`] if there is no point or the points are invalid.
    pub fn to_points(&self) -> Result<PointSet, ServiceError>
    {
        self.validate()?;

        let (rows, cols) = match self.shape[..] {
            [rows, cols] => (rows, cols),
            _ => {
                return Err(ServiceError::MalformedRequest(format!(
                    "point matrix must be two-dimensional, got shape {:?}", self.shape
                )));
            },
        };

        if rows == 0 {
            return Err(ServiceError::InvalidInput("matrix has no points".into()));
        }

        Ok(PointSet::new(self.data.clone(), rows, cols)?)
    }
}

//

#[test]
fn test_matrix_shapes()
{
    assert_eq!(Matrix::scalar(2.).shape_len(), Some(1));
    assert_eq!(Matrix::scalar(2.).as_scalar(), Some(2.));
    assert_eq!(Matrix::vector(vec![1., 2.]).shape, vec![2]);
    assert_eq!(Matrix::vector(vec![1., 2.]).as_scalar(), None);
}

#[test]
fn test_matrix_to_points()
{
    let m = Matrix {
        data: vec![2., 4., 0., 0., 2.5, 2.],
        shape: vec![3, 2],
    };
    let ps = m.to_points().unwrap();

    assert_eq!(ps.len(), 3);
    assert_eq!(Matrix::from_points(&ps), m);
}

#[test]
fn test_matrix_malformed()
{
    let m = Matrix {
        data: vec![1., 2., 3.],
        shape: vec![2, 2],
    };
    assert!(matches!(m.to_points(), Err(ServiceError::MalformedRequest(_))));

    let m = Matrix {
        data: vec![1., 2., 3.],
        shape: vec![3],
    };
    assert!(matches!(m.to_points(), Err(ServiceError::MalformedRequest(_))));

    let m = Matrix {
        data: vec![],
        shape: vec![usize::MAX, 2],
    };
    assert!(matches!(m.validate(), Err(ServiceError::MalformedRequest(_))));

    let m = Matrix {
        data: vec![],
        shape: vec![0, 2],
    };
    assert!(matches!(m.to_points(), Err(ServiceError::InvalidInput(_))));
}

#[test]
fn test_matrix_json()
{
    let m: Matrix = serde_json::from_str(r#"{"data":[1.0,2.0],"shape":[1,2]}"#).unwrap();

    assert_eq!(m.shape, vec![1, 2]);
    assert_eq!(serde_json::to_string(&Matrix::scalar(0.5)).unwrap(), r#"{"data":[0.5],"shape":[]}"#);
}
