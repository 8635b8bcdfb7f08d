use crate::BallError;

//

/// Point set
///
/// An ordered sequence of \\(k\\) points in \\(\mathbb{R}^n\\),
/// stored as a row-major \\(k \times n\\) matrix.
///
/// A [`PointSet`] always holds at least one point of positive dimension
/// and only finite coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet
{
    data: Vec<f64>,
    len: usize,
    dim: usize,
}

impl PointSet
{
    /// Creates a point set from a row-major data array.
    ///
    /// Returns the [`PointSet`] instance, or `Err` with [`BallError::InvalidInput`]
    /// if the set is empty, zero-dimensional, ragged or not finite.
    /// * `data` is the row-major array of `rows * cols` coordinates.
    /// * `rows` is a number of points \\(k\\).
    /// * `cols` is a dimension \\(n\\).
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self, BallError>
    {
        if rows == 0 {
            return Err(BallError::InvalidInput("empty point set".into()));
        }
        if cols == 0 {
            return Err(BallError::InvalidInput("points have zero dimension".into()));
        }
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(BallError::InvalidInput(format!(
                "ragged point set: {} values for {} points of dimension {}",
                data.len(), rows, cols
            )));
        }
        if let Some(i) = data.iter().position(|v| !v.is_finite()) {
            return Err(BallError::InvalidInput(format!(
                "non-finite coordinate at point {}", i / cols
            )));
        }

        Ok(PointSet {
            data,
            len: rows,
            dim: cols,
        })
    }

    /// Creates a point set from a slice of points.
    ///
    /// Returns the [`PointSet`] instance, or `Err` with [`BallError::InvalidInput`]
    /// if there is no point or the points differ in dimension.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, BallError>
    {
        let dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(BallError::InvalidInput(format!(
                    "ragged point set: point {} has dimension {}, expected {}",
                    i, row.len(), dim
                )));
            }
            data.extend_from_slice(row);
        }

        PointSet::new(data, rows.len(), dim)
    }

    /// Number of points \\(k\\).
    pub fn len(&self) -> usize
    {
        self.len
    }

    /// Checks if there is no point, which never holds for a constructed set.
    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    /// Dimension \\(n\\) of each point.
    pub fn dim(&self) -> usize
    {
        self.dim
    }

    /// Coordinates of the `i`-th point.
    pub fn point(&self, i: usize) -> &[f64]
    {
        let (_, spl) = self.data.split_at(i * self.dim);
        &spl[.. self.dim]
    }

    /// Iterates the points in order.
    pub fn iter(&self) -> impl Iterator<Item=&[f64]>
    {
        self.data.chunks(self.dim)
    }

    /// Row-major data array.
    pub fn as_slice(&self) -> &[f64]
    {
        &self.data
    }

    /// Point set with every point moved by `offset`.
    pub fn translated(&self, offset: &[f64]) -> Self
    {
        assert_eq!(offset.len(), self.dim);

        let data = self.iter()
                   .flat_map(|p| p.iter().zip(offset).map(|(v, o)| v + o))
                   .collect();

        PointSet {
            data,
            len: self.len,
            dim: self.dim,
        }
    }
}

//

/// Ball
///
/// The minimum enclosing ball found by [`crate::solve_min_enclosing_ball`].
#[derive(Debug, Clone, PartialEq)]
pub struct BallResult
{
    /// Radius, non-negative.
    pub radius: f64,
    /// Center, of the same dimension as the points.
    pub center: Vec<f64>,
}

impl BallResult
{
    /// Euclidean distance from the center to `point`.
    pub fn distance(&self, point: &[f64]) -> f64
    {
        assert_eq!(point.len(), self.center.len());

        point.iter().zip(&self.center)
             .fold(0., |acc: f64, (p, c)| acc.hypot(p - c))
    }

    /// Checks if `point` lies in the ball enlarged by `tol`.
    pub fn contains(&self, point: &[f64], tol: f64) -> bool
    {
        self.distance(point) <= self.radius + tol
    }
}

//

#[test]
fn test_pointset_rows()
{
    let ps = PointSet::from_rows(&[[2., 4.], [0., 0.], [2.5, 2.]]).unwrap();

    assert_eq!(ps.len(), 3);
    assert_eq!(ps.dim(), 2);
    assert_eq!(ps.point(2), &[2.5, 2.]);
    assert_eq!(ps.iter().count(), 3);
}

#[test]
fn test_pointset_invalid()
{
    let empty: [[f64; 2]; 0] = [];
    assert!(matches!(PointSet::from_rows(&empty), Err(BallError::InvalidInput(_))));

    let ragged = vec![vec![1., 2.], vec![3.]];
    assert!(matches!(PointSet::from_rows(&ragged), Err(BallError::InvalidInput(_))));

    assert!(matches!(PointSet::new(vec![], 1, 0), Err(BallError::InvalidInput(_))));
    assert!(matches!(PointSet::new(vec![1., 2., 3.], 2, 2), Err(BallError::InvalidInput(_))));
    assert!(matches!(PointSet::new(vec![1., f64::NAN], 1, 2), Err(BallError::InvalidInput(_))));
}

#[test]
fn test_pointset_translated()
{
    let ps = PointSet::from_rows(&[[1., 2.], [3., 4.]]).unwrap();
    let moved = ps.translated(&[10., -1.]);

    assert_eq!(moved.as_slice(), &[11., 1., 13., 3.]);
}

#[test]
fn test_ball_contains()
{
    let ball = BallResult {
        radius: 5.,
        center: vec![0., 0.],
    };

    assert!(ball.contains(&[3., 4.], 0.));
    assert!(!ball.contains(&[3., 4.1], 1e-3));

    let ball = BallResult {
        radius: 0.,
        center: vec![0., 0.],
    };

    assert!((ball.distance(&[3e200, 4e200]) - 5e200).abs() <= 1e-12 * 5e200);
    assert!(ball.distance(&[3e-200, 4e-200]) > 0.);
}
