use totsu::prelude::{Solver, SolverParam};
use crate::{La, BallError, BallResult, PointSet};
use crate::problem::{ProbBall, prob_norm_socp};

type ASolver = Solver<La>;

//

/// Encoding of the minimum enclosing ball as a conic linear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formulation
{
    /// One stacked second-order cone constraint of dimension \\(k(1 + n)\\), see [`ProbBall`].
    #[default]
    StackedCone,
    /// \\(k\\) separate norm inequalities through a generic SOCP, see [`prob_norm_socp`].
    PerPointNorm,
}

/// Ball solver options.
#[derive(Debug, Clone, PartialEq)]
pub struct BallOptions
{
    /// Problem encoding.
    pub formulation: Formulation,
    /// Parameters passed to the conic solver.
    pub par: SolverParam<f64>,
}

impl Default for BallOptions
{
    fn default() -> Self
    {
        BallOptions {
            formulation: Formulation::default(),
            par: SolverParam {
                max_iter: Some(1_000_000),
                eps_acc: 1e-8,
                eps_inf: 1e-8,
                ..SolverParam::default()
            },
        }
    }
}

impl BallOptions
{
    /// Creates default options.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Changes the problem encoding.
    pub fn formulation(mut self, formulation: Formulation) -> Self
    {
        self.formulation = formulation;
        self
    }

    /// Changes solver parameters.
    ///
    /// Returns [`BallOptions`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut SolverParam<f64>)
    {
        f(&mut self.par);
        self
    }

    fn solver(&self) -> ASolver
    {
        let par = self.par.clone();
        ASolver::new().par(|p| *p = par)
    }
}

//

/// Finds the smallest Euclidean ball containing every point.
///
/// Returns `Ok` with the [`BallResult`],
/// or `Err` with [`BallError::InvalidInput`] if the point set breaks its invariants,
/// [`BallError::SolveFailure`] carrying the solver status if the conic solver fails,
/// or [`BallError::NonFiniteSolution`].
/// * `points` is the point set.
/// * `options` selects the formulation and solver parameters.
///
/// The points are shifted by the first point and scaled to the unit ball before solving.
/// The returned radius is the largest distance from the returned center to a point.
pub fn solve_min_enclosing_ball(points: &PointSet, options: &BallOptions) -> Result<BallResult, BallError>
{
    let k = points.len();
    let n = points.dim();

    if k == 0 || n == 0 || points.as_slice().len() != k * n {
        return Err(BallError::InvalidInput("empty or ragged point set".into()));
    }

    let origin = points.point(0);

    let spread = points.iter()
                 .map(|p| distance(p, origin))
                 .fold(0., f64::max);

    if !spread.is_finite() {
        return Err(BallError::InvalidInput("point spread exceeds the floating-point range".into()));
    }

    if spread == 0. {
        log::debug!("{} coincident points of dimension {}", k, n);

        return Ok(BallResult {
            radius: 0.,
            center: origin.to_vec(),
        });
    }

    let scaled: Vec<f64> = points.iter()
                           .flat_map(|p| p.iter().zip(origin).map(|(v, o)| (v - o) / spread))
                           .collect();

    log::debug!("solving {:?} with {} points of dimension {}, spread {:.3e}", options.formulation, k, n, spread);

    let sol = match options.formulation {
        Formulation::StackedCone => {
            let mut prob = ProbBall::new(n, scaled);
            let rslt = options.solver().solve(prob.problem())?;
            rslt.0.to_vec()
        },
        Formulation::PerPointNorm => {
            let mut socp = prob_norm_socp(n, &scaled);
            let rslt = options.solver().solve(socp.problem())?;
            rslt.0.to_vec()
        },
    };

    if sol.iter().any(|v| !v.is_finite()) {
        log::warn!("non-finite solution {:?}", sol);
        return Err(BallError::NonFiniteSolution);
    }

    let (sol_r, sol_c) = sol.split_at(1);

    let center: Vec<f64> = sol_c.iter().zip(origin)
                           .map(|(c, o)| o + c * spread)
                           .collect();

    let radius = points.iter()
                 .map(|p| distance(p, &center))
                 .fold(0., f64::max);

    log::debug!("radius {:.9e} (solver {:.9e})", radius, sol_r[0] * spread);

    Ok(BallResult {
        radius,
        center,
    })
}

fn distance(a: &[f64], b: &[f64]) -> f64
{
    // hypot keeps the squares out of overflow and underflow
    a.iter().zip(b)
     .fold(0., |acc: f64, (x, y)| acc.hypot(x - y))
}

//

#[test]
fn test_known_instance()
{
    use float_eq::assert_float_eq;

    let _ = env_logger::builder().is_test(true).try_init();

    let ps = PointSet::from_rows(&[[2., 4.], [0., 0.], [2.5, 2.]]).unwrap();
    let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

    assert_float_eq!(ball.radius, 5_f64.sqrt(), abs <= 1e-4);
    assert_float_eq!(ball.center, vec![1., 2.], abs_all <= 1e-4);
}

#[test]
fn test_excess_iter()
{
    let ps = PointSet::from_rows(&[[2., 4.], [0., 0.], [2.5, 2.]]).unwrap();
    let opts = BallOptions::new().par(|p| {
        p.max_iter = Some(2);
    });

    assert!(matches!(solve_min_enclosing_ball(&ps, &opts), Err(BallError::SolveFailure(_))));
}

#[test]
fn test_single_point()
{
    let ps = PointSet::from_rows(&[[0.3, -7., 1e3]]).unwrap();
    let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

    assert_eq!(ball.radius, 0.);
    assert_eq!(ball.center, vec![0.3, -7., 1e3]);
}
