use totsu_core::solver::{Solver, Operator, Cone, LinAlg};
use totsu_core::{ConeSOC, MatOp, MatType};
use crate::La;

//

pub struct ProbBallOpC
{
    n: usize,
}

impl Operator<La> for ProbBallOpC
{
    fn size(&self) -> (usize, usize)
    {
        (1 + self.n, 1)
    }

    fn op(&self, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
    {
        let (y_r, y_c) = y.split_at_mut(1);

        // y_r = a*1*x + b*y_r
        y_r[0] = alpha * x[0] + beta * y_r[0];

        // y_c = a*0*x + b*y_c
        La::scale(beta, y_c);
    }

    fn trans_op(&self, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
    {
        // y = a*x_r + b*y
        y[0] = alpha * x[0] + beta * y[0];
    }

    fn absadd_cols(&self, tau: &mut[f64])
    {
        tau[0] += 1.;
    }

    fn absadd_rows(&self, sigma: &mut[f64])
    {
        sigma[0] += 1.;
    }
}

//

pub struct ProbBallOpA
{
    n: usize,
    k: usize,
}

impl Operator<La> for ProbBallOpA
{
    fn size(&self) -> (usize, usize)
    {
        (self.k * (1 + self.n), 1 + self.n)
    }

    fn op(&self, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
    {
        let (x_r, x_c) = x.split_at(1);

        for y_i in y.chunks_mut(1 + self.n) {
            let (y_1, y_n) = y_i.split_at_mut(1);

            // y_1 = a*-x_r + b*y_1
            y_1[0] = -alpha * x_r[0] + beta * y_1[0];

            // y_n = a*x_c + b*y_n
            La::scale(beta, y_n);
            La::add(alpha, x_c, y_n);
        }
    }

    fn trans_op(&self, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
    {
        // y = b*y + ...
        La::scale(beta, y);

        let (y_r, y_c) = y.split_at_mut(1);

        for x_i in x.chunks(1 + self.n) {
            let (x_1, x_n) = x_i.split_at(1);

            // y_r = ... + a*-x_1 + ...
            y_r[0] -= alpha * x_1[0];

            // y_c = ... + a*x_n + ...
            La::add(alpha, x_n, y_c);
        }
    }

    fn absadd_cols(&self, tau: &mut[f64])
    {
        // every column holds k unit entries
        La::adds(self.k as f64, tau);
    }

    fn absadd_rows(&self, sigma: &mut[f64])
    {
        // every row holds one unit entry
        La::adds(1., sigma);
    }
}

//

pub struct ProbBallOpB<'a>
{
    vecs_p: Vec<MatOp<'a, La>>,
}

impl<'a> Operator<La> for ProbBallOpB<'a>
{
    fn size(&self) -> (usize, usize)
    {
        let mut n1_sum = 0;

        for vec_p in &self.vecs_p {
            let (n, one) = vec_p.size();
            assert_eq!(one, 1);

            n1_sum += 1 + n;
        }

        (n1_sum, 1)
    }

    fn op(&self, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
    {
        let mut done = 0;

        for vec_p in &self.vecs_p {
            let (n, _) = vec_p.size();

            let (_y_done, y_rest) = y.split_at_mut(done);
            let (y_1, y_rest) = y_rest.split_at_mut(1);
            let (y_n, _) = y_rest.split_at_mut(n);
            done += 1 + n;

            // y_1 = a*0*x + b*y_1
            y_1[0] *= beta;

            // y_n = a*vec_p*x + b*y_n
            vec_p.op(alpha, x, beta, y_n);
        }
    }

    fn trans_op(&self, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
    {
        // y = b*y + ...
        La::scale(beta, y);

        let mut done = 0;

        for vec_p in &self.vecs_p {
            let (n, _) = vec_p.size();

            let (_x_done, x_rest) = x.split_at(done);
            let (_x_1, x_rest) = x_rest.split_at(1);
            let (x_n, _) = x_rest.split_at(n);
            done += 1 + n;

            // y = ... + a*vec_p^T*x_n + ...
            vec_p.trans_op(alpha, x_n, 1., y);
        }
    }

    fn absadd_cols(&self, tau: &mut[f64])
    {
        for vec_p in &self.vecs_p {
            vec_p.absadd_cols(tau);
        }
    }

    fn absadd_rows(&self, sigma: &mut[f64])
    {
        let mut done = 0;

        for vec_p in &self.vecs_p {
            let (n, _) = vec_p.size();

            let (_sigma_done, sigma_rest) = sigma.split_at_mut(done);
            let (_sigma_1, sigma_rest) = sigma_rest.split_at_mut(1);
            let (sigma_n, _) = sigma_rest.split_at_mut(n);
            done += 1 + n;

            vec_p.absadd_rows(sigma_n);
        }
    }
}

//

pub struct ProbBallCone
{
    n: usize,
    cone_soc: ConeSOC<La>,
}

impl Cone<La> for ProbBallCone
{
    fn proj(&mut self, dual_cone: bool, x: &mut[f64]) -> Result<(), ()>
    {
        for x_i in x.chunks_mut(1 + self.n) {
            self.cone_soc.proj(dual_cone, x_i)?;
        }

        Ok(())
    }

    fn product_group<G: Fn(&mut[f64]) + Copy>(&self, dp_tau: &mut[f64], group: G)
    {
        for t_i in dp_tau.chunks_mut(1 + self.n) {
            self.cone_soc.product_group(t_i, group);
        }
    }
}

//

/// Minimum enclosing ball program
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-svg.js"></script>
///
/// The problem is
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & r \\\\
/// {\rm subject \ to} & (r, p_i - c) \in \mathcal{Q}^{1 + n} \quad (i = 0, \ldots, k - 1),
/// \end{array}
/// \\]
/// where
/// - variables \\( r \in \mathbb{R},\ c \in \mathbb{R}^n \\)
/// - \\( p_i \in \mathbb{R}^n \\) are the points.
///
/// The \\(k\\) cone memberships are stacked into a single constraint
/// of dimension \\(k(1 + n)\\).
/// The representation as a conic linear program is as follows:
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & \left[ \begin{array}{c} 1 \\\\ 0 \end{array} \right]^T
///   \left[ \begin{array}{c} r \\\\ c \end{array} \right] \\\\
/// {\rm subject \ to} &
///   \left[ \begin{array}{cc}
///   -1 & 0 \\\\ 0 & I_n \\\\
///   \vdots & \vdots \\\\
///   -1 & 0 \\\\ 0 & I_n
///   \end{array} \right]
///   \left[ \begin{array}{c} r \\\\ c \end{array} \right] + s =
///   \left[ \begin{array}{c}
///   0 \\\\ p_0 \\\\
///   \vdots \\\\
///   0 \\\\ p_{k - 1}
///   \end{array} \right] \\\\
/// & s \in \mathcal{Q}^{1 + n} \times \cdots \times \mathcal{Q}^{1 + n}.
/// \end{array}
/// \\]
///
/// \\( \mathcal{Q} \\) is a second-order (or quadratic) cone (see [`ConeSOC`]).
pub struct ProbBall
{
    n: usize,
    points: Vec<f64>,

    w_solver: Vec<f64>,
}

impl ProbBall
{
    /// Creates a minimum enclosing ball program with given points.
    ///
    /// Returns the [`ProbBall`] instance.
    /// * `n` is a dimension of the points.
    /// * `points` is a point-major array of \\(p_0, \\ldots, p_{k-1}\\).
    pub fn new(n: usize, points: Vec<f64>) -> Self
    {
        assert!(n > 0);
        assert!(!points.is_empty());
        assert_eq!(points.len() % n, 0);

        ProbBall {
            n,
            points,
            w_solver: Vec::new(),
        }
    }

    /// Generates the problem data structures to be fed to [`Solver::solve`].
    ///
    /// Returns a tuple of operators, a cone and a work slice.
    pub fn problem(&mut self) -> (ProbBallOpC, ProbBallOpA, ProbBallOpB<'_>, ProbBallCone, &mut[f64])
    {
        let n = self.n;
        let k = self.points.len() / n;

        let op_c = ProbBallOpC {
            n,
        };
        let op_a = ProbBallOpA {
            n,
            k,
        };
        let op_b = ProbBallOpB {
            vecs_p: self.points.chunks(n)
                    .map(|p| MatOp::new(MatType::General(n, 1), p))
                    .collect(),
        };

        let cone = ProbBallCone {
            n,
            cone_soc: ConeSOC::new(),
        };

        self.w_solver.resize(Solver::<La>::query_worklen(op_a.size()), 0.);

        (op_c, op_a, op_b, cone, self.w_solver.as_mut())
    }
}

//

#[cfg(test)]
fn sample_points() -> Vec<f64>
{
    vec![2., 4., 0., 0., 2.5, 2., -1., 3.]
}

#[cfg(test)]
fn check_operator<O: Operator<La>>(op: &O)
{
    use float_eq::assert_float_eq;
    use super::operator_ref;

    let (m, n) = op.size();

    let xi: Vec<f64> = (0.. m).map(|i| 1. + 0.25 * i as f64).collect();
    let mut yo = vec![0.5; n];
    op.trans_op(2., &xi, 0.5, &mut yo);

    let mut yo_ref = vec![0.5; n];
    operator_ref::trans_op(op.size(), |x, y| op.op(1., x, 0., y), 2., &xi, 0.5, &mut yo_ref);

    assert_float_eq!(yo, yo_ref, abs_all <= 1e-9);

    let mut tau = vec![0.; n];
    op.absadd_cols(&mut tau);

    let mut tau_ref = vec![0.; n];
    operator_ref::absadd_cols(op.size(), |x, y| op.op(1., x, 0., y), &mut tau_ref);

    assert_float_eq!(tau, tau_ref, abs_all <= 1e-9);

    let mut sigma = vec![0.; m];
    op.absadd_rows(&mut sigma);

    let mut sigma_ref = vec![0.; m];
    operator_ref::absadd_rows(op.size(), |x, y| op.trans_op(1., x, 0., y), &mut sigma_ref);

    assert_float_eq!(sigma, sigma_ref, abs_all <= 1e-9);
}

#[test]
fn test_op_c()
{
    let mut prob = ProbBall::new(2, sample_points());
    let (op_c, _, _, _, _) = prob.problem();

    check_operator(&op_c);
}

#[test]
fn test_op_a()
{
    let mut prob = ProbBall::new(2, sample_points());
    let (_, op_a, _, _, _) = prob.problem();

    assert_eq!(op_a.size(), (12, 3));
    check_operator(&op_a);
}

#[test]
fn test_op_b()
{
    let mut prob = ProbBall::new(2, sample_points());
    let (_, _, op_b, _, _) = prob.problem();

    assert_eq!(op_b.size(), (12, 1));
    check_operator(&op_b);

    let mut y = vec![0.; 12];
    op_b.op(1., &[1.], 0., &mut y);
    assert_eq!(y, vec![0., 2., 4., 0., 0., 0., 0., 2.5, 2., 0., -1., 3.]);
}

#[test]
fn test_cone_proj()
{
    use float_eq::assert_float_eq;

    let mut prob = ProbBall::new(2, sample_points());
    let (_, _, _, mut cone, _) = prob.problem();

    // inside, outside and polar blocks
    let mut x = vec![5., 3., 4., 0., 3., 4., -5., 3., 4.];
    cone.proj(false, &mut x).unwrap();

    assert_float_eq!(x, vec![5., 3., 4., 2.5, 1.5, 2., 0., 0., 0.], abs_all <= 1e-12);
}
