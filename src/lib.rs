/*!
Smallest enclosing ball of a point set, as a second-order cone program solved by [`totsu_core`].

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

Given points \\(p_0, \ldots, p_{k-1} \in {\bf R}^n\\), the crate finds
\\[
\begin{array}{ll}
{\rm minimize} & r \\\\
{\rm subject \ to} & \\| p_i - x \\|_2 \le r \quad (i = 0, \ldots, k - 1)
\end{array}
\\]
with variables \\(r \in {\bf R}\\) and \\(x \in {\bf R}^n\\),
and serves the computation over TCP with newline-delimited JSON.

# General usage

1. Build a [`PointSet`] from rows of coordinates.
1. Optionally change [`BallOptions`]: the [`Formulation`] and the solver parameters.
1. Invoke [`solve_min_enclosing_ball`] to get a [`BallResult`].

For out-of-process callers, [`server::Server`] wraps a [`service::ComputeService`]
which takes named [`Matrix`] values, see [`protocol`].

# Examples

```
use float_eq::assert_float_eq;
use cvxball::*;

//env_logger::init(); // Use any logger crate as `cvxball` uses `log` crate.

let ps = PointSet::from_rows(&[[2., 4.], [0., 0.], [2.5, 2.]]).unwrap();

let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

assert_float_eq!(ball.radius, 5_f64.sqrt(), abs <= 1e-4);
assert_float_eq!(ball.center, vec![1., 2.], abs_all <= 1e-4);
```
*/

mod error;

pub use error::*;

//

mod pointset;

pub use pointset::*;

//

pub mod problem;

mod solver;

pub use solver::*;

//

mod matrix;

pub use matrix::*;

pub mod protocol;
pub mod service;
pub mod server;
pub mod config;

//

/// Linear algebra used by the solver.
pub type La = totsu::prelude::FloatGeneric<f64>;

/// Prelude
pub mod prelude
{
    pub use crate::{BallError, BallOptions, BallResult, Formulation, PointSet, solve_min_enclosing_ball};
    pub use crate::{Matrix, Matrices, ServiceError, ErrorKind};
    pub use totsu::prelude::{SolverError, SolverParam};
}
