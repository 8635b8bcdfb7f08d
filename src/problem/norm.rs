use totsu::{MatBuild, ProbSOCP};
use totsu::prelude::MatType;
use crate::La;

type AMatBuild = MatBuild<La>;

/// Minimum enclosing ball as a generic [`ProbSOCP`]
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-svg.js"></script>
///
/// Each point contributes its own norm inequality
/// \\( \\| c - p_i \\|_2 \le r \\), expressed with
/// \\( G_i = [\\,0 \ \ -I_n\\,],\ h_i = p_i,\ c_i = e_0,\ d_i = 0 \\)
/// over the variables \\( (r, c) \\).
/// The feasible region equals that of [`super::ProbBall`].
///
/// * `n` is a dimension of the points.
/// * `points` is a point-major array of \\(p_0, \\ldots, p_{k-1}\\).
pub fn prob_norm_socp(n: usize, points: &[f64]) -> ProbSOCP<La>
{
    assert!(n > 0);
    assert_eq!(points.len() % n, 0);

    let k = points.len() / n;
    let nv = 1 + n; // r, c
    let p = 0;

    let vec_f = AMatBuild::new(MatType::General(nv, 1))
                .by_fn(|r, _| if r == 0 {1.} else {0.});

    let mats_g = vec![
        AMatBuild::new(MatType::General(n, nv))
        .by_fn(|r, c| if c == r + 1 {-1.} else {0.});
        k
    ];

    let vecs_h = points.chunks(n)
                 .map(|p_i| AMatBuild::new(MatType::General(n, 1)).iter_colmaj(p_i))
                 .collect();

    let vecs_c = vec![vec_f.clone(); k];

    let scls_d = vec![0.; k];

    let mat_a = AMatBuild::new(MatType::General(p, nv));

    let vec_b = AMatBuild::new(MatType::General(p, 1));

    ProbSOCP::new(vec_f, mats_g, vecs_h, vecs_c, scls_d, mat_a, vec_b)
}
