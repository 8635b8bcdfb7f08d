//! Reference implementations of [`Operator`](totsu_core::solver::Operator) methods
//! derived from `op` or `trans_op` alone, one unit vector at a time.

use totsu_core::solver::LinAlg;
use totsu_core::LinAlgEx;
use crate::La;

pub fn trans_op<O>(op_size: (usize, usize), op: O, alpha: f64, x: &[f64], beta: f64, y: &mut[f64])
where O: Fn(&[f64], &mut[f64])
{
    let (m, n) = op_size;

    let mut col = vec![0.; m];
    let mut row = vec![0.; n];

    for c in 0.. n {
        row[c] = 1.;
        op(&row, &mut col);
        row[c] = 0.;

        La::transform_ge(true, m, 1, alpha, &col, x, beta, &mut y[c..= c]);
    }
}

pub fn absadd_cols<O>(op_size: (usize, usize), op: O, tau: &mut[f64])
where O: Fn(&[f64], &mut[f64])
{
    let (m, n) = op_size;

    let mut col = vec![0.; m];
    let mut row = vec![0.; n];

    for c in 0.. tau.len() {
        row[c] = 1.;
        op(&row, &mut col);
        row[c] = 0.;

        tau[c] += La::abssum(&col, 1);
    }
}

pub fn absadd_rows<O>(op_size: (usize, usize), trans_op: O, sigma: &mut[f64])
where O: Fn(&[f64], &mut[f64])
{
    let (m, n) = op_size;

    let mut col = vec![0.; m];
    let mut row = vec![0.; n];

    for r in 0.. sigma.len() {
        col[r] = 1.;
        trans_op(&col, &mut row);
        col[r] = 0.;

        sigma[r] += La::abssum(&row, 1);
    }
}
