use float_eq::assert_float_eq;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;
use cvxball::*;

//

fn random_points(seed: u64, k: usize, n: usize) -> PointSet
{
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);

    let data = (0.. k * n).map(|_| rng.gen_range(-1.0..1.0)).collect();

    PointSet::new(data, k, n).unwrap()
}

//

#[test]
fn test_known_instance()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let ps = PointSet::from_rows(&[[2., 4.], [0., 0.], [2.5, 2.]]).unwrap();

    for f in [Formulation::StackedCone, Formulation::PerPointNorm] {
        let ball = solve_min_enclosing_ball(&ps, &BallOptions::new().formulation(f)).unwrap();

        assert_float_eq!(ball.radius, 2.2360679774997896, abs <= 1e-4);
        assert_float_eq!(ball.center, vec![1., 2.], abs_all <= 1e-4);
    }
}

#[test]
fn test_one_dimension()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let ps = PointSet::from_rows(&[[-1.], [3.], [0.5]]).unwrap();
    let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

    assert_float_eq!(ball.radius, 2., abs <= 1e-4);
    assert_float_eq!(ball.center, vec![1.], abs_all <= 1e-4);
}

#[test]
fn test_feasibility()
{
    let _ = env_logger::builder().is_test(true).try_init();

    for seed in 0.. 3 {
        let ps = random_points(seed, 12, 2 + seed as usize % 2);
        let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

        assert!(ball.radius >= 0.);
        assert_eq!(ball.center.len(), ps.dim());
        for p in ps.iter() {
            assert!(ball.contains(p, 1e-6), "{:?} outside {:?}", p, ball);
        }
    }
}

#[test]
fn test_single_point()
{
    let ps = PointSet::from_rows(&[[1.5, -2., 0.25]]).unwrap();
    let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

    assert_eq!(ball.radius, 0.);
    assert_eq!(ball.center, vec![1.5, -2., 0.25]);
}

#[test]
fn test_identical_points()
{
    let ps = PointSet::from_rows(&[[4., 4.]; 5]).unwrap();

    for f in [Formulation::StackedCone, Formulation::PerPointNorm] {
        let ball = solve_min_enclosing_ball(&ps, &BallOptions::new().formulation(f)).unwrap();

        assert_eq!(ball.radius, 0.);
        assert_eq!(ball.center, vec![4., 4.]);
    }
}

#[test]
fn test_empty_rejected()
{
    let rows: &[[f64; 2]] = &[];

    assert!(matches!(PointSet::from_rows(rows), Err(BallError::InvalidInput(_))));
    assert!(matches!(PointSet::new(vec![], 0, 3), Err(BallError::InvalidInput(_))));
    assert!(matches!(PointSet::from_rows(&[vec![1., 2.], vec![3.]]), Err(BallError::InvalidInput(_))));
}

#[test]
fn test_formulation_equivalence()
{
    let _ = env_logger::builder().is_test(true).try_init();

    for seed in 10.. 13 {
        let ps = random_points(seed, 15, 2);

        let stacked = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();
        let per_point = solve_min_enclosing_ball(&ps, &BallOptions::new().formulation(Formulation::PerPointNorm)).unwrap();

        assert_float_eq!(stacked.radius, per_point.radius, abs <= 1e-4);
        assert_float_eq!(stacked.center, per_point.center, abs_all <= 1e-4);
    }
}

#[test]
fn test_translation_invariance()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rng = Xoshiro256StarStar::seed_from_u64(20);

    for seed in 20.. 23 {
        let ps = random_points(seed, 10, 3);
        let offset: Vec<f64> = (0.. 3).map(|_| rng.gen_range(-5.0..5.0)).collect();

        let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();
        let moved = solve_min_enclosing_ball(&ps.translated(&offset), &BallOptions::new()).unwrap();

        let expected: Vec<f64> = ball.center.iter().zip(&offset).map(|(c, o)| c + o).collect();

        assert_float_eq!(moved.radius, ball.radius, abs <= 1e-4);
        assert_float_eq!(moved.center, expected, abs_all <= 1e-4);
    }
}

#[test]
fn test_extreme_scales()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let ps = PointSet::from_rows(&[[0., 0.], [1e200, 0.]]).unwrap();
    let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

    assert_float_eq!(ball.radius, 5e199, rmax <= 1e-4);
    assert_float_eq!(ball.center[0], 5e199, rmax <= 1e-4);
    assert!(ball.center[1].abs() <= 1e-4 * 5e199);

    let ps = PointSet::from_rows(&[[0., 0.], [1e-200, 0.]]).unwrap();
    let ball = solve_min_enclosing_ball(&ps, &BallOptions::new()).unwrap();

    assert!(ball.radius > 0.);
    assert_float_eq!(ball.radius, 5e-201, rmax <= 1e-4);
    for p in ps.iter() {
        assert!(ball.contains(p, 0.));
    }
}
