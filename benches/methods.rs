use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{dvector, DVector};

use asktell::Driver;

const MAX_EVALS: usize = 1_000_000;

fn cubic(x: f64) -> f64 {
    3.0 * x.powi(3) - 5.0 * x.powi(2) - 6.0 * x + 5.0
}

fn rosenbrock(x: f64, y: f64) -> f64 {
    (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2)
}

fn run<F>(driver: &mut Driver, dim: usize, mut f: F) -> bool
where
    F: FnMut(&DVector<f64>) -> f64,
{
    let mut x = DVector::zeros(dim);

    for _ in 0..MAX_EVALS {
        match driver.is_done() {
            Ok(status) if status.is_done() => return true,
            Ok(_) => {}
            Err(_) => return false,
        }

        if driver.next(&mut x).is_err() {
            return false;
        }
        let fx = f(&x);
        if driver.set_value(&x, fx).is_err() {
            return false;
        }
    }

    false
}

fn root_finders(c: &mut Criterion) {
    c.bench_function("bisection cubic", |b| {
        b.iter(|| {
            let mut driver = Driver::with_builtins();
            driver.select("bisection", 1).unwrap();
            driver.hparam_set("lower", 2.0).unwrap();
            driver.hparam_set("upper", 3.0).unwrap();
            assert!(run(&mut driver, 1, |x| cubic(x[0])));
        })
    });

    c.bench_function("brent-dekker cubic", |b| {
        b.iter(|| {
            let mut driver = Driver::with_builtins();
            driver.select("brent-dekker", 1).unwrap();
            driver.hparam_set("x_0", 2.0).unwrap();
            driver.hparam_set("x_1", 3.0).unwrap();
            assert!(run(&mut driver, 1, |x| cubic(x[0])));
        })
    });

    c.bench_function("secant cubic", |b| {
        b.iter(|| {
            let mut driver = Driver::with_builtins();
            driver.select("secant", 1).unwrap();
            driver.hparam_set("x_0", 2.0).unwrap();
            driver.hparam_set("x_1", 3.0).unwrap();
            assert!(run(&mut driver, 1, |x| cubic(x[0])));
        })
    });
}

fn minimizers(c: &mut Criterion) {
    c.bench_function("nelder-mead rosenbrock", |b| {
        b.iter(|| {
            let mut driver = Driver::with_builtins();
            driver.select("nelder-mead", 2).unwrap();
            driver.hparam_set("dist_threshold", 1e-7).unwrap();
            driver.hparam_set("max_iterations", 10_000i64).unwrap();
            driver.seed(&dvector![0.0, 0.0]).unwrap();
            assert!(run(&mut driver, 2, |x| rosenbrock(x[0], x[1])));
        })
    });

    c.bench_function("differential evolution rosenbrock", |b| {
        b.iter(|| {
            let mut driver = Driver::with_builtins();
            driver.select("differential evolution", 2).unwrap();
            driver.hparam_set("iterations", 100i64).unwrap();
            driver.hparam_set("NP", 20i64).unwrap();
            driver.hparam_set("lower", dvector![-5.0, -5.0]).unwrap();
            driver.hparam_set("upper", dvector![5.0, 5.0]).unwrap();
            assert!(run(&mut driver, 2, |x| rosenbrock(x[0], x[1])));
        })
    });
}

criterion_group!(benches, root_finders, minimizers);
criterion_main!(benches);
