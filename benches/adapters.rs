use criterion::{criterion_group, criterion_main, Criterion};
use odesys::{
    test_models::{
        exponential_decay::exponential_decay, harmonic_oscillator::harmonic_oscillator,
        robertson::{robertson, robertson_iterative},
    },
    Bdf2Fvc, DenseSystem, Integrator, IterativeSystem, OdeSystem, Rk4,
};

fn criterion_benchmark(c: &mut Criterion) {
    let y = [0.7, 2e-5, 0.3];

    c.bench_function("robertson_rhs", |b| {
        let mut sys = robertson::<f64>();
        let mut f = [0.0; 3];
        b.iter(|| sys.rhs(0.0, &y, &mut f))
    });

    c.bench_function("robertson_dense_jac_cmaj", |b| {
        let mut sys = robertson::<f64>();
        let mut jac = [0.0; 9];
        b.iter(|| sys.dense_jac_cmaj(0.0, &y, None, &mut jac, 3, None))
    });

    c.bench_function("robertson_dense_jac_rmaj", |b| {
        let mut sys = robertson::<f64>();
        let mut jac = [0.0; 9];
        b.iter(|| sys.dense_jac_rmaj(0.0, &y, None, &mut jac, 3, None))
    });

    c.bench_function("robertson_prec_setup_solve", |b| {
        let mut sys = robertson_iterative::<f64>();
        let mut z = [0.0; 3];
        let mut recomputed = false;
        b.iter(|| {
            sys.prec_setup(0.0, &y, None, false, &mut recomputed, 1e-3);
            sys.prec_solve_left(0.0, &y, None, &[1.0, 1.0, 1.0], &mut z, 1e-3, 0.0)
        })
    });

    c.bench_function("harmonic_oscillator_roots", |b| {
        let mut sys = harmonic_oscillator::<f64>(1.0, 1e-3);
        let mut out = [0.0];
        b.iter(|| sys.roots(0.0, &[1.0, 0.0], &mut out))
    });

    c.bench_function("exponential_decay_rk4", |b| {
        let xout: Vec<f64> = (0..=100).map(|i| i as f64 * 0.1).collect();
        b.iter(|| {
            let mut sys = exponential_decay::<f64>();
            Rk4::default().integrate_predefined(&mut sys, &[1.0, 1.0], &xout)
        })
    });

    c.bench_function("nalgebra_bdf2_robertson", |b| {
        let xout: Vec<f64> = (0..=40).map(|i| i as f64 * 0.01).collect();
        b.iter(|| {
            let mut sys = robertson::<f64>();
            Bdf2Fvc::<f64>::default().integrate_predefined(&mut sys, &[1.0, 0.0, 0.0], &xout)
        })
    });

    c.bench_function("faer_bdf2_robertson", |b| {
        let xout: Vec<f64> = (0..=40).map(|i| i as f64 * 0.01).collect();
        b.iter(|| {
            let mut sys = robertson::<f64>();
            Bdf2Fvc::<f64, faer::Mat<f64>>::default().integrate_predefined(
                &mut sys,
                &[1.0, 0.0, 0.0],
                &xout,
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
