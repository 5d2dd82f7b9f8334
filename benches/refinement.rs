use criterion::{criterion_group, criterion_main, Criterion};
use hfrefine::{algorithms::threshold::select_threshold, errors::HFError, fitting::{context::FittingContext, hierarchical_fitting::HierarchicalFitting, piecewise_constant::PiecewiseConstantFit}, storage::hierarchical_domain::HierarchicalDomain, FittingOptions};

fn build_fitting() -> Result<HierarchicalFitting<PiecewiseConstantFit>, HFError>
{
    let domain = HierarchicalDomain::uniform(&[0.0, 0.0], &[1.0, 1.0], &[4, 4])?;
    let n = 200;
    let mut parameters = Vec::with_capacity(2*n*n);
    let mut values = Vec::with_capacity(n*n);
    for i in 0..n
    {
        for j in 0..n
        {
            let (x, y) = (i as f64 / (n - 1) as f64, j as f64 / (n - 1) as f64);
            parameters.extend([x, y]);
            values.push((8.0*x).sin()*(4.0*y).cos());
        }
    }
    let context = PiecewiseConstantFit::new(domain, parameters, values, 1)?;
    let mut fitting = HierarchicalFitting::new(context, FittingOptions::new(0.1, vec![1, 1], 0.0)?)?;
    fitting.iterative_refine(3, 0.0, -1.0)?;
    Ok(fitting)
}

fn run_threshold(c: &mut Criterion)
{
    let errors: Vec<f64> = (0..100_000).map(|i| ((i * 7919) % 100_003) as f64).collect();
    c.bench_function("threshold 1e5", |b|b.iter(||select_threshold(&errors, 0.1)));
}

fn run_get_boxes(c: &mut Criterion)
{
    let fitting = build_fitting().unwrap();
    let errors = fitting.context().point_errors().to_vec();
    let threshold = select_threshold(&errors, 0.1).unwrap();
    c.bench_function("get_boxes 4e4", |b|b.iter(||fitting.get_boxes(&errors, threshold).unwrap()));
}

criterion_group!(benches, run_threshold, run_get_boxes);
criterion_main!(benches);
