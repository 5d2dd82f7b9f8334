use hfrefine::{basis::hierarchical::HierarchicalBasis, errors::HFError, fitting::{context::FittingContext, hierarchical_fitting::HierarchicalFitting, piecewise_constant::PiecewiseConstantFit}, storage::hierarchical_domain::HierarchicalDomain, ErrorThreshold, FittingOptions};

///
/// Samples a surface with a sharp ridge along the diagonal.
///
fn ridge_samples(n: usize) -> (Vec<f64>, Vec<f64>)
{
    let mut parameters = Vec::with_capacity(2*n*n);
    let mut values = Vec::with_capacity(n*n);
    for i in 0..n
    {
        for j in 0..n
        {
            let (u, v) = ((i as f64 + 0.5) / n as f64, (j as f64 + 0.5) / n as f64);
            parameters.extend([u, v]);
            values.push((-200.0*(u - v).powi(2)).exp());
        }
    }
    (parameters, values)
}

fn percentage_driven() -> Result<(), HFError>
{
    println!("\nRunning \"percentage_driven\" example\n");
    let domain = HierarchicalDomain::uniform(&[0.0, 0.0], &[1.0, 1.0], &[4, 4])?;
    let (parameters, values) = ridge_samples(64);
    let context = PiecewiseConstantFit::new(domain, parameters, values, 1)?;
    // refine the 20% worst samples with one cell of margin
    let options = FittingOptions::new(0.2, vec![1, 1], 0.0)?;
    let mut fitting = HierarchicalFitting::new(context, options)?;
    for _ in 0..8
    {
        let status = fitting.next_iteration(1e-2, ErrorThreshold::Percentage)?;
        let context = fitting.context();
        println!("{status:?}: max error {:.4}, min error {:.4}, levels {}, coefficients {}",
            context.max_error(), context.min_error(), context.basis().max_level() + 1, context.num_coefficients());
        if !status.should_continue()
        {
            break;
        }
    }
    Ok(())
}

fn threshold_driven() -> Result<(), HFError>
{
    println!("\nRunning \"threshold_driven\" example\n");
    let domain = HierarchicalDomain::uniform(&[0.0, 0.0], &[1.0, 1.0], &[4, 4])?;
    let (parameters, values) = ridge_samples(64);
    let context = PiecewiseConstantFit::new(domain, parameters, values, 1)?;
    let mut fitting = HierarchicalFitting::new(context, FittingOptions::with_dim(2))?;
    let report = fitting.iterative_refine(10, 1e-2, 0.05)?;
    println!("{report:?}");
    println!("max error {:.4} with {} coefficients", fitting.context().max_error(), fitting.context().num_coefficients());
    Ok(())
}

fn main() -> Result<(), HFError>
{
    percentage_driven()?;
    threshold_driven()
}
