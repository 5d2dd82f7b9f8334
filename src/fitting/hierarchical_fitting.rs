use crate::algorithms::boxes::{BoxBuilder, RefinementBoxes};
use crate::algorithms::threshold::ErrorThreshold;
use crate::basis::hierarchical::HierarchicalBasis;
use crate::errors::HFError;
use crate::fitting::context::FittingContext;
use crate::options::{check_extension, check_lambda, check_ref_percentage, FittingOptions};

///
/// Outcome of a single refinement step.
///
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IterationStatus
{
    /// No fit existed yet; the baseline fit was computed.
    InitialFit,
    /// Boxes were inserted and the fit was recomputed.
    Refined { num_boxes: usize },
    /// The maximum error is within tolerance.
    ToleranceReached,
    /// No sample at or above the threshold produced a box.
    NoRefinableRegion,
}

impl IterationStatus
{
    ///
    /// False once the loop has reached one of its terminal conditions.
    ///
    pub fn should_continue(&self) -> bool
    {
        matches!(self, IterationStatus::InitialFit | IterationStatus::Refined { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason
{
    ToleranceReached,
    NoRefinableRegion,
    IterationLimit,
}

///
/// Summary of [`HierarchicalFitting::iterative_refine`].
///
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RefinementReport
{
    /// Number of refinement steps that inserted boxes
    pub iterations: usize,
    pub boxes_inserted: usize,
    pub stop_reason: StopReason,
}

///
/// Adaptive fitting: refines the hierarchical basis of a fitting context where
/// the point-wise errors are largest until the error tolerance is met.
///
pub struct HierarchicalFitting<C: FittingContext>
{
    context: C,
    options: FittingOptions,
}

impl<C: FittingContext> HierarchicalFitting<C>
{
    pub fn new(context: C, options: FittingOptions) -> Result<Self, HFError>
    {
        options.validate(context.basis().dim())?;
        Ok(Self { context, options })
    }

    pub fn context(&self) -> &C
    {
        &self.context
    }

    pub fn into_context(self) -> C
    {
        self.context
    }

    pub fn options(&self) -> &FittingOptions
    {
        &self.options
    }

    pub fn ref_percentage(&self) -> f64
    {
        self.options.ref_percentage
    }

    pub fn set_ref_percentage(&mut self, ref_percentage: f64) -> Result<(), HFError>
    {
        check_ref_percentage(ref_percentage)?;
        self.options.ref_percentage = ref_percentage;
        Ok(())
    }

    pub fn extension(&self) -> &[u32]
    {
        &self.options.extension
    }

    pub fn set_extension(&mut self, extension: Vec<u32>) -> Result<(), HFError>
    {
        check_extension(&extension, self.context.basis().dim())?;
        self.options.extension = extension;
        Ok(())
    }

    pub fn lambda(&self) -> f64
    {
        self.options.lambda
    }

    pub fn set_lambda(&mut self, lambda: f64) -> Result<(), HFError>
    {
        check_lambda(lambda)?;
        self.options.lambda = lambda;
        Ok(())
    }

    ///
    /// Boxes around every sample whose error is at least `threshold`. Each
    /// finest level cell yields at most one box. Does not modify the basis.
    ///
    pub fn get_boxes(&self, errors: &[f64], threshold: f64) -> Result<RefinementBoxes, HFError>
    {
        let num_points = self.context.num_points();
        if errors.len() != num_points
        {
            return Err(HFError::DimensionMismatch { expected: num_points, found: errors.len() });
        }
        let mut builder = BoxBuilder::new(self.context.basis(), &self.options.extension)?;
        for (index, &error) in errors.iter().enumerate()
        {
            if threshold <= error
            {
                builder.append_box(self.context.parameter(index))?;
            }
        }
        Ok(builder.finish())
    }

    fn fit(&mut self) -> Result<(), HFError>
    {
        self.context.compute(self.options.lambda)?;
        self.context.compute_errors()
    }

    ///
    /// One refinement step. Computes the baseline fit if none exists yet;
    /// otherwise refines around the samples at or above the threshold and
    /// recomputes the fit and its errors.
    ///
    pub fn next_iteration(&mut self, tolerance: f64, threshold: impl Into<ErrorThreshold>) -> Result<IterationStatus, HFError>
    {
        let threshold: ErrorThreshold = threshold.into();
        if self.context.point_errors().is_empty()
        {
            self.fit()?;
            return Ok(IterationStatus::InitialFit);
        }
        if self.context.max_error() <= tolerance
        {
            log::debug!("Tolerance reached.");
            return Ok(IterationStatus::ToleranceReached);
        }
        let errors = self.context.point_errors();
        let threshold = match threshold.resolve(errors, self.options.ref_percentage)
        {
            Some(threshold) => threshold,
            None => return Ok(IterationStatus::NoRefinableRegion),
        };
        let boxes = self.get_boxes(errors, threshold)?;
        if boxes.is_empty()
        {
            log::debug!("No more Boxes to insert above threshold {threshold}.");
            return Ok(IterationStatus::NoRefinableRegion);
        }
        self.context.basis_mut().refine_elements(boxes.as_slice())?;
        log::debug!("inserted {} boxes.", boxes.len());
        self.fit()?;
        Ok(IterationStatus::Refined { num_boxes: boxes.len() })
    }

    ///
    /// Refines for at most `max_iterations` steps, stopping early once the
    /// maximum error is within `tolerance` or no box can be inserted. A
    /// baseline fit is always computed first if none exists.
    ///
    pub fn iterative_refine(&mut self, max_iterations: usize, tolerance: f64, threshold: impl Into<ErrorThreshold>) -> Result<RefinementReport, HFError>
    {
        let threshold: ErrorThreshold = threshold.into();
        if self.context.point_errors().is_empty()
        {
            self.fit()?;
        }
        let mut report = RefinementReport { iterations: 0, boxes_inserted: 0, stop_reason: StopReason::IterationLimit };
        for iteration in 0..max_iterations
        {
            let status = self.next_iteration(tolerance, threshold)?;
            if let IterationStatus::Refined { num_boxes } = status
            {
                report.iterations += 1;
                report.boxes_inserted += num_boxes;
            }
            if self.context.max_error() <= tolerance
            {
                log::debug!("Tolerance reached at iteration: {iteration}");
                report.stop_reason = StopReason::ToleranceReached;
                break;
            }
            if !status.should_continue()
            {
                log::debug!("No more Boxes to insert at iteration: {iteration}");
                report.stop_reason = StopReason::NoRefinableRegion;
                break;
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::algorithms::threshold::select_threshold;
    use crate::fitting::piecewise_constant::PiecewiseConstantFit;
    use crate::storage::hierarchical_domain::HierarchicalDomain;

    /// Counts the fits requested from the wrapped context.
    struct CountingFit
    {
        inner: PiecewiseConstantFit,
        fits: usize,
    }

    impl FittingContext for CountingFit
    {
        type Basis = HierarchicalDomain;

        fn basis(&self) -> &HierarchicalDomain { self.inner.basis() }
        fn basis_mut(&mut self) -> &mut HierarchicalDomain { self.inner.basis_mut() }
        fn num_inputs(&self) -> usize { self.inner.num_inputs() }
        fn num_points(&self) -> usize { self.inner.num_points() }
        fn parameter(&self, index: usize) -> &[f64] { self.inner.parameter(index) }
        fn compute(&mut self, lambda: f64) -> Result<(), HFError>
        {
            self.fits += 1;
            self.inner.compute(lambda)
        }
        fn compute_errors(&mut self) -> Result<(), HFError> { self.inner.compute_errors() }
        fn point_errors(&self) -> &[f64] { self.inner.point_errors() }
        fn max_error(&self) -> f64 { self.inner.max_error() }
        fn min_error(&self) -> f64 { self.inner.min_error() }
    }

    fn corner_points() -> PiecewiseConstantFit
    {
        let domain = HierarchicalDomain::uniform(&[0.0, 0.0], &[1.0, 1.0], &[2, 2]).unwrap();
        let parameters = vec![0.1, 0.1, 0.9, 0.1, 0.1, 0.9, 0.9, 0.9];
        PiecewiseConstantFit::new(domain, parameters, vec![0.0; 4], 1).unwrap()
    }

    /// Step in x sampled on a 16 x 16 grid of cell midpoints.
    fn step_samples() -> PiecewiseConstantFit
    {
        let domain = HierarchicalDomain::uniform(&[0.0, 0.0], &[1.0, 1.0], &[2, 2]).unwrap();
        let mut parameters = Vec::new();
        let mut values = Vec::new();
        for i in 0..16
        {
            for j in 0..16
            {
                let (x, y) = ((i as f64 + 0.5) / 16.0, (j as f64 + 0.5) / 16.0);
                parameters.extend([x, y]);
                values.push(if x < 0.3 { 1.0 } else { 0.0 });
            }
        }
        PiecewiseConstantFit::new(domain, parameters, values, 1).unwrap()
    }

    #[test]
    fn check_four_point_scenario()
    {
        let options = FittingOptions::new(0.5, vec![0, 0], 0.0).unwrap();
        let fitting = HierarchicalFitting::new(corner_points(), options).unwrap();
        let errors = [0.5, 0.9, 0.05, 0.05];
        let threshold = select_threshold(&errors, fitting.ref_percentage()).unwrap();
        assert_eq!(threshold, 0.5);
        let boxes = fitting.get_boxes(&errors, threshold).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes.as_slice(), &[1, 0, 0, 1, 1, 1, 2, 0, 3, 1]);
        // pure: the basis is untouched and a second call agrees
        assert_eq!(fitting.context().basis().max_level(), 0);
        assert_eq!(fitting.get_boxes(&errors, threshold).unwrap(), boxes);
    }

    #[test]
    fn check_get_boxes_rejects_wrong_error_count()
    {
        let fitting = HierarchicalFitting::new(corner_points(), FittingOptions::with_dim(2)).unwrap();
        assert_eq!(fitting.get_boxes(&[1.0], 0.0), Err(HFError::DimensionMismatch { expected: 4, found: 1 }));
    }

    #[test]
    fn check_configuration_is_validated()
    {
        let options = FittingOptions::new(0.5, vec![0], 0.0).unwrap();
        assert!(HierarchicalFitting::new(corner_points(), options).is_err());

        let mut fitting = HierarchicalFitting::new(corner_points(), FittingOptions::with_dim(2)).unwrap();
        assert_eq!(fitting.set_ref_percentage(-0.1), Err(HFError::InvalidRefinementPercentage(-0.1)));
        assert_eq!(fitting.ref_percentage(), 0.1);
        assert!(fitting.set_extension(vec![1, 1, 1]).is_err());
        assert_eq!(fitting.extension(), &[0, 0]);
        fitting.set_extension(vec![2, 1]).unwrap();
        assert_eq!(fitting.extension(), &[2, 1]);
        assert!(fitting.set_lambda(f64::INFINITY).is_err());
        fitting.set_lambda(0.5).unwrap();
        assert_eq!(fitting.lambda(), 0.5);
    }

    #[test]
    fn check_infinite_tolerance_fits_once()
    {
        let context = CountingFit { inner: step_samples(), fits: 0 };
        let mut fitting = HierarchicalFitting::new(context, FittingOptions::with_dim(2)).unwrap();
        let report = fitting.iterative_refine(10, f64::INFINITY, -1.0).unwrap();
        assert_eq!(report.stop_reason, StopReason::ToleranceReached);
        assert_eq!(report.iterations, 0);
        assert_eq!(fitting.context().fits, 1);
        assert_eq!(fitting.context().basis().max_level(), 0);

        let context = CountingFit { inner: step_samples(), fits: 0 };
        let mut fitting = HierarchicalFitting::new(context, FittingOptions::with_dim(2)).unwrap();
        let report = fitting.iterative_refine(0, 0.0, -1.0).unwrap();
        assert_eq!(report.stop_reason, StopReason::IterationLimit);
        assert_eq!(fitting.context().fits, 1);
    }

    #[test]
    fn check_threshold_above_errors_stops_without_refining()
    {
        let mut fitting = HierarchicalFitting::new(step_samples(), FittingOptions::with_dim(2)).unwrap();
        assert_eq!(fitting.next_iteration(0.0, -1.0).unwrap(), IterationStatus::InitialFit);
        let max_error = fitting.context().max_error();
        assert!(max_error > 0.0);

        let status = fitting.next_iteration(0.0, max_error + 1.0).unwrap();
        assert_eq!(status, IterationStatus::NoRefinableRegion);
        assert!(!status.should_continue());
        assert_eq!(fitting.context().basis().max_level(), 0);

        let report = fitting.iterative_refine(5, 0.0, max_error + 1.0).unwrap();
        assert_eq!(report.stop_reason, StopReason::NoRefinableRegion);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn check_next_iteration_refines()
    {
        let mut fitting = HierarchicalFitting::new(step_samples(), FittingOptions::with_dim(2)).unwrap();
        fitting.next_iteration(0.0, -1.0).unwrap();
        let status = fitting.next_iteration(0.0, -1.0).unwrap();
        assert!(matches!(status, IterationStatus::Refined { num_boxes } if num_boxes > 0));
        assert_eq!(fitting.context().basis().max_level(), 1);
        assert_eq!(fitting.next_iteration(f64::INFINITY, -1.0).unwrap(), IterationStatus::ToleranceReached);
    }

    #[test]
    fn check_step_converges()
    {
        let options = FittingOptions::new(0.2, vec![1, 1], 0.0).unwrap();
        let mut fitting = HierarchicalFitting::new(step_samples(), options).unwrap();
        let report = fitting.iterative_refine(10, 1e-12, -1.0).unwrap();
        assert_eq!(report.stop_reason, StopReason::ToleranceReached);
        assert!(report.iterations >= 3);
        assert!(report.boxes_inserted >= report.iterations);
        assert_eq!(fitting.context().max_error(), 0.0);
    }

    #[test]
    fn check_numerical_failure_propagates()
    {
        let domain = HierarchicalDomain::uniform(&[0.0], &[1.0], &[2]).unwrap();
        let context = PiecewiseConstantFit::new(domain, vec![0.2, 0.7], vec![1.0, f64::NAN], 1).unwrap();
        let mut fitting = HierarchicalFitting::new(context, FittingOptions::with_dim(1)).unwrap();
        assert_eq!(fitting.iterative_refine(3, 0.0, -1.0), Err(HFError::NumericalFailure));
    }
}
