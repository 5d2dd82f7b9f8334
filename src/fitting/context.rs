use crate::basis::hierarchical::HierarchicalBasis;
use crate::errors::HFError;

///
/// Least squares fitting of parametrized points on a hierarchical basis. The
/// adaptive loop only drives it: fitting, error measurement and the basis are
/// owned by the implementor.
///
/// An empty error field means no fit has been computed yet.
///
pub trait FittingContext
{
    type Basis: HierarchicalBasis;

    fn basis(&self) -> &Self::Basis;

    fn basis_mut(&mut self) -> &mut Self::Basis;

    ///
    /// Number of parametric dimensions of each sample
    ///
    fn num_inputs(&self) -> usize;

    fn num_points(&self) -> usize;

    ///
    /// Parameter values of sample `index`
    ///
    fn parameter(&self, index: usize) -> &[f64];

    ///
    /// Recomputes the approximation on the current basis with smoothing `lambda`.
    ///
    fn compute(&mut self, lambda: f64) -> Result<(), HFError>;

    ///
    /// Recomputes the per-point errors and their extrema from the last approximation.
    ///
    fn compute_errors(&mut self) -> Result<(), HFError>;

    fn point_errors(&self) -> &[f64];

    fn max_error(&self) -> f64;

    fn min_error(&self) -> f64;
}
