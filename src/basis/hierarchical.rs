use crate::errors::HFError;

///
/// Structural view of a hierarchical basis used by the refinement algorithms.
///
/// Levels are numbered from 0 (coarsest). Every level must be an exact dyadic
/// refinement of the previous one: each interval of level `l` is split into two
/// intervals at level `l + 1`. Index arithmetic between levels relies on this,
/// a cell `c` at level `l` has the children `2c` and `2c + 1` at level `l + 1`.
///
pub trait HierarchicalBasis
{
    ///
    /// Number of parametric dimensions
    ///
    fn dim(&self) -> usize;

    ///
    /// Deepest level currently present in the hierarchy
    ///
    fn max_level(&self) -> usize;

    ///
    /// Break points of `level` along `dim`. Only valid for `level <= max_level()`.
    ///
    fn breaks(&self, level: usize, dim: usize) -> &[f64];

    ///
    /// Number of break points of `level` along `dim`. Must also answer for levels
    /// beyond `max_level()`, refinement may request `max_level() + 1`.
    ///
    fn num_breaks(&self, level: usize, dim: usize) -> usize;

    ///
    /// Returns the deepest level, not larger than `max_level`, whose domain fully
    /// contains the half-open box `[lower, upper)` given in indices of the
    /// current finest level.
    ///
    fn query_level(&self, lower: &[u32], upper: &[u32], max_level: usize) -> usize;

    ///
    /// Applies flat refinement records `(level, lower[0..d], upper[0..d])`.
    /// Refining an already refined region leaves the hierarchy unchanged.
    ///
    fn refine_elements(&mut self, boxes: &[u32]) -> Result<(), HFError>;
}
