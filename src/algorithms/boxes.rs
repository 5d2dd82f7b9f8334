use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

use crate::algorithms::cell_locator::locate_cell;
use crate::basis::hierarchical::HierarchicalBasis;
use crate::errors::HFError;

///
/// Flat list of refinement records `(level, lower[0..d], upper[0..d])`, in the
/// order they were discovered.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefinementBoxes
{
    dim: usize,
    data: Vec<u32>,
}

impl RefinementBoxes
{
    pub fn new(dim: usize) -> Self
    {
        Self { dim, data: Vec::new() }
    }

    #[inline]
    pub fn dim(&self) -> usize
    {
        self.dim
    }

    #[inline]
    pub fn record_len(&self) -> usize
    {
        2 * self.dim + 1
    }

    /// Number of boxes
    #[inline]
    pub fn len(&self) -> usize
    {
        self.data.len() / self.record_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32]
    {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u32>
    {
        self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = RefinementBox<'_>>
    {
        self.data.chunks_exact(self.record_len()).map(|record| RefinementBox { dim: self.dim, record })
    }

    pub(crate) fn push(&mut self, level: u32, lower: &[u32], upper: &[u32])
    {
        self.data.push(level);
        self.data.extend_from_slice(lower);
        self.data.extend_from_slice(upper);
    }
}

///
/// View of a single record of [`RefinementBoxes`].
///
#[derive(Clone, Copy, Debug)]
pub struct RefinementBox<'a>
{
    dim: usize,
    record: &'a [u32],
}

impl RefinementBox<'_>
{
    pub fn level(&self) -> u32
    {
        self.record[0]
    }

    pub fn lower(&self) -> &[u32]
    {
        &self.record[1..1 + self.dim]
    }

    pub fn upper(&self) -> &[u32]
    {
        &self.record[1 + self.dim..]
    }
}

///
/// Finest level cells that already produced a box during one pass.
///
#[derive(Default, Debug)]
pub struct CellSet(IndexSet<Vec<u32>, FxBuildHasher>);

impl CellSet
{
    ///
    /// Inserts `cell`, returns false if it was already present.
    ///
    pub fn insert(&mut self, cell: &[u32]) -> bool
    {
        if self.0.contains(cell)
        {
            false
        }
        else
        {
            self.0.insert(cell.to_vec())
        }
    }

    pub fn contains(&self, cell: &[u32]) -> bool
    {
        self.0.contains(cell)
    }

    pub fn len(&self) -> usize
    {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.0.is_empty()
    }
}

///
/// Level at which a finest level `cell` gets refined: one level deeper than the
/// level the cell currently lives at. Refinement advances one level at a time.
///
pub fn resolve_level<B: HierarchicalBasis + ?Sized>(basis: &B, cell: &[u32], max_level: usize) -> usize
{
    let upper: Vec<u32> = cell.iter().map(|&c| c + 1).collect();
    basis.query_level(cell, &upper, max_level) + 1
}

///
/// Projects an index of `max_level` onto `level`. Exact only because levels are
/// dyadic refinements of each other.
///
#[inline]
pub fn index_at_level(index: u32, level: usize, max_level: usize) -> u32
{
    if level < max_level
    {
        index >> (max_level - level)
    }
    else
    {
        index << (level - max_level)
    }
}

///
/// Appends the box of `cell` at `level`, widened by `extension` and clamped to
/// the index range of that level.
///
pub fn build_box<B: HierarchicalBasis + ?Sized>(basis: &B, cell: &[u32], level: usize, max_level: usize, extension: &[u32], boxes: &mut RefinementBoxes)
{
    let d = cell.len();
    let mut lower = vec![0; d];
    let mut upper = vec![0; d];
    for dim in 0..d
    {
        let max_index = (basis.num_breaks(level, dim) - 1) as u32;
        let index = index_at_level(cell[dim], level, max_level);
        lower[dim] = index.saturating_sub(extension[dim]);
        upper[dim] = index.saturating_add(extension[dim]).saturating_add(1).min(max_index);
    }
    log::trace!("cell {cell:?} refined at level {level}: {lower:?}..{upper:?}");
    boxes.push(level as u32, &lower, &upper);
}

///
/// Collects the refinement boxes of one pass over marked parameters.
///
pub struct BoxBuilder<'a, B: HierarchicalBasis + ?Sized>
{
    basis: &'a B,
    extension: &'a [u32],
    max_level: usize,
    breaks: Vec<&'a [f64]>,
    cells: CellSet,
    boxes: RefinementBoxes,
}

impl<'a, B: HierarchicalBasis + ?Sized> BoxBuilder<'a, B>
{
    pub fn new(basis: &'a B, extension: &'a [u32]) -> Result<Self, HFError>
    {
        let dim = basis.dim();
        crate::options::check_extension(extension, dim)?;
        let max_level = basis.max_level();
        let breaks = (0..dim).map(|d| basis.breaks(max_level, d)).collect();
        Ok(Self { basis, extension, max_level, breaks, cells: CellSet::default(), boxes: RefinementBoxes::new(dim) })
    }

    ///
    /// Adds the box around `parameter` unless its finest level cell was already handled.
    ///
    pub fn append_box(&mut self, parameter: &[f64]) -> Result<(), HFError>
    {
        let cell = locate_cell(parameter, &self.breaks)?;
        if self.cells.insert(&cell)
        {
            let level = resolve_level(self.basis, &cell, self.max_level);
            build_box(self.basis, &cell, level, self.max_level, self.extension, &mut self.boxes);
        }
        Ok(())
    }

    pub fn num_cells(&self) -> usize
    {
        self.cells.len()
    }

    pub fn finish(self) -> RefinementBoxes
    {
        self.boxes
    }
}
