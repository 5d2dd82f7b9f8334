use std::io::Write;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::algorithms::cell_locator::locate_cell;
use crate::basis::dyadic::{bisect, num_breaks_at_level, uniform_breaks, validate_breaks};
use crate::basis::hierarchical::HierarchicalBasis;
use crate::errors::HFError;
use crate::serialization::SerializationFormat;
use crate::utilities::cell_range::CellRangeIterator;

///
/// Dyadic hierarchy of nested tensor grids. Level 0 covers the whole domain;
/// the domain of level `l > 0` is the set of level `l` cells stored in
/// `domains[l - 1]`. Domains are kept nested: whenever a cell is added to a
/// level, its ancestors are added to every coarser level.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HierarchicalDomain
{
    /// break points per level and dimension
    breaks: Vec<Vec<Vec<f64>>>,
    domains: Vec<FxHashSet<Vec<u32>>>,
}

impl HierarchicalDomain
{
    ///
    /// Builds a hierarchy with a single level from one break point sequence per dimension.
    ///
    pub fn new(base_breaks: Vec<Vec<f64>>) -> Result<Self, HFError>
    {
        if base_breaks.is_empty()
        {
            return Err(HFError::InvalidBreakPoints);
        }
        for breaks in &base_breaks
        {
            validate_breaks(breaks)?;
        }
        Ok(Self { breaks: vec![base_breaks], domains: Vec::new() })
    }

    ///
    /// Uniform level 0 grid on the box `[lower, upper]` with `num_intervals[d]` cells along `d`.
    ///
    pub fn uniform(lower: &[f64], upper: &[f64], num_intervals: &[usize]) -> Result<Self, HFError>
    {
        if lower.len() != upper.len() || lower.len() != num_intervals.len()
        {
            return Err(HFError::DimensionMismatch { expected: lower.len(), found: upper.len().min(num_intervals.len()) });
        }
        let base_breaks = (0..lower.len()).map(|d| uniform_breaks(lower[d], upper[d], num_intervals[d])).collect();
        Self::new(base_breaks)
    }

    ///
    /// Returns true if `cell` (given at `level`) lies in the domain of `level`.
    ///
    #[inline]
    pub fn contains_cell(&self, level: usize, cell: &[u32]) -> bool
    {
        match level
        {
            0 => true,
            l => self.domains.get(l - 1).is_some_and(|domain| domain.contains(cell)),
        }
    }

    ///
    /// Deepest level at which the ancestor of `cell` (given at level `from`) is present.
    ///
    pub fn cell_level(&self, cell: &[u32], from: usize) -> usize
    {
        let mut ancestor = cell.to_vec();
        for level in (1..=from).rev()
        {
            let shift = from - level;
            for (a, &c) in ancestor.iter_mut().zip(cell)
            {
                *a = c >> shift;
            }
            if self.contains_cell(level, &ancestor)
            {
                return level;
            }
        }
        0
    }

    ///
    /// Returns the level and the cell index at that level of the active cell
    /// containing `parameter`.
    ///
    pub fn leaf(&self, parameter: &[f64]) -> Result<(usize, Vec<u32>), HFError>
    {
        let max_level = self.max_level();
        let cell = locate_cell(parameter, &self.breaks[max_level])?;
        let level = self.cell_level(&cell, max_level);
        let shift = max_level - level;
        Ok((level, cell.into_iter().map(|c| c >> shift).collect()))
    }

    ///
    /// Number of cells belonging to the domain of `level`.
    ///
    pub fn num_cells(&self, level: usize) -> usize
    {
        match level
        {
            0 => (0..self.dim()).map(|d| self.breaks[0][d].len() - 1).product(),
            l => self.domains.get(l - 1).map_or(0, |domain| domain.len()),
        }
    }

    fn ensure_level(&mut self, level: usize)
    {
        while self.max_level() < level
        {
            let finer: Vec<Vec<f64>> = self.breaks[self.max_level()].iter().map(|b| bisect(b)).collect();
            self.breaks.push(finer);
            self.domains.push(FxHashSet::default());
        }
    }

    ///
    /// Checks the invariants a decoded hierarchy must satisfy: every level is the
    /// bisection of the one below it, each level above 0 has a domain, and every
    /// stored cell is in range with its parent present one level down.
    ///
    fn check_structure(&self) -> Result<(), HFError>
    {
        let base = self.breaks.first().ok_or(HFError::InvalidBreakPoints)?;
        if base.is_empty() || self.domains.len() + 1 != self.breaks.len() || self.breaks.len() > u32::BITS as usize
        {
            return Err(HFError::InvalidBreakPoints);
        }
        for breaks in base
        {
            validate_breaks(breaks)?;
        }
        for level in 1..self.breaks.len()
        {
            let coarse = &self.breaks[level - 1];
            let fine = &self.breaks[level];
            if fine.len() != coarse.len() || fine.iter().zip(coarse).any(|(f, c)| *f != bisect(c))
            {
                return Err(HFError::InvalidBreakPoints);
            }
        }
        let d = base.len();
        for (offset, domain) in self.domains.iter().enumerate()
        {
            let level = offset + 1;
            for cell in domain
            {
                if cell.len() != d || (0..d).any(|dim| cell[dim] as usize >= self.num_breaks(level, dim) - 1)
                {
                    return Err(HFError::InvalidBox);
                }
                let parent: Vec<u32> = cell.iter().map(|&c| c >> 1).collect();
                if !self.contains_cell(level - 1, &parent)
                {
                    return Err(HFError::InvalidBox);
                }
            }
        }
        Ok(())
    }

    fn check_box(&self, record: &[u32]) -> Result<(), HFError>
    {
        let d = self.dim();
        let level = record[0] as usize;
        // indices of deeper levels overflow u32
        if level >= u32::BITS as usize
        {
            return Err(HFError::InvalidBox);
        }
        for dim in 0..d
        {
            let (low, upp) = (record[1 + dim], record[1 + d + dim]);
            if low > upp || upp as usize > self.num_breaks(level, dim) - 1
            {
                return Err(HFError::InvalidBox);
            }
        }
        Ok(())
    }

    fn insert_box(&mut self, record: &[u32])
    {
        let d = self.dim();
        let level = record[0] as usize;
        if level == 0
        {
            return;
        }
        self.ensure_level(level);
        for cell in CellRangeIterator::new(&record[1..1 + d], &record[1 + d..])
        {
            for coarser in 1..level
            {
                let shift = level - coarser;
                self.domains[coarser - 1].insert(cell.iter().map(|&c| c >> shift).collect());
            }
            self.domains[level - 1].insert(cell);
        }
    }

    ///
    /// Writes the hierarchy to `path`.
    ///
    pub fn write(&self, path: &str, format: SerializationFormat) -> Result<(), HFError>
    {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path).map_err(|_|HFError::FileIOError)?);
        let buffer = crate::serialization::serialize(self, format)?;
        file.write_all(&buffer).map_err(|_|HFError::WriteBufferFailed)?;
        Ok(())
    }

    ///
    /// Reads a hierarchy from a buffer.
    ///
    pub fn read_buffer(buffer: &[u8], format: SerializationFormat) -> Result<Self, HFError>
    {
        let domain: Self = crate::serialization::deserialize(buffer, format)?;
        domain.check_structure().map_err(|_|HFError::DeserializationFailed)?;
        Ok(domain)
    }

    ///
    /// Reads a hierarchy from a reader.
    ///
    pub fn read<Reader: std::io::Read>(mut reader: Reader, format: SerializationFormat) -> Result<Self, HFError>
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|_|HFError::ReadBufferFailed)?;
        Self::read_buffer(&bytes, format)
    }
}

impl HierarchicalBasis for HierarchicalDomain
{
    #[inline]
    fn dim(&self) -> usize
    {
        self.breaks[0].len()
    }

    #[inline]
    fn max_level(&self) -> usize
    {
        self.breaks.len() - 1
    }

    #[inline]
    fn breaks(&self, level: usize, dim: usize) -> &[f64]
    {
        &self.breaks[level][dim]
    }

    #[inline]
    fn num_breaks(&self, level: usize, dim: usize) -> usize
    {
        num_breaks_at_level(self.breaks[0][dim].len(), level)
    }

    fn query_level(&self, lower: &[u32], upper: &[u32], max_level: usize) -> usize
    {
        let finest = self.max_level();
        let mut level = max_level.min(finest);
        let mut coarse_lower = vec![0; lower.len()];
        let mut coarse_upper = vec![0; upper.len()];
        while level > 0
        {
            let shift = finest - level;
            for dim in 0..lower.len()
            {
                coarse_lower[dim] = lower[dim] >> shift;
                coarse_upper[dim] = ((upper[dim].max(lower[dim] + 1) - 1) >> shift) + 1;
            }
            if CellRangeIterator::new(&coarse_lower, &coarse_upper).all(|cell| self.contains_cell(level, &cell))
            {
                break;
            }
            level -= 1;
        }
        level
    }

    fn refine_elements(&mut self, boxes: &[u32]) -> Result<(), HFError>
    {
        let record_len = 2 * self.dim() + 1;
        if boxes.len() % record_len != 0
        {
            return Err(HFError::InvalidBox);
        }
        for record in boxes.chunks_exact(record_len)
        {
            self.check_box(record)?;
        }
        for record in boxes.chunks_exact(record_len)
        {
            self.insert_box(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn unit_square(cells: usize) -> HierarchicalDomain
    {
        HierarchicalDomain::uniform(&[0.0, 0.0], &[1.0, 1.0], &[cells, cells]).unwrap()
    }

    #[test]
    fn check_new_domain()
    {
        let domain = unit_square(2);
        assert_eq!(domain.dim(), 2);
        assert_eq!(domain.max_level(), 0);
        assert_eq!(domain.num_breaks(0, 0), 3);
        assert_eq!(domain.num_breaks(1, 1), 5);
        assert_eq!(domain.num_cells(0), 4);
        assert_eq!(domain.query_level(&[1, 1], &[2, 2], 0), 0);
        assert!(HierarchicalDomain::new(vec![]).is_err());
    }

    #[test]
    fn check_refine_creates_nested_levels()
    {
        let mut domain = unit_square(2);
        // level 2 cell (5, 1) lies in level 1 cell (2, 0)
        domain.refine_elements(&[2, 5, 1, 6, 2]).unwrap();
        assert_eq!(domain.max_level(), 2);
        assert_eq!(domain.breaks(2, 0).len(), 9);
        assert!(domain.contains_cell(2, &[5, 1]));
        assert!(domain.contains_cell(1, &[2, 0]));
        assert!(!domain.contains_cell(1, &[0, 0]));
        assert_eq!(domain.num_cells(1), 1);
        assert_eq!(domain.cell_level(&[5, 1], 2), 2);
        assert_eq!(domain.cell_level(&[4, 1], 2), 1);
        assert_eq!(domain.cell_level(&[0, 0], 2), 0);
    }

    #[test]
    fn check_query_level()
    {
        let mut domain = unit_square(2);
        domain.refine_elements(&[1, 0, 0, 2, 2]).unwrap();
        assert_eq!(domain.query_level(&[0, 0], &[1, 1], 1), 1);
        assert_eq!(domain.query_level(&[1, 1], &[3, 2], 1), 0);
        assert_eq!(domain.query_level(&[0, 0], &[1, 1], 0), 0);
    }

    #[test]
    fn check_refine_is_idempotent_and_validates()
    {
        let mut domain = unit_square(2);
        domain.refine_elements(&[1, 0, 0, 2, 2]).unwrap();
        let before = domain.num_cells(1);
        domain.refine_elements(&[1, 0, 0, 2, 2]).unwrap();
        assert_eq!(domain.num_cells(1), before);

        assert_eq!(domain.refine_elements(&[1, 0, 0, 2]), Err(HFError::InvalidBox));
        // upper bound beyond the 4 cells of level 1
        assert_eq!(domain.refine_elements(&[1, 0, 0, 2, 2, 1, 0, 0, 5, 1]), Err(HFError::InvalidBox));
        assert_eq!(domain.num_cells(1), before);
    }

    #[test]
    fn check_leaf()
    {
        let mut domain = unit_square(2);
        domain.refine_elements(&[1, 0, 0, 1, 1]).unwrap();
        assert_eq!(domain.leaf(&[0.1, 0.1]).unwrap(), (1, vec![0, 0]));
        assert_eq!(domain.leaf(&[0.9, 0.1]).unwrap(), (0, vec![1, 0]));
        assert_eq!(domain.leaf(&[1.5, 0.1]), Err(HFError::OutOfDomain));
    }

    #[test]
    fn check_domain_roundtrip()
    {
        let mut domain = unit_square(2);
        domain.refine_elements(&[2, 0, 0, 3, 1]).unwrap();
        let bytes = crate::serialization::serialize(&domain, SerializationFormat::BincodeLz4).unwrap();
        let result = HierarchicalDomain::read(bytes.as_slice(), SerializationFormat::BincodeLz4).unwrap();
        assert_eq!(result.max_level(), 2);
        assert_eq!(result.num_cells(2), 3);
        assert_eq!(result.num_cells(1), 2);
    }

    #[test]
    fn check_read_rejects_malformed_hierarchy()
    {
        let format = SerializationFormat::Bincode;
        let read = |domain: &HierarchicalDomain|
        {
            let bytes = crate::serialization::serialize(domain, format).unwrap();
            HierarchicalDomain::read_buffer(&bytes, format)
        };

        let empty = HierarchicalDomain { breaks: vec![], domains: vec![] };
        assert_eq!(read(&empty).err(), Some(HFError::DeserializationFailed));

        let mut missing_domains = unit_square(2);
        missing_domains.ensure_level(1);
        missing_domains.domains.clear();
        assert_eq!(read(&missing_domains).err(), Some(HFError::DeserializationFailed));

        let mut skewed = unit_square(2);
        skewed.ensure_level(1);
        skewed.breaks[1][0][1] = 0.3;
        assert_eq!(read(&skewed).err(), Some(HFError::DeserializationFailed));

        let mut orphan = unit_square(2);
        orphan.ensure_level(2);
        orphan.domains[1].insert(vec![5, 1]);
        assert_eq!(read(&orphan).err(), Some(HFError::DeserializationFailed));

        let mut refined = unit_square(2);
        refined.refine_elements(&[2, 5, 1, 6, 2]).unwrap();
        let mut result = read(&refined).unwrap();
        assert!(result.contains_cell(2, &[5, 1]));
        result.refine_elements(&[1, 0, 0, 1, 1]).unwrap();
        assert_eq!(result.num_cells(1), 2);
    }
}
