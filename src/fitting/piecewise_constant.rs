use rustc_hash::FxHashMap;

use crate::basis::hierarchical::HierarchicalBasis;
use crate::errors::HFError;
use crate::fitting::context::FittingContext;
use crate::storage::hierarchical_domain::HierarchicalDomain;

///
/// Least squares fit with one constant per active cell of a [`HierarchicalDomain`].
///
/// The normal equations decouple per cell, so the coefficient of a cell holding
/// `n` samples is `sum(values) / (n + lambda)`. Errors are Euclidean distances
/// between each sample and the fitted value of its cell.
///
pub struct PiecewiseConstantFit
{
    domain: HierarchicalDomain,
    num_outputs: usize,
    parameters: Vec<f64>,
    values: Vec<f64>,
    cells: FxHashMap<(usize, Vec<u32>), usize>,
    coefficients: Vec<f64>,
    point_cells: Vec<usize>,
    point_errors: Vec<f64>,
    max_error: f64,
    min_error: f64,
}

impl PiecewiseConstantFit
{
    ///
    /// `parameters` holds `domain.dim()` values per sample and `values` holds
    /// `num_outputs` values per sample.
    ///
    pub fn new(domain: HierarchicalDomain, parameters: Vec<f64>, values: Vec<f64>, num_outputs: usize) -> Result<Self, HFError>
    {
        let num_inputs = domain.dim();
        if num_outputs == 0
        {
            return Err(HFError::NoOutputs);
        }
        if parameters.len() % num_inputs != 0
        {
            return Err(HFError::DimensionMismatch { expected: num_inputs, found: parameters.len() % num_inputs });
        }
        let num_points = parameters.len() / num_inputs;
        if values.len() != num_points * num_outputs
        {
            return Err(HFError::DimensionMismatch { expected: num_points * num_outputs, found: values.len() });
        }
        Ok(Self {
            domain, num_outputs, parameters, values,
            cells: FxHashMap::default(), coefficients: Vec::new(), point_cells: Vec::new(),
            point_errors: Vec::new(), max_error: 0.0, min_error: 0.0,
        })
    }

    pub fn num_outputs(&self) -> usize
    {
        self.num_outputs
    }

    pub fn value(&self, index: usize) -> &[f64]
    {
        &self.values[index * self.num_outputs..(index + 1) * self.num_outputs]
    }

    ///
    /// Number of cells carrying a coefficient in the current fit.
    ///
    pub fn num_coefficients(&self) -> usize
    {
        self.cells.len()
    }

    ///
    /// Fitted value at `parameter`, `None` if its cell holds no samples.
    ///
    pub fn eval(&self, parameter: &[f64]) -> Result<Option<&[f64]>, HFError>
    {
        let leaf = self.domain.leaf(parameter)?;
        Ok(self.cells.get(&leaf).map(|&i| &self.coefficients[i * self.num_outputs..(i + 1) * self.num_outputs]))
    }

    pub fn into_domain(self) -> HierarchicalDomain
    {
        self.domain
    }
}

impl FittingContext for PiecewiseConstantFit
{
    type Basis = HierarchicalDomain;

    fn basis(&self) -> &HierarchicalDomain
    {
        &self.domain
    }

    fn basis_mut(&mut self) -> &mut HierarchicalDomain
    {
        &mut self.domain
    }

    fn num_inputs(&self) -> usize
    {
        self.domain.dim()
    }

    fn num_points(&self) -> usize
    {
        self.parameters.len() / self.num_inputs()
    }

    fn parameter(&self, index: usize) -> &[f64]
    {
        let d = self.num_inputs();
        &self.parameters[index * d..(index + 1) * d]
    }

    fn compute(&mut self, lambda: f64) -> Result<(), HFError>
    {
        let mut cells = FxHashMap::default();
        let mut sums = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut point_cells = Vec::with_capacity(self.num_points());
        for index in 0..self.num_points()
        {
            let leaf = self.domain.leaf(self.parameter(index))?;
            let next = cells.len();
            let cell = *cells.entry(leaf).or_insert(next);
            if cell == next
            {
                sums.resize(sums.len() + self.num_outputs, 0.0);
                counts.push(0);
            }
            for (sum, value) in sums[cell * self.num_outputs..].iter_mut().zip(self.value(index))
            {
                *sum += value;
            }
            counts[cell] += 1;
            point_cells.push(cell);
        }
        for (coefficient, &count) in sums.chunks_exact_mut(self.num_outputs).zip(&counts)
        {
            let denominator = count as f64 + lambda;
            for c in coefficient.iter_mut()
            {
                *c /= denominator;
                if !c.is_finite()
                {
                    return Err(HFError::NumericalFailure);
                }
            }
        }
        log::trace!("fitted {} cell coefficients from {} samples", cells.len(), point_cells.len());
        self.cells = cells;
        self.coefficients = sums;
        self.point_cells = point_cells;
        Ok(())
    }

    fn compute_errors(&mut self) -> Result<(), HFError>
    {
        if self.point_cells.len() != self.num_points()
        {
            return Err(HFError::NotFitted);
        }
        let m = self.num_outputs;
        let errors: Vec<f64> = self.point_cells.iter().enumerate().map(|(index, &cell)|
        {
            let fitted = &self.coefficients[cell * m..(cell + 1) * m];
            fitted.iter().zip(self.value(index)).map(|(f, v)| (f - v) * (f - v)).sum::<f64>().sqrt()
        }).collect();
        self.max_error = errors.iter().copied().fold(0.0, f64::max);
        self.min_error = errors.iter().copied().reduce(f64::min).unwrap_or(0.0);
        self.point_errors = errors;
        Ok(())
    }

    fn point_errors(&self) -> &[f64]
    {
        &self.point_errors
    }

    fn max_error(&self) -> f64
    {
        self.max_error
    }

    fn min_error(&self) -> f64
    {
        self.min_error
    }
}
