use serde::{Deserialize, Serialize};

use crate::errors::HFError;

pub const DEFAULT_REF_PERCENTAGE: f64 = 0.1;

///
/// Settings of the adaptive fitting loop.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingOptions
{
    /// Fraction of samples, by error rank, marked for refinement. In `[0, 1]`.
    pub(crate) ref_percentage: f64,
    /// Number of extra cells added on each side of a marked cell, per dimension.
    pub(crate) extension: Vec<u32>,
    /// Smoothing parameter passed to every fit.
    pub(crate) lambda: f64,
}

impl FittingOptions
{
    pub fn new(ref_percentage: f64, extension: Vec<u32>, lambda: f64) -> Result<Self, HFError>
    {
        check_ref_percentage(ref_percentage)?;
        check_lambda(lambda)?;
        Ok(Self { ref_percentage, extension, lambda })
    }

    ///
    /// Default options for a `dim` dimensional basis: 10% refinement, no extension, no smoothing.
    ///
    pub fn with_dim(dim: usize) -> Self
    {
        Self { ref_percentage: DEFAULT_REF_PERCENTAGE, extension: vec![0; dim], lambda: 0.0 }
    }

    ///
    /// Checks every setting against a basis with `dim` dimensions.
    ///
    pub fn validate(&self, dim: usize) -> Result<(), HFError>
    {
        check_ref_percentage(self.ref_percentage)?;
        check_extension(&self.extension, dim)?;
        check_lambda(self.lambda)
    }

    pub fn ref_percentage(&self) -> f64
    {
        self.ref_percentage
    }

    pub fn extension(&self) -> &[u32]
    {
        &self.extension
    }

    pub fn lambda(&self) -> f64
    {
        self.lambda
    }
}

pub(crate) fn check_ref_percentage(ref_percentage: f64) -> Result<(), HFError>
{
    if (0.0..=1.0).contains(&ref_percentage)
    {
        Ok(())
    }
    else
    {
        Err(HFError::InvalidRefinementPercentage(ref_percentage))
    }
}

pub(crate) fn check_extension(extension: &[u32], dim: usize) -> Result<(), HFError>
{
    if extension.len() == dim
    {
        Ok(())
    }
    else
    {
        Err(HFError::ExtensionDimensionMismatch { expected: dim, found: extension.len() })
    }
}

pub(crate) fn check_lambda(lambda: f64) -> Result<(), HFError>
{
    if lambda.is_finite() && lambda >= 0.0
    {
        Ok(())
    }
    else
    {
        Err(HFError::InvalidSmoothingParameter(lambda))
    }
}

#[test]
fn check_options_validation()
{
    assert!(FittingOptions::new(0.5, vec![1, 1], 0.0).is_ok());
    assert_eq!(FittingOptions::new(1.5, vec![1, 1], 0.0), Err(HFError::InvalidRefinementPercentage(1.5)));
    assert!(FittingOptions::new(f64::NAN, vec![1, 1], 0.0).is_err());
    assert_eq!(FittingOptions::new(0.5, vec![1], -1.0), Err(HFError::InvalidSmoothingParameter(-1.0)));

    let options = FittingOptions::new(0.5, vec![1], 0.0).unwrap();
    assert_eq!(options.validate(2), Err(HFError::ExtensionDimensionMismatch { expected: 2, found: 1 }));
    assert!(FittingOptions::with_dim(3).validate(3).is_ok());
}
