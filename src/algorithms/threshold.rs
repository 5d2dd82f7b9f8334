use serde::{Deserialize, Serialize};

///
/// How the error cutoff of a refinement step is chosen.
///
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum ErrorThreshold
{
    /// Refine the configured fraction of samples with the largest errors.
    #[default]
    Percentage,
    /// Refine every sample whose error is at least this value.
    Absolute(f64),
}

impl ErrorThreshold
{
    ///
    /// Returns the cutoff for `errors`. `None` if the threshold is derived
    /// from the percentage and `errors` is empty.
    ///
    pub fn resolve(&self, errors: &[f64], ref_percentage: f64) -> Option<f64>
    {
        match *self
        {
            ErrorThreshold::Absolute(value) => Some(value),
            ErrorThreshold::Percentage => select_threshold(errors, ref_percentage),
        }
    }
}

/// Negative values select [`ErrorThreshold::Percentage`].
impl From<f64> for ErrorThreshold
{
    fn from(value: f64) -> Self {
        if value >= 0.0
        {
            ErrorThreshold::Absolute(value)
        }
        else
        {
            ErrorThreshold::Percentage
        }
    }
}

///
/// Returns the error located at rank `floor(n * (1 - ref_percentage))` of the
/// ascending order of `errors`. Uses a partial selection on a copy, so the
/// input is left untouched and the cost is linear on average.
///
/// A percentage of 0 selects the largest error, 1 selects the smallest.
///
pub fn select_threshold(errors: &[f64], ref_percentage: f64) -> Option<f64>
{
    if errors.is_empty()
    {
        return None;
    }
    let rank = (errors.len() as f64 * (1.0 - ref_percentage)) as usize;
    let rank = rank.min(errors.len() - 1);
    let mut errors_copy = errors.to_vec();
    let (_, nth, _) = errors_copy.select_nth_unstable_by(rank, f64::total_cmp);
    log::trace!("refinement threshold {} selected at rank {rank} of {}", *nth, errors.len());
    Some(*nth)
}
