use crate::errors::HFError;

///
/// Checks that `breaks` has at least two strictly increasing, finite entries.
///
pub fn validate_breaks(breaks: &[f64]) -> Result<(), HFError>
{
    if breaks.len() < 2 || breaks.iter().any(|b| !b.is_finite()) || breaks.windows(2).any(|w| w[0] >= w[1])
    {
        Err(HFError::InvalidBreakPoints)
    }
    else
    {
        Ok(())
    }
}

///
/// Splits every interval in half.
///
pub fn bisect(breaks: &[f64]) -> Vec<f64>
{
    let mut r = Vec::with_capacity(2 * breaks.len() - 1);
    for w in breaks.windows(2)
    {
        r.push(w[0]);
        r.push(0.5 * (w[0] + w[1]));
    }
    r.extend(breaks.last());
    r
}

///
/// Number of break points after `level` bisections of a sequence with `num_base` break points.
///
#[inline]
pub fn num_breaks_at_level(num_base: usize, level: usize) -> usize
{
    ((num_base - 1) << level) + 1
}

///
/// Uniform break points with `num_intervals` cells on `[lower, upper]`.
///
pub fn uniform_breaks(lower: f64, upper: f64, num_intervals: usize) -> Vec<f64>
{
    let width = upper - lower;
    (0..=num_intervals).map(|i| lower + width * i as f64 / num_intervals as f64).collect()
}

#[test]
fn check_bisect()
{
    let breaks = bisect(&[0.0, 0.5, 1.0]);
    assert_eq!(breaks, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_eq!(breaks.len(), num_breaks_at_level(3, 1));
    assert_eq!(num_breaks_at_level(3, 3), 17);
}

#[test]
fn check_validate_breaks()
{
    assert!(validate_breaks(&uniform_breaks(0.0, 2.0, 4)).is_ok());
    assert_eq!(validate_breaks(&[0.0]), Err(HFError::InvalidBreakPoints));
    assert_eq!(validate_breaks(&[0.0, 0.0, 1.0]), Err(HFError::InvalidBreakPoints));
    assert_eq!(validate_breaks(&[0.0, f64::NAN]), Err(HFError::InvalidBreakPoints));
}
