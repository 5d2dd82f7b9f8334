use crate::errors::HFError;

///
/// Returns the index of the half-open interval `[breaks[i], breaks[i+1])`
/// containing `u`. The right end of the domain belongs to the last interval.
///
#[inline]
pub fn find_interval(breaks: &[f64], u: f64) -> Result<u32, HFError>
{
    let (first, last) = match (breaks.first(), breaks.last())
    {
        (Some(&first), Some(&last)) if breaks.len() > 1 => (first, last),
        _ => return Err(HFError::InvalidBreakPoints),
    };
    // written this way so NaN is rejected too
    if !(u >= first && u <= last)
    {
        return Err(HFError::OutOfDomain);
    }
    let upper = breaks.partition_point(|&b| b <= u);
    Ok((upper - 1).min(breaks.len() - 2) as u32)
}

///
/// Locates the cell containing `parameter`, one break point sequence per dimension.
///
pub fn locate_cell<B: AsRef<[f64]>>(parameter: &[f64], breaks: &[B]) -> Result<Vec<u32>, HFError>
{
    if parameter.len() != breaks.len()
    {
        return Err(HFError::DimensionMismatch { expected: breaks.len(), found: parameter.len() });
    }
    parameter.iter().zip(breaks).map(|(&u, breaks)| find_interval(breaks.as_ref(), u)).collect()
}

#[test]
fn check_find_interval()
{
    let breaks = [0.0, 0.25, 0.5, 0.75, 1.0];
    assert_eq!(find_interval(&breaks, 0.0), Ok(0));
    assert_eq!(find_interval(&breaks, 0.1), Ok(0));
    assert_eq!(find_interval(&breaks, 0.25), Ok(1));
    assert_eq!(find_interval(&breaks, 0.74), Ok(2));
    assert_eq!(find_interval(&breaks, 1.0), Ok(3));
    assert_eq!(find_interval(&breaks, 1.01), Err(HFError::OutOfDomain));
    assert_eq!(find_interval(&breaks, -0.1), Err(HFError::OutOfDomain));
    assert_eq!(find_interval(&breaks, f64::NAN), Err(HFError::OutOfDomain));
    assert_eq!(find_interval(&[0.0], 0.0), Err(HFError::InvalidBreakPoints));
}

#[test]
fn check_locate_cell_non_uniform()
{
    let breaks = vec![vec![0.0, 0.1, 0.5, 1.0], vec![-1.0, 0.0, 1.0]];
    assert_eq!(locate_cell(&[0.3, -0.5], &breaks), Ok(vec![1, 0]));
    assert_eq!(locate_cell(&[1.0, 1.0], &breaks), Ok(vec![2, 1]));
    assert_eq!(locate_cell(&[0.3], &breaks), Err(HFError::DimensionMismatch { expected: 2, found: 1 }));
}
