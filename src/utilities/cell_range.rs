///
/// Iterates over every cell of the half-open index box `[lower, upper)` in
/// lexicographic order, last dimension fastest.
///
#[derive(Clone, Debug)]
pub struct CellRangeIterator
{
    lower: Vec<u32>,
    upper: Vec<u32>,
    current: Vec<u32>,
    done: bool,
}

impl CellRangeIterator
{
    pub fn new(lower: &[u32], upper: &[u32]) -> Self
    {
        let done = lower.is_empty() || lower.len() != upper.len() || lower.iter().zip(upper).any(|(l, u)| l >= u);
        Self { lower: lower.to_vec(), upper: upper.to_vec(), current: lower.to_vec(), done }
    }

    ///
    /// Number of cells in the box.
    ///
    pub fn num_cells(&self) -> usize
    {
        if self.done
        {
            return 0;
        }
        self.lower.iter().zip(&self.upper).map(|(&l, &u)| (u - l) as usize).product()
    }
}

impl Iterator for CellRangeIterator
{
    type Item = Vec<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done
        {
            return None;
        }
        let item = self.current.clone();
        let mut dim = self.current.len();
        loop
        {
            if dim == 0
            {
                self.done = true;
                break;
            }
            dim -= 1;
            self.current[dim] += 1;
            if self.current[dim] < self.upper[dim]
            {
                break;
            }
            self.current[dim] = self.lower[dim];
        }
        Some(item)
    }
}

#[test]
fn check_cell_range()
{
    let cells: Vec<_> = CellRangeIterator::new(&[1, 0], &[3, 2]).collect();
    assert_eq!(cells, vec![vec![1, 0], vec![1, 1], vec![2, 0], vec![2, 1]]);
    assert_eq!(CellRangeIterator::new(&[1, 0], &[3, 2]).num_cells(), 4);
    assert_eq!(CellRangeIterator::new(&[1, 1], &[1, 2]).count(), 0);
    assert_eq!(CellRangeIterator::new(&[], &[]).count(), 0);
}
