pub mod cell_range;
