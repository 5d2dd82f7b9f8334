pub mod boxes;
pub mod cell_locator;
pub mod threshold;
