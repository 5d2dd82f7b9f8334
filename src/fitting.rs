pub mod context;
pub mod hierarchical_fitting;
pub mod piecewise_constant;
