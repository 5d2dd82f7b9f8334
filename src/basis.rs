pub mod dyadic;
pub mod hierarchical;
