//!
//! Adaptive refinement of hierarchical bases for least-squares fitting of
//! parametrized point clouds.
//!
//! A [`fitting::hierarchical_fitting::HierarchicalFitting`] drives any
//! [`fitting::context::FittingContext`]: after each fit the samples with the
//! largest errors are located on the finest grid, turned into refinement boxes
//! one level deeper than where they currently live, and handed to the
//! [`basis::hierarchical::HierarchicalBasis`].
//!
pub mod algorithms;
pub mod basis;
pub mod errors;
pub mod fitting;
pub mod options;
pub mod serialization;
pub mod storage;
pub mod utilities;

pub use algorithms::threshold::ErrorThreshold;
pub use errors::HFError;
pub use fitting::hierarchical_fitting::{HierarchicalFitting, IterationStatus, RefinementReport, StopReason};
pub use options::FittingOptions;
