pub mod hierarchical_domain;
