/// Defines useful functions for common float operations:
/// ordering a pair, tolerant comparison, remapping a value onto the unit interval.
pub mod float;

/// Homogeneous-coordinate maths module.
/// Types: 3D points and vectors with the usual arithmetic.
pub mod hcm;
