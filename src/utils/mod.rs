//! Helpers shared by tether's tests, doctests and demos.
pub mod testing;
