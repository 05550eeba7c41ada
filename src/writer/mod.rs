//! Everything that ends up on disk or stdout.
pub mod contribution;
pub mod descriptor;
