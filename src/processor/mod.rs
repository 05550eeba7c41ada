//! The build passes: entry derivation, optimizer driving and the
//! post-build reconciliation of optimized maps.
pub mod driver;
pub mod entries;
pub mod optimizer;
pub mod reconcile;
pub mod registry;

pub use driver::{BuildError, BundleContribution, BundleHost, MapPlugin};
pub use reconcile::{OutputLayout, ReconcileError, reconcile};
pub use registry::AssetRegistry;
