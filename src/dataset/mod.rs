/// Paired fundus / visual field dataset
///
/// This module handles:
/// - File name tokens and pair types (record.rs)
/// - Discovering (input, target) pairs on disk (discovery.rs)
/// - Loading pairs into model-ready samples (loader.rs)

pub mod discovery;
pub mod loader;
pub mod record;

pub use discovery::{discover_pairs, RoleMarkers};
pub use loader::{PairedDataset, Sample};
pub use record::{ImagePair, Laterality, SampleRecord};
