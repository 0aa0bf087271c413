/// Image handling for dataset samples
///
/// This module handles:
/// - Decoding input and target images (processor.rs)
/// - Resizing targets and blending the cross-hair overlay (processor.rs)
/// - Converting images to model-ready tensors (tensor.rs)

pub mod processor;
pub mod tensor;

pub use processor::{load_image, prepare_target, BlendParams};
pub use tensor::{StandardTransform, Tensor, Transform};
