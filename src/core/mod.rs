pub mod engine;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod segment;
pub mod splitter;
pub mod stitch;
