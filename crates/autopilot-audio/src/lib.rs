pub mod device;
pub mod streamer;

pub use device::DeviceManager;
pub use streamer::{AudioFrame, AudioStreamer, AudioStreamerConfig};
