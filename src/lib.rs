//! Direct access to Linux framebuffer devices.
//!
//! [`FrameBufferDevice`] probes a `/dev/fbN` device for its geometry and
//! writes caller-prepared pixel buffers straight into its display memory.

pub mod configuration;
pub mod display;
pub mod error;
pub mod fbio;
pub mod framebuffer;

pub use error::Error;
pub use fbio::{BlankingLevel, DeviceControl, Ioctl};
pub use framebuffer::{FrameBufferDevice, DEFAULT_DISPLAY_DEVICE};
