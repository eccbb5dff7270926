//! Concrete monitor actions.
//!
//! Register reads share [`RegisterReadAction`], which owns the
//! send/receive/decode sequence; each read supplies its address, length,
//! capability gate and result handling through [`RegisterRead`].

pub mod device_info;
pub mod frame;
pub mod register;

pub use device_info::DeviceInfo;
pub use frame::{FrameError, ReadRegisters};
pub use register::{RegisterRead, RegisterReadAction};
