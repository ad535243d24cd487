//! 渲染错误定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("GPU device request failed: {0}")]
    Device(String),

    #[error("Invalid frame size: {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("Frame readback failed: {0}")]
    Readback(String),
}
