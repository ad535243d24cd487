//! DXView 文件处理
//!
//! 支持：
//! - `.dxf` 导入（后台线程解析，帧循环轮询结果）
//! - 当前视图导出为 PNG / SVG

pub mod dxf_io;
pub mod error;
pub mod export;
pub mod import;

pub use dxf_io::{DrawingParser, DxfParser};
pub use error::FileError;
pub use export::{encode_png, export_file_name, save_png, ExportFormat, SvgExporter};
pub use import::{import_file, import_text, ImportInfo, ImportJob, ImportResult};
