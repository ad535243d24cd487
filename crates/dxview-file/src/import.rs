//! 导入流水线
//!
//! 读取 → 解析 → 几何转换 → 图层索引 → 摘要。读取和解析失败会终止本次导入；
//! 单个实体转换失败只会跳过该实体。

use crate::dxf_io::{DrawingParser, DxfParser};
use crate::error::FileError;
use crossbeam::channel::{self, Receiver, TryRecvError};
use dxview_core::entity::DrawingDocument;
use dxview_core::layer::LayerRegistry;
use dxview_core::primitive::{build, RenderPrimitive};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 导入摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportInfo {
    /// 文件版本（头段中的 `$ACADVER`，缺失时为 `Unknown`）
    pub format_version: String,

    /// 解析出的实体总数（含不支持的实体）
    pub entity_count: usize,

    /// 图层数量
    pub layer_count: usize,
}

impl ImportInfo {
    pub fn to_json(&self) -> Result<String, FileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 一次成功导入的结果
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub primitives: Vec<RenderPrimitive>,
    pub layers: LayerRegistry,
    pub info: ImportInfo,
}

/// 检查扩展名是否为 `.dxf`（不区分大小写）
pub fn check_extension(path: &Path) -> Result<(), FileError> {
    let is_dxf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dxf"));
    if is_dxf {
        Ok(())
    } else {
        Err(FileError::InvalidFormat(format!(
            "{} is not a .dxf file",
            path.display()
        )))
    }
}

/// 读取图纸文本（非 UTF-8 字节按替换字符解码）
pub fn read_drawing_text(path: &Path) -> Result<String, FileError> {
    check_extension(path)?;
    let bytes = std::fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!("{} is not valid UTF-8, decoding lossily", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// 把解析后的图纸转换为图元、图层和摘要
pub fn import_document(document: &DrawingDocument) -> ImportResult {
    let primitives: Vec<RenderPrimitive> = document
        .entities
        .iter()
        .filter_map(|entity| {
            let primitive = build(entity);
            if primitive.is_none() {
                tracing::debug!("Skipped {} entity on layer {}", entity.type_name(), entity.layer);
            }
            primitive
        })
        .collect();

    let layers = LayerRegistry::rebuild(&primitives);
    let info = ImportInfo {
        format_version: document.version_label().to_string(),
        entity_count: document.entities.len(),
        layer_count: layers.count(),
    };

    tracing::info!(
        "Imported DXF {}: {} entities, {} rendered, {} layers",
        info.format_version,
        info.entity_count,
        primitives.len(),
        info.layer_count
    );

    ImportResult {
        primitives,
        layers,
        info,
    }
}

/// 从文本导入
pub fn import_text(text: &str, parser: &dyn DrawingParser) -> Result<ImportResult, FileError> {
    let document = parser.parse(text)?;
    Ok(import_document(&document))
}

/// 从文件导入（默认 DXF 解析器）
pub fn import_file(path: &Path) -> Result<ImportResult, FileError> {
    let text = read_drawing_text(path)?;
    import_text(&text, &DxfParser)
}

/// 后台导入任务
///
/// 在工作线程上执行导入，帧循环通过 [`ImportJob::poll`] 取回结果。
pub struct ImportJob {
    path: PathBuf,
    receiver: Receiver<Result<ImportResult, FileError>>,
}

impl ImportJob {
    /// 启动后台导入
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = channel::bounded(1);
        let worker_path = path.clone();
        std::thread::spawn(move || {
            let result = import_file(&worker_path);
            if sender.send(result).is_err() {
                tracing::debug!("Import of {} finished after the job was dropped", worker_path.display());
            }
        });
        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 非阻塞地取回结果；仍在进行时返回 `None`
    pub fn poll(&self) -> Option<Result<ImportResult, FileError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(FileError::Read {
                path: self.path.clone(),
                source: std::io::Error::other("import worker terminated"),
            })),
        }
    }

    /// 阻塞等待结果
    pub fn wait(self) -> Result<ImportResult, FileError> {
        self.receiver.recv().map_err(|_| FileError::Read {
            path: self.path.clone(),
            source: std::io::Error::other("import worker terminated"),
        })?
    }
}
