//! UI状态管理

use dxview_file::ImportInfo;
use dxview_renderer::ViewMode;

/// 工具栏意图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarIntent {
    OpenFile,
    ToggleLayersPanel,
    ToggleExportPanel,
    ResetView,
    ToggleHelp,
    ToggleMeasure,
    SetViewMode(ViewMode),
    /// 关闭所有面板和帮助
    CloseAll,
}

impl ToolbarIntent {
    pub fn name(&self) -> &'static str {
        match self {
            ToolbarIntent::OpenFile => "Open",
            ToolbarIntent::ToggleLayersPanel => "Layers",
            ToolbarIntent::ToggleExportPanel => "Export",
            ToolbarIntent::ResetView => "Reset View",
            ToolbarIntent::ToggleHelp => "Help",
            ToolbarIntent::ToggleMeasure => "Measure",
            ToolbarIntent::SetViewMode(ViewMode::Perspective) => "Perspective",
            ToolbarIntent::SetViewMode(ViewMode::Orthographic) => "Orthographic",
            ToolbarIntent::CloseAll => "Close",
        }
    }
}

/// 图层面板意图
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerIntent {
    SetLayerVisible(String, bool),
    ShowAll,
    HideAll,
}

/// UI状态
#[derive(Debug)]
pub struct UiState {
    /// 是否显示图层面板
    pub show_layers_panel: bool,

    /// 是否显示导出面板
    pub show_export_panel: bool,

    /// 是否显示帮助
    pub show_help: bool,

    /// 测量模式
    pub measuring: bool,

    /// 当前投影模式（由场景回填）
    pub view_mode: ViewMode,

    /// 最近一次导入的摘要
    pub info: Option<ImportInfo>,

    /// 正在导入的文件名
    pub loading: Option<String>,

    /// 状态栏消息
    pub status_message: String,

    /// 最近一次错误（显示在状态栏，下次成功操作时清除）
    pub last_error: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_layers_panel: false,
            show_export_panel: false,
            show_help: false,
            measuring: false,
            view_mode: ViewMode::Perspective,
            info: None,
            loading: None,
            status_message: "Open a DXF file to begin".to_string(),
            last_error: None,
        }
    }
}

impl UiState {
    /// 处理意图；面板开关在此消化，其余意图返回给应用层执行
    pub fn apply(&mut self, intent: ToolbarIntent) -> Option<ToolbarIntent> {
        match intent {
            ToolbarIntent::ToggleLayersPanel => {
                self.show_layers_panel = !self.show_layers_panel;
                None
            }
            ToolbarIntent::ToggleExportPanel => {
                self.show_export_panel = !self.show_export_panel;
                None
            }
            ToolbarIntent::ToggleHelp => {
                self.show_help = !self.show_help;
                None
            }
            ToolbarIntent::CloseAll => {
                self.show_layers_panel = false;
                self.show_export_panel = false;
                self.show_help = false;
                None
            }
            ToolbarIntent::ToggleMeasure => {
                self.measuring = !self.measuring;
                self.status_message = if self.measuring {
                    "Measure: pick two points".to_string()
                } else {
                    "Measure off".to_string()
                };
                Some(intent)
            }
            ToolbarIntent::OpenFile
            | ToolbarIntent::ResetView
            | ToolbarIntent::SetViewMode(_) => Some(intent),
        }
    }

    /// 开始导入
    pub fn begin_loading(&mut self, file_name: impl Into<String>) {
        let name = file_name.into();
        self.status_message = format!("Loading {}...", name);
        self.loading = Some(name);
    }

    /// 导入成功
    pub fn finish_loading(&mut self, info: ImportInfo) {
        self.status_message = match self.loading.take() {
            Some(name) => format!("Loaded {}", name),
            None => "Loaded".to_string(),
        };
        self.last_error = None;
        self.info = Some(info);
    }

    /// 记录失败（导入或导出）
    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.loading = None;
        self.status_message = "Error".to_string();
        self.last_error = Some(message);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }
}
