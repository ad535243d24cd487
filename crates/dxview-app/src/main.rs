//! DXView 主程序入口
//! 使用 eframe 作为应用框架，egui 绘制界面，wgpu 负责静帧导出

mod app;
mod config;
mod input;
mod viewport;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::app::ViewerApp;
use crate::config::ViewerConfig;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "dxview", version, about = "3D viewer for DXF drawings")]
struct Cli {
    /// 启动时打开的DXF文件
    file: Option<PathBuf>,

    /// 配置文件路径（默认读取工作目录下的 dxview.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 只导入文件并以JSON打印摘要，不打开窗口
    #[arg(long, requires = "file")]
    info: bool,
}

/// 加载系统中的CJK字体，图层名常含中文
fn setup_cjk_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    let font_paths = [
        // macOS
        "/System/Library/Fonts/PingFang.ttc",
        "/System/Library/Fonts/Hiragino Sans GB.ttc",
        // Linux
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
        // Windows
        "C:\\Windows\\Fonts\\msyh.ttc",
        "C:\\Windows\\Fonts\\simsun.ttc",
    ];

    let Some((path, font_data)) = font_paths
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|data| (path, data)))
    else {
        return;
    };

    fonts.font_data.insert(
        "cjk".to_owned(),
        std::sync::Arc::new(egui::FontData::from_owned(font_data)),
    );
    // 放在默认字体之后，仅作回退
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }

    info!("Loaded CJK font from: {}", path);
    ctx.set_fonts(fonts);
}

/// `--info`：导入并打印摘要
fn print_info(path: &std::path::Path) -> Result<()> {
    let result = dxview_file::import_file(path)?;
    println!("{}", result.info.to_json()?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = ViewerConfig::load_or_default(cli.config.as_deref());

    // 初始化日志
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(config.log_level())
            .finish(),
    )?;

    if let Some(e) = config_error {
        tracing::error!("{}; using default configuration", e);
    }

    if cli.info {
        if let Some(path) = cli.file.as_deref() {
            return print_info(path);
        }
    }

    info!("Starting DXView...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_drag_and_drop(true)
            .with_title("DXView"),
        ..Default::default()
    };

    let initial_file = cli.file;
    eframe::run_native(
        "DXView",
        native_options,
        Box::new(move |cc| {
            setup_cjk_fonts(&cc.egui_ctx);
            let app = ViewerApp::new(cc, &config, initial_file)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
