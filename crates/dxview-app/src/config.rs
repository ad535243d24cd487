//! 查看器配置
//!
//! 查找顺序：`--config <path>` → 工作目录下的 `dxview.toml` → 默认值。

use dxview_core::measure::MeasureUnits;
use dxview_core::properties::Color;
use dxview_renderer::SceneSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// 工作目录下的默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "dxview.toml";

const DEFAULT_BACKGROUND: Color = Color::from_hex(0xf5f7fa);

/// 配置根结构
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub log_level: String,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub view_cube: ViewCubeConfig,
    pub measure: MeasureConfig,
    /// 背景色 `#rrggbb`
    pub background: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            view_cube: ViewCubeConfig::default(),
            measure: MeasureConfig::default(),
            background: DEFAULT_BACKGROUND.to_hex_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub damping: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 10000.0,
            min_distance: 1.0,
            max_distance: 5000.0,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewCubeConfig {
    pub size: f64,
    pub margin: f64,
    pub snap_duration_ms: u64,
    pub drag_time_ms: u64,
    pub drag_distance_px: f64,
}

impl Default for ViewCubeConfig {
    fn default() -> Self {
        Self {
            size: 120.0,
            margin: 20.0,
            snap_duration_ms: 500,
            drag_time_ms: 200,
            drag_distance_px: 5.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub units: MeasureUnits,
}

impl ViewerConfig {
    /// 从显式路径加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 按查找顺序加载；文件不存在时返回默认值
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = working_dir.join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 加载失败时退回默认值，同时把错误交给调用方报告
    pub fn load_or_default(explicit: Option<&Path>) -> (Self, Option<ConfigError>) {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match Self::discover(explicit, &working_dir) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// 日志级别，无法识别时为 INFO
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    /// 背景色，无法解析时为默认浅灰
    pub fn background_color(&self) -> Color {
        Color::parse_hex(&self.background).unwrap_or(DEFAULT_BACKGROUND)
    }

    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            fov_degrees: self.camera.fov_degrees,
            near: self.camera.near,
            far: self.camera.far,
            min_distance: self.camera.min_distance,
            max_distance: self.camera.max_distance,
            damping: self.camera.damping,
            view_cube_size: self.view_cube.size,
            view_cube_margin: self.view_cube.margin,
            snap_duration: Duration::from_millis(self.view_cube.snap_duration_ms),
            drag_time: Duration::from_millis(self.view_cube.drag_time_ms),
            drag_distance: self.view_cube.drag_distance_px,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.log_level(), Level::INFO);
        assert_eq!(config.background_color(), Color::from_hex(0xf5f7fa));
        assert_eq!(config.scene_settings().snap_duration, Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
            log_level = "debug"
            background = "#202020"

            [camera]
            fov_degrees = 60.0

            [view_cube]
            size = 160.0

            [measure]
            units = "imperial"
            "##
        )
        .unwrap();

        let config = ViewerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level(), Level::DEBUG);
        assert_eq!(config.background_color(), Color::from_hex(0x202020));
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.far, 10000.0);
        assert_eq!(config.view_cube.size, 160.0);
        assert_eq!(config.view_cube.margin, 20.0);
        assert_eq!(config.measure.units, MeasureUnits::Imperial);
        assert_eq!(config.window.width, 1400.0);
    }

    #[test]
    fn test_working_dir_file_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[window]\nwidth = 800.0\n").unwrap();

        let config = ViewerConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.window.width, 800.0);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "camera = [").unwrap();

        let result = ViewerConfig::discover(Some(file.path()), Path::new("."));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        let (config, error) = ViewerConfig::load_or_default(Some(file.path()));
        assert_eq!(config, ViewerConfig::default());
        assert!(error.is_some());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = ViewerConfig::discover(Some(Path::new("/no/such/dxview.toml")), Path::new("."));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ViewerConfig {
            log_level: "chatty".to_string(),
            background: "not a color".to_string(),
            ..Default::default()
        };
        assert_eq!(config.log_level(), Level::INFO);
        assert_eq!(config.background_color(), Color::from_hex(0xf5f7fa));
    }
}
