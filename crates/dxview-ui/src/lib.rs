//! DXView 用户界面
//!
//! 基于egui的即时模式GUI。面板只产出意图，由应用层转交给场景执行。

pub mod export_panel;
pub mod help;
pub mod layers_panel;
pub mod shortcuts;
pub mod state;
pub mod status_bar;
pub mod toolbar;

pub use shortcuts::Shortcut;
pub use state::{LayerIntent, ToolbarIntent, UiState};
