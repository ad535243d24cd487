//! DXView 渲染层
//!
//! 相机取景、轨道控制、视图立方体，以及基于wgpu的图元缓冲。
//!
//! # 组成
//!
//! - **取景**：按模型包围盒放置相机并生成地面网格
//! - **视图立方体**：与主相机姿态同步，点击面吸附到标准视图
//! - **模型容器**：独占当前图纸的 GPU 资源，替换时同步释放
//! - **静帧渲染**：离屏渲染当前视图并读回像素

pub mod camera;
pub mod controls;
pub mod error;
pub mod framing;
pub mod gpu;
pub mod model;
pub mod scene;
pub mod transition;
pub mod vertex;
pub mod view_cube;

pub use camera::{CameraSnapshot, CameraState, ViewMode};
pub use controls::{OrbitControls, PinchZoom};
pub use error::RenderError;
pub use framing::{fit_to_volume, GroundGrid};
pub use gpu::{PixelBuffer, StillFrameRenderer, WgpuBackend};
pub use model::{CountingBackend, GpuBackend, ModelContainer};
pub use scene::{Scene, SceneSettings};
pub use transition::{ease_in_out_quad, CameraTransition, TransitionSlot};
pub use view_cube::{CubeAction, CubeFace, FaceDescriptor, ViewCube, FACES};
