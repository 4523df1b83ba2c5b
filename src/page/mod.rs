//! # 页面控制层
//!
//! 通过 CDP 在目标页面中执行脚本，为截图引擎提供滚动控制与可视区域截图。
//!
//! ## 主要功能
//! - **几何探测**: 读取视口尺寸、滚动位置与页面完整尺寸
//! - **状态快照**: 记录并恢复滚动位置和 overflow 样式
//! - **截图**: 调用 `Page.captureScreenshot` 并解码为 RGBA 图像
//! - **标题进度**: 在页面标题中显示截图进度，结束后恢复原标题
//!
//! ## 模块结构
//! - `scripts`: 页面内执行的 JavaScript 片段
//! - `controller`: `CdpPage`，实现 `ScrollController` 与 `CaptureProvider`
//! - `progress`: `TitleProgress` 进度装饰器

pub mod scripts;
pub mod controller;
pub mod progress;

#[cfg(test)]
mod tests;

pub use controller::CdpPage;
pub use progress::{progress_title, TitleProgress};
