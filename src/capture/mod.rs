//! # 整页截图引擎
//!
//! 通过反复滚动、截取可视区域并拼接，生成比任何单个视口都大的整页图像。
//!
//! ## 主要功能
//! - **滚动规划**: 计算覆盖整个页面所需的滚动位置（按栈顺序消费）
//! - **分块**: 将超大输出图像拆分为受尺寸限制的多个画布
//! - **拼接**: 修正缩放偏差后，把每一帧绘制到所有相交的分块上
//! - **状态机**: 滚动 → 等待稳定 → 截图 → 拼接 → 进度，结束时必定恢复页面状态
//!
//! ## 模块结构
//! - `types`: 数据模型（PageExtent、Arrangement、Tile、CaptureFrame 等）
//! - `geometry`: 滚动位置规划
//! - `tiles`: 输出分块
//! - `compositor`: 帧拼接与缩放修正
//! - `orchestrator`: 截图会话状态机
//! - `target`: 目标 URL 校验
//! - `filename`: 输出文件名
//! - `traits`: 滚动控制、截图提供者与进度回调接口
//!
//! ## 使用示例
//! ```rust,no_run
//! use chaser_shot::capture::{CaptureMode, CaptureOptions, CaptureOrchestrator};
//! use chaser_shot::output::LoggingProgress;
//! use chaser_shot::page::CdpPage;
//! use std::sync::Arc;
//!
//! # async fn example(client: Arc<dyn chaser_shot::cdp::CdpClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let page = Arc::new(CdpPage::new(client));
//! let mut orchestrator = CaptureOrchestrator::new(page.clone(), page, CaptureOptions::default());
//!
//! let output = orchestrator
//!     .capture("https://example.com/", CaptureMode::WholePage, &LoggingProgress)
//!     .await?;
//! println!("{} tile(s) -> {}", output.tiles.len(), output.metadata.filename);
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod geometry;
pub mod tiles;
pub mod compositor;
pub mod orchestrator;
pub mod target;
pub mod filename;
pub mod traits;


pub use types::{
    Arrangement, CaptureFrame, CaptureMode, CaptureOutput, OutputMetadata, PageExtent,
    ScrollPosition, SessionState, Tile, TileBounds, Viewport,
};
pub use geometry::{plan, CapturePlan};
pub use tiles::{partition, TileLimits};
pub use compositor::{correct, Compositor, CorrectedPlacement};
pub use orchestrator::{CaptureOptions, CaptureOrchestrator, CaptureState};
pub use target::validate_target;
pub use filename::build_filename;
pub use traits::{CaptureProvider, ProgressSink, ScrollController};
