pub mod perf;
pub mod planner;
pub mod renderer;

// Re-export commonly used items
pub use perf::{OptimizationMode, PerformanceMonitor, PerformanceSnapshot, RenderFlags};
pub use planner::{DrawBatch, FramePlan, FramePlanner, TileInstance};
pub use renderer::{FrameDrawList, RenderError, RenderOptions, Renderer};
