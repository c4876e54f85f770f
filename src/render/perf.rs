use super::renderer::RenderOptions;
use bevy::prelude::*;
use std::collections::VecDeque;
use std::fmt;

/// Number of frame samples in the rolling FPS window
const FPS_WINDOW: usize = 60;

/// Frames a low/high FPS condition must persist before auto-optimize
/// changes mode; the buffer prevents oscillation on brief spikes
const STREAK_FRAMES: u32 = 30;

/// Auto-optimize engages Quality only when FPS sits comfortably above
/// the target by this factor
const HIGH_FACTOR: f32 = 1.2;

/// Optimization toggles consumed by the planner, plus the frame budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderFlags {
    pub vsync: bool,
    pub culling: bool,
    pub batching: bool,
    pub lod: bool,
    pub target_fps: f32,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            vsync: true,
            culling: true,
            batching: true,
            lod: false,
            target_fps: 60.0,
        }
    }
}

/// Rendering behavior preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptimizationMode {
    #[default]
    Standard,
    Performance,
    Quality,
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationMode::Standard => write!(f, "Standard"),
            OptimizationMode::Performance => write!(f, "Performance"),
            OptimizationMode::Quality => write!(f, "Quality"),
        }
    }
}

/// Per-frame statistics plus the current optimization state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub render_time_ms: f32,
    pub block_count: usize,
    pub visible_block_count: usize,
    pub draw_calls: usize,
    pub memory_usage_bytes: usize,
    pub flags: RenderFlags,
    pub mode: OptimizationMode,
}

impl Default for PerformanceSnapshot {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            render_time_ms: 0.0,
            block_count: 0,
            visible_block_count: 0,
            draw_calls: 0,
            memory_usage_bytes: 0,
            flags: RenderFlags::default(),
            mode: OptimizationMode::Standard,
        }
    }
}

/// Samples frame and render durations, maintains a rolling FPS average
/// and drives the optimization flags, optionally closed-loop
#[derive(Resource, Debug)]
pub struct PerformanceMonitor {
    frame_times: VecDeque<f32>,
    flags: RenderFlags,
    mode: OptimizationMode,
    auto: bool,
    /// Fraction of target_fps below which a frame counts toward the low
    /// streak; Performance mode tightens this band
    low_tolerance: f32,
    low_streak: u32,
    high_streak: u32,
    latest: PerformanceSnapshot,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
            flags: RenderFlags::default(),
            mode: OptimizationMode::Standard,
            auto: false,
            low_tolerance: 0.9,
            low_streak: 0,
            high_streak: 0,
            latest: PerformanceSnapshot::default(),
        }
    }

    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    pub fn mode(&self) -> OptimizationMode {
        self.mode
    }

    pub fn auto_enabled(&self) -> bool {
        self.auto
    }

    /// Record one frame's measurements and refresh the snapshot
    pub fn record_frame(
        &mut self,
        frame_time_ms: f32,
        render_time_ms: f32,
        block_count: usize,
        visible_block_count: usize,
        draw_calls: usize,
        memory_usage_bytes: usize,
    ) {
        if self.frame_times.len() == FPS_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time_ms.max(0.001));

        self.latest = PerformanceSnapshot {
            fps: self.fps(),
            frame_time_ms,
            render_time_ms,
            block_count,
            visible_block_count,
            draw_calls,
            memory_usage_bytes,
            flags: self.flags,
            mode: self.mode,
        };
    }

    /// Rolling average FPS over the sample window
    pub fn fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg_ms: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        1000.0 / avg_ms
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        self.latest
    }

    /// Prioritize smoothness: lossy LOD on, overlays off, tight tolerance
    pub fn optimize_for_performance(&mut self, options: &mut RenderOptions) {
        self.mode = OptimizationMode::Performance;
        self.flags.culling = true;
        self.flags.batching = true;
        self.flags.lod = true;
        self.low_tolerance = 0.95;
        options.show_grid = false;
        options.show_labels = false;
        self.reset_streaks();
        info!("Optimization mode: performance");
    }

    /// Prioritize detail: LOD off; culling and batching stay on since
    /// they are lossless
    pub fn optimize_for_quality(&mut self) {
        self.mode = OptimizationMode::Quality;
        self.flags.culling = true;
        self.flags.batching = true;
        self.flags.lod = false;
        self.low_tolerance = 0.9;
        self.reset_streaks();
        info!("Optimization mode: quality");
    }

    pub fn set_auto(&mut self, enabled: bool) {
        self.auto = enabled;
        self.reset_streaks();
        info!("Auto-optimize {}", if enabled { "engaged" } else { "off" });
    }

    /// Closed-loop controller: sustained low FPS shifts toward
    /// Performance settings, sustained headroom shifts toward Quality.
    /// Streak counters give the hysteresis that keeps it from flapping.
    pub fn auto_optimize(&mut self, options: &mut RenderOptions) {
        if !self.auto || self.frame_times.len() < FPS_WINDOW / 2 {
            return;
        }
        let fps = self.fps();
        let target = self.flags.target_fps;

        if fps < target * self.low_tolerance {
            self.low_streak += 1;
            self.high_streak = 0;
        } else if fps > target * HIGH_FACTOR {
            self.high_streak += 1;
            self.low_streak = 0;
        } else {
            self.low_streak = 0;
            self.high_streak = 0;
        }

        if self.low_streak >= STREAK_FRAMES && self.mode != OptimizationMode::Performance {
            self.optimize_for_performance(options);
        } else if self.high_streak >= STREAK_FRAMES && self.mode != OptimizationMode::Quality {
            self.optimize_for_quality();
        }
    }

    /// Human-readable summary for the report overlay
    pub fn report(&self) -> String {
        let s = &self.latest;
        format!(
            "FPS: {:.1} (target {:.0})\n\
             Frame: {:.2} ms | Render: {:.2} ms\n\
             Blocks: {} total, {} visible\n\
             Draw calls: {}\n\
             Memory: {:.1} KiB\n\
             Mode: {}{}\n\
             Flags: culling={} batching={} lod={} vsync={}",
            s.fps,
            s.flags.target_fps,
            s.frame_time_ms,
            s.render_time_ms,
            s.block_count,
            s.visible_block_count,
            s.draw_calls,
            s.memory_usage_bytes as f32 / 1024.0,
            s.mode,
            if self.auto { " (auto)" } else { "" },
            s.flags.culling,
            s.flags.batching,
            s.flags.lod,
            s.flags.vsync,
        )
    }

    fn reset_streaks(&mut self) {
        self.low_streak = 0;
        self.high_streak = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_frames(monitor: &mut PerformanceMonitor, frame_ms: f32, count: usize) {
        for _ in 0..count {
            monitor.record_frame(frame_ms, frame_ms * 0.6, 100, 80, 4, 4096);
        }
    }

    #[test]
    fn test_rolling_fps_average() {
        let mut monitor = PerformanceMonitor::new();
        assert_eq!(monitor.fps(), 0.0);

        feed_frames(&mut monitor, 16.0, FPS_WINDOW);
        assert!((monitor.fps() - 62.5).abs() < 0.5);

        // Window slides: slow frames pull the average down
        feed_frames(&mut monitor, 33.0, FPS_WINDOW);
        assert!((monitor.fps() - 30.3).abs() < 0.5);
    }

    #[test]
    fn test_performance_mode_flags() {
        let mut monitor = PerformanceMonitor::new();
        let mut options = RenderOptions::default();
        options.show_grid = true;
        options.show_labels = true;

        monitor.optimize_for_performance(&mut options);
        feed_frames(&mut monitor, 16.0, 1);

        let snapshot = monitor.snapshot();
        assert!(snapshot.flags.lod);
        assert!(snapshot.flags.culling);
        assert!(snapshot.flags.batching);
        assert_eq!(snapshot.mode, OptimizationMode::Performance);
        assert!(!options.show_grid);
        assert!(!options.show_labels);
    }

    #[test]
    fn test_quality_mode_flags() {
        let mut monitor = PerformanceMonitor::new();
        let mut options = RenderOptions::default();
        monitor.optimize_for_performance(&mut options);
        monitor.optimize_for_quality();
        feed_frames(&mut monitor, 16.0, 1);

        let snapshot = monitor.snapshot();
        assert!(!snapshot.flags.lod);
        assert!(snapshot.flags.culling);
        assert!(snapshot.flags.batching);
        assert_eq!(snapshot.mode, OptimizationMode::Quality);
    }

    #[test]
    fn test_auto_optimize_needs_sustained_low_fps() {
        let mut monitor = PerformanceMonitor::new();
        let mut options = RenderOptions::default();
        monitor.set_auto(true);

        // Fill the window with healthy frames
        feed_frames(&mut monitor, 16.0, FPS_WINDOW);
        for _ in 0..STREAK_FRAMES {
            monitor.auto_optimize(&mut options);
            monitor.record_frame(16.0, 10.0, 100, 80, 4, 4096);
        }
        assert_eq!(monitor.mode(), OptimizationMode::Standard);

        // A brief dip is not enough
        feed_frames(&mut monitor, 50.0, 5);
        for _ in 0..5 {
            monitor.auto_optimize(&mut options);
        }
        assert_eq!(monitor.mode(), OptimizationMode::Standard);

        // A sustained dip flips to performance settings
        feed_frames(&mut monitor, 50.0, FPS_WINDOW);
        for _ in 0..STREAK_FRAMES {
            monitor.auto_optimize(&mut options);
            monitor.record_frame(50.0, 40.0, 100, 80, 4, 4096);
        }
        assert_eq!(monitor.mode(), OptimizationMode::Performance);
        assert!(monitor.flags().lod);
    }

    #[test]
    fn test_auto_optimize_recovers_to_quality() {
        let mut monitor = PerformanceMonitor::new();
        let mut options = RenderOptions::default();
        monitor.set_auto(true);
        monitor.optimize_for_performance(&mut options);

        // Sustained comfortable headroom above target
        feed_frames(&mut monitor, 8.0, FPS_WINDOW);
        for _ in 0..STREAK_FRAMES {
            monitor.auto_optimize(&mut options);
            monitor.record_frame(8.0, 5.0, 100, 80, 4, 4096);
        }
        assert_eq!(monitor.mode(), OptimizationMode::Quality);
        assert!(!monitor.flags().lod);
    }

    #[test]
    fn test_auto_optimize_idle_when_disengaged() {
        let mut monitor = PerformanceMonitor::new();
        let mut options = RenderOptions::default();

        feed_frames(&mut monitor, 100.0, FPS_WINDOW);
        for _ in 0..STREAK_FRAMES * 2 {
            monitor.auto_optimize(&mut options);
        }
        assert_eq!(monitor.mode(), OptimizationMode::Standard);
    }

    #[test]
    fn test_report_mentions_key_figures() {
        let mut monitor = PerformanceMonitor::new();
        feed_frames(&mut monitor, 16.0, 10);
        let report = monitor.report();
        assert!(report.contains("FPS"));
        assert!(report.contains("Draw calls: 4"));
        assert!(report.contains("Blocks: 100 total, 80 visible"));
    }
}
