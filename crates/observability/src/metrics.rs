//! 录制会话指标收集模块
//!
//! 采样、事件、刷盘与连续性指标 (`gaze_recorder_*`)。

use metrics::{counter, gauge, histogram};

/// 记录收到的一个采样
///
/// 在生产者线程上调用；只增加计数器，不持有任何锁。
pub fn record_sample_received(source: &str) {
    counter!("gaze_recorder_samples_received_total", "source" => source.to_string())
        .increment(1);
}

/// 记录一个实验事件
pub fn record_event_recorded() {
    counter!("gaze_recorder_events_recorded_total").increment(1);
}

/// 记录一次 drain (原子交换)
pub fn record_drain(samples: usize, events: usize) {
    counter!("gaze_recorder_drains_total").increment(1);
    histogram!("gaze_recorder_drain_samples").record(samples as f64);
    if events > 0 {
        histogram!("gaze_recorder_drain_events").record(events as f64);
    }
}

/// 记录写入文件的行数
pub fn record_rows_written(format: &str, rows: usize) {
    counter!("gaze_recorder_rows_written_total", "format" => format.to_string())
        .increment(rows as u64);
}

/// 记录一次保存
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_save;
///
/// let report = engine.save(&samples, &events)?;
/// record_save(report.rows_written, report.events_written, report.elapsed_ms);
/// ```
pub fn record_save(rows: usize, events: usize, elapsed_ms: f64) {
    counter!("gaze_recorder_saves_total").increment(1);
    histogram!("gaze_recorder_save_latency_ms").record(elapsed_ms);
    histogram!("gaze_recorder_save_rows").record(rows as f64);
    if events > 0 {
        counter!("gaze_recorder_events_written_total").increment(events as u64);
    }
}

/// 记录连续性分析估计的丢失采样数
pub fn record_dropped_samples(dropped: u64, total: u64) {
    gauge!("gaze_recorder_dropped_samples_estimate").set(dropped as f64);
    gauge!("gaze_recorder_persisted_samples").set(total as f64);
}

/// 记录一次实时注视点查询
pub fn record_rolling_query(has_data: bool) {
    counter!(
        "gaze_recorder_rolling_queries_total",
        "result" => if has_data { "position" } else { "empty" }
    )
    .increment(1);
}

/// 记录缓冲区深度
pub fn record_buffer_depth(samples: usize) {
    gauge!("gaze_recorder_buffer_depth").set(samples as f64);
}

/// 会话指标聚合器
///
/// 在内存中聚合每次保存的指标，便于输出会话摘要。
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// 保存次数
    pub total_saves: u64,

    /// 写入的总行数
    pub total_rows: u64,

    /// 写入的总事件数
    pub total_events: u64,

    /// 空保存次数 (没有采样)
    pub empty_saves: u64,

    /// 每次保存的行数统计
    pub batch_stats: RunningStats,

    /// 保存耗时统计 (毫秒)
    pub latency_stats: RunningStats,
}

impl SessionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, rows: usize, events: usize, elapsed_ms: f64) {
        self.total_saves += 1;
        if rows == 0 {
            self.empty_saves += 1;
            return;
        }

        self.total_rows += rows as u64;
        self.total_events += events as u64;
        self.batch_stats.push(rows as f64);
        self.latency_stats.push(elapsed_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_saves: self.total_saves,
            empty_saves: self.empty_saves,
            total_rows: self.total_rows,
            total_events: self.total_events,
            batch_rows: StatsSummary::from(&self.batch_stats),
            save_latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_saves: u64,
    pub empty_saves: u64,
    pub total_rows: u64,
    pub total_events: u64,
    pub batch_rows: StatsSummary,
    pub save_latency_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Save Metrics Summary ===")?;
        writeln!(
            f,
            "Saves: {} ({} empty)",
            self.total_saves, self.empty_saves
        )?;
        writeln!(f, "Rows written: {}", self.total_rows)?;
        writeln!(f, "Events written: {}", self.total_events)?;
        writeln!(f, "Rows per save: {}", self.batch_rows)?;
        writeln!(f, "Save latency (ms): {}", self.save_latency_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
