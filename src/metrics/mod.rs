use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use lazy_static::lazy_static;
use std::sync::Once;
use std::time::Instant;

static INIT: Once = Once::new();

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref REQUEST_COUNTER: Counter = Counter::with_opts(
        Opts::new("meme_requests_total", "Total number of meme generation requests")
    ).unwrap();

    pub static ref RENDER_TIME: Histogram = Histogram::with_opts(
        HistogramOpts::new("meme_render_duration_seconds", "Time spent rendering memes")
    ).unwrap();

    pub static ref RENDER_FAILURES: Counter = Counter::with_opts(
        Opts::new("meme_render_failures_total", "Total number of failed renders")
    ).unwrap();

    pub static ref TOTAL_MEMES: Gauge = Gauge::with_opts(
        Opts::new("total_memes", "Total number of registered memes")
    ).unwrap();
}

/// 注册所有指标，可重复调用
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY.register(Box::new(REQUEST_COUNTER.clone())).unwrap();
        REGISTRY.register(Box::new(RENDER_TIME.clone())).unwrap();
        REGISTRY.register(Box::new(RENDER_FAILURES.clone())).unwrap();
        REGISTRY.register(Box::new(TOTAL_MEMES.clone())).unwrap();
    });
}

pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("编码指标失败: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub struct Timer {
    start: Instant,
    histogram: &'static Histogram,
}

impl Timer {
    pub fn new(histogram: &'static Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}
