//! Metrics and observability utilities

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all Corpora metrics
pub const METRICS_PREFIX: &str = "corpora";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of search queries"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search query latency in seconds"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of results returned from search"
    );

    describe_counter!(
        format!("{}_resources_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total resources ingested"
    );

    describe_counter!(
        format!("{}_chunks_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks created"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Resource ingestion latency in seconds"
    );

    describe_counter!(
        format!("{}_jobs_processed_total", METRICS_PREFIX),
        Unit::Count,
        "Total jobs processed, labeled by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Record a completed search
pub fn record_search(duration_secs: f64, mode: &str, result_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .set(result_count as f64);
}

/// Record a completed ingestion
pub fn record_ingestion(duration_secs: f64, chunks_created: usize) {
    counter!(format!("{}_resources_ingested_total", METRICS_PREFIX)).increment(1);
    counter!(format!("{}_chunks_created_total", METRICS_PREFIX))
        .increment(chunks_created as u64);
    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record a job outcome ("completed", "failed", "dropped")
pub fn record_job(task_type: &str, outcome: &str) {
    counter!(
        format!("{}_jobs_processed_total", METRICS_PREFIX),
        "task_type" => task_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
