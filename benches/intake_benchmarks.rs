//! Criterion benchmarks for rust_log_intake

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_log_intake::element;
use rust_log_intake::prelude::*;
use rust_log_intake::processing::{process_log_request, IntakeState};
use std::sync::Arc;

fn sample_config() -> Element {
    element!("logging", { "serverSideMessageFormat" => "%requestId | %logger | %level | %message" }, [
        element!("ajaxAppender", {
            "name" => "appender1",
            "level" => "WARN",
            "storeInBufferLevel" => "TRACE",
            "sendWithBufferLevel" => "FATAL",
        }),
        element!("consoleAppender", { "name" => "console" }),
        element!("logger", { "appenders" => "appender1;console" }),
        element!("logger", { "name" => "checkout", "level" => "INFO", "disallow" => "password" }, [
            element!("onceOnly", { "regex" => "timeout after \\d+ms" }),
        ]),
        element!("logger", { "name" => "checkout.payment", "userAgentRegex" => "Chrome|Firefox" }),
    ])
}

fn batch_body(entries: usize) -> String {
    let entries: Vec<String> = (0..entries)
        .map(|i| {
            format!(
                r#"{{"l":{},"m":"event {}","n":"checkout.payment","t":1714564800000}}"#,
                1000 * (1 + i % 6),
                i
            )
        })
        .collect();
    format!(r#"{{"r":"req-1","lg":[{}]}}"#, entries.join(","))
}

// ============================================================================
// Configuration Benchmarks
// ============================================================================

fn bench_configuration(c: &mut Criterion) {
    let mut group = c.benchmark_group("configuration");
    let config = sample_config();
    let parser = ConfigParser::new();
    let env = ParseEnvironment::new().with_request_id("req-1");

    group.bench_function("parse", |b| {
        b.iter(|| black_box(parser.parse(black_box(&config), &env).unwrap()));
    });

    let parsed = parser.parse(&config, &env).unwrap();
    group.bench_function("render_js", |b| {
        b.iter(|| black_box(parsed.script.render_js(true)));
    });

    group.bench_function("build_state", |b| {
        b.iter(|| black_box(IntakeState::new(parsed.configuration.clone())));
    });

    group.finish();
}

// ============================================================================
// Request Processing Benchmarks
// ============================================================================

fn bench_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("processing");
    let configuration = ConfigParser::new().parse_configuration(&sample_config()).unwrap();
    let request = LogRequest::new().with_user_agent("Mozilla/5.0 Chrome/120");
    let metrics = IntakeMetrics::new();

    for size in [1usize, 10, 100] {
        let body = batch_body(size);
        let state = IntakeState::new(configuration.clone());
        let sink = MemorySink::new();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("batch_{}", size), |b| {
            b.iter(|| {
                let response = process_log_request(
                    black_box(&body),
                    &request,
                    chrono::Utc::now(),
                    &state,
                    &sink,
                    &metrics,
                );
                sink.drain();
                black_box(response)
            });
        });
    }

    group.throughput(Throughput::Elements(1));
    group.bench_function("parse_batch_100", |b| {
        let body = batch_body(100);
        b.iter(|| black_box(LogBatch::parse(black_box(&body)).unwrap()));
    });

    group.finish();
}

fn bench_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor");
    group.throughput(Throughput::Elements(10));
    let sink = Arc::new(MemorySink::new());
    let processor = RequestProcessor::builder()
        .sink(Arc::clone(&sink))
        .active_configuration(Arc::new(ActiveConfiguration::load(&sample_config()).unwrap()))
        .build();
    let body = batch_body(10);

    group.bench_function("process_with_snapshot", |b| {
        b.iter(|| {
            let response = processor.process(black_box(&body), &LogRequest::new());
            sink.drain();
            black_box(response)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_configuration,
    bench_processing,
    bench_processor
);
criterion_main!(benches);
