//! Benchmarks for per-frame session processing

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use formcoach_core::SessionId;
use formcoach_runtime::{SessionConfig, SquatSession};
use formcoach_test::{run_scenario, AngleScript, SquatTraceBuilder};

fn bench_process_frame(c: &mut Criterion) {
    let trace = SquatTraceBuilder::new().jitter(1.0, 3).reps(10, 85.0, 2.0).build();
    let config = SessionConfig::default();

    c.bench_function("session_process_frame", |b| {
        let mut session = SquatSession::new(SessionId::new(1), &config).unwrap();
        let mut i = 0;
        b.iter(|| {
            let frame = &trace[i % trace.len()];
            i += 1;
            black_box(session.process_frame(&frame.frame, frame.at()))
        })
    });
}

fn bench_process_angles(c: &mut Criterion) {
    let script = AngleScript::new(30).clean_rep(15);
    let steps: Vec<_> = script.iter().collect();
    let config = SessionConfig::default();

    c.bench_function("session_process_angles", |b| {
        let mut session = SquatSession::new(SessionId::new(2), &config).unwrap();
        let mut i = 0;
        b.iter(|| {
            let (at, angles) = steps[i % steps.len()];
            i += 1;
            black_box(session.process_angles(angles, at))
        })
    });
}

fn bench_full_session(c: &mut Criterion) {
    let trace = SquatTraceBuilder::new().stand(1.0).reps(10, 85.0, 2.0).build();
    let config = SessionConfig::default();

    c.bench_function("session_10_reps", |b| {
        b.iter_batched(
            || SquatSession::new(SessionId::new(3), &config).unwrap(),
            |mut session| {
                run_scenario(&mut session, &trace);
                session.finish()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_process_frame,
    bench_process_angles,
    bench_full_session
);
criterion_main!(benches);
