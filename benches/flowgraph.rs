use anyhow::Result;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use sdrflow::blocks::Copy;
use sdrflow::blocks::Head;
use sdrflow::blocks::NullSink;
use sdrflow::blocks::NullSource;
use sdrflow::blocks::VectorSink;
use sdrflow::prelude::*;
use sdrflow::runtime::scheduler::Scheduler;
use std::hint::black_box;
use std::time::Duration;
use std::time::Instant;

fn build_fg(n_samp: u64) -> Result<Flowgraph> {
    let mut fg = Flowgraph::new();

    let src = fg.add_block(NullSource::<f32>::new());
    let head = fg.add_block(Head::<f32>::new(n_samp));
    let copy = fg.add_block(Copy::<f32>::new());
    let snk = fg.add_block(VectorSink::<f32>::new(n_samp as usize));

    connect!(fg, src > head > copy > snk);
    Ok(fg)
}

fn run_fg(n_samp: u64) -> Result<()> {
    Runtime::new(build_fg(n_samp)?).run()?;
    Ok(())
}

fn run_fg_timed(n_samp: u64, iters: u64) -> Result<Duration> {
    let mut duration = Duration::from_secs(0);
    let mut rt = Runtime::new(build_fg(n_samp)?);
    for _ in 0..iters {
        let now = Instant::now();
        rt.run()?;
        duration += now.elapsed();
    }

    Ok(duration)
}

fn run_chain<S: Scheduler>(scheduler: S, n_chains: usize, n_samp: u64) -> Result<()> {
    let mut fg = Flowgraph::new();
    for _ in 0..n_chains {
        let src = fg.add_block(NullSource::<f32>::new());
        let head = fg.add_block(Head::<f32>::new(n_samp));
        let copy = fg.add_block(Copy::<f32>::new());
        let snk = fg.add_block(NullSink::<f32>::new());
        connect!(fg, src > head > copy > snk);
    }
    Runtime::with_scheduler(fg, scheduler).run()?;
    Ok(())
}

pub fn flowgraph(c: &mut Criterion) {
    let n_samp = 123456;

    let mut group = c.benchmark_group("flowgraph");

    group.throughput(criterion::Throughput::Elements(n_samp));

    group.bench_function(format!("overall-{n_samp}"), |b| {
        b.iter(|| {
            run_fg(black_box(n_samp)).unwrap();
        });
    });

    // topology and allocation are redone per run, block construction is not
    group.bench_function(format!("run-{n_samp}"), |b| {
        b.iter_custom(|iters: u64| run_fg_timed(black_box(n_samp), black_box(iters)).unwrap());
    });

    group.finish();
}

pub fn schedulers(c: &mut Criterion) {
    let n_samp = 100_000;
    let n_chains = 4;

    let mut group = c.benchmark_group("schedulers");
    group.throughput(criterion::Throughput::Elements(n_samp * n_chains as u64));

    group.bench_function("thread", |b| {
        b.iter(|| run_chain(ThreadScheduler::new(), n_chains, black_box(n_samp)).unwrap());
    });
    group.bench_function("single-thread", |b| {
        b.iter(|| run_chain(SingleThreadScheduler::new(), n_chains, black_box(n_samp)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, flowgraph, schedulers);
criterion_main!(benches);
