use anyhow::Result;
use sdrflow::blocks::Head;
use sdrflow::blocks::NullSink;
use sdrflow::blocks::NullSource;
use sdrflow::blocks::Repeat;
use sdrflow::blocks::Throttle;
use sdrflow::blocks::VectorSink;
use sdrflow::blocks::VectorSource;
use sdrflow::prelude::*;
use sdrflow::runtime::config::Config;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

/// Forwards items and counts `init()` and `deinit()` calls.
struct Counted {
    inits: Arc<AtomicUsize>,
    deinits: Arc<AtomicUsize>,
}

impl Kernel for Counted {
    fn work(
        &mut self,
        io: &mut WorkIo,
        detail: &mut Detail,
        _meta: &mut BlockMeta,
    ) -> anyhow::Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<u32>();
        let o = outputs[0].slice::<u32>();
        let n = i.len().min(o.len());
        o[..n].copy_from_slice(&i[..n]);
        let finished = inputs[0].finished() && n == i.len();
        inputs[0].consume(n)?;
        outputs[0].produce(n)?;
        io.finished = finished;
        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> anyhow::Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deinit(&mut self, _meta: &mut BlockMeta) -> anyhow::Result<()> {
        self.deinits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn stop_and_wait() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let throttle = fg.add_block(Throttle::<f32>::new(1000.0));
    let snk = fg.add_block(NullSink::<f32>::new());

    connect!(fg, src > throttle > snk);

    let mut rt = Runtime::new(fg);
    rt.start()?;
    assert!(rt.is_running());

    thread::sleep(Duration::from_millis(200));
    assert!(!rt.is_finished());
    rt.stop();
    rt.wait()?;
    assert!(!rt.is_running());

    let n = rt
        .flowgraph()
        .kernel::<NullSink<f32>>(snk)
        .map(|s| s.n_received())
        .unwrap_or_default();
    assert!(n > 0 && n < 1000, "received {n} items");

    Ok(())
}

#[test]
fn already_running() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<u8>::new());
    let snk = fg.add_block(NullSink::<u8>::new());
    connect!(fg, src > snk);

    let mut rt = Runtime::new(fg);
    rt.start()?;

    assert!(matches!(rt.start(), Err(Error::SchedulerAlreadyRunning)));
    assert!(matches!(rt.flowgraph_mut(), Err(Error::SchedulerAlreadyRunning)));
    assert!(rt.flowgraph().block(src).is_none());

    rt.stop();
    rt.wait()?;
    assert!(rt.flowgraph().block(src).is_some());
    assert!(rt.flowgraph_mut().is_ok());

    Ok(())
}

#[test]
fn wait_when_idle() -> Result<()> {
    let mut rt = Runtime::new(Flowgraph::new());
    rt.wait()?;
    rt.run()?;
    assert!(!rt.is_running());
    Ok(())
}

#[test]
fn restart_rebuilds_buffers() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(VectorSource::<u32>::new((0..5000).collect()));
    let snk = fg.add_block(VectorSink::<u32>::new(5000));
    connect!(fg, src > snk);

    let mut rt = Runtime::new(fg);
    for _ in 0..3 {
        rt.run()?;
        let v = rt
            .flowgraph()
            .kernel::<VectorSink<u32>>(snk)
            .expect("vector sink")
            .items();
        assert_eq!(v.len(), 5000);
        assert_eq!(v[4999], 4999);
    }

    Ok(())
}

#[test]
fn reconnect_between_runs() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<u16>::new());
    let head = fg.add_block(Head::<u16>::new(100));
    let snk0 = fg.add_block(NullSink::<u16>::new());
    let snk1 = fg.add_block(NullSink::<u16>::new());
    connect!(fg, src > head > snk0);
    let spare = fg.remove_block(snk1).expect("block");

    let mut rt = Runtime::new(fg);
    rt.run()?;

    let fg = rt.flowgraph_mut()?;
    let snk1 = fg.add_block(spare);
    connect!(fg, head > snk1);
    rt.run()?;

    let fg = rt.flowgraph();
    assert_eq!(fg.kernel::<NullSink<u16>>(snk0).map(|s| s.n_received()), Some(100));
    assert_eq!(fg.kernel::<NullSink<u16>>(snk1).map(|s| s.n_received()), Some(100));

    Ok(())
}

#[test]
fn explicit_config() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let head = fg.add_block(Head::<f32>::new(10_000));
    let snk = fg.add_block(NullSink::<f32>::new());
    connect!(fg, src > head > snk);

    let mut config = Config::default();
    config.buffer_size = 64;
    config.max_noutput_items = Some(7);
    config.backoff_max = 10;
    config.debug = true;

    let mut rt = Runtime::with_config(fg, ThreadScheduler::new(), config);
    rt.run()?;

    let stats = rt.flowgraph().block_stats(head).expect("stats");
    assert_eq!(stats.items_produced, 10_000);
    assert!(stats.work_calls >= 10_000 / 7);

    Ok(())
}

#[test]
fn drop_stops_runtime() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let snk = fg.add_block(NullSink::<f32>::new());
    connect!(fg, src > snk);

    let mut rt = Runtime::new(fg);
    rt.start()?;
    drop(rt);

    Ok(())
}

#[test]
fn into_flowgraph() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let snk = fg.add_block(NullSink::<f32>::new());
    connect!(fg, src > snk);

    let mut rt = Runtime::with_scheduler(fg, SingleThreadScheduler::new());
    rt.start()?;
    let fg = rt.into_flowgraph();
    assert!(fg.block(src).is_some());
    assert!(fg.block(snk).is_some());
    assert_eq!(fg.edges().len(), 1);

    Ok(())
}

#[test]
fn cap_below_output_multiple() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(VectorSource::<u32>::new(vec![1, 2, 3]));
    let repeat = fg.add_block(Repeat::<u32>::new(3));
    let snk = fg.add_block(VectorSink::<u32>::new(9));
    connect!(fg, src > repeat > snk);

    let mut config = Config::default();
    config.max_noutput_items = Some(2);

    let mut rt = Runtime::with_config(fg, ThreadScheduler::new(), config);
    rt.start()?;
    let deadline = Instant::now() + Duration::from_secs(10);
    while !rt.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    let finished = rt.is_finished();
    rt.stop();
    rt.wait()?;
    assert!(finished, "flowgraph did not terminate");

    let items = rt
        .flowgraph()
        .kernel::<VectorSink<u32>>(snk)
        .map(|s| s.items().clone());
    assert_eq!(items, Some(vec![1, 1, 1, 2, 2, 2, 3, 3, 3]));

    Ok(())
}

#[test]
fn failed_spawn_keeps_flowgraph() -> Result<()> {
    let inits = Arc::new(AtomicUsize::new(0));
    let deinits = Arc::new(AtomicUsize::new(0));

    let mut fg = Flowgraph::new();
    let src = fg.add_block(VectorSource::<u32>::new((0..10).collect()));
    let counted = fg.add_block(Block::new(
        BlockMetaBuilder::new("Counted").build(),
        IoSignature::of::<u32>(),
        IoSignature::of::<u32>(),
        Counted {
            inits: inits.clone(),
            deinits: deinits.clone(),
        },
    ));
    let snk = fg.add_block(VectorSink::<u32>::new(10));
    connect!(fg, src > counted > snk);
    // second component, so one worker may start before the failure
    let src1 = fg.add_block(NullSource::<u8>::new());
    let snk1 = fg.add_block(NullSink::<u8>::new());
    connect!(fg, src1 > snk1);

    let mut config = Config::default();
    config.stack_size = 1 << 62;

    let mut rt = Runtime::with_config(fg, ThreadScheduler::new(), config);
    assert!(matches!(rt.start(), Err(Error::RuntimeError(_))));
    assert!(!rt.is_running());
    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert_eq!(deinits.load(Ordering::SeqCst), 1);

    let fg = rt.into_flowgraph();
    assert_eq!(fg.edges().len(), 3);
    for id in [src, counted, snk, src1, snk1] {
        assert!(fg.block(id).is_some());
    }

    let mut fg = fg;
    fg.remove_block(src1);
    fg.remove_block(snk1);
    let mut rt = Runtime::new(fg);
    rt.run()?;
    assert_eq!(inits.load(Ordering::SeqCst), 2);
    assert_eq!(deinits.load(Ordering::SeqCst), 2);
    let items = rt
        .flowgraph()
        .kernel::<VectorSink<u32>>(snk)
        .map(|s| s.items().clone());
    assert_eq!(items, Some((0..10).collect::<Vec<u32>>()));

    Ok(())
}
