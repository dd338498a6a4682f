use anyhow::Result;
use anyhow::bail;
use sdrflow::blocks::NullSink;
use sdrflow::blocks::NullSource;
use sdrflow::blocks::VectorSource;
use sdrflow::prelude::*;

struct FailInit;

impl Kernel for FailInit {
    fn work(
        &mut self,
        _io: &mut WorkIo,
        _detail: &mut Detail,
        _meta: &mut BlockMeta,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> anyhow::Result<()> {
        bail!("FailInit")
    }
}

/// Fails after forwarding a number of items.
struct FailWork {
    remaining: usize,
}

impl Kernel for FailWork {
    fn work(
        &mut self,
        _io: &mut WorkIo,
        detail: &mut Detail,
        _meta: &mut BlockMeta,
    ) -> anyhow::Result<()> {
        let n = detail.input(0).items_available().min(self.remaining);
        if n == 0 {
            bail!("FailWork");
        }
        self.remaining -= n;
        detail.input(0).consume(n)?;
        Ok(())
    }
}

fn fail_work_block(remaining: usize) -> Block {
    Block::new(
        BlockMetaBuilder::new("FailWork").build(),
        IoSignature::of::<f32>(),
        IoSignature::empty(),
        FailWork { remaining },
    )
}

#[test]
fn fail_init() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let snk = fg.add_block(NullSink::<f32>::new());
    connect!(fg, src > snk);
    let bad = fg.add_block(Block::new(
        BlockMetaBuilder::new("FailInit").build(),
        IoSignature::empty(),
        IoSignature::empty(),
        FailInit,
    ));

    let mut rt = Runtime::new(fg);
    let res = rt.start();
    assert!(matches!(res, Err(Error::BlockError { .. })));
    assert!(!rt.is_running());
    assert!(rt.flowgraph().block(bad).is_some());

    rt.flowgraph_mut()?.remove_block(bad);
    rt.start()?;
    rt.stop();
    rt.wait()?;

    Ok(())
}

#[test]
fn fail_work() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let snk = fg.add_block(fail_work_block(10_000));
    connect!(fg, src > snk);

    let mut rt = Runtime::new(fg);
    let res = rt.run();
    match res {
        Err(Error::BlockError { block, message }) => {
            assert!(block.starts_with("FailWork_0"), "{block}");
            assert_eq!(message, "FailWork");
        }
        r => panic!("unexpected result {r:?}"),
    }

    // blocks are back and can run again
    assert!(rt.flowgraph().block(snk).is_some());
    assert!(rt.flowgraph().block(src).is_some());

    Ok(())
}

#[test]
fn failure_does_not_stop_other_components() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src0 = fg.add_block(NullSource::<f32>::new());
    let bad = fg.add_block(fail_work_block(100));
    let src1 = fg.add_block(VectorSource::<u32>::new((0..100_000).collect()));
    let snk1 = fg.add_block(NullSink::<u32>::new());
    connect!(fg, src0 > bad; src1 > snk1);

    let mut rt = Runtime::new(fg);
    assert!(matches!(rt.run(), Err(Error::BlockError { .. })));

    let n = rt
        .flowgraph()
        .kernel::<NullSink<u32>>(snk1)
        .map(|s| s.n_received());
    assert_eq!(n, Some(100_000));

    Ok(())
}
