use criterion::BatchSize;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use std::iter::repeat_with;

use sdrflow::blocks::Apply;
use sdrflow::prelude::*;
use sdrflow::runtime::Mocker;

struct AddChunk;

impl Kernel for AddChunk {
    fn work(
        &mut self,
        io: &mut WorkIo,
        detail: &mut Detail,
        _meta: &mut BlockMeta,
    ) -> anyhow::Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<u8>();
        let o = outputs[0].slice::<u8>();
        let n = std::cmp::min(i.len(), o.len());
        let n = n - n % 32;

        for (i, o) in i[..n].chunks_exact(32).zip(o[..n].chunks_exact_mut(32)) {
            for x in 0..32 {
                o[x] = i[x].wrapping_add(1);
            }
        }

        let finished = inputs[0].finished() && i.len() == n;
        inputs[0].consume(n)?;
        outputs[0].produce(n)?;
        if finished {
            io.finished = true;
        }

        Ok(())
    }
}

fn add_chunk() -> Block {
    Block::new(
        BlockMetaBuilder::new("AddChunk").output_multiple(32).build(),
        IoSignature::of::<u8>(),
        IoSignature::of::<u8>(),
        AddChunk,
    )
}

fn mocker(block: Block, input: &[u8]) -> Mocker {
    let mut mocker = Mocker::new(block);
    mocker.input(0, input.to_vec());
    mocker.init_output::<u8>(0, input.len());
    mocker
}

pub fn apply(c: &mut Criterion) {
    let n_samp = 1024 * 1024;
    let input: Vec<u8> = repeat_with(rand::random::<u8>).take(n_samp).collect();

    let mut group = c.benchmark_group("apply");

    group.throughput(criterion::Throughput::Elements(n_samp as u64));

    group.bench_function(format!("apply-u8-plus-1-{n_samp}"), |b| {
        b.iter_batched(
            || mocker(Apply::new(|x: &u8| x.wrapping_add(1)), &input),
            |mut m| m.run(),
            BatchSize::LargeInput,
        );
    });

    group.bench_function(format!("chunks-u8-plus-1-{n_samp}"), |b| {
        b.iter_batched(
            || mocker(add_chunk(), &input),
            |mut m| m.run(),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, apply);
criterion_main!(benches);
