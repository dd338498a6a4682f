use anyhow::Result;
use proptest::prelude::*;
use sdrflow::blocks::KeepOneInN;
use sdrflow::blocks::MovingAverage;
use sdrflow::blocks::NullSink;
use sdrflow::blocks::NullSource;
use sdrflow::prelude::*;
use sdrflow::runtime::Endpoint;
use sdrflow::runtime::buffer::Buffer;
use sdrflow::runtime::buffer::allocator::buffer_items;
use sdrflow::runtime::buffer::allocator::output_buffer_items;

#[derive(Debug, Clone)]
enum Op {
    Write(usize),
    Consume(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..200).prop_map(Op::Write),
        (0usize..3, 0usize..200).prop_map(|(r, n)| Op::Consume(r, n)),
    ]
}

proptest! {
    #[test]
    fn readers_never_lap_writer(
        capacity in 1usize..128,
        histories in prop::collection::vec(0usize..8, 3),
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let mut buffer = Buffer::new(capacity, 4);
        for h in histories.iter() {
            buffer.add_reader((*h).min(capacity - 1));
        }
        let (mut writer, mut readers) = buffer.split();
        let mut next = 0u32;
        let mut expected: Vec<std::collections::VecDeque<u32>> = histories
            .iter()
            .map(|h| std::iter::repeat_n(0, (*h).min(capacity - 1)).collect())
            .collect();

        for op in ops {
            match op {
                Op::Write(n) => {
                    let n = n.min(writer.space_available());
                    let s = writer.slice::<u32>();
                    for v in s[..n].iter_mut() {
                        next += 1;
                        *v = next;
                    }
                    writer.produce(n).expect("within space");
                    for q in expected.iter_mut() {
                        q.extend(next - n as u32 + 1..=next);
                    }
                }
                Op::Consume(r, n) => {
                    let reader = &mut readers[r];
                    let n = n.min(reader.items_available());
                    let s = reader.slice::<u32>();
                    for v in s[..n].iter() {
                        prop_assert_eq!(Some(*v), expected[r].pop_front());
                    }
                    reader.consume(n).expect("within available");
                }
            }

            for (r, reader) in readers.iter().enumerate() {
                prop_assert!(reader.items_available() <= capacity);
                prop_assert_eq!(reader.items_available(), expected[r].len());
            }
        }
    }
}

fn meta(history: usize, decimation: u64, output_multiple: usize) -> BlockMeta {
    BlockMetaBuilder::new("Test")
        .history(history)
        .rate(1, decimation)
        .output_multiple(output_multiple)
        .build()
}

#[test]
fn sizing_single_consumer() {
    for om in [1, 3, 64, 5000] {
        let producer = meta(1, 1, om);
        let consumer = meta(1, 1, 1);
        let n = buffer_items(4, 0, &producer, &[&consumer]);
        assert!(n >= 2 * om, "{n} < 2 * {om}");
    }
}

#[test]
fn sizing_decimating_consumer() {
    for (d, om, h) in [(1, 1, 1), (2, 1, 1), (10, 7, 3), (100, 16, 64)] {
        let producer = meta(1, 1, 1);
        let consumer = meta(h, d, om);
        let n = buffer_items(4, 0, &producer, &[&consumer]);
        let bound = 2 * (d as usize * om + h);
        assert!(n >= bound, "d={d} om={om} h={h}: {n} < {bound}");
    }
}

#[test]
fn sizing_respects_min_bytes() {
    let producer = meta(1, 1, 1);
    let consumer = meta(1, 1, 1);
    assert_eq!(buffer_items(8, 32768, &producer, &[&consumer]), 4096);
}

#[test]
fn sizing_in_flowgraph() -> Result<()> {
    let mut fg = Flowgraph::new();
    let src = fg.add_block(NullSource::<f32>::new());
    let keep = fg.add_block(KeepOneInN::<f32>::new(2));
    let avg = fg.add_block(MovingAverage::new(1000));
    let snk = fg.add_block(NullSink::<f32>::new());

    connect!(fg, src > keep > avg > snk);
    fg.validate()?;

    let n = output_buffer_items(fg.topology(), Endpoint::new(src, 0), 0)?;
    assert!(n >= 2 * (2 + 1));
    let n = output_buffer_items(fg.topology(), Endpoint::new(keep, 0), 0)?;
    assert!(n >= 2 * (1 + 1000));

    Ok(())
}
