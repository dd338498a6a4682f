use std::collections::HashMap;

use crate::runtime::BlockId;
use crate::runtime::BlockMeta;
use crate::runtime::Endpoint;
use crate::runtime::Error;
use crate::runtime::Result;
use crate::runtime::Topology;
use crate::runtime::buffer::Buffer;
use crate::runtime::buffer::BufferReader;
use crate::runtime::buffer::BufferWriter;

/// Number of items of a buffer between `producer` and `consumers`.
///
/// The buffer holds at least `min_bytes`, twice the producer's output
/// multiple, the producer's `min_output_buffer` and, for every consumer,
/// `2 * (d * output_multiple + history)` where `d` is the consumer's
/// decimation factor.
pub fn buffer_items(
    item_size: usize,
    min_bytes: usize,
    producer: &BlockMeta,
    consumers: &[&BlockMeta],
) -> usize {
    let mut nitems = (min_bytes / item_size).max(1);
    nitems = nitems.max(2 * producer.output_multiple());
    if let Some(min) = producer.min_output_buffer() {
        nitems = nitems.max(min);
    }

    for c in consumers {
        let d = c.rate().decimation_factor();
        nitems = nitems.max(2 * (d * c.output_multiple() + c.history()));
    }
    nitems
}

/// Size in items of the buffer of output `src` in `topology`.
pub fn output_buffer_items(topology: &Topology, src: Endpoint, min_bytes: usize) -> Result<usize> {
    let producer = topology
        .block_ref(src.block)
        .ok_or(Error::InvalidEndpoint(src))?;
    let consumers = topology
        .downstream_blocks_port(src)
        .iter()
        .map(|e| {
            topology
                .block_ref(e.block)
                .map(|b| b.meta())
                .ok_or(Error::InvalidEndpoint(*e))
        })
        .collect::<Result<Vec<_>>>()?;
    let item_size = producer.output_signature().item_size(src.port);
    Ok(buffer_items(
        item_size,
        min_bytes,
        producer.meta(),
        &consumers,
    ))
}

/// Buffer handles of one block, indexed by port.
#[derive(Debug, Default)]
pub(crate) struct BlockBuffers {
    pub(crate) inputs: Vec<BufferReader>,
    pub(crate) outputs: Vec<BufferWriter>,
}

/// Allocate the buffers of a validated topology.
///
/// First, one buffer is created per connected output port. Then, a reader is
/// attached to it for every edge leaving the port, offset by the consumer's
/// history.
pub(crate) fn allocate(
    topology: &Topology,
    min_bytes: usize,
) -> Result<HashMap<BlockId, BlockBuffers>> {
    let mut result: HashMap<BlockId, BlockBuffers> = HashMap::new();
    let mut readers: HashMap<Endpoint, BufferReader> = HashMap::new();

    for id in topology.block_ids() {
        let block = topology
            .block_ref(id)
            .ok_or(Error::InvalidBlock(id))?;
        let noutputs = topology.used_output_ports(id).len();
        let mut outputs = Vec::with_capacity(noutputs);

        for port in 0..noutputs {
            let src = Endpoint::new(id, port);
            let nitems = output_buffer_items(topology, src, min_bytes)?;
            let item_size = block.output_signature().item_size(port);
            let mut buffer = Buffer::new(nitems, item_size);

            let dsts = topology.downstream_blocks_port(src);
            for dst in dsts.iter() {
                let history = topology
                    .block_ref(dst.block)
                    .ok_or(Error::InvalidEndpoint(*dst))?
                    .meta()
                    .history();
                buffer.add_reader(history - 1);
            }
            debug!(
                "{}: output {} buffer of {} items ({} bytes each, {} readers)",
                topology.block_label(id),
                port,
                nitems,
                item_size,
                dsts.len()
            );

            let (writer, rs) = buffer.split();
            for (dst, reader) in dsts.into_iter().zip(rs) {
                readers.insert(dst, reader);
            }
            outputs.push(writer);
        }

        result.entry(id).or_default().outputs = outputs;
    }

    for id in topology.block_ids() {
        let ninputs = topology.used_input_ports(id).len();
        let mut inputs = Vec::with_capacity(ninputs);
        for port in 0..ninputs {
            let dst = Endpoint::new(id, port);
            let reader = readers.remove(&dst).ok_or(Error::InvalidEndpoint(dst))?;
            inputs.push(reader);
        }
        result.entry(id).or_default().inputs = inputs;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::BlockMetaBuilder;

    #[test]
    fn producer_multiple() {
        let p = BlockMetaBuilder::new("P").output_multiple(64).build();
        let c = BlockMetaBuilder::new("C").build();
        assert_eq!(buffer_items(4, 0, &p, &[&c]), 128);
        assert_eq!(buffer_items(4, 4096, &p, &[&c]), 1024);
    }

    #[test]
    fn decimating_consumer() {
        let p = BlockMetaBuilder::new("P").build();
        let c = BlockMetaBuilder::new("C")
            .rate(1, 10)
            .output_multiple(8)
            .history(5)
            .build();
        assert_eq!(buffer_items(4, 0, &p, &[&c]), 2 * (10 * 8 + 5));
    }

    #[test]
    fn min_output_buffer() {
        let p = BlockMetaBuilder::new("P").min_output_buffer(5000).build();
        assert_eq!(buffer_items(1, 16, &p, &[]), 5000);
    }
}
