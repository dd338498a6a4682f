use slab::Slab;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::runtime::Block;
use crate::runtime::BlockId;
use crate::runtime::Edge;
use crate::runtime::Endpoint;
use crate::runtime::Error;
use crate::runtime::IoSignature;
use crate::runtime::PortDirection;
use crate::runtime::Result;
use crate::runtime::TopologyViolation;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// The graph that backs a [`Flowgraph`](crate::runtime::Flowgraph).
///
/// Blocks live in an arena indexed by [`BlockId`]; edges refer to blocks only
/// by id. While a flowgraph runs, the arena slots are empty.
#[derive(Debug)]
pub struct Topology {
    pub(crate) blocks: Slab<Option<Block>>,
    edges: Vec<Edge>,
    next_unique_id: u64,
}

impl Topology {
    /// Constructs a blank [`Topology`]
    pub fn new() -> Self {
        Topology {
            blocks: Slab::new(),
            edges: Vec::new(),
            next_unique_id: 0,
        }
    }

    /// Get id of a block by its instance name.
    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        for (i, b) in self.blocks.iter() {
            if b.as_ref().and_then(|b| b.instance_name()) == Some(name) {
                return Some(BlockId(i));
            }
        }
        None
    }

    /// Get instance name of a block.
    pub fn block_name(&self, id: BlockId) -> Option<&str> {
        self.block_ref(id).and_then(|b| b.instance_name())
    }

    pub(crate) fn block_label(&self, id: BlockId) -> String {
        match self.block_name(id) {
            Some(name) => format!("{name} ({})", id.0),
            None => id.to_string(),
        }
    }

    /// Adds a [`Block`], returning its id.
    ///
    /// Blocks without instance name are named `<TypeName>_<n>`. Names are made
    /// unique by appending a counter.
    pub fn add_block(&mut self, mut block: Block) -> BlockId {
        let (mut i, base_name, mut block_name) = if let Some(name) = block.instance_name() {
            (-1, name.to_string(), name.to_string())
        } else {
            (
                0,
                block.type_name().to_string(),
                format!("{}_{}", block.type_name(), 0),
            )
        };

        // find a unique name
        while self.block_id(&block_name).is_some() {
            i += 1;
            block_name = format!("{base_name}_{i}");
        }

        block.set_instance_name(&block_name);
        block.meta_mut().set_unique_id(self.next_unique_id);
        self.next_unique_id += 1;
        BlockId(self.blocks.insert(Some(block)))
    }

    /// Removes a [`Block`] and all edges connected to it.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.try_remove(id.0)??;
        self.edges.retain(|e| e.src.block != id && e.dst.block != id);
        Some(block)
    }

    /// Get reference to a block.
    pub fn block_ref(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0).and_then(|v| v.as_ref())
    }

    /// Get mutable reference to a block.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0).and_then(|v| v.as_mut())
    }

    /// Ids of all blocks in insertion order.
    pub fn block_ids(&self) -> Vec<BlockId> {
        let mut ids: Vec<BlockId> = self.blocks.iter().map(|(i, _)| BlockId(i)).collect();
        ids.sort_by_key(|id| self.unique_id(*id));
        ids
    }

    fn unique_id(&self, id: BlockId) -> u64 {
        self.block_ref(id)
            .map(|b| b.meta().unique_id())
            .unwrap_or(u64::MAX)
    }

    /// All edges
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Move a block out of its slot for a run. The id stays reserved.
    pub(crate) fn take_block(&mut self, id: BlockId) -> Option<Block> {
        self.blocks.get_mut(id.0).and_then(Option::take)
    }

    pub(crate) fn restore_block(&mut self, id: BlockId, block: Block) {
        if let Some(slot) = self.blocks.get_mut(id.0) {
            *slot = Some(block);
        }
    }

    /// Drop slots of blocks that were not handed back after a run.
    pub(crate) fn purge_missing(&mut self) -> Vec<BlockId> {
        let missing: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|(_, b)| b.is_none())
            .map(|(i, _)| BlockId(i))
            .collect();
        for id in missing.iter() {
            self.blocks.remove(id.0);
            self.edges.retain(|e| e.src.block != *id && e.dst.block != *id);
        }
        missing
    }

    fn check_port(&self, e: Endpoint, direction: PortDirection) -> Result<&Block> {
        let block = self.block_ref(e.block).ok_or(Error::InvalidEndpoint(e))?;
        let sig = match direction {
            PortDirection::Input => block.input_signature(),
            PortDirection::Output => block.output_signature(),
        };
        if !sig.contains(e.port) {
            return Err(Error::PortOutOfRange {
                block: self.block_label(e.block),
                direction,
                port: e.port,
                max: sig.max_streams().unwrap_or(usize::MAX),
            });
        }
        Ok(block)
    }

    fn check_edge(&self, edge: &Edge, pending: &[Edge]) -> Result<()> {
        let src = self.check_port(edge.src, PortDirection::Output)?;
        let dst = self.check_port(edge.dst, PortDirection::Input)?;

        if self
            .edges
            .iter()
            .chain(pending.iter())
            .any(|e| e.dst == edge.dst)
        {
            return Err(Error::DestinationInUse {
                block: self.block_label(edge.dst.block),
                port: edge.dst.port,
            });
        }

        let src_size = src.output_signature().item_size(edge.src.port);
        let dst_size = dst.input_signature().item_size(edge.dst.port);
        if src_size != dst_size {
            return Err(Error::TypeMismatch {
                src: format!("{} output {}", self.block_label(edge.src.block), edge.src.port),
                src_size,
                dst: format!("{} input {}", self.block_label(edge.dst.block), edge.dst.port),
                dst_size,
            });
        }
        Ok(())
    }

    /// Connect consecutive pairs of `endpoints`.
    ///
    /// `[a, b, c]` adds the edges `a -> b` and `b -> c`. Either all edges are
    /// added or, on error, none.
    pub fn connect(&mut self, endpoints: &[Endpoint]) -> Result<()> {
        if endpoints.len() < 2 {
            return Err(Error::RuntimeError(
                "connect requires at least two endpoints".to_string(),
            ));
        }

        let mut pending: Vec<Edge> = Vec::new();
        for w in endpoints.windows(2) {
            let edge = Edge::new(w[0], w[1]);
            self.check_edge(&edge, &pending)?;
            pending.push(edge);
        }

        for e in pending {
            debug!("connect {}", e);
            self.edges.push(e);
        }
        Ok(())
    }

    /// Remove the edge `src -> dst`.
    pub fn disconnect(&mut self, src: Endpoint, dst: Endpoint) -> Result<()> {
        let edge = Edge::new(src, dst);
        match self.edges.iter().position(|e| *e == edge) {
            Some(i) => {
                self.edges.remove(i);
                debug!("disconnect {}", edge);
                Ok(())
            }
            None => Err(Error::EdgeNotFound(edge)),
        }
    }

    /// Remove all edges.
    pub fn disconnect_all(&mut self) {
        self.edges.clear();
    }

    /// Distinct input ports of `block` with an edge, sorted.
    pub fn used_input_ports(&self, block: BlockId) -> Vec<usize> {
        let mut ports: Vec<usize> = self
            .edges
            .iter()
            .filter(|e| e.dst.block == block)
            .map(|e| e.dst.port)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Distinct output ports of `block` with an edge, sorted.
    pub fn used_output_ports(&self, block: BlockId) -> Vec<usize> {
        let mut ports: Vec<usize> = self
            .edges
            .iter()
            .filter(|e| e.src.block == block)
            .map(|e| e.src.port)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Input endpoints fed by output `src`, ordered by block insertion.
    pub fn downstream_blocks_port(&self, src: Endpoint) -> Vec<Endpoint> {
        let mut v: Vec<Endpoint> = self
            .edges
            .iter()
            .filter(|e| e.src == src)
            .map(|e| e.dst)
            .collect();
        v.sort_by_key(|e| (self.unique_id(e.block), e.port));
        v
    }

    /// Distinct blocks fed by `block`.
    pub fn downstream_blocks(&self, block: BlockId) -> Vec<BlockId> {
        let mut v: Vec<BlockId> = self
            .edges
            .iter()
            .filter(|e| e.src.block == block)
            .map(|e| e.dst.block)
            .collect();
        v.sort_by_key(|b| self.unique_id(*b));
        v.dedup();
        v
    }

    /// Distinct blocks feeding `block`.
    pub fn upstream_blocks(&self, block: BlockId) -> Vec<BlockId> {
        let mut v: Vec<BlockId> = self
            .edges
            .iter()
            .filter(|e| e.dst.block == block)
            .map(|e| e.src.block)
            .collect();
        v.sort_by_key(|b| self.unique_id(*b));
        v.dedup();
        v
    }

    fn check_contiguity(
        &self,
        block: BlockId,
        sig: &IoSignature,
        used: &[usize],
        direction: PortDirection,
    ) -> Result<()> {
        let nports = used.len();
        let violation = if nports == 0 && sig.min_streams() == 0 {
            None
        } else if nports < sig.min_streams() {
            Some(TopologyViolation::TooFewStreams {
                direction,
                min: sig.min_streams(),
                connected: nports,
            })
        } else if sig.max_streams().is_some_and(|max| nports > max) {
            Some(TopologyViolation::TooManyStreams {
                direction,
                max: sig.max_streams().unwrap_or(usize::MAX),
                connected: nports,
            })
        } else {
            used.iter()
                .enumerate()
                .find(|(i, p)| *i != **p)
                .map(|(i, _)| TopologyViolation::MissingPort { direction, port: i })
        };

        match violation {
            Some(violation) => Err(Error::TopologyError {
                block: self.block_label(block),
                violation,
            }),
            None => Ok(()),
        }
    }

    /// Check port usage of every block.
    ///
    /// Used ports have to be contiguous from 0 and their number within the
    /// bounds of the signature. The kernel's `check_topology` has the final
    /// word.
    pub fn validate(&self) -> Result<()> {
        for id in self.block_ids() {
            let block = self.block_ref(id).ok_or(Error::InvalidBlock(id))?;
            let inputs = self.used_input_ports(id);
            let outputs = self.used_output_ports(id);

            self.check_contiguity(id, block.input_signature(), &inputs, PortDirection::Input)?;
            self.check_contiguity(
                id,
                block.output_signature(),
                &outputs,
                PortDirection::Output,
            )?;

            if !block.check_topology(inputs.len(), outputs.len()) {
                return Err(Error::TopologyError {
                    block: self.block_label(id),
                    violation: TopologyViolation::Rejected {
                        ninputs: inputs.len(),
                        noutputs: outputs.len(),
                    },
                });
            }
        }
        Ok(())
    }

    /// Order `vertices` so that every edge between them points forward.
    ///
    /// Depth-first search starting from sources, ties broken by insertion
    /// order, so the result is reproducible.
    pub fn topological_sort(&self, vertices: &[BlockId]) -> Result<Vec<BlockId>> {
        let set: HashSet<BlockId> = vertices.iter().copied().collect();
        let is_source = |v: BlockId| {
            !self
                .edges
                .iter()
                .any(|e| e.dst.block == v && set.contains(&e.src.block))
        };

        let mut roots: Vec<BlockId> = set.iter().copied().collect();
        roots.sort_by_key(|v| (!is_source(*v), self.unique_id(*v), v.0));

        let succ: HashMap<BlockId, Vec<BlockId>> = roots
            .iter()
            .map(|v| {
                let next = self
                    .downstream_blocks(*v)
                    .into_iter()
                    .filter(|d| set.contains(d))
                    .collect();
                (*v, next)
            })
            .collect();

        let mut color: HashMap<BlockId, Color> = roots.iter().map(|v| (*v, Color::White)).collect();
        let mut order = Vec::with_capacity(roots.len());

        for root in roots.iter() {
            if color[root] != Color::White {
                continue;
            }
            color.insert(*root, Color::Gray);
            let mut stack = vec![(*root, 0usize)];

            while let Some((v, next)) = stack.last_mut() {
                let v = *v;
                match succ[&v].get(*next) {
                    Some(&w) => {
                        *next += 1;
                        let c = color[&w];
                        match c {
                            Color::White => {
                                color.insert(w, Color::Gray);
                                stack.push((w, 0));
                            }
                            Color::Gray => {
                                return Err(Error::CyclicGraph {
                                    block: self.block_label(w),
                                });
                            }
                            Color::Black => {}
                        }
                    }
                    None => {
                        color.insert(v, Color::Black);
                        order.push(v);
                        stack.pop();
                    }
                }
            }
        }

        order.reverse();
        Ok(order)
    }

    /// Split `vertices` into weakly connected components.
    ///
    /// Every component is topologically sorted. Components are ordered by
    /// their first inserted block.
    pub fn partition_graph(&self, vertices: &[BlockId]) -> Result<Vec<Vec<BlockId>>> {
        let set: HashSet<BlockId> = vertices.iter().copied().collect();
        let mut sorted: Vec<BlockId> = set.iter().copied().collect();
        sorted.sort_by_key(|v| (self.unique_id(*v), v.0));

        let mut seen: HashSet<BlockId> = HashSet::new();
        let mut components = Vec::new();

        for v in sorted {
            if !seen.insert(v) {
                continue;
            }
            let mut component = vec![v];
            let mut queue = VecDeque::from([v]);
            while let Some(u) = queue.pop_front() {
                for w in self
                    .downstream_blocks(u)
                    .into_iter()
                    .chain(self.upstream_blocks(u))
                {
                    if set.contains(&w) && seen.insert(w) {
                        component.push(w);
                        queue.push_back(w);
                    }
                }
            }
            components.push(self.topological_sort(&component)?);
        }

        Ok(components)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::new()
    }
}
