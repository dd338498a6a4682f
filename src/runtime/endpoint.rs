use std::fmt;

/// Block Identifier
///
/// Index of the block in the [`Flowgraph`](crate::runtime::Flowgraph).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl From<usize> for BlockId {
    fn from(item: usize) -> Self {
        BlockId(item)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// Direction of a stream port.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// A (block, port) pair.
///
/// A bare [`BlockId`] converts to port 0 of that block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    /// Block
    pub block: BlockId,
    /// Port index
    pub port: usize,
}

impl Endpoint {
    /// Create endpoint
    pub fn new(block: impl Into<BlockId>, port: usize) -> Self {
        Endpoint {
            block: block.into(),
            port,
        }
    }
}

impl From<BlockId> for Endpoint {
    fn from(block: BlockId) -> Self {
        Endpoint { block, port: 0 }
    }
}

impl From<(BlockId, usize)> for Endpoint {
    fn from((block, port): (BlockId, usize)) -> Self {
        Endpoint { block, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block.0, self.port)
    }
}

/// Directed stream connection from an output endpoint to an input endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Output endpoint
    pub src: Endpoint,
    /// Input endpoint
    pub dst: Endpoint,
}

impl Edge {
    /// Create edge
    pub fn new(src: impl Into<Endpoint>, dst: impl Into<Endpoint>) -> Self {
        Edge {
            src: src.into(),
            dst: dst.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}
