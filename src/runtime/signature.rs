/// Stream port signature of one side (inputs or outputs) of a block.
///
/// Describes how many streams may be connected and the size in bytes of one
/// item on each stream. If fewer item sizes than streams are given, the last
/// size applies to all remaining ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSignature {
    min_streams: usize,
    max_streams: Option<usize>,
    item_sizes: Vec<usize>,
}

impl IoSignature {
    /// Signature with a single item size for all ports.
    ///
    /// `max_streams` of `None` means unbounded.
    pub fn new(min_streams: usize, max_streams: Option<usize>, item_size: usize) -> Self {
        Self::with_sizes(min_streams, max_streams, vec![item_size])
    }

    /// Signature with per-port item sizes.
    pub fn with_sizes(min_streams: usize, max_streams: Option<usize>, item_sizes: Vec<usize>) -> Self {
        if let Some(max) = max_streams {
            assert!(
                min_streams <= max,
                "io signature: min_streams ({min_streams}) > max_streams ({max})"
            );
        }
        assert!(
            !item_sizes.is_empty() || max_streams == Some(0),
            "io signature: no item size given"
        );
        assert!(
            item_sizes.iter().all(|s| *s > 0),
            "io signature: item sizes have to be positive"
        );
        IoSignature {
            min_streams,
            max_streams,
            item_sizes,
        }
    }

    /// Signature without any streams.
    pub fn empty() -> Self {
        IoSignature {
            min_streams: 0,
            max_streams: Some(0),
            item_sizes: Vec::new(),
        }
    }

    /// Exactly one stream of items of type `T`.
    pub fn of<T>() -> Self {
        Self::new(1, Some(1), std::mem::size_of::<T>())
    }

    /// Exactly `n` streams of items of type `T`.
    pub fn fixed<T>(n: usize) -> Self {
        if n == 0 {
            return Self::empty();
        }
        Self::new(n, Some(n), std::mem::size_of::<T>())
    }

    /// Minimum number of connected streams.
    pub fn min_streams(&self) -> usize {
        self.min_streams
    }

    /// Maximum number of connected streams (`None`: unbounded).
    pub fn max_streams(&self) -> Option<usize> {
        self.max_streams
    }

    /// Check if `port` is a valid port index for this signature.
    pub fn contains(&self, port: usize) -> bool {
        self.max_streams.is_none_or(|max| port < max)
    }

    /// Size in bytes of one item on stream `port`.
    pub fn item_size(&self, port: usize) -> usize {
        match self.item_sizes.get(port) {
            Some(s) => *s,
            None => self.item_sizes.last().copied().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_size_repeats() {
        let s = IoSignature::with_sizes(1, None, vec![4, 8]);
        assert_eq!(s.item_size(0), 4);
        assert_eq!(s.item_size(1), 8);
        assert_eq!(s.item_size(7), 8);
        assert!(s.contains(1000));
    }

    #[test]
    fn bounded() {
        let s = IoSignature::new(1, Some(2), 4);
        assert!(s.contains(1));
        assert!(!s.contains(2));
        assert_eq!(IoSignature::empty().max_streams(), Some(0));
        assert!(!IoSignature::empty().contains(0));
    }

    #[test]
    #[should_panic]
    fn min_larger_than_max() {
        let _ = IoSignature::new(3, Some(2), 4);
    }
}
