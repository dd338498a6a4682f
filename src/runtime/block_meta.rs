use num_integer::Integer;
use std::fmt;

const MAX_TERM: u64 = 1 << 32;

/// Output items per input item, kept as an exact fraction.
///
/// Budgets are computed in integer arithmetic so that rates like `1/3` do not
/// lose items to floating-point rounding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RelativeRate {
    interpolation: u64,
    decimation: u64,
}

impl RelativeRate {
    /// Create rate `interpolation / decimation`, reduced to lowest terms.
    pub fn new(interpolation: u64, decimation: u64) -> Self {
        assert!(
            interpolation > 0 && decimation > 0,
            "relative rate has to be positive ({interpolation}/{decimation})"
        );
        let g = interpolation.gcd(&decimation);
        RelativeRate {
            interpolation: interpolation / g,
            decimation: decimation / g,
        }
    }

    /// Approximate a float rate with a fraction (continued fraction expansion).
    pub fn from_f64(rate: f64) -> Self {
        assert!(
            rate.is_finite() && rate > 0.0,
            "relative rate has to be positive and finite ({rate})"
        );

        let (mut h0, mut h1) = (0u64, 1u64);
        let (mut k0, mut k1) = (1u64, 0u64);
        let mut x = rate;

        loop {
            let a = x.floor();
            if a >= MAX_TERM as f64 {
                break;
            }
            let a = a as u64;
            let h2 = a.checked_mul(h1).and_then(|v| v.checked_add(h0));
            let k2 = a.checked_mul(k1).and_then(|v| v.checked_add(k0));
            match (h2, k2) {
                (Some(h2), Some(k2)) if h2 <= MAX_TERM && k2 <= MAX_TERM => {
                    h0 = h1;
                    h1 = h2;
                    k0 = k1;
                    k1 = k2;
                }
                _ => break,
            }

            let frac = x - a as f64;
            if frac < 1e-12 || (h1 as f64 / k1 as f64 - rate).abs() <= rate * 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }

        if k1 == 0 {
            // larger than any representable term
            return Self::new(MAX_TERM, 1);
        }
        if h1 == 0 {
            return Self::new(1, MAX_TERM);
        }
        Self::new(h1, k1)
    }

    /// Numerator
    pub fn interpolation(&self) -> u64 {
        self.interpolation
    }

    /// Denominator
    pub fn decimation(&self) -> u64 {
        self.decimation
    }

    /// Rate as float.
    pub fn as_f64(&self) -> f64 {
        self.interpolation as f64 / self.decimation as f64
    }

    /// Integer decimation factor `round(1 / rate)` for rates below one, else 1.
    pub fn decimation_factor(&self) -> usize {
        if self.interpolation >= self.decimation {
            1
        } else {
            ((self.decimation + self.interpolation / 2) / self.interpolation) as usize
        }
    }

    /// Output items that `n` input items allow (rounded down).
    pub fn output_for_input(&self, n: usize) -> usize {
        let v = n as u128 * self.interpolation as u128 / self.decimation as u128;
        usize::try_from(v).unwrap_or(usize::MAX)
    }

    /// Input items required for `n` output items (rounded up).
    pub fn input_for_output(&self, n: usize) -> usize {
        let v = (n as u128 * self.decimation as u128).div_ceil(self.interpolation as u128);
        usize::try_from(v).unwrap_or(usize::MAX)
    }
}

impl Default for RelativeRate {
    fn default() -> Self {
        RelativeRate {
            interpolation: 1,
            decimation: 1,
        }
    }
}

impl fmt::Display for RelativeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.interpolation, self.decimation)
    }
}

/// Block metadata
///
/// Everything the scheduler needs to know about a block besides its port
/// signatures.
#[derive(Debug, Clone)]
pub struct BlockMeta {
    type_name: String,
    instance_name: Option<String>,
    unique_id: u64,
    history: usize,
    relative_rate: RelativeRate,
    output_multiple: usize,
    min_output_buffer: Option<usize>,
    max_noutput_items: Option<usize>,
}

impl BlockMeta {
    fn new(type_name: String) -> BlockMeta {
        BlockMeta {
            type_name,
            instance_name: None,
            unique_id: 0,
            history: 1,
            relative_rate: RelativeRate::default(),
            output_multiple: 1,
            min_output_buffer: None,
            max_noutput_items: None,
        }
    }

    /// Type name of the block, e.g., `Head`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name of this instance, unique within a flowgraph.
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// Set instance name.
    pub fn set_instance_name(&mut self, name: &str) {
        self.instance_name = Some(name.to_string());
    }

    /// Id assigned in insertion order when the block is added to a flowgraph.
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    pub(crate) fn set_unique_id(&mut self, id: u64) {
        self.unique_id = id;
    }

    /// Number of items the block needs to see, including the current one.
    ///
    /// A history of 1 means no overlap.
    pub fn history(&self) -> usize {
        self.history
    }

    /// Set history. Takes effect on the next start.
    pub fn set_history(&mut self, history: usize) {
        assert!(history >= 1, "history has to be at least 1");
        self.history = history;
    }

    /// Output items per input item.
    pub fn relative_rate(&self) -> f64 {
        self.relative_rate.as_f64()
    }

    /// Output items per input item as fraction.
    pub fn rate(&self) -> RelativeRate {
        self.relative_rate
    }

    /// Set relative rate from float.
    pub fn set_relative_rate(&mut self, rate: f64) {
        self.relative_rate = RelativeRate::from_f64(rate);
    }

    /// Set relative rate as fraction.
    pub fn set_rate(&mut self, rate: RelativeRate) {
        self.relative_rate = rate;
    }

    /// Granularity of produced items.
    pub fn output_multiple(&self) -> usize {
        self.output_multiple
    }

    /// Set output multiple.
    pub fn set_output_multiple(&mut self, multiple: usize) {
        assert!(multiple >= 1, "output multiple has to be at least 1");
        self.output_multiple = multiple;
    }

    /// Lower bound on the size of the block's output buffers in items.
    pub fn min_output_buffer(&self) -> Option<usize> {
        self.min_output_buffer
    }

    /// Set lower bound for output buffers.
    pub fn set_min_output_buffer(&mut self, items: usize) {
        self.min_output_buffer = Some(items);
    }

    /// Cap on items produced in one `work()` call.
    pub fn max_noutput_items(&self) -> Option<usize> {
        self.max_noutput_items
    }

    /// Set cap on items produced in one `work()` call.
    pub fn set_max_noutput_items(&mut self, n: usize) {
        assert!(n >= 1, "max_noutput_items has to be at least 1");
        self.max_noutput_items = Some(n);
    }
}

/// Builder for [`BlockMeta`].
pub struct BlockMetaBuilder {
    meta: BlockMeta,
}

impl BlockMetaBuilder {
    /// Create builder
    pub fn new(type_name: &str) -> BlockMetaBuilder {
        BlockMetaBuilder {
            meta: BlockMeta::new(type_name.to_string()),
        }
    }

    /// Instance name
    #[must_use]
    pub fn instance_name(mut self, name: &str) -> BlockMetaBuilder {
        self.meta.set_instance_name(name);
        self
    }

    /// History
    #[must_use]
    pub fn history(mut self, history: usize) -> BlockMetaBuilder {
        self.meta.set_history(history);
        self
    }

    /// Relative rate as float
    #[must_use]
    pub fn relative_rate(mut self, rate: f64) -> BlockMetaBuilder {
        self.meta.set_relative_rate(rate);
        self
    }

    /// Relative rate as fraction
    #[must_use]
    pub fn rate(mut self, interpolation: u64, decimation: u64) -> BlockMetaBuilder {
        self.meta.set_rate(RelativeRate::new(interpolation, decimation));
        self
    }

    /// Output multiple
    #[must_use]
    pub fn output_multiple(mut self, multiple: usize) -> BlockMetaBuilder {
        self.meta.set_output_multiple(multiple);
        self
    }

    /// Minimum output buffer size in items
    #[must_use]
    pub fn min_output_buffer(mut self, items: usize) -> BlockMetaBuilder {
        self.meta.set_min_output_buffer(items);
        self
    }

    /// Cap on items per `work()` call
    #[must_use]
    pub fn max_noutput_items(mut self, n: usize) -> BlockMetaBuilder {
        self.meta.set_max_noutput_items(n);
        self
    }

    /// Build
    pub fn build(self) -> BlockMeta {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_from_float() {
        assert_eq!(RelativeRate::from_f64(0.5), RelativeRate::new(1, 2));
        assert_eq!(RelativeRate::from_f64(1.0 / 3.0), RelativeRate::new(1, 3));
        assert_eq!(RelativeRate::from_f64(4.0), RelativeRate::new(4, 1));
        assert_eq!(RelativeRate::from_f64(0.75), RelativeRate::new(3, 4));
        assert_eq!(RelativeRate::from_f64(1.0), RelativeRate::default());
    }

    #[test]
    fn integer_budgets() {
        let r = RelativeRate::new(1, 3);
        assert_eq!(r.output_for_input(3), 1);
        assert_eq!(r.output_for_input(8), 2);
        assert_eq!(r.input_for_output(2), 6);
        assert_eq!(r.decimation_factor(), 3);

        let r = RelativeRate::new(3, 2);
        assert_eq!(r.output_for_input(5), 7);
        assert_eq!(r.input_for_output(7), 5);
        assert_eq!(r.decimation_factor(), 1);
    }

    #[test]
    fn decimation_factor_rounds() {
        assert_eq!(RelativeRate::new(2, 5).decimation_factor(), 3);
        assert_eq!(RelativeRate::new(1, 2).decimation_factor(), 2);
    }

    #[test]
    fn builder() {
        let meta = BlockMetaBuilder::new("Foo")
            .history(4)
            .relative_rate(0.25)
            .output_multiple(8)
            .build();
        assert_eq!(meta.type_name(), "Foo");
        assert_eq!(meta.history(), 4);
        assert_eq!(meta.rate(), RelativeRate::new(1, 4));
        assert!((meta.relative_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(meta.output_multiple(), 8);
        assert!(meta.instance_name().is_none());
    }
}
