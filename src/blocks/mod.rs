//! ## Generic blocks
//! | Block | Usage |
//! |---|---|
//! | [Apply] | Apply a function to each sample |
//! | [Combine] | Apply a function to combine two streams into one |
//! | [Copy](struct@Copy) | Copy input samples to the output |
//!
//! ## Rate changing blocks
//! | Block | Usage |
//! |---|---|
//! | [KeepOneInN] | Decimate by keeping the first of every `n` samples |
//! | [Repeat] | Interpolate by repeating every sample `n` times |
//! | [MovingAverage] | Sliding window mean, using the block history |
//!
//! ## Limiting blocks
//! | Block | Usage |
//! |---|---|
//! | [Throttle] | Limits graph sample rate |
//! | [Head] | Stops graph after specified number of samples |
//!
//! ## Source/sink blocks
//! | Block | Usage |
//! |---|---|
//! | [NullSource] | Generates a stream of zeros |
//! | [VectorSource] | Streams the items of a vector |
//! | [NullSink] | Drops samples |
//! | [VectorSink] | Stores samples in a vector |
//!
//! ## Message controlled blocks
//! | Block | Usage |
//! |---|---|
//! | [MultiplyConst] | Multiplies with a constant set through messages |

mod apply;
pub use apply::Apply;

mod combine;
pub use combine::Combine;

mod copy;
pub use copy::Copy;

mod head;
pub use head::Head;

mod keep_one_in_n;
pub use keep_one_in_n::KeepOneInN;

mod moving_average;
pub use moving_average::MovingAverage;

mod multiply_const;
pub use multiply_const::MultiplyConst;

mod null_sink;
pub use null_sink::NullSink;

mod null_source;
pub use null_source::NullSource;

mod repeat;
pub use repeat::Repeat;

mod throttle;
pub use throttle::Throttle;

mod vector_sink;
pub use vector_sink::VectorSink;

mod vector_source;
pub use vector_source::VectorSource;
