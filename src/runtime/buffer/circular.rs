use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem;
use std::ptr;
use std::slice;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::runtime::Error;
use crate::runtime::Result;

#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct CacheLine([u8; 64]);

struct ReaderState {
    read: CachePadded<AtomicU64>,
    start: u64,
    done: AtomicBool,
}

/// Circular buffer with one writer and multiple readers
///
/// The storage holds every item twice (the second half mirrors the first), so
/// both the readable and the writable region are always one contiguous slice.
/// Cursors are absolute item counters; `cursor % capacity` is the position in
/// the ring.
///
/// A buffer is set up in two phases: readers are attached with
/// [`add_reader`](Buffer::add_reader) and the buffer is then
/// [`split`](Buffer::split) into its writer and reader handles.
pub struct Buffer {
    item_size: usize,
    capacity: usize,
    data: Box<[UnsafeCell<CacheLine>]>,
    write: CachePadded<AtomicU64>,
    readers: Vec<ReaderState>,
    done: AtomicBool,
}

// SAFETY: the writer only touches the region no live reader may read and
// readers never write the storage. Cursor hand-over uses release/acquire.
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Create buffer for `nitems` items of `item_size` bytes.
    ///
    /// The storage is zero-initialized.
    pub fn new(nitems: usize, item_size: usize) -> Buffer {
        assert!(nitems > 0, "buffer needs room for at least one item");
        assert!(item_size > 0, "item size has to be positive");

        let bytes = 2 * nitems * item_size;
        let lines = bytes.div_ceil(mem::size_of::<CacheLine>());
        let data = (0..lines)
            .map(|_| UnsafeCell::new(CacheLine([0; 64])))
            .collect();

        Buffer {
            item_size,
            capacity: nitems,
            data,
            write: CachePadded::new(AtomicU64::new(nitems as u64)),
            readers: Vec::new(),
            done: AtomicBool::new(false),
        }
    }

    /// Attach a reader starting `history_minus_one` items behind the write
    /// cursor, returning the reader index.
    ///
    /// The items of the history window are zero before anything is written.
    pub fn add_reader(&mut self, history_minus_one: usize) -> usize {
        assert!(
            history_minus_one < self.capacity,
            "history ({}) does not fit into buffer of {} items",
            history_minus_one + 1,
            self.capacity
        );
        let start = *self.write.get_mut() - history_minus_one as u64;
        self.readers.push(ReaderState {
            read: CachePadded::new(AtomicU64::new(start)),
            start,
            done: AtomicBool::new(false),
        });
        self.readers.len() - 1
    }

    /// Split into the writer and the reader handles (in order of attachment).
    pub fn split(self) -> (BufferWriter, Vec<BufferReader>) {
        let n = self.readers.len();
        let buffer = Arc::new(self);
        let readers = (0..n)
            .map(|idx| BufferReader {
                buffer: buffer.clone(),
                idx,
            })
            .collect();
        (BufferWriter { buffer }, readers)
    }

    /// Capacity in items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of one item in bytes
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Number of attached readers
    pub fn nreaders(&self) -> usize {
        self.readers.len()
    }

    fn ptr(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.data.as_ptr()).cast::<u8>()
    }

    fn ring_offset(&self, cursor: u64) -> usize {
        (cursor % self.capacity as u64) as usize * self.item_size
    }

    fn check_type<T>(&self) {
        assert_eq!(
            mem::size_of::<T>(),
            self.item_size,
            "item type does not match buffer item size"
        );
        assert!(mem::align_of::<T>() <= mem::align_of::<CacheLine>());
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("item_size", &self.item_size)
            .field("capacity", &self.capacity)
            .field("readers", &self.readers.len())
            .field("done", &self.done.load(Ordering::Relaxed))
            .finish()
    }
}

/// Writing end of a [`Buffer`]
pub struct BufferWriter {
    buffer: Arc<Buffer>,
}

impl BufferWriter {
    /// Items that can be written without overwriting unread data of a live
    /// reader.
    pub fn space_available(&self) -> usize {
        let b = &self.buffer;
        let w = b.write.load(Ordering::Relaxed);
        let unread = b
            .readers
            .iter()
            .filter(|r| !r.done.load(Ordering::Acquire))
            .map(|r| w - r.read.load(Ordering::Acquire))
            .max()
            .unwrap_or(0);
        b.capacity.saturating_sub(unread as usize)
    }

    /// Writable region of `space_available()` items.
    pub fn slice<T: Copy>(&mut self) -> &mut [T] {
        self.buffer.check_type::<T>();
        let len = self.space_available();
        let b = &self.buffer;
        let offset = b.ring_offset(b.write.load(Ordering::Relaxed));
        // SAFETY: offset + len items stay within the doubled storage and no
        // live reader can access this region until the cursor is advanced.
        unsafe { slice::from_raw_parts_mut(b.ptr().add(offset).cast::<T>(), len) }
    }

    /// Publish `n` items written to the front of [`slice`](Self::slice).
    pub fn produce(&mut self, n: usize) -> Result<()> {
        let available = self.space_available();
        if n > available {
            return Err(Error::ProduceOverrun {
                requested: n,
                available,
            });
        }
        if n == 0 {
            return Ok(());
        }

        let b = &self.buffer;
        let w = b.write.load(Ordering::Relaxed);
        let size = b.item_size;
        let cap = b.capacity;
        let start = (w % cap as u64) as usize;
        let end = start + n;
        let base = b.ptr();

        // SAFETY: both halves of the copy lie in the region owned by the
        // writer, once in the lower and once in the mirrored upper half.
        unsafe {
            if start < cap {
                let stop = end.min(cap);
                ptr::copy_nonoverlapping(
                    base.add(start * size),
                    base.add((start + cap) * size),
                    (stop - start) * size,
                );
            }
            if end > cap {
                let from = start.max(cap);
                ptr::copy_nonoverlapping(
                    base.add(from * size),
                    base.add((from - cap) * size),
                    (end - from) * size,
                );
            }
        }

        b.write.store(w + n as u64, Ordering::Release);
        Ok(())
    }

    /// Total number of items written.
    pub fn nitems_written(&self) -> u64 {
        self.buffer.write.load(Ordering::Relaxed) - self.buffer.capacity as u64
    }

    /// Signal readers that no more items will be written.
    pub fn set_done(&self) {
        self.buffer.done.store(true, Ordering::Release);
    }

    /// True if all readers stopped reading.
    pub fn readers_done(&self) -> bool {
        self.buffer
            .readers
            .iter()
            .all(|r| r.done.load(Ordering::Acquire))
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

impl fmt::Debug for BufferWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferWriter")
            .field("buffer", &self.buffer)
            .field("written", &self.nitems_written())
            .finish()
    }
}

/// Reading end of a [`Buffer`]
pub struct BufferReader {
    buffer: Arc<Buffer>,
    idx: usize,
}

impl BufferReader {
    fn state(&self) -> &ReaderState {
        &self.buffer.readers[self.idx]
    }

    /// Unread items of this reader.
    pub fn items_available(&self) -> usize {
        let w = self.buffer.write.load(Ordering::Acquire);
        (w - self.state().read.load(Ordering::Relaxed)) as usize
    }

    /// All unread items.
    pub fn slice<T: Copy>(&self) -> &[T] {
        self.buffer.check_type::<T>();
        let len = self.items_available();
        let b = &self.buffer;
        let offset = b.ring_offset(self.state().read.load(Ordering::Relaxed));
        // SAFETY: the writer does not touch unread items of a live reader.
        unsafe { slice::from_raw_parts(b.ptr().add(offset).cast::<T>(), len) }
    }

    /// Mark `n` items as read.
    pub fn consume(&mut self, n: usize) -> Result<()> {
        let available = self.items_available();
        if n > available {
            return Err(Error::ConsumeOverrun {
                requested: n,
                available,
            });
        }
        let state = self.state();
        let r = state.read.load(Ordering::Relaxed);
        state.read.store(r + n as u64, Ordering::Release);
        Ok(())
    }

    /// Total number of items consumed.
    pub fn nitems_read(&self) -> u64 {
        let state = self.state();
        state.read.load(Ordering::Relaxed) - state.start
    }

    /// True if the writer is done. Items may still be available.
    pub fn finished(&self) -> bool {
        self.buffer.done.load(Ordering::Acquire)
    }

    /// Detach this reader: the writer no longer waits for it.
    pub fn set_done(&self) {
        self.state().done.store(true, Ordering::Release);
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

impl fmt::Debug for BufferReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferReader")
            .field("idx", &self.idx)
            .field("available", &self.items_available())
            .field("finished", &self.finished())
            .finish()
    }
}
