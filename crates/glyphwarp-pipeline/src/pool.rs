//! Reusable canvas buffers.
//!
//! Copy-based effects (distortion, tile rotation) build a new raster from
//! the old one on every generation call. [`CanvasPool`] keeps released
//! buffers around, keyed by their exact dimensions, so steady-state
//! generation does not allocate.
//!
//! A buffer is owned by exactly one [`PooledCanvas`] handle at a time.
//! Dropping the handle (or calling [`PooledCanvas::release`]) moves the
//! buffer back into the pool; the borrow checker guarantees the previous
//! owner cannot touch it afterwards.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use parking_lot::Mutex;

use crate::types::Dimensions;

/// Default number of idle buffers retained per dimension key.
pub const DEFAULT_MAX_IDLE: usize = 16;

/// Thread-safe pool of RGBA buffers keyed by dimensions.
///
/// Cloning is cheap: clones share the same underlying storage.
#[derive(Clone)]
pub struct CanvasPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    idle: Mutex<HashMap<Dimensions, Vec<RgbaImage>>>,
    max_idle: usize,
    allocated: AtomicU64,
    reused: AtomicU64,
}

/// Allocation counters for a [`CanvasPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Buffers created because no idle buffer of the right size existed.
    pub allocated: u64,
    /// Acquisitions satisfied from idle buffers.
    pub reused: u64,
}

impl Default for CanvasPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CanvasPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasPool")
            .field("max_idle", &self.inner.max_idle)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl CanvasPool {
    /// Create an empty pool retaining up to [`DEFAULT_MAX_IDLE`] buffers
    /// per size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Create an empty pool retaining up to `max_idle` buffers per size.
    ///
    /// `max_idle == 0` disables retention: every acquire allocates.
    #[must_use]
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(HashMap::new()),
                max_idle,
                allocated: AtomicU64::new(0),
                reused: AtomicU64::new(0),
            }),
        }
    }

    /// Take a buffer of exactly `dimensions`.
    ///
    /// Contents are unspecified: a recycled buffer still holds whatever
    /// its previous owner drew. Fill it before reading.
    #[must_use]
    pub fn acquire(&self, dimensions: Dimensions) -> PooledCanvas {
        let recycled = self
            .inner
            .idle
            .lock()
            .get_mut(&dimensions)
            .and_then(Vec::pop);

        let image = if let Some(image) = recycled {
            self.inner.reused.fetch_add(1, Ordering::Relaxed);
            image
        } else {
            self.inner.allocated.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(%dimensions, "canvas pool miss, allocating");
            RgbaImage::new(dimensions.width, dimensions.height)
        };

        PooledCanvas {
            image,
            pool: self.clone(),
        }
    }

    /// Number of idle buffers currently held for `dimensions`.
    #[must_use]
    pub fn idle_count(&self, dimensions: Dimensions) -> usize {
        self.inner.idle.lock().get(&dimensions).map_or(0, Vec::len)
    }

    /// Allocation counters since the pool was created.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.inner.allocated.load(Ordering::Relaxed),
            reused: self.inner.reused.load(Ordering::Relaxed),
        }
    }

    /// Drop every idle buffer.
    pub fn clear(&self) {
        self.inner.idle.lock().clear();
    }

    fn put(&self, image: RgbaImage) {
        let dimensions = Dimensions::of(&image);
        if dimensions.pixel_count() == 0 {
            return;
        }
        let mut idle = self.inner.idle.lock();
        let bucket = idle.entry(dimensions).or_default();
        if bucket.len() < self.inner.max_idle {
            bucket.push(image);
        }
    }
}

/// Exclusive handle to a pooled canvas.
///
/// Dereferences to [`RgbaImage`]. The buffer returns to its pool when the
/// handle is dropped, unless it was detached with
/// [`into_image`](Self::into_image).
pub struct PooledCanvas {
    image: RgbaImage,
    pool: CanvasPool,
}

impl PooledCanvas {
    /// Dimensions of the underlying buffer.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }

    /// Borrow the pixels.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Borrow the pixels mutably.
    pub const fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Return the buffer to its pool now.
    pub fn release(self) {
        drop(self);
    }

    /// Detach the buffer from the pool and take ownership of it.
    #[must_use]
    pub fn into_image(mut self) -> RgbaImage {
        // The zero-sized placeholder is discarded by `put` on drop.
        std::mem::replace(&mut self.image, RgbaImage::new(0, 0))
    }

    /// The pool this canvas returns to.
    #[must_use]
    pub const fn pool(&self) -> &CanvasPool {
        &self.pool
    }
}

impl Deref for PooledCanvas {
    type Target = RgbaImage;

    fn deref(&self) -> &RgbaImage {
        &self.image
    }
}

impl DerefMut for PooledCanvas {
    fn deref_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }
}

impl Drop for PooledCanvas {
    fn drop(&mut self) {
        let image = std::mem::replace(&mut self.image, RgbaImage::new(0, 0));
        self.pool.put(image);
    }
}

impl std::fmt::Debug for PooledCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledCanvas")
            .field("dimensions", &self.dimensions())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    const SIZE: Dimensions = Dimensions::new(8, 4);

    #[test]
    fn acquire_returns_requested_dimensions() {
        let pool = CanvasPool::new();
        let canvas = pool.acquire(SIZE);
        assert_eq!(canvas.dimensions(), SIZE);
        assert_eq!(canvas.width(), 8);
        assert_eq!(canvas.height(), 4);
    }

    #[test]
    fn released_buffer_is_reused() {
        let pool = CanvasPool::new();
        let mut canvas = pool.acquire(SIZE);
        canvas.put_pixel(0, 0, Rgba([1, 2, 3, 4]));
        canvas.release();
        assert_eq!(pool.idle_count(SIZE), 1);

        let again = pool.acquire(SIZE);
        // Contents are unspecified; here they are the previous owner's.
        assert_eq!(*again.get_pixel(0, 0), Rgba([1, 2, 3, 4]));
        assert_eq!(pool.stats(), PoolStats { allocated: 1, reused: 1 });
    }

    #[test]
    fn drop_returns_buffer() {
        let pool = CanvasPool::new();
        {
            let _canvas = pool.acquire(SIZE);
            assert_eq!(pool.idle_count(SIZE), 0);
        }
        assert_eq!(pool.idle_count(SIZE), 1);
    }

    #[test]
    fn buffers_are_keyed_by_dimensions() {
        let pool = CanvasPool::new();
        pool.acquire(SIZE).release();
        let other = pool.acquire(Dimensions::new(4, 8));
        assert_eq!(other.dimensions(), Dimensions::new(4, 8));
        assert_eq!(pool.stats().allocated, 2);
        assert_eq!(pool.idle_count(SIZE), 1);
    }

    #[test]
    fn into_image_detaches_from_pool() {
        let pool = CanvasPool::new();
        let image = pool.acquire(SIZE).into_image();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(pool.idle_count(SIZE), 0);
        assert_eq!(pool.idle_count(Dimensions::new(0, 0)), 0);
    }

    #[test]
    fn idle_buffers_are_capped() {
        let pool = CanvasPool::with_max_idle(2);
        let held: Vec<_> = (0..5).map(|_| pool.acquire(SIZE)).collect();
        drop(held);
        assert_eq!(pool.idle_count(SIZE), 2);
    }

    #[test]
    fn zero_max_idle_never_retains() {
        let pool = CanvasPool::with_max_idle(0);
        pool.acquire(SIZE).release();
        assert_eq!(pool.idle_count(SIZE), 0);
    }

    #[test]
    fn clear_drops_idle_buffers() {
        let pool = CanvasPool::new();
        pool.acquire(SIZE).release();
        pool.clear();
        assert_eq!(pool.idle_count(SIZE), 0);
    }

    #[test]
    fn concurrent_acquire_release_has_no_cross_talk() {
        let pool = CanvasPool::with_max_idle(4);
        std::thread::scope(|s| {
            for id in 0..8_u8 {
                let pool = pool.clone();
                s.spawn(move || {
                    for round in 0..200_u8 {
                        let mut canvas = pool.acquire(SIZE);
                        let mark = Rgba([id, round, 0, 255]);
                        crate::raster::fill(&mut canvas, mark);
                        std::thread::yield_now();
                        assert!(
                            canvas.pixels().all(|p| *p == mark),
                            "thread {id} saw foreign pixels in round {round}"
                        );
                    }
                });
            }
        });
        let stats = pool.stats();
        assert_eq!(stats.allocated + stats.reused, 8 * 200);
        assert!(pool.idle_count(SIZE) <= 4);
    }
}
