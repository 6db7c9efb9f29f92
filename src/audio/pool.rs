use tracing::debug;

/// Fixed-capacity free list of reusable sample buffers.
///
/// Batch buffers cycle between the framer and this pool so the steady-state
/// capture path performs no allocation. Releasing beyond capacity simply drops
/// the buffer; acquiring from an empty pool allocates a fresh one.
pub struct BufferPool {
    buf_len: usize,
    capacity: usize,
    free: Vec<Vec<i16>>,
}

impl BufferPool {
    pub fn new(capacity: usize, buf_len: usize) -> Self {
        Self {
            buf_len,
            capacity,
            free: Vec::with_capacity(capacity),
        }
    }

    /// Take a zeroed buffer of `buf_len` samples.
    pub fn acquire(&mut self) -> Vec<i16> {
        match self.free.pop() {
            Some(mut buf) => {
                buf.fill(0);
                buf
            }
            None => {
                debug!("buffer pool empty, allocating new {}-sample buffer", self.buf_len);
                vec![0i16; self.buf_len]
            }
        }
    }

    /// Return a buffer to the free list. Wrong-sized buffers are discarded.
    pub fn release(&mut self, buf: Vec<i16>) {
        if buf.len() != self.buf_len {
            debug!(
                "discarding buffer of {} samples (pool holds {}-sample buffers)",
                buf.len(),
                self.buf_len
            );
            return;
        }
        if self.free.len() < self.capacity {
            self.free.push(buf);
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_reuses_released_buffers() {
        let mut pool = BufferPool::new(2, 4);
        let buf = pool.acquire();
        assert_eq!(buf.len(), 4);
        pool.release(buf);
        assert_eq!(pool.available(), 1);
        let buf = pool.acquire();
        assert_eq!(buf, vec![0i16; 4]);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn release_beyond_capacity_drops() {
        let mut pool = BufferPool::new(1, 4);
        pool.release(vec![0i16; 4]);
        pool.release(vec![0i16; 4]);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn wrong_sized_buffer_is_discarded() {
        let mut pool = BufferPool::new(2, 4);
        pool.release(vec![0i16; 3]);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn reused_buffers_come_back_zeroed() {
        let mut pool = BufferPool::new(1, 2);
        pool.release(vec![7i16, -7]);
        assert_eq!(pool.acquire(), vec![0i16, 0]);
    }
}
