use std::sync::Mutex;

/// A free-list of reusable `Vec<char>` buffers shared across readers and
/// rows that hold escaped-value content, avoiding an allocation per value
/// the way the Design Notes call for. Safe for concurrent rent/release.
pub struct CharPool {
    free: Mutex<Vec<Vec<char>>>,
    max_size: usize,
}

impl CharPool {
    pub fn new(max_size: usize) -> CharPool {
        CharPool { free: Mutex::new(Vec::new()), max_size }
    }

    /// Takes a buffer from the pool, or allocates a fresh one if the pool is
    /// empty.
    pub fn rent(&self) -> Vec<char> {
        let mut free = self.free.lock().expect("CharPool mutex poisoned");
        free.pop().unwrap_or_default()
    }

    /// Returns a buffer to the pool for reuse, clearing it first. Buffers
    /// larger than `max_size` are dropped instead of pooled, so one
    /// unusually large value doesn't pin a huge allocation in the pool
    /// forever.
    pub fn release(&self, mut buf: Vec<char>) {
        if buf.capacity() > self.max_size {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().expect("CharPool mutex poisoned");
        free.push(buf);
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for CharPool {
    fn default() -> CharPool {
        CharPool::new(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_then_release_reuses_allocation() {
        let pool = CharPool::new(1024);
        let mut buf = pool.rent();
        buf.extend_from_slice(&['a', 'b', 'c']);
        let cap = buf.capacity();
        pool.release(buf);
        let buf2 = pool.rent();
        assert!(buf2.is_empty());
        assert!(buf2.capacity() >= cap || cap == 0);
    }

    #[test]
    fn oversized_buffer_is_dropped_not_pooled() {
        let pool = CharPool::new(4);
        let buf = Vec::with_capacity(1024);
        pool.release(buf);
        let rented = pool.rent();
        assert_eq!(rented.capacity(), 0);
    }
}
