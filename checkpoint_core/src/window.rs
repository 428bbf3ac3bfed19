//! Fixed-capacity sample windows.
//!
//! `SampleWindow<T, N>` is a FIFO ring with capacity fixed at compile time.
//! Inserting into a full window evicts the oldest sample. Indexing is only
//! exposed relative to the newest sample and returns `Option`, so no caller
//! can address a slot outside the stored samples.

#[derive(Debug, Clone)]
pub struct SampleWindow<T, const N: usize> {
    buf: [T; N],
    /// Index of the oldest stored sample.
    head: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for SampleWindow<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> SampleWindow<T, N> {
    const NONEMPTY: () = assert!(N > 0, "SampleWindow capacity must be non-zero");

    pub fn new() -> Self {
        let () = Self::NONEMPTY;
        Self {
            buf: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append `sample`; returns the evicted oldest sample when full.
    pub fn push(&mut self, sample: T) -> Option<T> {
        if self.len < N {
            let tail = (self.head + self.len) % N;
            self.buf[tail] = sample;
            self.len += 1;
            None
        } else {
            let evicted = std::mem::replace(&mut self.buf[self.head], sample);
            self.head = (self.head + 1) % N;
            Some(evicted)
        }
    }

    /// The `k`-th newest sample (`0` = newest).
    pub fn newest(&self, k: usize) -> Option<T> {
        if k >= self.len {
            return None;
        }
        let idx = (self.head + self.len - 1 - k) % N;
        Some(self.buf[idx])
    }

    pub fn latest(&self) -> Option<T> {
        self.newest(0)
    }

    pub fn previous(&self) -> Option<T> {
        self.newest(1)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.buf[(self.head + i) % N])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_then_evicts_oldest() {
        let mut w = SampleWindow::<u16, 3>::new();
        assert_eq!(w.push(1), None);
        assert_eq!(w.push(2), None);
        assert_eq!(w.push(3), None);
        assert!(w.is_full());
        assert_eq!(w.push(4), Some(1));
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn newest_is_relative_to_last_push() {
        let mut w = SampleWindow::<u16, 4>::new();
        for v in 10..17 {
            w.push(v);
        }
        assert_eq!(w.latest(), Some(16));
        assert_eq!(w.previous(), Some(15));
        assert_eq!(w.newest(3), Some(13));
        assert_eq!(w.newest(4), None);
    }

    #[test]
    fn empty_and_single_sample() {
        let mut w = SampleWindow::<u16, 2>::new();
        assert!(w.is_empty());
        assert_eq!(w.latest(), None);
        w.push(7);
        assert_eq!(w.latest(), Some(7));
        assert_eq!(w.previous(), None);
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut w = SampleWindow::<f32, 2>::new();
        w.push(1.0);
        w.push(2.0);
        w.push(3.0);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.iter().count(), 0);
        w.push(9.0);
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![9.0]);
    }
}
