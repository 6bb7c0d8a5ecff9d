use std::collections::VecDeque;

/// FIFO queue of transactions waiting for a resource.
///
/// Besides the waiting elements, the queue remembers how many elements it ever admitted and
/// the largest length it reached, which are reported along with the time-weighted statistics.
///
/// # Examples
///
/// ```
/// # use smpl::WaitQueue;
/// let mut queue = WaitQueue::default();
/// queue.push_back("A");
/// queue.push_back("B");
/// assert_eq!(queue.pop_front(), Some("A"));
/// queue.push_back("C");
/// assert_eq!(queue.len(), 2);
/// assert_eq!(queue.max_len(), 2);
/// assert_eq!(queue.total_enqueued(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct WaitQueue<T> {
    inner: VecDeque<T>,
    max_len: usize,
    total_enqueued: u64,
}

impl<T> Default for WaitQueue<T> {
    fn default() -> Self {
        Self {
            inner: VecDeque::default(),
            max_len: 0,
            total_enqueued: 0,
        }
    }
}

impl<T> WaitQueue<T> {
    /// Appends an element to the back of the queue.
    pub fn push_back(&mut self, value: T) {
        self.inner.push_back(value);
        self.total_enqueued += 1;
        self.max_len = self.max_len.max(self.inner.len());
    }

    /// Removes the first element and returns it, or `None` if the queue is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    /// Returns the first element without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Returns the number of elements in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The largest number of elements the queue has held at once.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Number of elements ever pushed to the queue.
    #[must_use]
    pub fn total_enqueued(&self) -> u64 {
        self.total_enqueued
    }

    /// Iterates over the waiting elements from the front to the back.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }
}
