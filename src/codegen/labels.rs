use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out `loop_label_<n>` continue targets and `result_<n>` comprehension
/// accumulators. Each sequence starts at 1 and is never reused by the same
/// allocator.
#[derive(Debug)]
pub struct LabelAllocator {
    counter: AtomicUsize,
    accumulators: AtomicUsize,
}

impl LabelAllocator {
    pub fn new() -> Self {
        LabelAllocator {
            counter: AtomicUsize::new(1),
            accumulators: AtomicUsize::new(1),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("loop_label_{}", n)
    }

    pub fn accumulator(&self) -> String {
        let n = self.accumulators.fetch_add(1, Ordering::Relaxed);
        format!("result_{}", n)
    }
}

impl Default for LabelAllocator {
    fn default() -> Self {
        LabelAllocator::new()
    }
}
