use std::cell::UnsafeCell;

use super::combine::Combine;

/// Partial-sums buffer of one super-tile while its blocks are being scanned.
///
/// Slot `0` is reserved for the seed; slot `lane + 1` receives block
/// `lane`'s local total. `None` marks an empty block.
pub(crate) struct BlockTotals<T> {
    slots: Box<[UnsafeCell<Option<T>>]>,
}

// SAFETY: during the local-scan stage each lane writes only its own slot;
// nothing reads the slots until the stage has completed.
unsafe impl<T: Send> Sync for BlockTotals<T> {}

impl<T> BlockTotals<T> {
    pub(crate) fn new(lanes: usize) -> Self {
        Self {
            slots: (0..=lanes).map(|_| UnsafeCell::new(None)).collect(),
        }
    }

    /// # Safety
    /// Only lane `lane` may call this during a stage, and at most once.
    pub(crate) unsafe fn set_block_total(&self, lane: usize, total: Option<T>) {
        *self.slots[lane + 1].get() = total;
    }

    /// Seed slot `0`, then replace the buffer with its own inclusive scan.
    ///
    /// Empty blocks act as the identity, so slot `i` of the result is the
    /// combined total of the seed and every block before block `i`.
    pub(crate) fn into_carries<Op>(self, seed: T, op: &Op) -> Carries<T>
    where
        T: Clone,
        Op: Combine<T> + ?Sized,
    {
        let mut running = seed;
        let mut prefix = Vec::with_capacity(self.slots.len());
        for slot in self.slots.into_vec().into_iter().skip(1) {
            prefix.push(running.clone());
            if let Some(total) = slot.into_inner() {
                running = op.combine(&running, &total);
            }
        }
        prefix.push(running);
        Carries { prefix }
    }
}

/// Partial-sums buffer after carry assembly: slot `i` is the carry for
/// block `i` and the last slot is the super-tile's seed-inclusive total.
pub(crate) struct Carries<T> {
    prefix: Vec<T>,
}

impl<T> Carries<T> {
    pub(crate) fn carry(&self, lane: usize) -> &T {
        &self.prefix[lane]
    }

    pub(crate) fn into_total(mut self) -> T {
        // Never empty: `into_carries` always pushes the running total.
        self.prefix.swap_remove(self.prefix.len() - 1)
    }
}
