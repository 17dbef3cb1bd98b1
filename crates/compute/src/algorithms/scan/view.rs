use std::marker::PhantomData;
use std::ops::Range;

use tilescan_core::ScanError;

use super::combine::Combine;

/// Non-owning view over a contiguous run of `T`.
///
/// Views are created only through [`ScanBuffers`], which holds the borrow
/// for `'a`. Element access is unsafe: callers must guarantee that no two
/// lanes touch the same element at the same time.
pub(crate) struct SeqView<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> SeqView<'a, T> {
    fn new(ptr: *mut T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Split into the first `mid` elements and the remainder.
    fn split_at(self, mid: usize) -> (Self, Self) {
        assert!(mid <= self.len, "split point {} beyond view of {}", mid, self.len);
        // SAFETY: `mid <= len`, so the offset stays within (or one past) the
        // borrowed allocation.
        let rest = unsafe { self.ptr.add(mid) };
        (Self::new(self.ptr, mid), Self::new(rest, self.len - mid))
    }

    /// # Safety
    /// `index < len`, and no `&mut` to this element is live.
    unsafe fn get(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        &*self.ptr.add(index)
    }

    /// # Safety
    /// `index < len`, and the caller has exclusive access to this element.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        &mut *self.ptr.add(index)
    }
}

/// Input and output views of one scan, advanced together.
///
/// The two views either cover separate memory or alias the same memory for
/// an in-place scan. Their lengths are always equal.
pub struct ScanBuffers<'a, T> {
    input: SeqView<'a, T>,
    output: SeqView<'a, T>,
}

// SAFETY: the views are only dereferenced by lanes that own disjoint element
// ranges, so sharing them moves `T` values across threads (`Send`) and reads
// them from several threads (`Sync`).
unsafe impl<T: Send + Sync> Send for ScanBuffers<'_, T> {}
unsafe impl<T: Send + Sync> Sync for ScanBuffers<'_, T> {}

impl<'a, T> ScanBuffers<'a, T> {
    /// Scan `input` into a separate `output` of the same length.
    pub fn separate(input: &'a [T], output: &'a mut [T]) -> Result<Self, ScanError> {
        if input.len() != output.len() {
            return Err(ScanError::LengthMismatch {
                input: input.len(),
                output: output.len(),
            });
        }
        Ok(Self {
            input: SeqView::new(input.as_ptr() as *mut T, input.len()),
            output: SeqView::new(output.as_mut_ptr(), output.len()),
        })
    }

    /// Scan `data` in place: input and output alias.
    pub fn in_place(data: &'a mut [T]) -> Self {
        let ptr = data.as_mut_ptr();
        Self {
            input: SeqView::new(ptr, data.len()),
            output: SeqView::new(ptr, data.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn is_aliased(&self) -> bool {
        self.input.ptr == self.output.ptr
    }

    /// Split both views at `mid`: the first `mid` elements and the rest.
    pub fn split_at(self, mid: usize) -> (Self, Self) {
        let (input_head, input_rest) = self.input.split_at(mid);
        let (output_head, output_rest) = self.output.split_at(mid);
        (
            Self { input: input_head, output: output_head },
            Self { input: input_rest, output: output_rest },
        )
    }

    /// Inclusive scan of `range` from input into output, without any seed.
    /// Returns the block total, or `None` for an empty range.
    ///
    /// # Safety
    /// `range` lies within the views and no other lane accesses it
    /// concurrently.
    pub(crate) unsafe fn scan_block<Op>(&self, range: Range<usize>, op: &Op) -> Option<T>
    where
        T: Clone,
        Op: Combine<T> + ?Sized,
    {
        debug_assert!(range.end <= self.len());
        let start = range.start;
        let last = range.end.checked_sub(1).filter(|&last| last >= start)?;
        for k in range {
            // Read input[k] before writing output[k]; the two may alias.
            let value = if k == start {
                self.input.get(k).clone()
            } else {
                op.combine(self.output.get(k - 1), self.input.get(k))
            };
            *self.output.get_mut(k) = value;
        }
        Some(self.output.get(last).clone())
    }

    /// Combine `carry` onto the left of every output element in `range`.
    ///
    /// # Safety
    /// Same contract as [`scan_block`](Self::scan_block).
    pub(crate) unsafe fn apply_carry<Op>(&self, range: Range<usize>, carry: &T, op: &Op)
    where
        Op: Combine<T> + ?Sized,
    {
        debug_assert!(range.end <= self.len());
        for k in range {
            let element = self.output.get_mut(k);
            *element = op.combine(carry, element);
        }
    }

    /// Overwrite every output element in `range` with `f(index)`, where
    /// `index` counts from the start of the view.
    ///
    /// # Safety
    /// Same contract as [`scan_block`](Self::scan_block).
    pub(crate) unsafe fn fill_block<F>(&self, range: Range<usize>, f: &F)
    where
        F: Fn(usize) -> T + ?Sized,
    {
        debug_assert!(range.end <= self.len());
        for k in range {
            *self.output.get_mut(k) = f(k);
        }
    }
}
