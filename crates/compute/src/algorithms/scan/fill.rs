use crate::scheduler::AsyncValue;

use super::partition::block_range;
use super::view::ScanBuffers;

/// Deferred parallel fill: `data[i] = f(i)` for every index, split across
/// `lanes` balanced blocks in one bulk stage. `lanes` of zero is treated as one.
pub fn tabulate<'a, T, F>(data: &'a mut [T], lanes: usize, f: F) -> AsyncValue<'a, ()>
where
    T: Send + Sync + 'a,
    F: Fn(usize) -> T + Send + Sync + 'a,
{
    let lanes = lanes.max(1);
    let views = ScanBuffers::in_place(data);
    let len = views.len();
    AsyncValue::immediate(()).bulk(lanes, move |lane, _| {
        // SAFETY: balanced partition ranges are disjoint across lanes.
        unsafe { views.fill_block(block_range(lane, len, lanes), &f) };
        Ok(())
    })
}
