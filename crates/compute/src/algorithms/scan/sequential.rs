use super::combine::Combine;

/// Sequential inclusive scan of `input` seeded with `seed`.
///
/// Returns the scanned values and the final running total, which is `seed`
/// itself for empty input.
pub fn inclusive_scan<T, Op>(seed: T, input: &[T], op: &Op) -> (Vec<T>, T)
where
    T: Clone,
    Op: Combine<T> + ?Sized,
{
    let mut running = seed;
    let mut out = Vec::with_capacity(input.len());
    for x in input {
        running = op.combine(&running, x);
        out.push(running.clone());
    }
    (out, running)
}

/// In-place variant of [`inclusive_scan`]; returns the final running total.
pub fn inclusive_scan_in_place<T, Op>(seed: T, data: &mut [T], op: &Op) -> T
where
    T: Clone,
    Op: Combine<T> + ?Sized,
{
    let mut running = seed;
    for x in data.iter_mut() {
        running = op.combine(&running, x);
        *x = running.clone();
    }
    running
}
