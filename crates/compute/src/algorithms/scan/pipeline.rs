use std::ops::Range;
use std::sync::Arc;

use tilescan_core::{super_tile_len, ScanConfig, ScanError};
use tracing::debug;

use crate::scheduler::{AsyncValue, ChainLink};

use super::combine::{Combine, Sum};
use super::partials::{BlockTotals, Carries};
use super::partition::block_range;
use super::view::ScanBuffers;

/// Tiled two-pass inclusive scan expressed as a deferred computation.
///
/// The input is carved into super-tiles of at most `tile_count * block_size`
/// elements. Each super-tile is split into `tile_count` balanced blocks that
/// are scanned locally in one bulk stage, joined with the incoming seed,
/// turned into per-block carries, and finished by a second bulk stage that
/// applies the carries. The super-tile's total becomes the next seed.
#[derive(Debug, Clone)]
pub struct TiledScanPipeline<Op> {
    block_size: usize,
    tile_count: usize,
    super_tile: usize,
    op: Arc<Op>,
}

impl<Op> TiledScanPipeline<Op> {
    /// Validate the tiling and build a pipeline. Nothing is scheduled.
    pub fn new(block_size: usize, tile_count: usize, op: Op) -> Result<Self, ScanError> {
        let super_tile = super_tile_len(block_size, tile_count)?;
        Ok(Self {
            block_size,
            tile_count,
            super_tile,
            op: Arc::new(op),
        })
    }

    pub fn from_config(config: &ScanConfig, op: Op) -> Result<Self, ScanError> {
        Self::new(config.block_size, config.tile_count, op)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    /// Maximum number of elements processed per iteration.
    pub fn super_tile_len(&self) -> usize {
        self.super_tile
    }

    /// Build the deferred scan of `buffers` seeded with `seed`.
    ///
    /// The returned value resolves to the seed combined with every element.
    /// Driving it writes the seeded inclusive scan into the output view.
    pub fn run<'a, T>(
        &self,
        seed: AsyncValue<'a, T>,
        buffers: ScanBuffers<'a, T>,
    ) -> AsyncValue<'a, T>
    where
        T: Clone + Send + Sync + 'a,
        Op: Combine<T> + 'a,
    {
        debug!(
            len = buffers.len(),
            in_place = buffers.is_aliased(),
            block_size = self.block_size,
            tile_count = self.tile_count,
            "Building tiled scan"
        );
        let op = Arc::clone(&self.op);
        let tiles = SuperTiles::new(buffers, self.super_tile, self.tile_count);
        seed.chain(tiles.map(move |tile| tile_link(Arc::new(tile), Arc::clone(&op))))
    }
}

/// Seeded inclusive sum of `buffers` with the given tiling.
pub fn async_inclusive_scan<'a, T>(
    seed: AsyncValue<'a, T>,
    buffers: ScanBuffers<'a, T>,
    block_size: usize,
    tile_count: usize,
) -> Result<AsyncValue<'a, T>, ScanError>
where
    T: std::ops::Add<Output = T> + Clone + Send + Sync + 'a,
{
    Ok(TiledScanPipeline::new(block_size, tile_count, Sum)?.run(seed, buffers))
}

/// One super-tile: its views and how they split into blocks.
struct SuperTile<'a, T> {
    views: ScanBuffers<'a, T>,
    lanes: usize,
}

impl<T> SuperTile<'_, T> {
    fn block(&self, lane: usize) -> Range<usize> {
        block_range(lane, self.views.len(), self.lanes)
    }
}

/// Carves super-tiles off the front of the remaining views.
struct SuperTiles<'a, T> {
    rest: Option<ScanBuffers<'a, T>>,
    super_tile: usize,
    lanes: usize,
    offset: usize,
}

impl<'a, T> SuperTiles<'a, T> {
    fn new(buffers: ScanBuffers<'a, T>, super_tile: usize, lanes: usize) -> Self {
        Self {
            rest: Some(buffers),
            super_tile,
            lanes,
            offset: 0,
        }
    }
}

impl<'a, T> Iterator for SuperTiles<'a, T> {
    type Item = SuperTile<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.take().filter(|rest| !rest.is_empty())?;
        let n = rest.len().min(self.super_tile);
        let (views, rest) = rest.split_at(n);
        debug!(offset = self.offset, len = n, "Super-tile");
        self.offset += n;
        self.rest = Some(rest);
        Some(SuperTile {
            views,
            lanes: self.lanes,
        })
    }
}

/// Stages of one super-tile: the seed-independent local scan, and the carry
/// assembly plus carry application that need the seed.
fn tile_link<'a, T, Op>(
    tile: Arc<SuperTile<'a, T>>,
    op: Arc<Op>,
) -> ChainLink<'a, T, BlockTotals<T>>
where
    T: Clone + Send + Sync + 'a,
    Op: Combine<T> + ?Sized + 'a,
{
    let lanes = tile.lanes;

    let local_tile = Arc::clone(&tile);
    let local_op = Arc::clone(&op);
    let local_scan =
        AsyncValue::immediate(BlockTotals::new(lanes)).bulk(lanes, move |lane, totals| {
            let range = local_tile.block(lane);
            // SAFETY: the balanced partition gives every lane a disjoint range
            // and its own totals slot.
            unsafe {
                let total = local_tile.views.scan_block(range, &*local_op);
                totals.set_block_total(lane, total);
            }
            Ok(())
        });

    ChainLink::new(local_scan, move |seed: T, totals: BlockTotals<T>| {
        let carry_op = Arc::clone(&op);
        AsyncValue::immediate(totals)
            .map(move |totals| totals.into_carries(seed, &*carry_op))
            .bulk(lanes, move |lane, carries: &Carries<T>| {
                // SAFETY: same disjoint ranges as the local scan, which has
                // completed before this stage starts.
                unsafe { tile.views.apply_carry(tile.block(lane), carries.carry(lane), &*op) };
                Ok(())
            })
            .map(Carries::into_total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::scan::inclusive_scan;
    use crate::scheduler::{sync_wait, Outcome};

    #[test]
    fn rejects_zero_sizes_eagerly() {
        assert!(matches!(TiledScanPipeline::new(0, 4, Sum), Err(ScanError::ZeroBlockSize)));
        assert!(matches!(TiledScanPipeline::new(4, 0, Sum), Err(ScanError::ZeroTileCount)));
        assert!(matches!(
            TiledScanPipeline::new(usize::MAX, 3, Sum),
            Err(ScanError::TileOverflow { .. })
        ));
    }

    #[test]
    fn from_config_uses_tiling() {
        let config = ScanConfig {
            block_size: 100,
            tile_count: 4,
            ..ScanConfig::default()
        };
        let pipeline = TiledScanPipeline::from_config(&config, Sum).unwrap();
        assert_eq!(pipeline.super_tile_len(), 400);
        assert_eq!(pipeline.block_size(), 100);
        assert_eq!(pipeline.tile_count(), 4);
    }

    #[test]
    fn super_tiles_cover_input_in_order() {
        let mut data = vec![0u8; 23];
        let tiles: Vec<usize> = SuperTiles::new(ScanBuffers::in_place(&mut data), 10, 2)
            .map(|t| t.views.len())
            .collect();
        assert_eq!(tiles, vec![10, 10, 3]);
    }

    #[test]
    fn small_inline_scan() {
        let input: Vec<u32> = (1..=10).collect();
        let mut output = vec![0; 10];
        let pipeline = TiledScanPipeline::new(2, 2, Sum).unwrap();
        let scan = pipeline.run(
            AsyncValue::immediate(100),
            ScanBuffers::separate(&input, &mut output).unwrap(),
        );
        assert_eq!(sync_wait(scan), Outcome::Value(155));
        let (expected, _) = inclusive_scan(100, &input, &Sum);
        assert_eq!(output, expected);
    }

    #[test]
    fn nothing_runs_until_driven() {
        let mut data = vec![1u32; 8];
        let pipeline = TiledScanPipeline::new(2, 2, Sum).unwrap();
        let scan = pipeline.run(AsyncValue::immediate(0), ScanBuffers::in_place(&mut data));
        drop(scan);
        assert_eq!(data, vec![1; 8]);
    }

    #[test]
    fn async_inclusive_scan_sums() {
        let mut data: Vec<u64> = (1..=1000).collect();
        let buffers = ScanBuffers::in_place(&mut data);
        let scan = async_inclusive_scan(AsyncValue::immediate(0), buffers, 7, 3).unwrap();
        assert_eq!(sync_wait(scan), Outcome::Value(500_500));
        assert_eq!(data[999], 500_500);
        assert_eq!(data[9], 55);
    }
}
