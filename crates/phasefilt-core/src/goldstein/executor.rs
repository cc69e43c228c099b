use std::ops::Range;

use ndarray::Axis;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::ProgressReporter;
use crate::raster::{AlphaMap, CoherenceMap, FilteredOutput, Interferogram};

use super::coherence::tile_alpha;
use super::spectral::TileWorkspace;
use super::tiling::TilePlan;
use super::writer::OutputBand;

/// One worker's share: a contiguous run of tile rows, the output band those
/// rows own, and the worker's private transform resources.
struct BandJob<'a> {
    tile_rows: Range<usize>,
    output: OutputBand<'a>,
    workspace: TileWorkspace,
}

impl BandJob<'_> {
    fn run(
        mut self,
        plan: &TilePlan,
        interferogram: &Interferogram,
        coherence: &CoherenceMap,
        reporter: &dyn ProgressReporter,
    ) {
        for tile_row in self.tile_rows.clone() {
            for tile in plan.tiles_in_row(tile_row) {
                let alpha = tile_alpha(coherence, plan.grid, &tile);
                self.workspace.load_tile(interferogram, plan.grid, &tile);
                self.workspace.filter(alpha);
                self.output.commit(plan.grid, &tile, &self.workspace, alpha);
            }
            reporter.advance(1);
        }
    }
}

/// Split `count` tile rows into `workers` contiguous, near-equal bands.
pub(crate) fn partition_rows(count: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.clamp(1, count.max(1));
    (0..workers)
        .map(|i| (i * count / workers)..((i + 1) * count / workers))
        .collect()
}

/// Run every tile of `plan` on a pool of `workers` threads.
///
/// All per-worker resources and the pool are built before any tile runs;
/// a failure there returns before either output is touched. Returns the
/// number of workers actually used.
pub(crate) fn run_tiles(
    plan: &TilePlan,
    interferogram: &Interferogram,
    coherence: &CoherenceMap,
    filtered: &mut FilteredOutput,
    alpha: &mut AlphaMap,
    workers: usize,
    reporter: &dyn ProgressReporter,
) -> Result<usize> {
    let requested = workers;
    let bands = partition_rows(plan.tile_rows(), requested);
    let workers = bands.len();
    debug!(
        requested,
        workers,
        tile_rows = plan.tile_rows(),
        "Worker pool sized"
    );

    let workspaces = (0..workers)
        .map(|_| TileWorkspace::new(plan.tile_size))
        .collect::<Result<Vec<_>>>()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;

    let mut jobs = Vec::with_capacity(workers);
    let mut filtered_rest = filtered.view_mut();
    let mut alpha_rest = alpha.view_mut();
    let mut cursor = 0;

    for (tile_rows, workspace) in bands.into_iter().zip(workspaces) {
        let owned = plan.owned_rows(tile_rows.clone());
        debug_assert_eq!(owned.start, cursor, "bands must be contiguous");
        let len = owned.end - cursor;

        let (band_filtered, rest_f) = filtered_rest.split_at(Axis(0), len);
        let (band_alpha, rest_a) = alpha_rest.split_at(Axis(0), len);
        filtered_rest = rest_f;
        alpha_rest = rest_a;

        debug!(
            tiles = ?tile_rows,
            rows = ?(cursor..owned.end),
            "Worker band assigned"
        );
        jobs.push(BandJob {
            tile_rows,
            output: OutputBand::new(cursor, band_filtered, band_alpha),
            workspace,
        });
        cursor = owned.end;
    }
    debug_assert_eq!(cursor, plan.grid.height, "bands must cover every row");

    pool.install(|| {
        jobs.into_par_iter()
            .for_each(|job| job.run(plan, interferogram, coherence, reporter));
    });

    Ok(workers)
}
