use std::{fs, fs::File, io::BufWriter, path::Path};

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    args::GroupSearchOptions,
    graph::{RoadGraph, SegmentId},
    output::RenderOptions,
    progress::Progress,
    search::{enumerate_groups, RoadGroup},
    Error, Result,
};

use super::draw_segments;

#[derive(Debug, Clone, Serialize)]
pub struct StartGroups {
    pub start: SegmentId,
    pub groups: Vec<RoadGroup>,
}

/// Start segments of a batch: the filtered segments in id order, or shuffled
/// when a seed is given, truncated to `max_rounds`.
pub fn select_starts(graph: &RoadGraph, max_rounds: usize, seed: Option<u64>) -> Vec<SegmentId> {
    let mut starts = graph.filtered_ids();
    if let Some(seed) = seed {
        starts.shuffle(&mut StdRng::seed_from_u64(seed));
    }
    starts.truncate(max_rounds);
    starts
}

/// Enumerates the groups of every selected start segment, in parallel.
///
/// Start segments with malformed geometry somewhere along their search are
/// skipped with a warning; any other error aborts the batch. The result is
/// in start order and only holds starts that produced at least one group.
pub fn find_groups(
    graph: &RoadGraph,
    opts: &GroupSearchOptions,
    progress: &mut Progress,
) -> Result<Vec<StartGroups>> {
    let bounds = opts.bounds()?;
    let starts = select_starts(graph, opts.max_rounds, opts.seed);

    let pb = progress.step_sized(
        starts.len(),
        format!("Enumerating road groups from {} start segments", starts.len()),
    );
    let outcomes = starts
        .par_iter()
        .map(|&start| {
            let outcome = enumerate_groups(graph, start, bounds);
            pb.inc(1);
            (start, outcome)
        })
        .collect::<Vec<_>>();

    let mut found = Vec::new();
    let mut skipped = 0;
    for (start, outcome) in outcomes {
        match outcome {
            Ok(groups) if groups.is_empty() => debug!("No groups found from segment {}", start),
            Ok(groups) => {
                debug!("Found {} groups from segment {}", groups.len(), start);
                found.push(StartGroups { start, groups });
            }
            Err(err @ Error::Geometry { .. }) => {
                warn!("Skipping start segment {}: {}", start, err);
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    let total = found.iter().map(|s| s.groups.len()).sum::<usize>();
    progress.finish(format!(
        "Found {} groups from {} start segments, skipped {}",
        total,
        found.len(),
        skipped
    ));
    Ok(found)
}

/// Writes `<output>/<start>/connected_path_<n>.svg` for every group and a
/// `groups.json` manifest per start. Returns the number of images written.
pub fn write_groups(
    graph: &RoadGraph,
    found: &[StartGroups],
    output: &Path,
    opts: &RenderOptions,
    progress: &mut Progress,
) -> Result<usize> {
    let total = found.iter().map(|s| s.groups.len()).sum::<usize>();
    let pb = progress.step_sized(total, format!("Rendering {} groups", total));

    let written: usize = found
        .par_iter()
        .map(|start_groups| -> Result<usize> {
            let dir = output.join(start_groups.start.to_string());
            fs::create_dir_all(&dir)?;

            for (idx, group) in start_groups.groups.iter().enumerate() {
                let canvas = draw_segments(graph, &group.segments, opts)?;
                canvas.save(dir.join(format!("connected_path_{}.svg", idx + 1)))?;
                pb.inc(1);
            }

            let manifest = BufWriter::new(File::create(dir.join("groups.json"))?);
            serde_json::to_writer_pretty(manifest, &start_groups.groups)?;
            info!(
                "Generated {} images in {}",
                start_groups.groups.len(),
                dir.display()
            );
            Ok(start_groups.groups.len())
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .sum();

    progress.finish(format!("Wrote {} images to {}", written, output.display()));
    Ok(written)
}
