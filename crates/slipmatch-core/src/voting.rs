use crate::error::SlipmatchError;
use crate::extraction::{PageRange, PageRasterizer, TextRecognizer};
use crate::model::DpiSample;
use crate::parsing::extract_index_lines;
use std::path::Path;

/// Pick the most frequent reading for one index line.
///
/// Ties go to the reading first observed at the lowest resolution.
/// Returns `None` only for an empty sample set.
pub fn vote(samples: &[DpiSample]) -> Option<String> {
    let mut ordered: Vec<&DpiSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.resolution_dpi);

    // (candidate, count) in order of first appearance
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for sample in ordered {
        let candidate = sample.recognized_order_id.as_str();
        match tally.iter_mut().find(|(c, _)| *c == candidate) {
            Some((_, count)) => *count += 1,
            None => tally.push((candidate, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (candidate, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((candidate, count));
        }
    }
    best.map(|(candidate, _)| candidate.to_string())
}

/// Line readings of the index pages at one resolution.
#[derive(Debug, Clone)]
pub struct SweepReading {
    pub dpi: u32,
    pub lines: Vec<String>,
}

/// Vote every line position across all resolutions.
///
/// Position `i` collects the `i`-th line of every reading that has one. A
/// position is kept only while more than half of the readings reach it, so
/// a resolution that invents a trailing line is outvoted like any misread.
pub fn vote_positions(readings: &[SweepReading]) -> Vec<String> {
    let positions = (0..)
        .take_while(|&i| {
            let reached = readings.iter().filter(|r| r.lines.len() > i).count();
            reached * 2 > readings.len()
        })
        .count();

    (0..positions)
        .filter_map(|i| {
            let samples: Vec<DpiSample> = readings
                .iter()
                .filter_map(|r| {
                    r.lines.get(i).map(|line| DpiSample {
                        resolution_dpi: r.dpi,
                        recognized_order_id: line.clone(),
                    })
                })
                .collect();
            vote(&samples)
        })
        .collect()
}

/// Reads the index pages of a shipping-label PDF at every resolution of a
/// DPI sweep and takes the majority reading of each line.
pub struct MultiResolutionVoter<'a> {
    rasterizer: &'a dyn PageRasterizer,
    recognizer: &'a dyn TextRecognizer,
    levels: Vec<u32>,
    workers: usize,
}

impl<'a> MultiResolutionVoter<'a> {
    pub fn new(
        rasterizer: &'a dyn PageRasterizer,
        recognizer: &'a dyn TextRecognizer,
        levels: Vec<u32>,
        workers: usize,
    ) -> Self {
        MultiResolutionVoter {
            rasterizer,
            recognizer,
            levels,
            workers: workers.max(1),
        }
    }

    /// Vote the order IDs listed on `pages` of `pdf`, in listing order.
    ///
    /// Each resolution renders into its own folder under `work_dir`. Levels run
    /// `workers` at a time; all of them finish before voting starts.
    pub fn read_index(
        &self,
        pdf: &Path,
        pages: PageRange,
        work_dir: &Path,
    ) -> Result<Vec<String>, SlipmatchError> {
        let mut readings = Vec::with_capacity(self.levels.len());

        for batch in self.levels.chunks(self.workers) {
            let results: Vec<Result<SweepReading, SlipmatchError>> = std::thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|&dpi| {
                        let pages = pages.clone();
                        scope.spawn(move || self.read_at(pdf, dpi, pages, work_dir))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect()
            });
            for result in results {
                readings.push(result?);
            }
        }

        let voted = vote_positions(&readings);
        tracing::info!(
            levels = readings.len(),
            positions = voted.len(),
            "voted index lines across resolutions"
        );
        Ok(voted)
    }

    fn read_at(
        &self,
        pdf: &Path,
        dpi: u32,
        pages: PageRange,
        work_dir: &Path,
    ) -> Result<SweepReading, SlipmatchError> {
        let out_dir = work_dir.join(format!("dpi_{dpi}"));
        std::fs::create_dir_all(&out_dir)?;

        let images = self
            .rasterizer
            .rasterize(pdf, dpi, Some(pages), &out_dir)?;
        let texts = images
            .values()
            .map(|image| self.recognizer.recognize(image))
            .collect::<Result<Vec<_>, _>>()?;

        let lines = extract_index_lines(&texts);
        tracing::debug!(dpi, lines = lines.len(), "read index pages");
        Ok(SweepReading { dpi, lines })
    }
}
