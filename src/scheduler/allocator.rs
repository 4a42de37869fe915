use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::error::ScheduleResult;
use super::tolerance::ToleranceTable;
use crate::data::model::{Batch, BatchGroup, CategoryMapping, FinalJob, JobId};

// ---------------------------------------------------------------------------
// Round-robin batch building
// ---------------------------------------------------------------------------

/// Drain `mapping` into tolerance-respecting batches.
///
/// Each round visits every non-exhausted category in mapping order and takes
/// up to `tolerance.get(category)` items from the end of its sequence. A round
/// that takes nothing is not emitted. Zero caps on pending categories are
/// rejected before the first round.
pub fn build_batches(
    mapping: CategoryMapping,
    tolerance: &ToleranceTable,
) -> ScheduleResult<BatchGroup> {
    tolerance.check_pending(&mapping)?;
    if mapping.is_empty() {
        return Ok(BatchGroup::new());
    }

    let mut buckets: Vec<(String, Vec<String>, usize)> = mapping
        .into_buckets()
        .into_iter()
        .map(|(category, items)| {
            let cap = tolerance.get(&category);
            (category, items, cap)
        })
        .collect();

    let mut exhausted: HashSet<usize> = buckets
        .iter()
        .enumerate()
        .filter(|(_, (_, items, _))| items.is_empty())
        .map(|(i, _)| i)
        .collect();

    let mut batches = BatchGroup::new();
    while exhausted.len() < buckets.len() {
        let mut batch = Batch::new();
        for (i, (_, items, cap)) in buckets.iter_mut().enumerate() {
            if exhausted.contains(&i) {
                continue;
            }
            let take = (*cap).min(items.len());
            for _ in 0..take {
                if let Some(item) = items.pop() {
                    batch.push(item);
                }
            }
            if items.is_empty() {
                exhausted.insert(i);
            }
        }
        if !batch.is_empty() {
            batches.push(batch);
        }
    }

    log::debug!("Built {} batches from {} domains", batches.len(), buckets.len());
    Ok(batches)
}

// ---------------------------------------------------------------------------
// Fixed-size resplit + shuffle
// ---------------------------------------------------------------------------

/// Split every batch into consecutive chunks of at most `batch_size` items
/// and shuffle each chunk independently.
///
/// `batch_size == 0` uses a chunk size of `max(batch len) + 1`, so every batch
/// stays whole. A batch yielding one chunk gets `JobId::Whole(i)`; otherwise
/// its chunks get `JobId::Chunk { batch: i, chunk: j }`.
///
/// Tolerance is not re-checked here: it is a per-batch constraint, and a chunk
/// boundary may split one domain's allotment across sibling chunks.
pub fn split_jobs<R>(batches: BatchGroup, batch_size: usize, rng: &mut R) -> Vec<FinalJob>
where
    R: Rng + ?Sized,
{
    let k = if batch_size > 0 {
        batch_size
    } else {
        batches.iter().map(Vec::len).max().unwrap_or(0) + 1
    };

    let mut jobs = Vec::new();
    for (i, batch) in batches.into_iter().enumerate() {
        let mut chunks: Vec<Vec<String>> = batch.chunks(k).map(<[String]>::to_vec).collect();
        if chunks.len() == 1 {
            let mut items = chunks.remove(0);
            items.shuffle(rng);
            jobs.push(FinalJob {
                id: JobId::Whole(i),
                items,
            });
            continue;
        }
        for (j, mut items) in chunks.into_iter().enumerate() {
            items.shuffle(rng);
            jobs.push(FinalJob {
                id: JobId::Chunk { batch: i, chunk: j },
                items,
            });
        }
    }
    jobs
}

/// [`build_batches`] followed by [`split_jobs`].
pub fn allocate<R>(
    mapping: CategoryMapping,
    tolerance: &ToleranceTable,
    batch_size: usize,
    rng: &mut R,
) -> ScheduleResult<Vec<FinalJob>>
where
    R: Rng + ?Sized,
{
    let batches = build_batches(mapping, tolerance)?;
    Ok(split_jobs(batches, batch_size, rng))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::data::model::category_of;
    use crate::scheduler::classifier::group;
    use crate::scheduler::error::ScheduleError;

    fn mapping(raw: &[&str]) -> CategoryMapping {
        group(raw.iter().map(|s| s.to_string())).mapping
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    /// Synthetic input: `per_domain[d]` items for domain `d{d}.com`, interleaved.
    fn synthetic(per_domain: &[usize]) -> Vec<String> {
        let longest = per_domain.iter().copied().max().unwrap_or(0);
        let mut out = Vec::new();
        for n in 0..longest {
            for (d, &count) in per_domain.iter().enumerate() {
                if n < count {
                    out.push(format!("u{n}@d{d}.com"));
                }
            }
        }
        out
    }

    fn counts_by_domain(items: &[String]) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for item in items {
            *counts.entry(category_of(item).unwrap()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn round_shape_with_unit_tolerance() {
        let batches = build_batches(
            mapping(&["a@x.com", "b@x.com", "c@x.com", "d@y.com"]),
            &ToleranceTable::new(1),
        )
        .unwrap();

        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), [2, 1, 1]);
        assert_eq!(sorted(batches[0].clone()), ["c@x.com", "d@y.com"]);
        assert_eq!(batches[1], ["b@x.com"]);
        assert_eq!(batches[2], ["a@x.com"]);
    }

    #[test]
    fn override_allows_more_per_round() {
        let t = ToleranceTable::new(1).with_override("x.com", 2);
        let m = mapping(&["a@x.com", "b@x.com", "c@x.com", "d@y.com"]);
        let batches = build_batches(m, &t).unwrap();
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), [3, 1]);
    }

    #[test]
    fn zero_tolerance_fails_before_any_round() {
        let t = ToleranceTable::new(1).with_override("x.com", 0);
        let err = build_batches(mapping(&["a@x.com"]), &t).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::ZeroTolerance {
                category: "x.com".into()
            }
        );

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(allocate(mapping(&["a@y.com"]), &ToleranceTable::new(0), 0, &mut rng).is_err());
    }

    #[test]
    fn empty_mapping_yields_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let jobs = allocate(CategoryMapping::new(), &ToleranceTable::new(0), 0, &mut rng).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn fixture_scenario_ids_and_membership() {
        // batch_size 2, default 1, example1.com 2
        let t = ToleranceTable::new(1).with_override("example1.com", 2);
        let m = mapping(&[
            "user0@example1.com",
            "user2@example1.com",
            "user3@example2.com",
            "user5@example2.com",
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let jobs = allocate(m, &t, 2, &mut rng).unwrap();

        let ids: Vec<String> = jobs.iter().map(|j| j.id.to_string()).collect();
        assert_eq!(ids, ["0_0", "0_1", "1"]);
        assert_eq!(sorted(jobs[0].items.clone()), ["user0@example1.com", "user2@example1.com"]);
        assert_eq!(jobs[1].items, ["user5@example2.com"]);
        assert_eq!(jobs[2].items, ["user3@example2.com"]);
    }

    #[test]
    fn unlimited_batch_size_keeps_batches_whole() {
        let batches = vec![
            vec!["a@x.com".to_string(), "b@y.com".to_string(), "c@z.com".to_string()],
            vec!["d@x.com".to_string()],
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let jobs = split_jobs(batches, 0, &mut rng);
        assert_eq!(
            jobs.iter().map(|j| j.id).collect::<Vec<_>>(),
            [JobId::Whole(0), JobId::Whole(1)]
        );
        assert_eq!(jobs[0].len(), 3);
    }

    #[test]
    fn chunks_follow_batch_order_before_shuffle() {
        let batch: Batch = (0..5).map(|n| format!("u{n}@d{n}.com")).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let jobs = split_jobs(vec![batch.clone()], 2, &mut rng);

        assert_eq!(jobs.len(), 3);
        assert_eq!(sorted(jobs[0].items.clone()), sorted(batch[0..2].to_vec()));
        assert_eq!(sorted(jobs[1].items.clone()), sorted(batch[2..4].to_vec()));
        assert_eq!(jobs[2].items, batch[4..5]);
        assert_eq!(jobs[2].id, JobId::Chunk { batch: 0, chunk: 2 });
    }

    #[test]
    fn invariants_hold_on_uneven_input() {
        let input = synthetic(&[17, 5, 1, 9, 30, 2]);
        let t = ToleranceTable::new(2).with_override("d4.com", 4).with_override("d0.com", 1);

        let refs: Vec<&str> = input.iter().map(String::as_str).collect();
        let batches = build_batches(mapping(&refs), &t).unwrap();
        for batch in &batches {
            for (domain, count) in counts_by_domain(batch) {
                assert!(count <= t.get(&domain), "{domain} has {count} in one batch");
            }
        }
        // d0 needs 17 rounds at cap 1, d4 needs ceil(30 / 4) = 8.
        assert_eq!(batches.len(), 17);

        for batch_size in [0, 1, 3, 4, 100] {
            let mut rng = ChaCha8Rng::seed_from_u64(batch_size as u64);
            let jobs = split_jobs(batches.clone(), batch_size, &mut rng);
            if batch_size > 0 {
                assert!(jobs.iter().all(|j| j.len() <= batch_size && !j.is_empty()));
            }
            let all: Vec<String> = jobs.into_iter().flat_map(|j| j.items).collect();
            assert_eq!(sorted(all), sorted(input.clone()));
        }
    }

    #[test]
    fn same_seed_same_output() {
        let input = synthetic(&[6, 4, 3]);
        let run = |seed| {
            let refs: Vec<&str> = input.iter().map(String::as_str).collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            allocate(mapping(&refs), &ToleranceTable::new(2), 3, &mut rng).unwrap()
        };

        assert_eq!(run(11), run(11));
        let ids = |jobs: Vec<FinalJob>| {
            jobs.into_iter()
                .map(|j| (j.id, sorted(j.items)))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(run(11)), ids(run(12)));
    }
}
