//! Stress utilities for concurrent drivers.
//!
//! Mirrors how a coordinator drives the managers: a membership watcher,
//! a catalog diff applier, and several routing readers all share one
//! instance.

use qcmeta_core::{
    CollectionId, DmChannel, NodeId, NodeVersion, PartitionId, Segment, SegmentId, TargetIndex,
    VersionManager,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Mutations applied by writers.
    pub writes: usize,
    /// Lookups performed by readers.
    pub reads: usize,
    /// Readers that observed an inconsistent index.
    pub inconsistencies: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(writes: usize, reads: usize, inconsistencies: usize, duration: Duration) -> Self {
        let total = writes + reads;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            writes,
            reads,
            inconsistencies,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Writes: {}", self.writes);
        println!("Reads: {}", self.reads);
        println!("Inconsistencies: {}", self.inconsistencies);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Writer threads; each owns one collection.
    pub writers: usize,
    /// Reader threads.
    pub readers: usize,
    /// Segments each writer adds.
    pub segments_per_writer: usize,
    /// Partitions per collection.
    pub partitions_per_collection: usize,
    /// Membership churn threads against the version manager.
    pub membership_threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writers: 4,
            readers: 4,
            segments_per_writer: 500,
            partitions_per_collection: 4,
            membership_threads: 2,
        }
    }
}

impl StressConfig {
    /// A small run suited to unit tests.
    pub fn quick() -> Self {
        Self {
            writers: 2,
            readers: 2,
            segments_per_writer: 100,
            partitions_per_collection: 2,
            membership_threads: 2,
        }
    }
}

/// Runs writers that build, trim, and drop per-collection targets while
/// readers list and check consistency.
///
/// Each writer `w` files segments under collection `w`, removes every
/// third segment, drops its first partition, and finally removes its
/// collection when `w` is odd.
pub fn stress_target_index(index: &Arc<TargetIndex>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let writes = Arc::new(AtomicUsize::new(0));
    let reads = Arc::new(AtomicUsize::new(0));
    let inconsistencies = Arc::new(AtomicUsize::new(0));
    let writers_done = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for w in 0..config.writers {
        let index = Arc::clone(index);
        let writes = Arc::clone(&writes);
        let writers_done = Arc::clone(&writers_done);
        let config = config.clone();
        handles.push(thread::spawn(move || {
            let collection = CollectionId::new(w as i64);
            let partition = |i: usize| {
                PartitionId::new((w * config.partitions_per_collection + i) as i64)
            };
            index.add_dm_channel(DmChannel::new(collection, format!("{w}-dmc0")));
            writes.fetch_add(1, Ordering::Relaxed);

            for i in 0..config.segments_per_writer {
                let id = SegmentId::new((w * config.segments_per_writer + i) as i64);
                let p = partition(i % config.partitions_per_collection);
                index.add_segment(Segment::new(id, collection, p));
                writes.fetch_add(1, Ordering::Relaxed);
                if i % 3 == 0 {
                    index.remove_segment(id);
                    writes.fetch_add(1, Ordering::Relaxed);
                }
            }
            index.remove_partition(partition(0));
            writes.fetch_add(1, Ordering::Relaxed);
            if w % 2 == 1 {
                index.remove_collection(collection);
                writes.fetch_add(1, Ordering::Relaxed);
            }
            writers_done.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for _ in 0..config.readers {
        let index = Arc::clone(index);
        let reads = Arc::clone(&reads);
        let inconsistencies = Arc::clone(&inconsistencies);
        let writers_done = Arc::clone(&writers_done);
        let writers = config.writers;
        handles.push(thread::spawn(move || loop {
            let finished = writers_done.load(Ordering::SeqCst) == writers;
            for w in 0..writers {
                let collection = CollectionId::new(w as i64);
                let segments = index.get_segments_by_collection(collection);
                if segments.iter().any(|s| s.collection_id != collection) {
                    inconsistencies.fetch_add(1, Ordering::Relaxed);
                }
                let channels = index.get_dm_channels_by_collection(collection);
                if channels.iter().any(|c| c.collection_id != collection) {
                    inconsistencies.fetch_add(1, Ordering::Relaxed);
                }
                reads.fetch_add(2, Ordering::Relaxed);
            }
            if !index.check_consistency() {
                inconsistencies.fetch_add(1, Ordering::Relaxed);
            }
            if finished {
                break;
            }
        }));
    }

    for handle in handles {
        handle.join().expect("stress thread panicked");
    }

    StressTestResult::new(
        writes.load(Ordering::Relaxed),
        reads.load(Ordering::Relaxed),
        inconsistencies.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Churns node membership while readers poll the aggregate bounds.
///
/// Thread `t` upserts node `t` through rounds `0..rounds` with versions
/// `(round, round + 100)`; odd threads remove their node at the end.
pub fn stress_version_manager(
    manager: &Arc<VersionManager>,
    threads: usize,
    rounds: i32,
) -> StressTestResult {
    let start = Instant::now();
    let writes = Arc::new(AtomicUsize::new(0));
    let reads = Arc::new(AtomicUsize::new(0));
    let inconsistencies = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let manager = Arc::clone(manager);
            let writes = Arc::clone(&writes);
            let reads = Arc::clone(&reads);
            let inconsistencies = Arc::clone(&inconsistencies);
            thread::spawn(move || {
                let node = NodeId::new(t as i64);
                for round in 0..rounds {
                    manager.update(NodeVersion::new(node, round, round + 100));
                    writes.fetch_add(1, Ordering::Relaxed);
                    if let Some(bounds) = manager.bounds() {
                        // Every record written here has minimal < current.
                        if bounds.minimal > bounds.current {
                            inconsistencies.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    reads.fetch_add(1, Ordering::Relaxed);
                }
                if t % 2 == 1 {
                    manager.remove_node(node);
                    writes.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("stress thread panicked");
    }

    StressTestResult::new(
        writes.load(Ordering::Relaxed),
        reads.load(Ordering::Relaxed),
        inconsistencies.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
