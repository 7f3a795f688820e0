//! Enumeration driver
//!
//! Walks the profile × region × type cross product and forwards every record
//! to a sink. The lane plan is fixed before anything runs, so which lanes
//! exist (and where global resources are attributed) never depends on
//! timing. Lanes may run concurrently; their records are buffered and
//! written in plan order.

use crate::output::RecordSink;
use crate::progress::{ProgressLog, DEFAULT_PROGRESS_INTERVAL};
use crate::resource::{walk_names, ExecutionContext, Registry, ResourceApi, ResourceDescriptor, ResourceRecord};
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Where records of global resource types are attributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GlobalAttribution {
    /// Listed once per profile, in the first requested region
    #[default]
    FirstRegion,
    /// Listed once per profile with an empty region
    Profile,
}

/// Knobs for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub profiles: Vec<String>,
    pub regions: Vec<String>,
    /// Restrict to these type ids; `None` lists every registered type
    pub types: Option<Vec<String>>,
    /// Lanes in flight at once (at least 1)
    pub concurrency: usize,
    /// Record failing lanes and continue instead of aborting
    pub keep_going: bool,
    pub walk_timeout: Option<Duration>,
    pub global_attribution: GlobalAttribution,
    pub progress_interval: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            profiles: vec!["default".to_string()],
            regions: vec!["us-east-1".to_string()],
            types: None,
            concurrency: 1,
            keep_going: false,
            walk_timeout: None,
            global_attribution: GlobalAttribution::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// One walk: a descriptor bound to a context
#[derive(Debug, Clone)]
pub struct Lane<'r> {
    pub descriptor: &'r ResourceDescriptor,
    /// Context the API is called in
    pub call: ExecutionContext,
    /// Context written into the records
    pub attributed: ExecutionContext,
}

impl<'r> Lane<'r> {
    fn new(descriptor: &'r ResourceDescriptor, call: ExecutionContext) -> Self {
        Self {
            descriptor,
            attributed: call.clone(),
            call,
        }
    }
}

impl fmt::Display for Lane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}/{}",
            self.descriptor.type_id, self.call.profile, self.call.region
        )
    }
}

/// Ordered lanes for a run
#[derive(Debug, Clone)]
pub struct LanePlan<'r> {
    pub lanes: Vec<Lane<'r>>,
    /// Global (profile, region, type) combinations left out by dedup
    pub skipped_globals: usize,
}

/// Compute the lanes of a run in output order
///
/// Profile, then region, then registry declaration order. A global type
/// gets exactly one lane per profile, placed in the first region. Type ids
/// in the filter that the registry does not know match nothing.
pub fn plan_lanes<'r>(registry: &'r Registry, opts: &RunOptions) -> LanePlan<'r> {
    let selected: Vec<&ResourceDescriptor> = registry
        .all()
        .iter()
        .filter(|d| match &opts.types {
            Some(types) => types.iter().any(|t| *t == d.type_id),
            None => true,
        })
        .collect();

    let mut lanes = Vec::new();
    let mut skipped_globals = 0;

    for profile in &opts.profiles {
        for (index, region) in opts.regions.iter().enumerate() {
            for &descriptor in &selected {
                if descriptor.is_global && index > 0 {
                    skipped_globals += 1;
                    continue;
                }

                let mut lane = Lane::new(descriptor, ExecutionContext::new(profile, region));
                if descriptor.is_global && opts.global_attribution == GlobalAttribution::Profile {
                    lane.attributed.region.clear();
                }
                lanes.push(lane);
            }
        }
    }

    LanePlan {
        lanes,
        skipped_globals,
    }
}

/// A lane that failed under `keep_going`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneFailure {
    pub profile: String,
    pub region: String,
    pub type_id: String,
    pub error: String,
}

impl fmt::Display for LaneFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {}/{}: {}",
            self.type_id, self.profile, self.region, self.error
        )
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub lanes_planned: usize,
    pub lanes_run: usize,
    pub skipped_globals: usize,
    pub records: u64,
    pub failures: Vec<LaneFailure>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            "Wrote {} names from {}/{} lanes in {:.2}s ({} global lanes deduplicated)",
            self.records,
            self.lanes_run - self.failures.len(),
            self.lanes_planned,
            self.elapsed.as_secs_f64(),
            self.skipped_globals
        );
        for failure in &self.failures {
            tracing::warn!(run_id = %self.run_id, "Failed lane: {}", failure);
        }
    }
}

/// Walk one lane to completion, buffering its records
async fn collect_lane<A: ResourceApi + ?Sized>(
    api: &A,
    lane: &Lane<'_>,
    opts: &RunOptions,
) -> Result<Vec<ResourceRecord>> {
    tracing::debug!("Listing {}", lane);

    let walk = async {
        let mut progress = ProgressLog::new(lane.descriptor.type_id.as_str(), opts.progress_interval);
        let mut records = Vec::new();

        let names = walk_names(api, lane.descriptor, &lane.call);
        futures::pin_mut!(names);
        while let Some(record) = names.try_next().await? {
            progress.tick();
            records.push(record);
        }

        progress.finish();
        Ok::<_, anyhow::Error>(records)
    };

    let mut records = match opts.walk_timeout {
        Some(limit) => tokio::time::timeout(limit, walk)
            .await
            .map_err(|_| anyhow!("Listing {} timed out after {}s", lane, limit.as_secs_f64()))??,
        None => walk.await?,
    };

    if lane.attributed != lane.call {
        for record in &mut records {
            record.region.clone_from(&lane.attributed.region);
        }
    }

    Ok(records)
}

/// Run every planned lane and write its records to `sink`
///
/// Without `keep_going` the first lane error aborts the run and is
/// returned. With it, failed lanes contribute no records and are listed in
/// the summary instead.
pub async fn run<A, S>(
    api: &A,
    registry: &Registry,
    opts: &RunOptions,
    sink: &mut S,
) -> Result<RunSummary>
where
    A: ResourceApi + ?Sized,
    S: RecordSink + ?Sized,
{
    let run_id = Uuid::new_v4();
    let started = Instant::now();
    let plan = plan_lanes(registry, opts);

    tracing::info!(
        run_id = %run_id,
        "Listing {} lanes across {} profiles and {} regions (concurrency {})",
        plan.lanes.len(),
        opts.profiles.len(),
        opts.regions.len(),
        opts.concurrency.max(1)
    );

    let mut summary = RunSummary {
        run_id,
        lanes_planned: plan.lanes.len(),
        lanes_run: 0,
        skipped_globals: plan.skipped_globals,
        records: 0,
        failures: Vec::new(),
        elapsed: Duration::ZERO,
    };

    let mut results = stream::iter(plan.lanes.iter())
        .map(|lane| async move { (lane, collect_lane(api, lane, opts).await) })
        .buffered(opts.concurrency.max(1));

    let mut current: Option<&ExecutionContext> = None;
    while let Some((lane, result)) = results.next().await {
        if current != Some(&lane.call) {
            tracing::info!(
                "Processing AWS profile [{}] and region [{}]",
                lane.call.profile,
                lane.call.region
            );
            current = Some(&lane.call);
        }

        summary.lanes_run += 1;
        match result {
            Ok(records) => {
                for record in &records {
                    sink.write_record(record)?;
                }
                summary.records += records.len() as u64;
            },
            Err(e) if opts.keep_going => {
                tracing::warn!("Listing {} failed: {:#}", lane, e);
                summary.failures.push(LaneFailure {
                    profile: lane.call.profile.clone(),
                    region: lane.call.region.clone(),
                    type_id: lane.descriptor.type_id.clone(),
                    error: format!("{:#}", e),
                });
            },
            Err(e) => return Err(e.context(format!("Listing {} failed", lane))),
        }
    }

    sink.flush()?;
    summary.elapsed = started.elapsed();
    summary.log();

    Ok(summary)
}
