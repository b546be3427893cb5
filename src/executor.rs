//! Assembly plan execution
//!
//! Clips are encoded one at a time in frame order, or on a bounded `rayon`
//! pool. Either way the concatenation manifest comes from the plan, so clip
//! completion order never affects playback order. The first failure raises the
//! shared cancel flag: queued clips are skipped and running tools are killed.

use crate::plan::AssemblyPlan;
use crate::tools::{AudioTranscoder, CancelFlag, ClipEncoder, StreamAssembler};
use crate::{Error, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::sync::Mutex;

/// Collaborators a plan runs against
pub struct PlanTools<'a> {
    pub clip_encoder: &'a dyn ClipEncoder,
    pub assembler: &'a dyn StreamAssembler,
    pub transcoder: &'a dyn AudioTranscoder,
}

/// Run every job of `plan`, failing on the first error
pub fn execute_plan(
    plan: &AssemblyPlan,
    tools: &PlanTools<'_>,
    jobs: usize,
    cancel: &CancelFlag,
) -> Result<()> {
    if jobs == 0 {
        return Err(Error::InvalidInput("jobs must be at least 1".to_string()));
    }
    for dir in plan.work_dirs() {
        std::fs::create_dir_all(dir)?;
    }

    info!("Encoding {} clips ({} at a time)", plan.clips.len(), jobs);
    if jobs == 1 {
        encode_sequential(plan, tools.clip_encoder, cancel)?;
    } else {
        encode_parallel(plan, tools.clip_encoder, jobs, cancel)?;
    }

    check_cancelled(cancel)?;
    plan.manifest.write()?;
    info!("Concatenating clips into {}", plan.manifest.output.display());
    tools.assembler.concat(&plan.manifest, cancel)?;

    if let Some(job) = &plan.audio_encode {
        check_cancelled(cancel)?;
        info!("Encoding audio at {} kbps", job.bitrate_kbps);
        tools.transcoder.encode_lossy(job, cancel)?;
    }

    check_cancelled(cancel)?;
    info!("Muxing into {}", plan.mux.output.display());
    tools.assembler.mux(&plan.mux, cancel)?;

    if !plan.mux.output.exists() {
        return Err(Error::MissingOutput(plan.mux.output.clone()));
    }
    Ok(())
}

fn check_cancelled(cancel: &CancelFlag) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

fn encode_sequential(
    plan: &AssemblyPlan,
    encoder: &dyn ClipEncoder,
    cancel: &CancelFlag,
) -> Result<()> {
    for job in &plan.clips {
        check_cancelled(cancel)?;
        debug!("Encoding clip {} ({})", job.frame_index, job.clip_duration);
        encoder.encode_clip(job, cancel)?;
    }
    Ok(())
}

fn encode_parallel(
    plan: &AssemblyPlan,
    encoder: &dyn ClipEncoder,
    jobs: usize,
    cancel: &CancelFlag,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| Error::InvalidInput(format!("failed to start worker pool: {}", e)))?;

    // Raised by a clip failure without looking like a caller abort
    let abort = cancel.child();
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    pool.install(|| {
        plan.clips.par_iter().for_each(|job| {
            if abort.is_cancelled() {
                return;
            }
            debug!("Encoding clip {} ({})", job.frame_index, job.clip_duration);
            if let Err(e) = encoder.encode_clip(job, &abort) {
                let mut slot = first_error.lock().unwrap_or_else(|p| p.into_inner());
                if slot.is_none() {
                    *slot = Some(e);
                }
                abort.cancel();
            }
        });
    });

    let first_error = first_error.into_inner().unwrap_or_else(|p| p.into_inner());
    match first_error {
        Some(e) => Err(e),
        None => check_cancelled(cancel),
    }
}
