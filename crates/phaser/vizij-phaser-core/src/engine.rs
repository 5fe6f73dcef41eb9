//! Command surface: `calculate` and `reset_keyframes`.
//!
//! Both validate the frame range and the active root before any mutation;
//! `calculate` also refuses ranges too wide to sample. A
//! failed precondition is reported once through the provider and returned as
//! [`Outcome::Rejected`]; nothing is cleared or written.
//!
//! Pass order: collect → erase → sample → propagate.

use crate::config::Config;
use crate::erase::erase_keyframes;
use crate::error::PhaserError;
use crate::frames::FrameInterval;
use crate::hierarchy::{collect_tree, Tree};
use crate::ids::{NodeHandle, NodeIndex};
use crate::outputs::{Outcome, PassReport, Rejection};
use crate::propagate::propagate;
use crate::provider::{FrameCursor, Severity, TransformProvider};
use crate::sampling::sample_baseline;

fn reject<P: TransformProvider + ?Sized>(provider: &mut P, rejection: Rejection) -> Outcome {
    let msg = rejection.message();
    log::info!("phaser pass rejected: {msg}");
    provider.report(Severity::Info, &msg);
    Outcome::Rejected(rejection)
}

/// Shared precondition checks. On failure the rejection has already been reported.
fn prepare<P: TransformProvider + ?Sized>(
    provider: &mut P,
    start: i32,
    end: i32,
) -> Result<(FrameInterval, NodeHandle, Tree), Outcome> {
    let interval = FrameInterval::new(start, end)
        .map_err(|_| reject(provider, Rejection::InvalidFrameRange { start, end }))?;
    let root = match provider.active_root() {
        Some(root) => root,
        None => return Err(reject(provider, Rejection::NoActiveRoot)),
    };
    let tree = match collect_tree(&*provider, &root) {
        Some(tree) => tree,
        None => return Err(reject(provider, Rejection::RootNotAnimatable { root })),
    };
    Ok((interval, root, tree))
}

/// Bake phase-delayed rotation keys for every descendant of the active root.
///
/// Returns `Err` only for non-finite parameters; precondition failures are
/// reported and come back as `Ok(Outcome::Rejected(..))`.
pub fn calculate<P: TransformProvider + ?Sized>(
    provider: &mut P,
    config: &Config,
) -> Result<Outcome, PhaserError> {
    let params = config.parameters()?;
    let (interval, root, tree) = match prepare(provider, config.start_frame, config.end_frame) {
        Ok(prepared) => prepared,
        Err(outcome) => return Ok(outcome),
    };
    if !interval.is_sampleable() {
        let rejection = Rejection::FrameRangeTooWide {
            start: interval.start(),
            end: interval.end(),
        };
        return Ok(reject(provider, rejection));
    }

    let mut cursor = FrameCursor::acquire(provider);

    // Clear fully before writing so stale output never stacks with new output.
    let keys_cleared = erase_keyframes(&mut *cursor, &tree, interval);
    let baseline = sample_baseline(&mut cursor, &tree, interval);
    let summary = propagate(&mut *cursor, &tree, &baseline, &params, config.debug);

    let handle_of = |idx: NodeIndex| tree.node(idx).handle.clone();
    let report = PassReport {
        nodes_collected: tree.len(),
        keys_cleared,
        keys_written: summary.keys_written,
        suppressed_frames: summary.suppressed_frames,
        dropped: baseline.dropped().iter().copied().map(handle_of).collect(),
        skipped: summary.skipped.iter().copied().map(handle_of).collect(),
        diagnostics: summary.diagnostics,
    };

    if report.excluded() > 0 {
        let msg = format!(
            "{} node(s) were unavailable during sampling; they were excluded and left at their baseline pose.",
            report.excluded()
        );
        cursor.report(Severity::Warning, &msg);
    }

    log::info!(
        "phaser '{root}' [{}, {}]: {} node(s), {} key(s) written, {} cleared, {} suppressed",
        interval.start(),
        interval.end(),
        report.nodes_collected,
        report.keys_written,
        report.keys_cleared,
        report.suppressed_frames
    );
    Ok(Outcome::Completed(report))
}

/// Remove phase keys over `[start, end]` from the active root's hierarchy.
pub fn reset_keyframes<P: TransformProvider + ?Sized>(
    provider: &mut P,
    start: i32,
    end: i32,
) -> Outcome {
    let (interval, root, tree) = match prepare(provider, start, end) {
        Ok(prepared) => prepared,
        Err(outcome) => return outcome,
    };

    let keys_cleared = erase_keyframes(provider, &tree, interval);
    provider.force_evaluate();

    log::info!(
        "phaser reset '{root}' [{}, {}]: {keys_cleared} key(s) cleared on {} node(s)",
        interval.start(),
        interval.end(),
        tree.len()
    );
    Outcome::Completed(PassReport {
        nodes_collected: tree.len(),
        keys_cleared,
        ..PassReport::default()
    })
}
