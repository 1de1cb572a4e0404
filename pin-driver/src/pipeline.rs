//! Host pipeline walk
//!
//! Stands in for the host compiler's pass manager: visits the injection
//! points in pipeline order and reaches the ones that were asked for.

use log::info;
use pin_common::InjectPoint;
use pin_protocol::Transport;
use crate::{DriverError, HostSession, ReachOutcome};

/// Outcome per reached point, in pipeline order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub reached: Vec<(InjectPoint, ReachOutcome)>,
}

impl PipelineReport {
    pub fn applied(&self) -> usize {
        self.reached.iter().filter(|(_, o)| *o == ReachOutcome::Applied).count()
    }
}

/// Reach every point in `points`, in pipeline order whatever order they
/// were given in. An empty list means every point.
pub fn run_pipeline<T: Transport>(
    session: &mut HostSession<T>,
    points: &[InjectPoint],
) -> Result<PipelineReport, DriverError> {
    let mut report = PipelineReport::default();
    for point in InjectPoint::ALL.into_iter().filter(|p| points.is_empty() || points.contains(p)) {
        let outcome = session.reach(point)?;
        report.reached.push((point, outcome));
    }
    info!("pipeline done: {} point(s) reached, {} applied", report.reached.len(), report.applied());
    Ok(report)
}
