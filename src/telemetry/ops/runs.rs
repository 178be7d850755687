use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Runs;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Validate, Save, History }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Validate => "validate", Phase::Save => "save", Phase::History => "history" } }
    fn span(&self) -> Span { match self { Phase::Validate => info_span!("validate"), Phase::Save => info_span!("save"), Phase::History => info_span!("history") } }
}

impl OpMarker for Runs {
    const NAME: &'static str = "runs";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("runs") }
}
