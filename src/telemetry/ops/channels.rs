use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Channels;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Fetch, Save }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Fetch => "fetch", Phase::Save => "save" } }
    fn span(&self) -> Span { match self { Phase::Fetch => info_span!("fetch"), Phase::Save => info_span!("save") } }
}

impl OpMarker for Channels {
    const NAME: &'static str = "channels";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("channels") }
}
