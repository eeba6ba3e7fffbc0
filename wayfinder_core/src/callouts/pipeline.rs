// wayfinder_core/src/callouts/pipeline.rs

//! Hands callout batches to the audio output one at a time.

use crate::messages::PositionedString;

/// Where callouts are spoken.
///
/// `play` queues a batch and returns immediately; the owner reports completion by
/// sending [`PipelineEvent::AudioQueueEmpty`] to the pipeline.
pub trait AudioSink {
    fn play(&mut self, batch: &[PositionedString]);

    /// Stops playback and drops anything queued.
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Playing,
    /// Ignores everything until reset.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Submit(Vec<PositionedString>),
    AudioQueueEmpty,
    Cancel,
    Reset,
}

/// Serializes callout batches onto an [`AudioSink`].
///
/// While a batch plays at most one more is held back; a newer batch replaces it, as
/// stale callouts are worse than missed ones.
#[derive(Debug, Clone, Default)]
pub struct CalloutPipeline {
    state: PipelineState,
    pending: Option<Vec<PositionedString>>,
    batches_played: usize,
}

impl CalloutPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn batches_played(&self) -> usize {
        self.batches_played
    }

    fn start(&mut self, batch: Vec<PositionedString>, sink: &mut dyn AudioSink) {
        sink.play(&batch);
        self.batches_played += 1;
        self.state = PipelineState::Playing;
    }

    pub fn handle(&mut self, event: PipelineEvent, sink: &mut dyn AudioSink) -> PipelineState {
        let previous = self.state;
        match (self.state, event) {
            (_, PipelineEvent::Reset) => {
                self.pending = None;
                self.state = PipelineState::Idle;
            }
            (PipelineState::Cancelled, _) => {}
            (_, PipelineEvent::Cancel) => {
                sink.clear();
                self.pending = None;
                self.state = PipelineState::Cancelled;
            }
            (_, PipelineEvent::Submit(batch)) if batch.is_empty() => {}
            (PipelineState::Idle, PipelineEvent::Submit(batch)) => self.start(batch, sink),
            (PipelineState::Playing, PipelineEvent::Submit(batch)) => {
                if self.pending.replace(batch).is_some() {
                    tracing::debug!("replaced a callout batch that never played");
                }
            }
            (PipelineState::Playing, PipelineEvent::AudioQueueEmpty) => match self.pending.take() {
                Some(batch) => self.start(batch, sink),
                None => self.state = PipelineState::Idle,
            },
            (PipelineState::Idle, PipelineEvent::AudioQueueEmpty) => {}
        }
        if previous != self.state {
            tracing::trace!(from = ?previous, to = ?self.state, "callout pipeline");
        }
        self.state
    }
}
