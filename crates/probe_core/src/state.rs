/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    Draining,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The run was started with this many input items.
    Started { items: usize },
    /// Every item was admitted and the admission queue is closed.
    InputClosed,
    /// Every worker has terminated.
    WorkersJoined,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        self == PipelineState::Completed
    }
}

/// Pure transition function. Events that do not apply to the current state
/// leave it unchanged; `Completed` is never left.
pub fn transition(state: PipelineState, event: PipelineEvent) -> PipelineState {
    match (state, event) {
        (PipelineState::Idle, PipelineEvent::Started { items: 0 }) => PipelineState::Completed,
        (PipelineState::Idle, PipelineEvent::Started { .. }) => PipelineState::Running,
        (PipelineState::Running, PipelineEvent::InputClosed) => PipelineState::Draining,
        (PipelineState::Draining, PipelineEvent::WorkersJoined) => PipelineState::Completed,
        (state, _) => state,
    }
}
