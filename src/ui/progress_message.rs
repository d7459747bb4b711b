#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressPhase {
    /// Reading, parsing and shaking modules while the graph is built
    Analyzing,
    /// Printing and writing pruned modules
    Emitting,
}

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Started {
        phase: ProgressPhase,
        /// Zero when the amount of work is not known up front
        total: usize,
    },
    Progress {
        phase: ProgressPhase,
        file: Option<String>,
    },
    Finished {
        phase: ProgressPhase,
    },
    Error(String),
}
