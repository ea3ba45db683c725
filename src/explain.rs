//! Human- and machine-readable descriptions of process chains.
//!
//! [`ProcessChain::explain`](crate::ProcessChain::explain) walks the
//! recorded steps of a chain without touching any data and reports, for
//! each step, how it will execute: synchronously, or on a worker pool in
//! ordered or unordered mode, and whether it is a barrier that drains its
//! whole input first.

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// The kind of a recorded chain step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum StepKind {
    Explode,
    Map,
    Filter,
    TryMap,
    Sort,
    Transform,
    /// Switch to parallel execution on a pool of `workers`.
    WithPool { workers: usize },
    Unordered,
}

impl StepKind {
    /// Barriers consume their complete input before producing output.
    pub fn is_barrier(&self) -> bool {
        matches!(self, StepKind::Sort | StepKind::Transform)
    }

    fn describe(&self) -> String {
        match self {
            StepKind::Explode => "expand each element into zero or more elements".to_string(),
            StepKind::Map => "map each element".to_string(),
            StepKind::Filter => "keep elements matching a predicate".to_string(),
            StepKind::TryMap => "map each element, dropping failures".to_string(),
            StepKind::Sort => "stable sort of the complete input".to_string(),
            StepKind::Transform => "rewrite the complete input".to_string(),
            StepKind::WithPool { workers } => format!("process on a pool of {workers} workers"),
            StepKind::Unordered => "yield elements in completion order".to_string(),
        }
    }
}

impl Display for StepKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            StepKind::Explode => "Explode",
            StepKind::Map => "Map",
            StepKind::Filter => "Filter",
            StepKind::TryMap => "TryMap",
            StepKind::Sort => "Sort",
            StepKind::Transform => "Transform",
            StepKind::WithPool { .. } => "WithPool",
            StepKind::Unordered => "Unordered",
        };
        f.write_str(name)
    }
}

/// Where and in which order a step produces its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Synchronous,
    ParallelOrdered,
    ParallelUnordered,
}

impl ExecutionMode {
    /// The mode after applying `step` in mode `self`.
    pub(crate) fn after(self, step: &StepKind) -> Self {
        match (self, step) {
            (ExecutionMode::Synchronous, StepKind::WithPool { .. }) => ExecutionMode::ParallelOrdered,
            (ExecutionMode::ParallelUnordered, StepKind::Sort | StepKind::Transform) => {
                ExecutionMode::ParallelOrdered
            }
            (ExecutionMode::ParallelOrdered, StepKind::Unordered) => ExecutionMode::ParallelUnordered,
            (mode, _) => mode,
        }
    }
}

impl Display for ExecutionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(match self {
            ExecutionMode::Synchronous => "synchronous",
            ExecutionMode::ParallelOrdered => "parallel, ordered",
            ExecutionMode::ParallelUnordered => "parallel, unordered",
        })
    }
}

/// One step of an explained chain.
#[derive(Clone, Debug, Serialize)]
pub struct ExplainStep {
    /// Position in the chain, starting at 1.
    pub step: usize,
    pub kind: StepKind,
    /// Mode the step executes in.
    pub mode: ExecutionMode,
    pub is_barrier: bool,
    pub description: String,
}

/// Description of every step of a chain.
#[derive(Clone, Debug, Serialize)]
pub struct ChainExplanation {
    pub realm: String,
    pub steps: Vec<ExplainStep>,
    /// Number of barrier steps.
    pub barriers: usize,
    /// Mode of the final result.
    pub final_mode: ExecutionMode,
}

impl ChainExplanation {
    pub(crate) fn from_steps(realm: &str, kinds: &[StepKind]) -> Self {
        let mut mode = ExecutionMode::Synchronous;
        let mut steps = Vec::with_capacity(kinds.len());
        for (i, kind) in kinds.iter().enumerate() {
            mode = mode.after(kind);
            steps.push(ExplainStep {
                step: i + 1,
                kind: kind.clone(),
                mode,
                is_barrier: kind.is_barrier(),
                description: kind.describe(),
            });
        }
        Self {
            realm: realm.to_string(),
            barriers: steps.iter().filter(|s| s.is_barrier).count(),
            steps,
            final_mode: mode,
        }
    }

    /// Render as pretty-printed JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        serde_json::to_string_pretty(self).context("serializing chain explanation")
    }
}

impl Display for ChainExplanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        writeln!(f, "╔═══════════════════════════════════════════════════════════════╗")?;
        writeln!(f, "║              PROCESS CHAIN EXPLANATION                        ║")?;
        writeln!(f, "╚═══════════════════════════════════════════════════════════════╝")?;
        writeln!(f)?;
        writeln!(f, "┌─ SUMMARY ────────────────────────────────────────────────────┐")?;
        writeln!(f, "│ Realm:             {:>10}", self.realm)?;
        writeln!(f, "│ Steps:             {:>10}", self.steps.len())?;
        writeln!(f, "│ Barrier Steps:     {:>10}", self.barriers)?;
        writeln!(f, "│ Final Mode:        {}", self.final_mode)?;
        writeln!(f, "└──────────────────────────────────────────────────────────────┘")?;
        writeln!(f)?;
        writeln!(f, "┌─ STEPS ──────────────────────────────────────────────────────┐")?;
        for step in &self.steps {
            let barrier_marker = if step.is_barrier { " [BARRIER]" } else { "" };
            writeln!(f, "│")?;
            writeln!(f, "│ Step {}: {}{}", step.step, step.kind, barrier_marker)?;
            writeln!(f, "│   {}", step.description)?;
            writeln!(f, "│   Mode: {}", step.mode)?;
        }
        writeln!(f, "│")?;
        writeln!(f, "└──────────────────────────────────────────────────────────────┘")
    }
}
