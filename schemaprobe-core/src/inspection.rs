//! One inspection run: connect, describe, sample, release.

use crate::connection::{ConnectionHandle, ConnectionManager, Connector};
use crate::error::Stage;
use crate::inspector::SchemaInspector;
use crate::models::{ColumnDescriptor, ErrorInfo, InspectionReport, SamplingOptions, TableSample};
use crate::sampler::DataSampler;

/// What to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionRequest {
    /// Table to describe
    pub table: String,
    /// Sampling options, `None` to skip sampling
    pub sampling: Option<SamplingOptions>,
}

impl InspectionRequest {
    /// Describe `table` and sample it with default options.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            sampling: Some(SamplingOptions::default()),
        }
    }

    /// Builder method to replace the sampling options.
    pub fn with_sampling(mut self, sampling: Option<SamplingOptions>) -> Self {
        self.sampling = sampling;
        self
    }
}

/// Lifecycle of a run. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing started
    Idle,
    /// Opening the connection
    Connecting,
    /// Reading column metadata
    Describing,
    /// Reading sample rows
    Sampling,
    /// Building the report
    Reporting,
    /// Connection released (or never opened)
    Closed,
}

/// Drives one run against a [`ConnectionManager`].
#[derive(Debug)]
pub struct Inspection<C> {
    manager: ConnectionManager<C>,
    inspector: SchemaInspector,
    sampler: DataSampler,
}

impl<C: Connector> Inspection<C> {
    /// Creates a run over `manager`.
    pub fn new(manager: ConnectionManager<C>) -> Self {
        Self {
            manager,
            inspector: SchemaInspector::new(),
            sampler: DataSampler::new(),
        }
    }

    /// Runs the inspection and returns the report.
    ///
    /// Never fails: every error becomes a failed report. The connection, once
    /// acquired, is released before this returns on every path.
    pub async fn run(&self, request: &InspectionRequest) -> InspectionReport {
        let mut phase = Phase::Idle;
        transition(&mut phase, Phase::Connecting);

        let mut handle = match self.manager.acquire().await {
            Ok(handle) => handle,
            Err(e) => {
                transition(&mut phase, Phase::Reporting);
                transition(&mut phase, Phase::Closed);
                return InspectionReport::failed(&request.table, ErrorInfo::from_connection(&e));
            }
        };

        let outcome = self.inspect(&mut handle, request, &mut phase).await;
        transition(&mut phase, Phase::Reporting);

        self.manager.release(&mut handle).await;
        transition(&mut phase, Phase::Closed);

        match outcome {
            Ok((columns, sample)) => InspectionReport::succeeded(&request.table, columns, sample),
            Err(info) => InspectionReport::failed(&request.table, info),
        }
    }

    async fn inspect(
        &self,
        handle: &mut ConnectionHandle,
        request: &InspectionRequest,
        phase: &mut Phase,
    ) -> Result<(Vec<ColumnDescriptor>, Option<TableSample>), ErrorInfo> {
        transition(phase, Phase::Describing);
        let columns = self
            .inspector
            .describe(handle, &request.table)
            .await
            .map_err(|e| {
                tracing::debug!("Describe failed: {:?}", e);
                ErrorInfo::from_schema(Stage::Describe, &e)
            })?;

        let Some(options) = &request.sampling else {
            return Ok((columns, None));
        };

        transition(phase, Phase::Sampling);
        let sample = self
            .sampler
            .sample(handle, &request.table, Some(&columns), options)
            .await
            .map_err(|e| {
                tracing::debug!("Sample failed: {:?}", e);
                ErrorInfo::from_schema(Stage::Sample, &e)
            })?;

        Ok((columns, Some(sample)))
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    tracing::debug!("Inspection phase {:?} -> {:?}", phase, next);
    *phase = next;
}
