mod ingest;

pub use ingest::{collect_inputs, open_workbook, IngestionOrchestrator, NullSink, OutcomeSink};
