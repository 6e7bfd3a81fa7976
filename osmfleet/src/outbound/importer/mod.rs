//! Subprocess-backed importer adapter (C3).

mod subprocess;

pub use subprocess::SubprocessImporterProcess;
