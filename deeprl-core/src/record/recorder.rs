use super::Record;

/// Writes records to an output destination.
pub trait Recorder {
    /// Writes a record.
    ///
    /// Failures of the destination are logged, never propagated, so that a
    /// broken log sink does not abort training.
    fn write(&mut self, record: Record);

    /// Flushes buffered records, if any.
    fn flush(&mut self) {}
}
