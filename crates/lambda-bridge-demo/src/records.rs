//! Stream record handler used by the demo.

use lambda_bridge::events::StreamRecord;
use lambda_bridge::{BoxError, InvocationContext, RecordHandler, ScopedLogger};

/// Logs each record's data as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataLogger;

impl DataLogger {
    /// Line logged for `record`.
    #[must_use]
    pub fn describe(record: &StreamRecord) -> String {
        format!(
            "partition {}: {}",
            record.kinesis.partition_key,
            String::from_utf8_lossy(&record.kinesis.data)
        )
    }
}

impl RecordHandler<StreamRecord> for DataLogger {
    fn handle(
        &self,
        _context: &InvocationContext,
        record: &StreamRecord,
        logger: &ScopedLogger,
    ) -> Result<(), BoxError> {
        logger.info(&Self::describe(record));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_bridge::events::{EventSource, Stream};

    #[test]
    fn describes_decoded_data() {
        let payload = br#"{"Records":[{"eventID":"ev1","kinesis":{"partitionKey":"foo","data":"aGVsbG8="}}]}"#;
        let records = Stream::decode(payload).expect("decode stream batch");
        let record = records.first().expect("one record");
        assert_eq!(DataLogger::describe(record), "partition foo: hello");
    }
}
