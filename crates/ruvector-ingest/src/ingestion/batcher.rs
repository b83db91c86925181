//! Size-bounded grouping of records for bulk submission

use crate::types::DocumentRecord;

/// Records submitted together in one bulk call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// Records in insertion order
    pub records: Vec<DocumentRecord>,
    /// Sum of the declared sizes added to this batch
    pub size: u64,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Accumulates records into an ordered list of batches.
///
/// A new batch opens when the running size plus the next delta would go
/// over the limit. Sizes are declared by the caller (on-disk file size), so
/// the limit is approximate with respect to the encoded payload.
#[derive(Debug, Clone)]
pub struct Batcher {
    max_size: u64,
    batches: Vec<Batch>,
    running_size: u64,
}

impl Batcher {
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            batches: Vec::new(),
            running_size: 0,
        }
    }

    /// Add one record with its declared size
    pub fn add(&mut self, record: DocumentRecord, size_delta: u64) {
        self.add_group(vec![record], size_delta);
    }

    /// Add records that come from one file; they share the file's size and
    /// always land in the same batch
    pub fn add_group(&mut self, records: Vec<DocumentRecord>, size_delta: u64) {
        let mut records = records.into_iter();
        let Some(first) = records.next() else {
            return;
        };

        let open_before = self.batches.len();
        self.running_size = add_to_current_batch(
            &mut self.batches,
            first,
            self.running_size,
            size_delta,
            self.max_size,
        );
        if open_before > 0 && self.batches.len() > open_before {
            tracing::debug!(
                "Batch {} is full, opened batch {}",
                open_before - 1,
                open_before
            );
        }

        if let Some(batch) = self.batches.last_mut() {
            batch.records.extend(records);
        }
    }

    /// Running size of the open batch
    pub fn running_size(&self) -> u64 {
        self.running_size
    }

    /// Number of records added so far
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Close the batcher and keep the non-empty batches in creation order
    pub fn finish(self) -> Vec<Batch> {
        self.batches.into_iter().filter(|b| !b.is_empty()).collect()
    }
}

/// Fold one record into `batches` and return the new running size.
///
/// The last batch is the open one. A new batch opens when there is none,
/// or when the open batch is non-empty and `running_size + size_delta`
/// exceeds `max_size`; the running size then restarts from zero.
pub fn add_to_current_batch(
    batches: &mut Vec<Batch>,
    record: DocumentRecord,
    running_size: u64,
    size_delta: u64,
    max_size: u64,
) -> u64 {
    let needs_new = match batches.last() {
        Some(batch) => !batch.is_empty() && running_size + size_delta > max_size,
        None => true,
    };
    let running_size = if needs_new {
        batches.push(Batch::default());
        0
    } else {
        running_size
    };
    if let Some(batch) = batches.last_mut() {
        batch.records.push(record);
        batch.size = running_size + size_delta;
    }
    running_size + size_delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn record(name: &str) -> DocumentRecord {
        DocumentRecord {
            id: name.to_string(),
            name: name.to_string(),
            doc_type: None,
            fields: Map::new(),
            chunk_index: None,
        }
    }

    fn names(batch: &Batch) -> Vec<&str> {
        batch.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_opens_new_batch_over_limit() {
        let mut batcher = Batcher::new(100);
        batcher.add(record("a"), 40);
        batcher.add(record("b"), 50);
        batcher.add(record("c"), 20);
        batcher.add(record("d"), 80);

        let batches = batcher.finish();
        assert_eq!(batches.len(), 2);
        assert_eq!(names(&batches[0]), vec!["a", "b"]);
        assert_eq!(batches[0].size, 90);
        assert_eq!(names(&batches[1]), vec!["c", "d"]);
        assert_eq!(batches[1].size, 100);
    }

    #[test]
    fn test_oversized_single_record() {
        let mut batcher = Batcher::new(10);
        batcher.add(record("big"), 50);
        batcher.add(record("small"), 1);
        let batches = batcher.finish();
        assert_eq!(batches.len(), 2);
        assert_eq!(names(&batches[0]), vec!["big"]);
        assert_eq!(names(&batches[1]), vec!["small"]);
    }

    #[test]
    fn test_group_stays_together() {
        let mut batcher = Batcher::new(100);
        batcher.add(record("a"), 90);
        batcher.add_group(vec![record("b1"), record("b2"), record("b3")], 30);
        assert_eq!(batcher.record_count(), 4);
        assert_eq!(batcher.running_size(), 30);
        let batches = batcher.finish();
        assert_eq!(names(&batches[1]), vec!["b1", "b2", "b3"]);
    }

    #[test]
    fn test_empty_batcher() {
        assert!(Batcher::new(10).finish().is_empty());
    }

    #[test]
    fn test_batcher_matches_fold() {
        let sizes = [6u64, 4, 1, 12, 3, 9];
        let mut batcher = Batcher::new(10);
        let mut batches = Vec::new();
        let mut running = 0;
        for (i, size) in sizes.iter().enumerate() {
            let name = format!("r{}", i);
            batcher.add(record(&name), *size);
            running = add_to_current_batch(&mut batches, record(&name), running, *size, 10);
            assert_eq!(batcher.running_size(), running);
        }
        assert_eq!(batcher.finish(), batches);
    }

    #[test]
    fn test_functional_form() {
        let mut batches = Vec::new();
        let mut running = 0;
        for (name, size) in [("a", 6), ("b", 4), ("c", 1)] {
            running = add_to_current_batch(&mut batches, record(name), running, size, 10);
        }
        assert_eq!(batches.len(), 2);
        assert_eq!(names(&batches[0]), vec!["a", "b"]);
        assert_eq!(names(&batches[1]), vec!["c"]);
        assert_eq!(running, 1);
    }
}
