use crate::plan::PlannedOperation;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Group operations by destination folder name and keep the groups with more
/// than one source. Names are compared exactly, without the parent path.
pub fn find_duplicate_targets(operations: &[PlannedOperation]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut targets: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for op in operations {
        targets
            .entry(op.destination_name())
            .or_default()
            .push(op.source.clone());
    }

    targets.retain(|_, sources| sources.len() > 1);
    targets
}
