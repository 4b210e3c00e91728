use std::fmt::Display;
use tracing::warn;

/// Map a batch item by item, dropping (and logging) the items that fail.
///
/// A single malformed resource must not take the whole page down with it.
pub fn map_successful<R, T, E, F>(resources: impl IntoIterator<Item = R>, mut mapper: F) -> Vec<T>
where
    F: FnMut(R) -> Result<T, E>,
    E: Display,
{
    resources
        .into_iter()
        .filter_map(|resource| match mapper(resource) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "dropping item that failed to map");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MappingError;

    #[test]
    fn test_failing_items_are_dropped() {
        let mapped = map_successful(vec!["1", "x", "3"], |s| {
            s.parse::<u32>().map_err(|e| MappingError::invalid("value", e))
        });

        assert_eq!(mapped, vec![1, 3]);
    }

    #[test]
    fn test_all_failing_gives_empty() {
        let mapped: Vec<u32> =
            map_successful(vec!["a", "b"], |_| Err(MappingError::missing("value")));
        assert!(mapped.is_empty());
    }
}
