//! Sequential client name assignment.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Issues unique, monotonically increasing client names.
///
/// Names are never reused, even after the client that held one disconnects.
#[derive(Debug, Default)]
pub struct NameAssigner {
    /// Number of names issued so far
    issued: AtomicUsize,
}

impl NameAssigner {
    /// Creates an assigner whose first name is `Client01`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next name in sequence.
    pub fn assign(&self) -> String {
        let next = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("Client{next:02}")
    }

    /// Number of names handed out so far.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_sequential_zero_padded_names() {
        let names = NameAssigner::new();
        assert_eq!(names.assign(), "Client01");
        assert_eq!(names.assign(), "Client02");
        assert_eq!(names.issued(), 2);
    }

    #[test]
    fn test_padding_grows_past_two_digits() {
        let names = NameAssigner::new();
        let last = (0..100).map(|_| names.assign()).last().unwrap();
        assert_eq!(last, "Client100");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unique_under_concurrency() {
        let names = Arc::new(NameAssigner::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let names = names.clone();
            handles.push(tokio::spawn(async move {
                (0..50).map(|_| names.assign()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let batch = handle.await.unwrap();
            // Each task observes its own names in increasing order.
            let numbers: Vec<usize> = batch
                .iter()
                .map(|name| name.trim_start_matches("Client").parse().unwrap())
                .collect();
            assert!(numbers.windows(2).all(|pair| pair[0] < pair[1]));
            for name in batch {
                assert!(seen.insert(name));
            }
        }
        assert_eq!(seen.len(), 400);
        assert_eq!(names.issued(), 400);
    }
}
