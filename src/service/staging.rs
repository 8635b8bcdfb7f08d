use std::collections::HashMap;
use std::time::{Duration, Instant};
use parking_lot::Mutex;
use crate::Matrices;

struct Staged
{
    matrices: Matrices,
    staged_at: Instant,
}

/// Staging store
///
/// Keeps matrices uploaded by `put` until a `get` with the same command takes them.
/// A single lock guards the map, so an entry is either absent or completely written
/// when any request looks it up.
#[derive(Default)]
pub struct StagingStore
{
    entries: Mutex<HashMap<String, Staged>>,
}

impl StagingStore
{
    /// Creates an empty store.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Stages `matrices` under `command`.
    ///
    /// Returns `true` if an earlier entry of the command was replaced.
    pub fn put(&self, command: &str, matrices: Matrices) -> bool
    {
        let staged = Staged {
            matrices,
            staged_at: Instant::now(),
        };

        self.entries.lock().insert(command.to_string(), staged).is_some()
    }

    /// Removes and returns the matrices staged under `command`.
    pub fn take(&self, command: &str) -> Option<Matrices>
    {
        self.entries.lock().remove(command).map(|s| s.matrices)
    }

    /// Checks if `command` has staged matrices.
    pub fn contains(&self, command: &str) -> bool
    {
        self.entries.lock().contains_key(command)
    }

    /// Number of staged commands.
    pub fn len(&self) -> usize
    {
        self.entries.lock().len()
    }

    /// Checks if nothing is staged.
    pub fn is_empty(&self) -> bool
    {
        self.entries.lock().is_empty()
    }

    /// Drops entries staged at least `max_age` ago.
    ///
    /// Returns the number of dropped entries.
    pub fn purge_older_than(&self, max_age: Duration) -> usize
    {
        let mut entries = self.entries.lock();
        let before = entries.len();

        entries.retain(|command, staged| {
            let keep = staged.staged_at.elapsed() < max_age;
            if !keep {
                log::debug!("purging stale entry for command: {}", command);
            }
            keep
        });

        before - entries.len()
    }
}

//

#[cfg(test)]
fn sample() -> Matrices
{
    let mut m = Matrices::new();
    m.insert("input".into(), crate::Matrix::vector(vec![1., 2.]));
    m
}

#[test]
fn test_put_take()
{
    let store = StagingStore::new();

    assert!(!store.put("BallServer", sample()));
    assert!(store.put("BallServer", sample()));
    assert_eq!(store.len(), 1);
    assert!(store.contains("BallServer"));

    assert_eq!(store.take("BallServer"), Some(sample()));
    assert_eq!(store.take("BallServer"), None);
    assert!(store.is_empty());
}

#[test]
fn test_purge()
{
    let store = StagingStore::new();
    store.put("a", sample());
    store.put("b", sample());

    assert_eq!(store.purge_older_than(Duration::from_secs(3600)), 0);
    assert_eq!(store.purge_older_than(Duration::ZERO), 2);
    assert!(store.is_empty());
}

#[test]
fn test_concurrent_put()
{
    use std::sync::Arc;

    let store = Arc::new(StagingStore::new());

    let handles: Vec<_> = (0.. 8).map(|i| {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            for j in 0.. 50 {
                store.put(&format!("cmd{}-{}", i, j), sample());
            }
        })
    }).collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.len(), 8 * 50);
    assert_eq!(store.take("cmd7-49"), Some(sample()));
}
