//! Result cursors over world state.

use balance_transfer_common::StoreError;
use tracing::warn;

/// A single state entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Storage key.
    pub key: String,
    /// Raw stored bytes.
    pub value: Vec<u8>,
}

/// Host-side cursor over query results.
///
/// Cursors are finite and single-pass. They hold resources in the host's
/// state-access layer until [`close`](StateQueryIterator::close) is called;
/// dropping one without closing it leaks those resources. Wrap cursors in a
/// [`ScopedCursor`] rather than driving them by hand.
pub trait StateQueryIterator {
    /// Whether another entry is available.
    fn has_next(&self) -> bool;

    /// Fetch the next entry.
    fn next_entry(&mut self) -> Result<KeyValue, StoreError>;

    /// Release the cursor. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Cursor guard that releases the underlying cursor on every exit path.
///
/// Iterates as `Result<KeyValue, StoreError>` and stops after the first
/// error. The cursor is closed when the guard is dropped, or earlier via
/// [`ScopedCursor::close`] when the caller wants to see a close failure.
pub struct ScopedCursor<'a> {
    inner: Box<dyn StateQueryIterator + 'a>,
    closed: bool,
    failed: bool,
}

impl<'a> ScopedCursor<'a> {
    /// Take ownership of a raw cursor.
    pub fn new(inner: Box<dyn StateQueryIterator + 'a>) -> Self {
        Self {
            inner,
            closed: false,
            failed: false,
        }
    }

    /// Close the cursor now and report the outcome.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.closed = true;
        self.inner.close()
    }
}

impl Iterator for ScopedCursor<'_> {
    type Item = Result<KeyValue, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed || self.failed || !self.inner.has_next() {
            return None;
        }
        let entry = self.inner.next_entry();
        if entry.is_err() {
            self.failed = true;
        }
        Some(entry)
    }
}

impl Drop for ScopedCursor<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.close() {
            warn!(error = %e, "Failed to close query cursor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct VecCursor {
        rows: Vec<KeyValue>,
        pos: usize,
        fail_at: Option<usize>,
        closes: Rc<Cell<usize>>,
    }

    impl VecCursor {
        fn boxed(n: usize, fail_at: Option<usize>, closes: &Rc<Cell<usize>>) -> Box<Self> {
            let rows = (0..n)
                .map(|i| KeyValue {
                    key: format!("k{i}"),
                    value: vec![i as u8],
                })
                .collect();
            Box::new(Self {
                rows,
                pos: 0,
                fail_at,
                closes: closes.clone(),
            })
        }
    }

    impl StateQueryIterator for VecCursor {
        fn has_next(&self) -> bool {
            self.pos < self.rows.len()
        }

        fn next_entry(&mut self) -> Result<KeyValue, StoreError> {
            if self.fail_at == Some(self.pos) {
                return Err(StoreError::Iteration("boom".to_string()));
            }
            let row = self.rows[self.pos].clone();
            self.pos += 1;
            Ok(row)
        }

        fn close(&mut self) -> Result<(), StoreError> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_full_iteration_closes_on_drop() {
        let closes = Rc::new(Cell::new(0));
        {
            let cursor = ScopedCursor::new(VecCursor::boxed(3, None, &closes));
            let keys: Vec<_> = cursor.map(|kv| kv.unwrap().key).collect();
            assert_eq!(keys, vec!["k0", "k1", "k2"]);
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_partial_iteration_closes_on_drop() {
        let closes = Rc::new(Cell::new(0));
        {
            let mut cursor = ScopedCursor::new(VecCursor::boxed(5, None, &closes));
            assert!(cursor.next().is_some());
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_error_stops_iteration() {
        let closes = Rc::new(Cell::new(0));
        let mut cursor = ScopedCursor::new(VecCursor::boxed(5, Some(1), &closes));
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().is_err());
        assert!(cursor.next().is_none());
        drop(cursor);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_explicit_close_is_not_repeated_on_drop() {
        let closes = Rc::new(Cell::new(0));
        let cursor = ScopedCursor::new(VecCursor::boxed(2, None, &closes));
        cursor.close().unwrap();
        assert_eq!(closes.get(), 1);
    }
}
