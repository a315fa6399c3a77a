//! Error types for the worker pool.
//!
//! Dispatching work never fails at run time; the only fallible operation is
//! creating worker threads, which happens when the pool is built or grown.

/// Represents errors that can occur while managing the worker pool.
#[derive(Debug)]
pub enum PoolError {
    /// The operating system refused to create a worker thread.
    Spawn(std::io::Error),
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::Spawn(err) => write!(f, "Failed to spawn worker thread: {}", err),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Spawn(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        PoolError::Spawn(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn spawn_error_exposes_its_source() {
        let err = PoolError::from(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            "out of threads",
        ));
        assert_eq!(
            err.to_string(),
            "Failed to spawn worker thread: out of threads"
        );
        assert!(err.source().is_some());
    }
}
