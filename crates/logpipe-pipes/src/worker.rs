use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::error::{PipesError, Result};

/// Handles to the background threads started by a part's `start_loop`.
///
/// Dropping the handle detaches the threads; they still end once the part
/// is stopped or their streams close.
#[derive(Debug, Default)]
pub struct LoopWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl LoopWorkers {
    pub(crate) fn spawn<F>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(PipesError::Spawn)?;
        self.handles.push(handle);
        Ok(())
    }

    /// Number of threads still owned by this handle.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Whether every worker has returned.
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(JoinHandle::is_finished)
    }

    /// Wait for every worker to return.
    pub fn join(self) {
        for handle in self.handles {
            let name = handle.thread().name().map(str::to_string);
            if handle.join().is_err() {
                warn!(worker = name.as_deref().unwrap_or("unnamed"), "worker thread panicked");
            }
        }
    }
}
