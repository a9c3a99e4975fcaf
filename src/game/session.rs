use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation counter shared by a room and the games it starts.
#[derive(Clone, Debug, Default)]
pub struct SessionCounter(Arc<AtomicU64>);

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation and returns its token. Older tokens go stale.
    pub fn issue(&self) -> SessionToken {
        let generation = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        SessionToken {
            current: self.0.clone(),
            generation,
        }
    }

    /// Makes every issued token stale without starting a new game.
    pub fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
pub struct SessionToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl SessionToken {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
