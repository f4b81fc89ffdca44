use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Process-wide shutdown signal shared by every pipeline stage.
///
/// The flag transitions once, from running to stopped, and never resets.
/// Cloning yields another handle to the same flag.
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; there is no way back.
    pub fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_once_and_stays_set() {
        let flag = StopFlag::new();
        let alias = flag.clone();
        assert!(!alias.is_set());
        flag.trip();
        assert!(alias.is_set());
        flag.trip();
        assert!(flag.is_set());
    }
}
