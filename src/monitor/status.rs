/// Latch that keeps the "running validation" status line to once per validation run.
///
/// Logging only: nothing in confirmation or alerting reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStatus {
    in_progress: bool,
}

impl ValidationStatus {
    /// Mark a validating frame. Returns `true` when this starts a new run, i.e. when the
    /// status line should be printed.
    pub fn begin(&mut self) -> bool {
        !std::mem::replace(&mut self.in_progress, true)
    }

    pub fn clear(&mut self) {
        self.in_progress = false;
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announces_once_per_run() {
        let mut status = ValidationStatus::default();
        assert!(status.begin());
        assert!(!status.begin());
        assert!(status.in_progress());

        status.clear();
        assert!(status.begin());
    }
}
