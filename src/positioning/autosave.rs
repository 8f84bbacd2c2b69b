//! Debounced autosave timing

/// Fires once edits have been idle for the debounce interval
#[derive(Clone, Debug, PartialEq)]
pub struct AutosaveTimer {
    debounce_secs: f64,
    last_edit: Option<f64>,
}

impl Default for AutosaveTimer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl AutosaveTimer {
    pub fn new(debounce_secs: f64) -> Self {
        Self {
            debounce_secs,
            last_edit: None,
        }
    }

    /// Record an edit at `now` (seconds), restarting the debounce window
    pub fn touch(&mut self, now: f64) {
        self.last_edit = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    pub fn due(&self, now: f64) -> bool {
        self.last_edit
            .is_some_and(|last_edit| now - last_edit >= self.debounce_secs)
    }

    pub fn clear(&mut self) {
        self.last_edit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_restarts_on_each_edit() {
        let mut timer = AutosaveTimer::new(0.5);
        assert!(!timer.due(10.0));

        timer.touch(1.0);
        assert!(!timer.due(1.2));
        timer.touch(1.3);
        assert!(!timer.due(1.6));
        assert!(timer.due(1.8));

        timer.clear();
        assert!(!timer.is_pending());
        assert!(!timer.due(5.0));
    }
}
