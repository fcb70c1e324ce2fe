//! Presentation hooks the timer calls into
//!
//! Both are optional collaborators; a machine without them still runs and
//! records sessions, it just stays quiet.

use std::time::Duration;

/// Short-lived toast messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, duration: Duration);
}

/// Completion feedback
pub trait CompletionUi: Send + Sync {
    fn show_completion_celebration(&self);
    fn play_alert(&self);
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{CompletionUi, Notifier};

    /// Collects everything the machine presents
    #[derive(Debug, Default)]
    pub struct RecordingUi {
        pub messages: Mutex<Vec<(String, Duration)>>,
        pub celebrations: Mutex<u32>,
        pub alerts: Mutex<u32>,
    }

    impl RecordingUi {
        pub fn messages(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|(m, _)| m.clone())
                .collect()
        }

        pub fn last(&self) -> Option<(String, Duration)> {
            self.messages.lock().unwrap().last().cloned()
        }

        pub fn celebrations(&self) -> u32 {
            *self.celebrations.lock().unwrap()
        }

        pub fn alerts(&self) -> u32 {
            *self.alerts.lock().unwrap()
        }
    }

    impl Notifier for RecordingUi {
        fn notify(&self, message: &str, duration: Duration) {
            self.messages
                .lock()
                .unwrap()
                .push((message.to_string(), duration));
        }
    }

    impl CompletionUi for RecordingUi {
        fn show_completion_celebration(&self) {
            *self.celebrations.lock().unwrap() += 1;
        }

        fn play_alert(&self) {
            *self.alerts.lock().unwrap() += 1;
        }
    }
}
