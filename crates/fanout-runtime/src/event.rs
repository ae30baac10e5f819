//! Run events.

use fanout_models::Target;

/// Events emitted by the engine while a run is in progress.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A task acquired a pool slot and is about to invoke the command.
    TaskStarted {
        /// Target being processed.
        target: Target,
    },
    /// A task's result was written to the sink.
    TaskFinished {
        /// Target that was processed.
        target: Target,
        /// Bytes appended to the sink.
        bytes: usize,
    },
    /// A task failed to run or to write its result.
    TaskFailed {
        /// Target that failed.
        target: Target,
        /// Error message.
        error: String,
    },
    /// Every task has finished. Sent once per run.
    Completed {
        /// Number of targets dispatched.
        total: usize,
        /// Number of failed tasks.
        failed: usize,
    },
}

impl RunEvent {
    /// Returns the target associated with this event, if any.
    pub fn target(&self) -> Option<&Target> {
        match self {
            RunEvent::TaskStarted { target } => Some(target),
            RunEvent::TaskFinished { target, .. } => Some(target),
            RunEvent::TaskFailed { target, .. } => Some(target),
            RunEvent::Completed { .. } => None,
        }
    }

    /// Returns true if this is a failure event.
    pub fn is_error(&self) -> bool {
        matches!(self, RunEvent::TaskFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_target() {
        let target = Target::parse("host1").unwrap();

        let event = RunEvent::TaskStarted {
            target: target.clone(),
        };
        assert_eq!(event.target(), Some(&target));

        let event = RunEvent::TaskFinished {
            target: target.clone(),
            bytes: 6,
        };
        assert_eq!(event.target(), Some(&target));

        let event = RunEvent::Completed {
            total: 1,
            failed: 0,
        };
        assert!(event.target().is_none());
    }

    #[test]
    fn test_event_is_error() {
        let target = Target::parse("host1").unwrap();

        let event = RunEvent::TaskFailed {
            target: target.clone(),
            error: "spawn failed".to_string(),
        };
        assert!(event.is_error());

        let event = RunEvent::TaskStarted { target };
        assert!(!event.is_error());
    }
}
