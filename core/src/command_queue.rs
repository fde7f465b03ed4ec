use std::collections::VecDeque;

/// A batch of command text waiting for the ex engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    /// Where the text came from, for diagnostics: a file or variable name.
    pub name: Option<String>,
    pub text: Vec<u8>,
    /// Run before anything already pending.
    pub immediate: bool,
}

/// Pending command batches, newest first. The back of the queue is always an
/// empty entry standing for "nothing running".
#[derive(Debug)]
pub struct CommandQueue {
    entries: VecDeque<QueuedCommand>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(QueuedCommand {
            name: None,
            text: Vec::new(),
            immediate: false,
        });
        Self { entries }
    }
}

impl CommandQueue {
    /// Queues `command` ahead of everything pending. Empty batches are
    /// dropped.
    pub fn push_front(&mut self, command: QueuedCommand) {
        if command.text.is_empty() {
            return;
        }
        self.entries.push_front(command);
    }

    /// True while a batch other than the sentinel is queued.
    pub fn is_running(&self) -> bool {
        self.entries
            .front()
            .is_some_and(|command| !command.text.is_empty())
    }

    /// Removes and returns the next batch. The sentinel is never removed.
    pub fn pop_next(&mut self) -> Option<QueuedCommand> {
        if self.is_running() {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &QueuedCommand> {
        self.entries.iter().filter(|command| !command.text.is_empty())
    }

    /// Number of queued batches, not counting the sentinel.
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
