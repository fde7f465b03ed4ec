use std::collections::VecDeque;
use std::io;
use std::io::Write;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
    /// An operating-system error, text already formatted as `name: reason`.
    SysErr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: Vec<u8>,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Writes the message on its own line. Error kinds carry the program
    /// name as a prefix.
    pub fn write_to(&self, out: &mut dyn Write, program: &str) -> io::Result<()> {
        if self.kind != MessageKind::Info {
            write!(out, "{program}: ")?;
        }
        out.write_all(&self.text)?;
        if self.text.last() != Some(&b'\n') {
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Messages waiting to be shown, oldest first.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: VecDeque<Message>,
}

impl MessageQueue {
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    pub fn info(&mut self, text: impl Into<Vec<u8>>) {
        self.push(Message::new(MessageKind::Info, text));
    }

    pub fn error(&mut self, text: impl Into<Vec<u8>>) {
        self.push(Message::new(MessageKind::Error, text));
    }

    pub fn sys_err(&mut self, name: &str, err: &io::Error) {
        self.push(Message::new(
            MessageKind::SysErr,
            format!("{name}: {}", os_reason(err)),
        ));
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Writes every message in order. Each one leaves the queue before it is
    /// written, so a write failure never causes a repeat. A failed write does
    /// not stop the rest; the first failure is returned once all are tried.
    pub fn drain_to(&mut self, out: &mut dyn Write, program: &str) -> io::Result<()> {
        let mut first_err = None;
        while let Some(message) = self.pop() {
            if let Err(err) = message.write_to(out, program) {
                warn!("failed to write message: {err}");
                first_err.get_or_insert(err);
            }
        }
        if let Err(err) = out.flush() {
            first_err.get_or_insert(err);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The system's text for `err`, without the `(os error N)` suffix.
fn os_reason(err: &io::Error) -> String {
    let text = err.to_string();
    match err.raw_os_error() {
        Some(code) => text
            .strip_suffix(&format!(" (os error {code})"))
            .map_or_else(|| text.clone(), str::to_string),
        None => text,
    }
}
