//! Session lifecycle for a modal ex/vi editor: boot-time argument handling,
//! screen construction, the interpreter dispatch loop, script loading and
//! teardown. The interpreters themselves are supplied through
//! [`EditorHost`].

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output goes through the streams handed to the driver.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod command_queue;
pub mod config;
mod driver;
mod error;
pub mod exrc;
mod file_ref;
pub mod flags;
mod host;
mod message;
mod mode;
mod normalize;
pub mod options;
mod screen;
pub mod script;
mod session;
mod teardown;
#[cfg(debug_assertions)]
mod trace;

pub use command_queue::CommandQueue;
pub use command_queue::QueuedCommand;
pub use config::Config;
pub use driver::Console;
pub use driver::ExitStatus;
pub use driver::run_editor;
pub use error::ExviErr;
pub use error::Result;
pub use file_ref::FileRef;
pub use file_ref::FileRefId;
pub use host::EditorHost;
pub use host::Event;
pub use message::Message;
pub use message::MessageKind;
pub use message::MessageQueue;
pub use mode::EditorMode;
pub use mode::is_editor_name;
pub use normalize::normalize_legacy_args;
pub use screen::Screen;
pub use screen::ScreenFlags;
pub use screen::ScreenId;
pub use session::Session;
pub use session::SessionFlags;
pub use teardown::end_screen;
pub use teardown::teardown;
