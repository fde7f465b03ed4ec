use std::io::Write;

use tracing::debug;
use tracing::warn;

use crate::error::ExviErr;
use crate::error::Result;
use crate::host::EditorHost;
use crate::screen::Screen;
use crate::screen::ScreenId;
use crate::session::Session;
use crate::session::SessionFlags;

/// Ends every screen and writes every pending message to `stderr`.
///
/// Host failures while ending screens are logged and skipped: message
/// delivery is the last thing that must happen before the process exits.
pub fn teardown<H>(session: &mut Session, host: &mut H, stderr: &mut dyn Write)
where
    H: EditorHost + ?Sized,
{
    if let Some(mut ccl) = session.ccl_screen.take() {
        debug!("ending command-line screen {}", ccl.id());
        if let Err(err) = host.end_file(session, &mut ccl, true) {
            warn!("ending command-line file failed: {err}");
        }
        end_unlinked(host, session, ccl);
    }

    while let Some(screen) = session.pop_visible() {
        end_unlinked(host, session, screen);
    }
    while let Some(screen) = session.pop_hidden() {
        end_unlinked(host, session, screen);
    }

    #[cfg(debug_assertions)]
    session.release_shared();

    if session.flags.contains(SessionFlags::BELL_SCHED) {
        if let Err(err) = stderr.write_all(b"\x07") {
            warn!("bell failed: {err}");
        }
    }

    if let Err(err) = session.flush_messages(stderr) {
        warn!("flushing messages failed: {err}");
    }

    #[cfg(debug_assertions)]
    session.close_trace();
}

/// Unlinks `screen` from its queue and hands it to the host.
pub fn end_screen<H>(host: &mut H, session: &mut Session, screen: ScreenId) -> Result<()>
where
    H: EditorHost + ?Sized,
{
    let screen = session
        .remove_screen(screen)
        .ok_or(ExviErr::UnknownScreen(screen))?;
    host.end_screen(session, screen)
}

fn end_unlinked<H>(host: &mut H, session: &mut Session, screen: Screen)
where
    H: EditorHost + ?Sized,
{
    let id = screen.id();
    if let Err(err) = host.end_screen(session, screen) {
        warn!("ending screen {id} failed: {err}");
    }
}
