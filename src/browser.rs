//! Hand a link to the platform's default opener.

use std::io;
use tracing::debug;

/// Open `url` in the default browser without blocking the UI.
///
/// The opener is fully detached, so nothing is left to reap afterwards.
pub fn open(url: &str) -> io::Result<()> {
    debug!(%url, "Opening link");
    ::open::that_detached(url)
}
