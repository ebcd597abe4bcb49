//! Process detachment for unattended operation
//!
//! Standard double-fork daemonization: new session, SIGHUP ignored, second
//! fork, root working directory, all inherited descriptors closed, stdio on
//! /dev/null. Steps that are not essential to a correct serving loop
//! degrade to warnings instead of aborting startup; only the fork/setsid
//! backbone is fatal.

use anyhow::{Context, Result};
use nix::fcntl::{open, OFlag};
use nix::sys::resource::{getrlimit, Resource, RLIM_INFINITY};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::stat::{umask, Mode};
use nix::unistd::{chdir, close, dup, fork, setsid, ForkResult};

/// Descriptor limit to sweep when the hard limit is unlimited.
const FALLBACK_NOFILE: u64 = 1024;

/// Detach the process from its controlling terminal.
///
/// The parent and the intermediate child exit inside this function; only
/// the grandchild returns. Returned warnings are tolerable step failures,
/// for the caller to log once a logging sink exists (stderr is gone by the
/// time this returns).
///
/// # Errors
/// Returns an error only if a fork or `setsid` fails.
pub fn detach() -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    // Reset the file-creation mask so daemon-created files get the modes
    // they ask for.
    umask(Mode::empty());

    // Highest descriptor number we may have inherited.
    let max_fd = match getrlimit(Resource::RLIMIT_NOFILE) {
        Ok((_, hard)) if hard != RLIM_INFINITY => hard,
        Ok(_) => FALLBACK_NOFILE,
        Err(e) => {
            warnings.push(format!("Unable to get max file descriptor number: {e}"));
            FALLBACK_NOFILE
        }
    };

    // First fork: the parent returns to the shell immediately.
    match unsafe { fork() }.context("first fork failed")? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    // New session, losing the controlling terminal.
    setsid().context("setsid failed")?;

    // A session leader could still acquire a terminal. Ignore SIGHUP and
    // fork once more so the survivor never can.
    if let Err(e) = unsafe { signal(Signal::SIGHUP, SigHandler::SigIgn) } {
        warnings.push(format!("Unable to ignore SIGHUP: {e}"));
    }

    match unsafe { fork() }.context("second fork failed")? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    // Never pin a removable filesystem.
    if let Err(e) = chdir("/") {
        warnings.push(format!("Unable to change working directory to /: {e}"));
    }

    // Drop every inherited descriptor.
    for fd in 0..max_fd {
        let _ = close(fd as i32);
    }

    // Rebind descriptors 0, 1 and 2 to /dev/null so stray writes to the
    // standard streams go nowhere.
    let fd0 = open("/dev/null", OFlag::O_RDWR, Mode::empty());
    let fd1 = fd0.and_then(dup);
    let fd2 = fd0.and_then(dup);
    if fd0 != Ok(0) || fd1 != Ok(1) || fd2 != Ok(2) {
        warnings.push(format!(
            "Unexpected standard stream descriptors {fd0:?} {fd1:?} {fd2:?}"
        ));
    }

    Ok(warnings)
}
