use std::fs::File;
use std::io;
use std::os::fd::{FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::pipe::set_cloexec;

/// Descriptor number under which a child finds the profile pipe's read end.
pub const CHILD_PROFILE_READER_FD: RawFd = 3;
/// Descriptor number under which a child finds the logs pipe's write end.
pub const CHILD_LOGS_WRITER_FD: RawFd = 4;

/// Lowest descriptor used to stage sources before they are moved into place.
const STAGING_FD_FLOOR: libc::c_int = 64;

/// Make `command` hand descriptors to the spawned process.
///
/// Each `(source, target)` pair makes the parent's `source` descriptor appear
/// as `target` in the child. Sources are staged above the target range
/// first, so mappings may overlap (e.g. `4 -> 3` and `3 -> 4`).
///
/// The source descriptors must stay open until the command is spawned.
pub fn map_inherited_fds(command: &mut Command, mappings: &[(RawFd, RawFd)]) {
    let sources: Vec<RawFd> = mappings.iter().map(|(source, _)| *source).collect();
    let targets: Vec<RawFd> = mappings.iter().map(|(_, target)| *target).collect();
    let mut staged: Vec<RawFd> = vec![-1; mappings.len()];

    debug!(?mappings, "mapping inherited descriptors");

    // SAFETY: the hook runs between fork and exec and only calls fcntl/dup2,
    // which are async-signal-safe. It allocates nothing; `staged` is sized
    // before the fork.
    unsafe {
        command.pre_exec(move || {
            for (slot, source) in staged.iter_mut().zip(&sources) {
                let dup = libc::fcntl(*source, libc::F_DUPFD_CLOEXEC, STAGING_FD_FLOOR);
                if dup < 0 {
                    return Err(io::Error::last_os_error());
                }
                *slot = dup;
            }
            for (staged, target) in staged.iter().zip(&targets) {
                if libc::dup2(*staged, *target) < 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            Ok(())
        });
    }
}

/// Adopt a descriptor inherited from the launching process.
///
/// The descriptor is marked close-on-exec so it does not leak further down
/// the process tree.
///
/// # Safety
///
/// `fd` must not be owned by anything else in this process; adopting the same
/// descriptor twice leads to a double close.
pub unsafe fn inherited_file(fd: RawFd) -> Result<File> {
    // SAFETY: F_GETFD only inspects the descriptor flags.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(TransportError::BadDescriptor {
            fd,
            source: io::Error::last_os_error(),
        });
    }

    set_cloexec(fd)?;
    debug!(fd, "adopted inherited descriptor");

    // SAFETY: the descriptor is open and the caller guarantees exclusive ownership.
    Ok(unsafe { File::from_raw_fd(fd) })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::os::fd::{AsRawFd, IntoRawFd};
    use std::process::Stdio;

    use super::*;
    use crate::pipe::pipe;

    #[test]
    fn inherited_file_rejects_closed_descriptor() {
        // SAFETY: descriptor 4242 is not open in the test process.
        let err = unsafe { inherited_file(4242) }.unwrap_err();
        assert!(matches!(err, TransportError::BadDescriptor { fd: 4242, .. }));
    }

    #[test]
    fn inherited_file_adopts_open_descriptor() {
        let (reader, mut writer) = pipe().unwrap();
        let raw = reader.into_raw_fd();

        // SAFETY: ownership of `raw` was released by `into_raw_fd` above.
        let mut adopted = unsafe { inherited_file(raw) }.unwrap();
        writer.write_all(b"ok").unwrap();
        drop(writer);

        let mut out = String::new();
        adopted.read_to_string(&mut out).unwrap();
        assert_eq!(out, "ok");
    }

    #[test]
    fn mapped_descriptor_reaches_child() {
        let (mut reader, writer) = pipe().unwrap();

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg("echo mapped >&7")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        map_inherited_fds(&mut command, &[(writer.as_raw_fd(), 7)]);

        let status = command.status().unwrap();
        assert!(status.success());
        drop(writer);

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out.trim(), "mapped");
    }
}
