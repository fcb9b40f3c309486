//! Readiness multiplexing over raw file descriptors.
//!
//! The session loops are single-threaded: they block here while waiting
//! for readiness across all watched sources (listener, connections,
//! local input) and never while processing a frame. This is a thin
//! wrapper over `poll(2)`.

use std::os::fd::RawFd;

use crate::error::{Result, TransportError};

/// Block until at least one of `fds` is readable (or has hung up), and
/// return a readiness flag per descriptor, index-aligned with the input.
///
/// Hangup and error conditions are reported as readable so the caller's
/// next read observes the closure instead of blocking forever.
pub fn wait_readable(fds: &[RawFd]) -> Result<Vec<bool>> {
    let mut pollfds: Vec<libc::pollfd> = fds
        .iter()
        .map(|&fd| libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    loop {
        // SAFETY: `pollfds` is a valid, writable array of `pollfds.len()`
        // entries for the duration of the call.
        let rc = unsafe {
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                -1, // no timeout; blocking until readiness is the contract
            )
        };

        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(TransportError::Poll(err));
        }

        let ready = pollfds
            .iter()
            .map(|p| p.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
            .collect();
        return Ok(ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn reports_readable_stream() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(b"x").unwrap();

        let ready = wait_readable(&[right.as_raw_fd()]).unwrap();
        assert_eq!(ready, vec![true]);
    }

    #[test]
    fn only_the_ready_source_is_flagged() {
        let (mut left_a, right_a) = UnixStream::pair().unwrap();
        let (_left_b, right_b) = UnixStream::pair().unwrap();
        left_a.write_all(b"x").unwrap();

        let ready = wait_readable(&[right_a.as_raw_fd(), right_b.as_raw_fd()]).unwrap();
        assert_eq!(ready, vec![true, false]);
    }

    #[test]
    fn hangup_counts_as_readable() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(left);

        let ready = wait_readable(&[right.as_raw_fd()]).unwrap();
        assert_eq!(ready, vec![true]);
    }
}
