pub mod io;


/// Restore the default SIGPIPE disposition.
///
/// The Rust runtime ignores SIGPIPE, which turns `flines -n big.txt | head`
/// into a write error once `head` exits. With SIG_DFL the process is simply
/// terminated, as a shell user expects. Call first thing in `main`.
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Render an I/O error the way GNU tools print it: the OS message alone,
/// without the " (os error N)" tail Rust's Display appends.
pub fn io_error_msg(e: &std::io::Error) -> String {
    let msg = e.to_string();
    match e.raw_os_error() {
        Some(code) => msg
            .trim_end_matches(&format!(" (os error {})", code))
            .to_string(),
        None => msg,
    }
}
