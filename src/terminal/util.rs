//! Terminal utilities

use crate::{ReadAloudError, Result};
use log::debug;
use nix::libc;
use std::io::{self, Write};
use std::os::unix::io::RawFd;

/// Enter the alternate screen and hide the cursor
const ENTER_SCREEN: &str = "\x1b[?1049h\x1b[?25l";
/// Show the cursor and leave the alternate screen
const LEAVE_SCREEN: &str = "\x1b[?25h\x1b[?1049l";

/// Get the terminal size for the given file descriptor
///
/// Falls back to 80x24 when the size cannot be queried.
pub fn get_terminal_size(fd: RawFd) -> Result<(u16, u16)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };

    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Ok((ws.ws_col, ws.ws_row))
    } else {
        Ok((80, 24))
    }
}

/// Whether `fd` refers to a terminal
pub fn is_tty(fd: RawFd) -> bool {
    unsafe { libc::isatty(fd) != 0 }
}

/// Set raw mode on a terminal file descriptor
///
/// Raw mode delivers every keypress, including control characters and
/// escape sequences, without echo.
pub fn set_raw_mode(fd: RawFd) -> Result<libc::termios> {
    let mut original_termios: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut original_termios) } != 0 {
        return Err(ReadAloudError::Terminal(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    let mut raw_termios = original_termios;

    unsafe {
        libc::cfmakeraw(&mut raw_termios);
    }
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw_termios) } != 0 {
        return Err(ReadAloudError::Terminal(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(original_termios)
}

/// Restore terminal attributes
pub fn restore_termios(fd: RawFd, termios: &libc::termios) {
    unsafe {
        libc::tcsetattr(fd, libc::TCSANOW, termios);
    }
}

/// RAII guard for the full-screen session
///
/// Puts the terminal in raw mode on the alternate screen, and puts
/// everything back when dropped, even on an early error return.
pub struct RawTerminal {
    fd: RawFd,
    termios: libc::termios,
}

impl RawTerminal {
    pub fn enter(fd: RawFd) -> Result<Self> {
        let termios = set_raw_mode(fd)?;
        let guard = Self { fd, termios };

        let mut stdout = io::stdout();
        stdout.write_all(ENTER_SCREEN.as_bytes())?;
        stdout.flush()?;
        debug!("Entered raw mode on fd {}", fd);

        Ok(guard)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(LEAVE_SCREEN.as_bytes());
        let _ = stdout.flush();
        restore_termios(self.fd, &self.termios);
        debug!("Terminal attributes restored");
    }
}
