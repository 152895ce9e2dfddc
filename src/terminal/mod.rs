//! Terminal handling and screen composition

pub mod util;
pub mod view;

pub use util::{get_terminal_size, is_tty, restore_termios, set_raw_mode, RawTerminal};
pub use view::compose;
