//! readaloud main entry point
//!
//! The main loop monitors three sources:
//! 1. stdin (user keyboard input) - routed through the key handlers
//! 2. speech capability events - folded into the playback state
//! 3. Signals (SIGWINCH for resize) - redraws at the new size

use log::{debug, error, info, warn};
use mio::{Events, Interest, Poll, Token};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use readaloud::coordinator::LocalePreference;
use readaloud::input::{create_default_keymap, dispatch, DefaultKeyHandler};
use readaloud::platform::is_wsl;
use readaloud::speech::{create_capability, event_channel, CapabilityEvent, VoiceDescriptor};
use readaloud::state::config::Config;
use readaloud::state::State;
use readaloud::terminal::{compose, get_terminal_size, is_tty, RawTerminal};
use readaloud::{ReadAloudError, Result};
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Token for stdin in mio poll
const STDIN: Token = Token(0);

/// How long the loop sleeps when nothing happens; speech events arrive
/// on a channel, not a file descriptor, so this bounds their latency
const TICK: Duration = Duration::from_millis(50);

/// How long --list-voices waits for an engine that lists voices late
const VOICE_WAIT: Duration = Duration::from_secs(2);

/// Global flag set by SIGWINCH handler
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// SIGWINCH handler - sets flag when terminal is resized
extern "C" fn handle_sigwinch(_: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    debug: bool,
    list_voices: bool,
    json: bool,
    help: bool,
    story: Option<PathBuf>,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> std::result::Result<Self, String> {
        let mut parsed = Args::default();
        for arg in args {
            match arg.as_str() {
                "--debug" | "-d" => parsed.debug = true,
                "--list-voices" => parsed.list_voices = true,
                "--json" => parsed.json = true,
                "--help" | "-h" => parsed.help = true,
                flag if flag.starts_with('-') => return Err(format!("Unknown option: {}", flag)),
                path => {
                    if parsed.story.is_some() {
                        return Err("Only one story file may be given".to_string());
                    }
                    parsed.story = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

fn usage() -> String {
    format!(
        "{} {}\n\
         Read a story aloud and highlight each word as it is spoken\n\n\
         Usage: {} [OPTIONS] [FILE]\n\n\
         Options:\n  \
         -d, --debug        Write a debug log to readaloud.log\n  \
         --list-voices      Print the available voices and exit\n  \
         --json             With --list-voices, print JSON\n  \
         -h, --help         Show this help",
        readaloud::APP_NAME,
        readaloud::VERSION,
        readaloud::APP_NAME
    )
}

fn main() {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, usage());
            process::exit(2);
        }
    };

    if args.help {
        println!("{}", usage());
        return;
    }

    // Initialize logger
    if args.debug {
        // Debug mode: write to readaloud.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("readaloud.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open readaloud.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "readaloud version {} starting (debug mode, logging to readaloud.log)",
            readaloud::VERSION
        );
    } else {
        // Normal mode: only errors, and only to stderr
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    let result = if args.list_voices {
        list_voices(args.json)
    } else {
        run(args.story)
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Print the voices the configured backend offers
fn list_voices(json: bool) -> Result<()> {
    let config = Config::load()?;
    let (sink, events) = event_channel();
    let mut capability = create_capability(config.backend())?;
    capability.subscribe(sink)?;

    let mut voices = capability.list_voices()?;
    let deadline = Instant::now() + VOICE_WAIT;
    while voices.is_empty() && Instant::now() < deadline {
        if let Ok(CapabilityEvent::VoicesChanged) = events.recv_timeout(TICK) {
            voices = capability.list_voices()?;
        }
    }
    capability.unsubscribe();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &voices)?;
        writeln!(out)?;
    } else {
        write_voice_table(&mut out, &voices, &config.locale_preference())?;
    }
    Ok(())
}

fn write_voice_table<W: Write>(
    out: &mut W,
    voices: &[VoiceDescriptor],
    prefs: &LocalePreference,
) -> Result<()> {
    if voices.is_empty() {
        writeln!(out, "No voices available")?;
        return Ok(());
    }
    for voice in voices {
        writeln!(out, "{:<12} {:<32} {}", voice.language, voice.name, voice.id)?;
    }

    // Tags must match exactly; espeak-ng lists `hi` where others list `hi-IN`
    if !voices
        .iter()
        .any(|v| v.speaks(&prefs.primary) || v.speaks(&prefs.secondary))
    {
        writeln!(
            out,
            "\nNo voice matches primary_locale {} or secondary_locale {}; \
             set one of the language tags above in ~/.readaloud.cfg",
            prefs.primary, prefs.secondary
        )?;
    }
    Ok(())
}

fn run(story: Option<PathBuf>) -> Result<()> {
    debug!("Initializing readaloud");

    // The narrator needs an interactive terminal for raw key input
    let stdin_fd = io::stdin().as_raw_fd();
    if !is_tty(stdin_fd) {
        eprintln!("Error: readaloud requires an interactive terminal (stdin is not a TTY)");
        eprintln!("Usage: readaloud [FILE]");
        eprintln!("To see the available voices without a terminal: readaloud --list-voices");
        process::exit(1);
    }

    let config = Config::load()?;
    info!("Config loaded from {:?}", config.path());

    // Capability events land here and are drained by the main loop
    let (sink, events) = event_channel();
    let capability = create_capability(config.backend())?;
    let mut state = State::new(config, capability, sink)?;

    if let Some(path) = story {
        if let Err(e) = state.load_story(&path) {
            warn!("Could not open {:?}: {}", path, e);
            state.set_status(format!("Could not open {}: {}", path.display(), e));
        }
    }

    let keymap = create_default_keymap();
    info!("Key handler initialized with {} bindings", keymap.len());
    let mut default_handler = DefaultKeyHandler::new(keymap);

    // Set up signal handler for window resize
    unsafe {
        signal::signal(Signal::SIGWINCH, SigHandler::Handler(handle_sigwinch)).map_err(|e| {
            ReadAloudError::Terminal(format!("Failed to set SIGWINCH handler: {}", e))
        })?;
    }

    // Restores the terminal on every exit path
    let _terminal = RawTerminal::enter(stdin_fd)?;
    let (mut cols, mut rows) = get_terminal_size(stdin_fd)?;
    info!("Terminal size: {}x{}", cols, rows);

    // WSL doesn't support epoll on TTY file descriptors, so use select() instead
    let use_select = is_wsl();
    let mut mio_poll = if !use_select {
        debug!("Using mio::Poll for event loop");
        let poll = Poll::new()?;
        let mut stdin_source = mio::unix::SourceFd(&stdin_fd);
        poll.registry()
            .register(&mut stdin_source, STDIN, Interest::READABLE)?;
        Some((poll, Events::with_capacity(16)))
    } else {
        debug!("Using select() for event loop (WSL mode)");
        None
    };

    info!("readaloud ready - entering event loop");
    let mut dirty = true;

    loop {
        if RESIZE_PENDING.swap(false, Ordering::Relaxed) {
            let (new_cols, new_rows) = get_terminal_size(stdin_fd)?;
            info!("Terminal resized to {}x{}", new_cols, new_rows);
            cols = new_cols;
            rows = new_rows;
            dirty = true;
        }

        dirty |= drain_events(&events, &mut state);

        if dirty {
            draw(&state, cols, rows)?;
            dirty = false;
        }

        let stdin_ready = if use_select {
            wait_select(stdin_fd)?
        } else if let Some((ref mut poll, ref mut poll_events)) = mio_poll {
            match poll.poll(poll_events, Some(TICK)) {
                Ok(()) => poll_events.iter().any(|event| event.token() == STDIN),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => false,
                Err(e) => return Err(e.into()),
            }
        } else {
            false
        };

        if stdin_ready {
            if !handle_stdin(&mut state, &mut default_handler)? {
                info!("stdin closed");
                break;
            }
            dirty = true;
        }

        if state.quit {
            info!("Quitting");
            break;
        }
    }

    // Stop speech before the terminal is restored
    if let Err(e) = state.stop() {
        warn!("Failed to stop speech on exit: {}", e);
    }
    Ok(())
}

/// Apply every pending capability event; returns whether to redraw
fn drain_events(events: &Receiver<CapabilityEvent>, state: &mut State) -> bool {
    let mut changed = false;
    for event in events.try_iter() {
        changed |= state.handle_event(event);
    }
    changed
}

/// Wait up to one tick for stdin with select(); returns whether it is readable
fn wait_select(stdin_fd: RawFd) -> Result<bool> {
    use nix::sys::select::{select, FdSet};
    use nix::sys::time::{TimeVal, TimeValLike};
    use std::os::unix::io::BorrowedFd;

    let stdin_borrowed = unsafe { BorrowedFd::borrow_raw(stdin_fd) };
    let mut read_fds = FdSet::new();
    read_fds.insert(stdin_borrowed);
    let mut timeout = TimeVal::milliseconds(TICK.as_millis() as i64);

    match select(None, Some(&mut read_fds), None, None, Some(&mut timeout)) {
        Ok(_) => Ok(read_fds.contains(stdin_borrowed)),
        Err(nix::errno::Errno::EINTR) => {
            debug!("select() interrupted by signal");
            Ok(false)
        }
        Err(e) => {
            error!("select() error: {:?}", e);
            Err(ReadAloudError::Io(io::Error::from_raw_os_error(e as i32)))
        }
    }
}

/// Read one chunk of keyboard input and route it
///
/// Returns false once stdin is closed. Command errors are shown in the
/// status line instead of ending the session.
fn handle_stdin(state: &mut State, default_handler: &mut DefaultKeyHandler) -> Result<bool> {
    let mut buf = [0u8; 4096];

    let n = match io::stdin().read(&mut buf) {
        Ok(n) => n,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(true),
        Err(e) => return Err(e.into()),
    };
    if n == 0 {
        return Ok(false);
    }

    if let Err(e) = dispatch(&buf[..n], state, default_handler) {
        state.report_error(&e);
    }
    Ok(true)
}

fn draw(state: &State, cols: u16, rows: u16) -> Result<()> {
    let screen = compose(state, cols, rows);
    let mut stdout = io::stdout();
    stdout.write_all(screen.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
