//! Word-by-word playback actor shared by the speech backends
//!
//! Platform engines only know how to speak a string and stop. The player
//! turns that into the full capability contract: it splits an utterance
//! into words, plays them one after another on a dedicated thread, emits
//! a boundary event before each word, and implements pause/resume by
//! remembering which word was interrupted.
//!
//! Every utterance gets exactly one terminal event: `End` after the last
//! word, or `Error` when the engine fails or the utterance is cancelled or
//! replaced.

use super::capability::Utterance;
use super::events::{CapabilityEvent, EventSink, SpeechEvent, UtteranceId, INTERRUPTED};
use super::segment::{self, WordSpan};
use crate::{ReadAloudError, Result};
use log::{debug, trace, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the engine is polled when no message arrives
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Progress of the chunk most recently handed to an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    Playing,
    Finished,
    Failed(String),
}

/// A speech engine that can play one chunk of text at a time
pub trait ChunkEngine: Send + 'static {
    /// Receive a waker for engines that learn about completion via callbacks
    fn attach(&mut self, _waker: Waker) -> Result<()> {
        Ok(())
    }

    /// Apply voice, rate and pitch for the chunks of `utterance`
    fn configure(&mut self, utterance: &Utterance) -> Result<()>;

    /// Start playing a chunk, interrupting any previous one
    fn play(&mut self, chunk: &str) -> Result<()>;

    /// Silence the current chunk
    fn halt(&mut self) -> Result<()>;

    /// Status of the chunk started by the last `play`
    fn status(&mut self) -> ChunkStatus;
}

enum PlayerMsg {
    Speak { id: UtteranceId, utterance: Utterance },
    Pause(UtteranceId),
    Resume(UtteranceId),
    Cancel(UtteranceId),
    CancelAll,
    Subscribe(EventSink),
    Unsubscribe,
    Wake,
    Shutdown,
}

/// Lets engine callbacks nudge the player to poll right away
#[derive(Clone)]
pub struct Waker {
    tx: Sender<PlayerMsg>,
}

impl Waker {
    pub fn wake(&self) {
        let _ = self.tx.send(PlayerMsg::Wake);
    }
}

struct Playback {
    id: UtteranceId,
    text: String,
    words: Vec<WordSpan>,
    current: usize,
    paused: bool,
}

struct PlayerLoop<E: ChunkEngine> {
    engine: E,
    sink: Option<EventSink>,
    playback: Option<Playback>,
}

impl<E: ChunkEngine> PlayerLoop<E> {
    fn new(engine: E) -> Self {
        Self {
            engine,
            sink: None,
            playback: None,
        }
    }

    fn run(mut self, rx: Receiver<PlayerMsg>) {
        debug!("Speech player started");
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(PlayerMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(msg) => self.handle(msg),
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.poll();
        }
        self.interrupt();
        debug!("Speech player stopped");
    }

    fn emit(&self, id: UtteranceId, event: SpeechEvent) {
        if let Some(sink) = &self.sink {
            sink.utterance(id, event);
        }
    }

    fn is_current(&self, id: UtteranceId) -> bool {
        self.playback.as_ref().map_or(false, |pb| pb.id == id)
    }

    fn handle(&mut self, msg: PlayerMsg) {
        match msg {
            PlayerMsg::Speak { id, utterance } => self.start(id, utterance),
            PlayerMsg::Pause(id) => self.pause(id),
            PlayerMsg::Resume(id) => self.resume(id),
            PlayerMsg::Cancel(id) => {
                if self.is_current(id) {
                    self.interrupt();
                } else {
                    trace!("Ignoring cancel for stale utterance {}", id);
                }
            }
            PlayerMsg::CancelAll => self.interrupt(),
            PlayerMsg::Subscribe(sink) => {
                // Voices are only known once the engine is up, which it now is
                sink.emit(CapabilityEvent::VoicesChanged);
                self.sink = Some(sink);
            }
            PlayerMsg::Unsubscribe => self.sink = None,
            PlayerMsg::Wake | PlayerMsg::Shutdown => {}
        }
    }

    /// Drop the current utterance, reporting it as interrupted
    fn interrupt(&mut self) {
        if let Some(pb) = self.playback.take() {
            debug!("Interrupting utterance {} at word {}", pb.id, pb.current);
            if let Err(e) = self.engine.halt() {
                warn!("Failed to halt speech engine: {}", e);
            }
            self.emit(pb.id, SpeechEvent::Error(INTERRUPTED.to_string()));
        }
    }

    fn start(&mut self, id: UtteranceId, utterance: Utterance) {
        self.interrupt();

        let words = segment::words(&utterance.text);
        debug!("Utterance {}: {} words, voice {}", id, words.len(), utterance.voice);
        self.emit(id, SpeechEvent::Start);

        if let Err(e) = self.engine.configure(&utterance) {
            warn!("Failed to configure engine for utterance {}: {}", id, e);
            self.emit(id, SpeechEvent::Error(e.to_string()));
            return;
        }

        if words.is_empty() {
            self.emit(id, SpeechEvent::End);
            return;
        }

        self.playback = Some(Playback {
            id,
            text: utterance.text,
            words,
            current: 0,
            paused: false,
        });
        self.play_current();
    }

    fn play_current(&mut self) {
        let (id, span, word) = match self.playback.as_ref() {
            Some(pb) => {
                let span = pb.words[pb.current];
                (pb.id, span, span.slice(&pb.text).to_string())
            }
            None => return,
        };

        self.emit(
            id,
            SpeechEvent::WordBoundary {
                offset: span.offset,
                length: span.length,
            },
        );

        if let Err(e) = self.engine.play(&word) {
            warn!("Engine failed to play '{}': {}", word, e);
            self.playback = None;
            self.emit(id, SpeechEvent::Error(e.to_string()));
        }
    }

    fn poll(&mut self) {
        let playing = matches!(&self.playback, Some(pb) if !pb.paused);
        if !playing {
            return;
        }

        match self.engine.status() {
            ChunkStatus::Playing => {}
            ChunkStatus::Finished => self.advance(),
            ChunkStatus::Failed(cause) => {
                if let Some(pb) = self.playback.take() {
                    warn!("Utterance {} failed: {}", pb.id, cause);
                    self.emit(pb.id, SpeechEvent::Error(cause));
                }
            }
        }
    }

    fn advance(&mut self) {
        let done = match self.playback.as_mut() {
            Some(pb) => {
                pb.current += 1;
                pb.current >= pb.words.len()
            }
            None => return,
        };

        if done {
            if let Some(pb) = self.playback.take() {
                debug!("Utterance {} finished", pb.id);
                self.emit(pb.id, SpeechEvent::End);
            }
        } else {
            self.play_current();
        }
    }

    fn pause(&mut self, id: UtteranceId) {
        match self.playback.as_mut() {
            Some(pb) if pb.id == id && !pb.paused => {
                pb.paused = true;
                debug!("Paused utterance {} at word {}", id, pb.current);
                if let Err(e) = self.engine.halt() {
                    warn!("Failed to halt speech engine: {}", e);
                }
            }
            _ => trace!("Ignoring pause for utterance {}", id),
        }
    }

    fn resume(&mut self, id: UtteranceId) {
        match self.playback.as_mut() {
            Some(pb) if pb.id == id && pb.paused => {
                pb.paused = false;
                debug!("Resuming utterance {} at word {}", id, pb.current);
            }
            _ => {
                trace!("Ignoring resume for utterance {}", id);
                return;
            }
        }
        self.play_current();
    }
}

/// Handle to a running player thread
///
/// Dropping the handle stops the thread and interrupts any utterance.
pub struct ChunkPlayer {
    tx: Sender<PlayerMsg>,
    worker: Option<JoinHandle<()>>,
    next_id: u64,
}

impl ChunkPlayer {
    /// Start a player thread driving `engine`
    pub fn spawn<E: ChunkEngine>(name: &str, mut engine: E) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        engine.attach(Waker { tx: tx.clone() })?;

        let worker = thread::Builder::new()
            .name(format!("readaloud-{}", name))
            .spawn(move || PlayerLoop::new(engine).run(rx))?;

        Ok(Self {
            tx,
            worker: Some(worker),
            next_id: 0,
        })
    }

    fn send(&self, msg: PlayerMsg) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| ReadAloudError::Speech("Speech player thread has stopped".to_string()))
    }

    pub fn subscribe(&mut self, sink: EventSink) -> Result<()> {
        self.send(PlayerMsg::Subscribe(sink))
    }

    pub fn unsubscribe(&mut self) {
        let _ = self.send(PlayerMsg::Unsubscribe);
    }

    pub fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId> {
        self.next_id += 1;
        let id = UtteranceId(self.next_id);
        self.send(PlayerMsg::Speak { id, utterance })?;
        Ok(id)
    }

    pub fn pause(&mut self, id: UtteranceId) -> Result<()> {
        self.send(PlayerMsg::Pause(id))
    }

    pub fn resume(&mut self, id: UtteranceId) -> Result<()> {
        self.send(PlayerMsg::Resume(id))
    }

    pub fn cancel(&mut self, id: UtteranceId) -> Result<()> {
        self.send(PlayerMsg::Cancel(id))
    }

    pub fn cancel_all(&mut self) -> Result<()> {
        self.send(PlayerMsg::CancelAll)
    }
}

impl Drop for ChunkPlayer {
    fn drop(&mut self) {
        let _ = self.tx.send(PlayerMsg::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Speech player thread panicked");
            }
        }
    }
}
