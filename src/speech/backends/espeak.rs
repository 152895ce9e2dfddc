//! espeak-ng backend
//!
//! Runs one `espeak-ng` process per word, feeding the word on stdin.
//! Works anywhere espeak-ng can reach an audio server, which makes it the
//! backend of choice under WSL with WSLg, where PulseAudio is available
//! through /mnt/wslg/PulseServer but speech-dispatcher usually is not.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)
//! - PulseAudio client libraries (usually pre-installed with WSLg)

use crate::platform::is_wsl;
use crate::speech::player::{ChunkEngine, ChunkPlayer, ChunkStatus};
use crate::speech::{EventSink, SpeechCapability, Utterance, UtteranceId, VoiceDescriptor};
use crate::{ReadAloudError, Result};
use log::{debug, info, warn};
use std::io::Write;
use std::process::{Child, Command, Stdio};

/// espeak-ng's own default speed in words per minute
const NORMAL_WPM: f32 = 175.0;

/// Setup PulseAudio server environment
///
/// Auto-detects the WSLg PulseAudio server and sets PULSE_SERVER if needed.
fn setup_pulseaudio() -> Result<()> {
    const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

    if std::env::var("PULSE_SERVER").is_ok() {
        debug!("PULSE_SERVER already set via environment");
        return Ok(());
    }

    if std::path::Path::new(WSLG_PULSE_PATH).exists() {
        info!("Auto-detected WSLg PulseAudio server at {}", WSLG_PULSE_PATH);
        std::env::set_var("PULSE_SERVER", WSLG_PULSE_PATH);
        return Ok(());
    }

    if is_wsl() {
        warn!("WSLg PulseAudio server not found at {}", WSLG_PULSE_PATH);
        warn!("Make sure WSLg is installed and running, or export PULSE_SERVER");
        return Err(ReadAloudError::Speech(
            "PulseAudio server not found. Install WSLg or set PULSE_SERVER environment variable."
                .to_string(),
        ));
    }

    // Native Linux: espeak-ng uses the default audio configuration
    Ok(())
}

/// Find espeak-ng executable
fn find_espeak() -> Result<String> {
    for path in ["espeak-ng", "/usr/bin/espeak-ng"] {
        let found = Command::new(path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);

        if found {
            return Ok(path.to_string());
        }
    }

    Err(ReadAloudError::Speech(
        "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
    ))
}

/// Convert a speed multiplier to espeak-ng words per minute (80-450)
fn rate_to_wpm(rate: f32) -> u16 {
    (NORMAL_WPM * rate).round().clamp(80.0, 450.0) as u16
}

/// Convert pitch 0..=2 to espeak-ng pitch (0-99, 50 is normal)
fn pitch_to_espeak(pitch: f32) -> u8 {
    (pitch * 50.0).round().clamp(0.0, 99.0) as u8
}

/// Parse the table printed by `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  hi              --/M      Hindi              inc/hi
/// ```
fn parse_voice_table(output: &str) -> Vec<VoiceDescriptor> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _priority = fields.next()?;
            let language = fields.next()?;
            let _age_gender = fields.next()?;
            let name = fields.next()?;
            Some(VoiceDescriptor::new(language, name.replace('_', " "), language))
        })
        .collect()
}

/// Chunk engine spawning one espeak-ng process per chunk
struct EspeakEngine {
    espeak_path: String,

    /// Currently running espeak-ng process
    current_process: Option<Child>,

    voice: String,
    speed: u16,
    pitch: u8,
}

impl EspeakEngine {
    fn new(espeak_path: String) -> Self {
        Self {
            espeak_path,
            current_process: None,
            voice: "en".to_string(),
            speed: rate_to_wpm(1.0),
            pitch: pitch_to_espeak(1.0),
        }
    }

    /// Kill any currently running speech process
    fn cancel_process(&mut self) {
        if let Some(mut child) = self.current_process.take() {
            debug!("Killing espeak-ng process");
            if let Err(e) = child.kill() {
                debug!("Failed to kill espeak-ng process: {}", e);
            }
            // Reap it even if it had already exited
            let _ = child.wait();
        }
    }
}

impl ChunkEngine for EspeakEngine {
    fn configure(&mut self, utterance: &Utterance) -> Result<()> {
        self.voice = utterance.voice.id.clone();
        self.speed = rate_to_wpm(utterance.rate);
        self.pitch = pitch_to_espeak(utterance.pitch);
        debug!(
            "espeak-ng voice {} speed {} pitch {}",
            self.voice, self.speed, self.pitch
        );
        Ok(())
    }

    fn play(&mut self, chunk: &str) -> Result<()> {
        self.cancel_process();

        // PULSE_SERVER was set up in new() and is inherited by the child
        let mut child = Command::new(&self.espeak_path)
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.speed.to_string())
            .arg("-p")
            .arg(self.pitch.to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to start espeak-ng: {}", e)))?;

        let stdin = child.stdin.take();
        self.current_process = Some(child);

        if let Some(mut stdin) = stdin {
            if let Err(e) = stdin.write_all(chunk.as_bytes()) {
                self.cancel_process();
                return Err(ReadAloudError::Speech(format!(
                    "Failed to send text to espeak-ng: {}",
                    e
                )));
            }
            // Dropping stdin closes it so espeak-ng starts speaking
        }
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.cancel_process();
        Ok(())
    }

    fn status(&mut self) -> ChunkStatus {
        let Some(child) = self.current_process.as_mut() else {
            return ChunkStatus::Finished;
        };

        match child.try_wait() {
            Ok(None) => ChunkStatus::Playing,
            Ok(Some(status)) => {
                self.current_process = None;
                if status.success() {
                    ChunkStatus::Finished
                } else {
                    ChunkStatus::Failed(format!("espeak-ng exited with {}", status))
                }
            }
            Err(e) => {
                self.current_process = None;
                ChunkStatus::Failed(format!("Failed to wait for espeak-ng: {}", e))
            }
        }
    }
}

impl Drop for EspeakEngine {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng engine");
        self.cancel_process();
    }
}

/// Speech capability backed by espeak-ng
pub struct EspeakCapability {
    espeak_path: String,
    player: ChunkPlayer,
}

impl EspeakCapability {
    /// Create a new espeak-ng capability
    ///
    /// Verifies espeak-ng and an audio server are available
    pub fn new() -> Result<Self> {
        debug!("Creating espeak-ng backend");

        setup_pulseaudio()?;
        let espeak_path = find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        let player = ChunkPlayer::spawn("espeak", EspeakEngine::new(espeak_path.clone()))?;
        Ok(Self {
            espeak_path,
            player,
        })
    }
}

impl SpeechCapability for EspeakCapability {
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        let output = Command::new(&self.espeak_path)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(ReadAloudError::Speech(format!(
                "espeak-ng --voices exited with {}",
                output.status
            )));
        }

        Ok(parse_voice_table(&String::from_utf8(output.stdout)?))
    }

    fn subscribe(&mut self, sink: EventSink) -> Result<()> {
        self.player.subscribe(sink)
    }

    fn unsubscribe(&mut self) {
        self.player.unsubscribe();
    }

    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId> {
        self.player.speak(utterance)
    }

    fn pause(&mut self, id: UtteranceId) -> Result<()> {
        self.player.pause(id)
    }

    fn resume(&mut self, id: UtteranceId) -> Result<()> {
        self.player.resume(id)
    }

    fn cancel(&mut self, id: UtteranceId) -> Result<()> {
        self.player.cancel(id)
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.player.cancel_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_conversion() {
        assert_eq!(rate_to_wpm(1.0), 175);
        assert_eq!(rate_to_wpm(0.5), 88);
        assert_eq!(rate_to_wpm(2.0), 350);
        assert_eq!(rate_to_wpm(0.1), 80);
        assert_eq!(rate_to_wpm(5.0), 450);
    }

    #[test]
    fn test_pitch_conversion() {
        assert_eq!(pitch_to_espeak(0.0), 0);
        assert_eq!(pitch_to_espeak(1.0), 50);
        assert_eq!(pitch_to_espeak(2.0), 99);
    }

    #[test]
    fn test_parse_voice_table() {
        let output = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
 5  hi              --/M      Hindi              inc/hi
 5  ne              --/M      Nepali             inc/ne
";
        let voices = parse_voice_table(output);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0], VoiceDescriptor::new("en-us", "English (America)", "en-us"));
        assert_eq!(voices[1].name, "Hindi");
        assert_eq!(voices[1].id, "hi");
    }

    #[test]
    fn test_parse_empty_table() {
        assert!(parse_voice_table("").is_empty());
        assert!(parse_voice_table("Pty Language Age/Gender VoiceName File\n").is_empty());
    }

    #[test]
    fn test_failed_write_reaps_process() {
        use std::os::unix::fs::PermissionsExt;

        // Stands in for espeak-ng: closes stdin without reading it
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-espeak");
        std::fs::write(&script, "#!/bin/sh\nexec 0<&-\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut engine = EspeakEngine::new(script.to_string_lossy().into_owned());
        // Larger than a pipe buffer, so the write cannot finish before stdin closes
        let chunk = "word ".repeat(200_000);

        let err = engine.play(&chunk).unwrap_err();
        assert!(err.to_string().contains("Failed to send text to espeak-ng"));
        assert!(engine.current_process.is_none());
        assert_eq!(engine.status(), ChunkStatus::Finished);
    }

    #[test]
    fn test_create_espeak_capability() {
        match EspeakCapability::new() {
            Ok(_) => println!("✓ espeak-ng backend available"),
            Err(e) => println!("⚠ espeak-ng backend not available: {}", e),
        }
    }
}
