//! Default key bindings for readaloud

use std::collections::HashMap;

/// Key sequence type
pub type KeySequence = Vec<u8>;

/// Action identifier for key bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Playback
    SpeakOrResume,
    Pause,
    Stop,

    // Voice and parameters
    NextVoice,
    PrevVoice,
    RefreshVoices,
    Faster,
    Slower,
    HigherPitch,
    LowerPitch,

    // Story text
    Edit,
    OpenFile,
    ReloadStory,
    Paste,
    ClearStory,

    Quit,
}

/// Create the default keymap
pub fn create_default_keymap() -> HashMap<KeySequence, KeyAction> {
    let mut map = HashMap::new();

    // Playback (space/enter, p, x)
    map.insert(b" ".to_vec(), KeyAction::SpeakOrResume);
    map.insert(b"\r".to_vec(), KeyAction::SpeakOrResume);
    map.insert(b"p".to_vec(), KeyAction::Pause);
    map.insert(b"x".to_vec(), KeyAction::Stop);

    // Voice selection
    map.insert(b"v".to_vec(), KeyAction::NextVoice);
    map.insert(b"V".to_vec(), KeyAction::PrevVoice);
    map.insert(b"R".to_vec(), KeyAction::RefreshVoices);

    // Speed (- / +, = so shift is optional)
    map.insert(b"+".to_vec(), KeyAction::Faster);
    map.insert(b"=".to_vec(), KeyAction::Faster);
    map.insert(b"-".to_vec(), KeyAction::Slower);

    // Pitch ([ / ])
    map.insert(b"]".to_vec(), KeyAction::HigherPitch);
    map.insert(b"[".to_vec(), KeyAction::LowerPitch);

    // Story text
    map.insert(b"e".to_vec(), KeyAction::Edit);
    map.insert(b"o".to_vec(), KeyAction::OpenFile);
    map.insert(b"r".to_vec(), KeyAction::ReloadStory);
    map.insert(b"\x16".to_vec(), KeyAction::Paste); // ctrl+v
    map.insert(b"c".to_vec(), KeyAction::ClearStory);

    // Quit (q, ctrl+c)
    map.insert(b"q".to_vec(), KeyAction::Quit);
    map.insert(b"\x03".to_vec(), KeyAction::Quit);

    map
}
