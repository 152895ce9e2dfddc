//! Playback coordinator tests
//!
//! Drives the coordinator against a recording capability and checks the
//! state machine, the commands it issues, and the highlighted rendering.

mod common;

use common::{coordinator, english, hindi, pump, Call, RecordingCapability};
use readaloud::coordinator::{
    LocalePreference, Outcome, PlaybackCoordinator, PlaybackParameters, PlaybackState, Rejection,
    WordRange,
};
use readaloud::speech::{event_channel, CapabilityEvent, SpeechEvent, UtteranceId, VoiceDescriptor};
use readaloud::ReadAloudError;

fn started(outcome: Outcome) -> UtteranceId {
    match outcome {
        Outcome::Started(id) => id,
        other => panic!("expected a new utterance, got {:?}", other),
    }
}

#[test]
fn test_hello_world_scenario() {
    let (mut coord, fake, events) = coordinator(vec![english(), hindi()]);
    coord.set_text("Hello world");

    // hi-IN is the primary locale
    assert_eq!(coord.selected_voice(), Some(&hindi()));

    fake.clear_calls();
    let id = started(coord.speak().unwrap());
    assert_eq!(coord.state(), PlaybackState::Speaking);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], Call::CancelAll);
    match &calls[1] {
        Call::Speak(utterance) => {
            assert_eq!(utterance.text, "Hello world");
            assert_eq!(utterance.voice, hindi());
            assert_eq!(utterance.rate, 1.0);
            assert_eq!(utterance.pitch, 1.0);
        }
        other => panic!("expected Speak, got {:?}", other),
    }

    fake.emit_utterance(id, SpeechEvent::Start);
    fake.emit_utterance(id, SpeechEvent::WordBoundary { offset: 0, length: 5 });
    pump(&mut coord, &events);
    assert_eq!(coord.word_range(), WordRange::new(0, 5));
    assert_eq!(coord.highlight().word, Some("Hello"));
    assert_eq!(coord.highlight().after, " world");

    fake.emit_utterance(id, SpeechEvent::End);
    pump(&mut coord, &events);
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert_eq!(coord.word_range(), WordRange::new(0, 0));
    assert_eq!(coord.highlight().word, None);
}

#[test]
fn test_speak_rejected_without_voices() {
    let (mut coord, fake, _events) = coordinator(Vec::new());
    coord.set_text("Hello world");
    assert!(coord.is_initializing());

    fake.clear_calls();
    assert_eq!(coord.speak().unwrap(), Outcome::Rejected(Rejection::NoVoices));
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert!(fake.calls().is_empty());
}

#[test]
fn test_speak_rejected_for_blank_text() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);

    for text in ["", "   ", "\n\t "] {
        coord.set_text(text);
        fake.clear_calls();
        assert_eq!(coord.speak().unwrap(), Outcome::Rejected(Rejection::EmptyText));
        assert_eq!(coord.state(), PlaybackState::Idle);
        assert!(fake.calls().is_empty());
    }
}

#[test]
fn test_speak_while_speaking_is_rejected() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);
    coord.set_text("एक राजा था");
    started(coord.speak().unwrap());

    fake.clear_calls();
    assert_eq!(coord.speak().unwrap(), Outcome::Rejected(Rejection::AlreadySpeaking));
    assert!(fake.calls().is_empty());
}

#[test]
fn test_pause_while_idle_is_noop() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);
    fake.clear_calls();

    assert_eq!(coord.pause().unwrap(), Outcome::Ignored);
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert!(fake.calls().is_empty());
}

#[test]
fn test_resume_does_not_resubmit() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);
    coord.set_text("Hello world");
    let id = started(coord.speak().unwrap());

    assert_eq!(coord.pause().unwrap(), Outcome::Paused);
    assert_eq!(coord.state(), PlaybackState::Paused);

    fake.clear_calls();
    // Speak while paused resumes
    assert_eq!(coord.speak().unwrap(), Outcome::Resumed);
    assert_eq!(coord.state(), PlaybackState::Speaking);
    assert_eq!(fake.calls(), vec![Call::Resume(id)]);
    assert_eq!(coord.active_utterance(), Some(id));
}

#[test]
fn test_stop_always_resets() {
    let (mut coord, fake, events) = coordinator(vec![hindi()]);
    coord.set_text("Hello world");

    // From Idle: nothing to cancel
    fake.clear_calls();
    assert_eq!(coord.stop().unwrap(), Outcome::Ignored);
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert_eq!(coord.word_range(), WordRange::new(0, 0));
    assert!(fake.calls().is_empty());

    // From Speaking with a word highlighted
    let id = started(coord.speak().unwrap());
    fake.emit_utterance(id, SpeechEvent::WordBoundary { offset: 6, length: 5 });
    pump(&mut coord, &events);
    assert_eq!(coord.word_range(), WordRange::new(6, 11));

    fake.clear_calls();
    assert_eq!(coord.stop().unwrap(), Outcome::Stopped);
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert_eq!(coord.word_range(), WordRange::new(0, 0));
    assert_eq!(fake.calls(), vec![Call::Cancel(id)]);

    // From Paused
    let id = started(coord.speak().unwrap());
    coord.pause().unwrap();
    fake.clear_calls();
    assert_eq!(coord.stop().unwrap(), Outcome::Stopped);
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert_eq!(coord.word_range(), WordRange::new(0, 0));
    assert_eq!(fake.calls(), vec![Call::Cancel(id)]);
}

#[test]
fn test_editing_never_changes_state() {
    let (mut coord, _fake, _events) = coordinator(vec![hindi()]);
    coord.set_text("Hello world");

    coord.edit_text(|t| t.push_str(" again"));
    assert_eq!(coord.state(), PlaybackState::Idle);

    started(coord.speak().unwrap());
    coord.set_text("completely different");
    coord.edit_text(|t| t.clear());
    assert_eq!(coord.state(), PlaybackState::Speaking);

    coord.pause().unwrap();
    coord.set_text("नई कहानी");
    assert_eq!(coord.state(), PlaybackState::Paused);
}

#[test]
fn test_edit_applies_on_next_speak() {
    let (mut coord, fake, events) = coordinator(vec![hindi()]);
    coord.set_text("first story");
    let id = started(coord.speak().unwrap());

    coord.set_text("second story");
    fake.emit_utterance(id, SpeechEvent::End);
    pump(&mut coord, &events);

    started(coord.speak().unwrap());
    let texts: Vec<String> = fake.spoken().into_iter().map(|u| u.text).collect();
    assert_eq!(texts, vec!["first story", "second story"]);
}

#[test]
fn test_boundary_highlights_only_while_speaking() {
    let text = "Once upon a time";
    let (mut coord, fake, events) = coordinator(vec![hindi()]);
    coord.set_text(text);
    let id = started(coord.speak().unwrap());

    fake.emit_utterance(id, SpeechEvent::WordBoundary { offset: 5, length: 4 });
    pump(&mut coord, &events);
    assert_eq!(coord.highlight().word, Some(&text[5..9]));
    assert_eq!(coord.highlight().before, "Once ");

    // Paused keeps the range but draws nothing
    coord.pause().unwrap();
    assert_eq!(coord.word_range(), WordRange::new(5, 9));
    assert_eq!(coord.highlight().word, None);
    assert_eq!(coord.highlight().before, text);

    // A boundary arriving while paused is not applied
    fake.emit_utterance(id, SpeechEvent::WordBoundary { offset: 10, length: 1 });
    pump(&mut coord, &events);
    assert_eq!(coord.word_range(), WordRange::new(5, 9));
}

#[test]
fn test_boundary_while_idle_is_not_drawn() {
    let (mut coord, fake, events) = coordinator(vec![hindi()]);
    coord.set_text("Once upon a time");
    let id = started(coord.speak().unwrap());
    coord.stop().unwrap();

    fake.emit_utterance(id, SpeechEvent::WordBoundary { offset: 5, length: 4 });
    pump(&mut coord, &events);
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert_eq!(coord.word_range(), WordRange::new(0, 0));
    assert_eq!(coord.highlight().word, None);
}

#[test]
fn test_superseded_events_are_dropped() {
    let (mut coord, fake, events) = coordinator(vec![hindi()]);
    coord.set_text("Hello world");

    let old = started(coord.speak().unwrap());
    coord.stop().unwrap();
    let new = started(coord.speak().unwrap());
    assert_ne!(old, new);

    // Late events from the first utterance, including its terminal event
    fake.emit_utterance(old, SpeechEvent::WordBoundary { offset: 6, length: 5 });
    fake.emit_utterance(old, SpeechEvent::Error("interrupted".to_string()));
    fake.emit_utterance(new, SpeechEvent::WordBoundary { offset: 0, length: 5 });
    pump(&mut coord, &events);

    assert_eq!(coord.state(), PlaybackState::Speaking);
    assert_eq!(coord.active_utterance(), Some(new));
    assert_eq!(coord.word_range(), WordRange::new(0, 5));
    assert_eq!(coord.last_error(), None);
}

#[test]
fn test_synthesis_error_recovers_to_idle() {
    let (mut coord, fake, events) = coordinator(vec![hindi()]);
    coord.set_text("Hello world");
    let id = started(coord.speak().unwrap());

    fake.emit_utterance(id, SpeechEvent::WordBoundary { offset: 0, length: 5 });
    fake.emit_utterance(id, SpeechEvent::Error("audio device lost".to_string()));
    pump(&mut coord, &events);

    assert_eq!(coord.state(), PlaybackState::Idle);
    assert_eq!(coord.word_range(), WordRange::new(0, 0));
    assert_eq!(coord.last_error(), Some("audio device lost"));

    // No automatic retry, but a new Speak works
    assert_eq!(fake.spoken().len(), 1);
    started(coord.speak().unwrap());
    assert_eq!(coord.last_error(), None);
}

#[test]
fn test_submit_failure_is_not_fatal() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);
    coord.set_text("Hello world");
    fake.fail_speak(true);

    assert!(matches!(coord.speak(), Err(ReadAloudError::Speech(_))));
    assert_eq!(coord.state(), PlaybackState::Idle);
    assert!(coord.last_error().is_some());

    fake.fail_speak(false);
    started(coord.speak().unwrap());
    assert_eq!(coord.state(), PlaybackState::Speaking);
}

#[test]
fn test_voices_arrive_late() {
    let (mut coord, fake, events) = coordinator(Vec::new());
    assert!(coord.is_initializing());
    assert_eq!(coord.selected_voice(), None);

    fake.set_voices(vec![english(), hindi()]);
    fake.emit(CapabilityEvent::VoicesChanged);
    pump(&mut coord, &events);

    assert!(!coord.is_initializing());
    assert_eq!(coord.selected_voice(), Some(&hindi()));
}

#[test]
fn test_refresh_keeps_user_selection() {
    let (mut coord, fake, events) = coordinator(vec![english(), hindi()]);
    coord.select_voice("A").unwrap();

    fake.set_voices(vec![hindi(), english(), VoiceDescriptor::new("c", "C", "en-IN")]);
    fake.emit(CapabilityEvent::VoicesChanged);
    pump(&mut coord, &events);

    assert_eq!(coord.selected_voice(), Some(&english()));
}

#[test]
fn test_refresh_without_selection_reruns_policy() {
    let (mut coord, fake, events) = coordinator(vec![english(), hindi()]);
    assert_eq!(coord.selected_voice(), Some(&hindi()));

    let indian_english = VoiceDescriptor::new("c", "C", "en-IN");
    fake.set_voices(vec![english(), indian_english.clone()]);
    fake.emit(CapabilityEvent::VoicesChanged);
    pump(&mut coord, &events);

    assert_eq!(coord.selected_voice(), Some(&indian_english));
}

#[test]
fn test_select_unknown_voice() {
    let (mut coord, _fake, _events) = coordinator(vec![hindi()]);
    assert!(matches!(
        coord.select_voice("Nobody"),
        Err(ReadAloudError::VoiceNotFound(_))
    ));
    assert_eq!(coord.selected_voice(), Some(&hindi()));
}

#[test]
fn test_cycle_voice_wraps() {
    let (mut coord, _fake, _events) = coordinator(vec![english(), hindi()]);
    assert_eq!(coord.selected_voice(), Some(&hindi()));

    assert_eq!(coord.cycle_voice(true), Some(&english()));
    assert_eq!(coord.cycle_voice(true), Some(&hindi()));
    assert_eq!(coord.cycle_voice(false), Some(&english()));
}

#[test]
fn test_parameters_reach_next_utterance() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);
    coord.set_text("Hello");
    coord.params_mut().step_rate(5);
    coord.params_mut().step_pitch(-3);
    started(coord.speak().unwrap());

    let utterance = &fake.spoken()[0];
    assert_eq!(utterance.rate, 1.5);
    assert_eq!(utterance.pitch, 0.7);
}

#[test]
fn test_configured_voice_preferred() {
    let fake = RecordingCapability::with_voices(vec![english(), hindi()]);
    let (sink, _events) = event_channel();
    let prefs = LocalePreference {
        preferred_voice: Some("A".to_string()),
        ..LocalePreference::default()
    };
    let coord =
        PlaybackCoordinator::new(Box::new(fake), sink, prefs, PlaybackParameters::default())
            .unwrap();
    assert_eq!(coord.selected_voice(), Some(&english()));
}

#[test]
fn test_drop_cancels_and_unsubscribes() {
    let (mut coord, fake, _events) = coordinator(vec![hindi()]);
    assert!(fake.is_subscribed());
    coord.set_text("Hello world");
    let id = started(coord.speak().unwrap());

    fake.clear_calls();
    drop(coord);
    assert_eq!(fake.calls(), vec![Call::Cancel(id), Call::Unsubscribe]);
    assert!(!fake.is_subscribed());
}
