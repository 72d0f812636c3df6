//! Spoken form feedback through the Web Speech API

/// Utterance rate and pitch
const SPEECH_RATE: f32 = 1.3;
const SPEECH_PITCH: f32 = 1.0;

/// Speak only new, non-empty feedback that is not the "good job" filler
pub fn should_speak(previous: &str, next: &str) -> bool {
    let next = next.trim();
    !next.is_empty() && next != previous.trim() && !next.to_lowercase().contains("good job")
}

fn synthesis() -> Option<web_sys::SpeechSynthesis> {
    web_sys::window()?.speech_synthesis().ok()
}

/// Cancel anything pending and speak `text`
pub fn speak(text: &str) {
    let Some(synth) = synthesis() else {
        log::debug!("Speech synthesis unavailable");
        return;
    };
    synth.cancel();
    match web_sys::SpeechSynthesisUtterance::new_with_text(text) {
        Ok(utterance) => {
            utterance.set_rate(SPEECH_RATE);
            utterance.set_pitch(SPEECH_PITCH);
            synth.speak(&utterance);
        }
        Err(e) => log::warn!("Could not create utterance: {:?}", e),
    }
}

/// Silence any queued or ongoing feedback
pub fn cancel() {
    if let Some(synth) = synthesis() {
        synth.cancel();
    }
}
