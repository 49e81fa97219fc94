use pitchroom_config::SegmentationConfig;
use pitchroom_core::Speaker;

use crate::segment::Segment;

/// Derives timed segments from a call's stored transcript text.
///
/// Expected format: one utterance per line, prefixed with a speaker label:
/// ```text
/// user: Hi, thanks for taking the call.
/// prospect: Sure, what are you selling?
/// ```
/// Lines without a recognized label continue the previous utterance.
/// Durations come from a reading-time estimate
/// (`max(min_utterance, chars * secs_per_char)`) with a fixed gap between
/// consecutive utterances.
pub fn segments_from_transcript(text: &str, config: &SegmentationConfig) -> Vec<Segment> {
    let mut utterances: Vec<(Speaker, String)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match split_speaker_label(line) {
            Some((speaker, rest)) => {
                if !rest.is_empty() {
                    utterances.push((speaker, rest.to_string()));
                }
            }
            None => {
                // Continuation of the previous utterance; a leading
                // unlabeled line belongs to the trainee.
                match utterances.last_mut() {
                    Some((_, text)) => {
                        text.push(' ');
                        text.push_str(line);
                    }
                    None => utterances.push((Speaker::User, line.to_string())),
                }
            }
        }
    }

    let mut segments = Vec::with_capacity(utterances.len());
    let mut offset = 0.0;
    for (speaker, text) in utterances {
        let duration = estimate_duration(&text, config);
        segments.push(Segment::new(speaker, text, offset, duration));
        offset += duration + config.utterance_gap_secs;
    }
    segments
}

/// Estimated reading duration for one utterance, in seconds.
fn estimate_duration(text: &str, config: &SegmentationConfig) -> f64 {
    (text.chars().count() as f64 * config.secs_per_char).max(config.min_utterance_secs)
}

/// Splits a `label: text` line if the label is a known speaker alias.
fn split_speaker_label(line: &str) -> Option<(Speaker, &str)> {
    let (label, rest) = line.split_once(':')?;
    let speaker = match label.trim().to_ascii_lowercase().as_str() {
        "user" | "rep" | "me" | "you" => Speaker::User,
        "prospect" | "assistant" | "ai" | "customer" => Speaker::Prospect,
        _ => return None,
    };
    Some((speaker, rest.trim()))
}
