//! Plain-text rendering of transcript messages

use crate::transcript::{ChatMessage, Role, Transcript};

/// Render a single message: a header line followed by indented, wrapped content
pub fn render_message(message: &ChatMessage, width: usize) -> String {
    let role_icon = match message.role {
        Role::User => "👤",
        Role::Assistant => "🤖",
        Role::System => "⚙️",
    };
    let timestamp = message.timestamp.format("%H:%M:%S");
    let label = message
        .name
        .clone()
        .unwrap_or_else(|| message.role.to_string());

    let mut out = format!("{} {} {} {}", role_icon, label, timestamp, "─".repeat(20));

    if message.is_placeholder() {
        out.push_str("\n  … thinking");
        return out;
    }

    for line in wrap_text(&message.content, width.saturating_sub(2)) {
        out.push_str("\n  ");
        out.push_str(&line);
    }
    out
}

pub fn render_transcript(transcript: &Transcript, width: usize) -> String {
    if transcript.is_empty() {
        return "No messages yet.".to_string();
    }
    transcript
        .messages()
        .iter()
        .map(|m| render_message(m, width))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wrap text to fit within the given width, keeping explicit line breaks
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = current_line.chars().count() + word.chars().count() + 1;
            if current_line.is_empty() || needed <= width {
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line.push_str(word);
            }
        }
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn keeps_paragraph_breaks() {
        let lines = wrap_text("first\n\nsecond", 40);
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    #[test]
    fn long_word_gets_its_own_line() {
        let lines = wrap_text("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn placeholder_renders_thinking_indicator() {
        let mut transcript = Transcript::new();
        transcript.push_user("Hello");
        transcript.push_placeholder();

        let rendered = render_transcript(&transcript, 80);
        assert!(rendered.contains("👤 user"));
        assert!(rendered.contains("  Hello"));
        assert!(rendered.contains("🤖 assistant"));
        assert!(rendered.contains("thinking"));
    }

    #[test]
    fn empty_reply_is_not_rendered_as_thinking() {
        let mut transcript = Transcript::new();
        let id = transcript.push_placeholder();
        transcript.fill(id, "");

        let rendered = render_transcript(&transcript, 80);
        assert!(rendered.contains("🤖 assistant"));
        assert!(!rendered.contains("thinking"));
    }

    #[test]
    fn empty_transcript_message() {
        assert_eq!(render_transcript(&Transcript::new(), 80), "No messages yet.");
    }
}
