//! Helpers for parsing Fountain-formatted model output.
//!
//! The generation stages ask the model to wrap its work in a fenced
//! ` ```fountain ` code block. These helpers pull the block out and extract
//! the structured fields later stages and the run summary need.

use std::sync::OnceLock;

use regex::Regex;

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```fountain\n(.*?)```").expect("block pattern is valid"))
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Episode Title:\s*(.+)").expect("title pattern is valid"))
}

fn pitch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Pitch Paragraph:\s*(.+)").expect("pitch pattern is valid")
    })
}

/// Extract the contents of a fenced fountain code block.
///
/// Falls back to the trimmed full text when no block is present, so a
/// model that skips the fence still produces usable output.
pub fn extract_block(text: &str) -> String {
    match block_regex().captures(text) {
        Some(captures) => captures[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Fields parsed from a pitch-stage response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchFields {
    /// The episode title line.
    pub episode_title: String,
    /// The single-paragraph pitch.
    pub pitch_paragraph: String,
}

/// Parse `Episode Title:` and `Pitch Paragraph:` fields out of pitch
/// output. Fields the model omitted come back empty.
pub fn parse_pitch(text: &str) -> PitchFields {
    let episode_title = title_regex()
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    let pitch_paragraph = pitch_regex()
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    PitchFields {
        episode_title,
        pitch_paragraph,
    }
}

/// Count `{{SFX: ...}}` annotations in a tagged script.
pub fn count_sfx_tags(text: &str) -> usize {
    text.matches("{{SFX:").count()
}

/// A single scene split out of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// The scene heading line (e.g. `INT. TREEHOUSE - DAY`).
    pub heading: String,
    /// Full scene text, including the heading line.
    pub content: String,
}

/// Split a script into scenes on `INT.` / `EXT.` scene headings.
///
/// Text before the first heading is not part of any scene.
pub fn split_scenes(script: &str) -> Vec<Scene> {
    let mut scenes: Vec<Scene> = Vec::new();
    let mut current: Option<Scene> = None;

    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("INT.") || trimmed.starts_with("EXT.") {
            if let Some(scene) = current.take() {
                scenes.push(scene);
            }
            current = Some(Scene {
                heading: trimmed.to_string(),
                content: format!("{}\n", line),
            });
        } else if let Some(scene) = current.as_mut() {
            scene.content.push_str(line);
            scene.content.push('\n');
        }
    }

    if let Some(scene) = current {
        scenes.push(scene);
    }

    scenes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_block() {
        let text = "Here you go:\n\n```fountain\nEpisode Title: The Great Mess\n\nPitch Paragraph: Chaos ensues.\n```\n\nHope you like it!";
        let block = extract_block(text);
        assert_eq!(
            block,
            "Episode Title: The Great Mess\n\nPitch Paragraph: Chaos ensues."
        );
    }

    #[test]
    fn test_extract_block_fallback_to_full_text() {
        let text = "  No fence here, just a script.  ";
        assert_eq!(extract_block(text), "No fence here, just a script.");
    }

    #[test]
    fn test_extract_block_takes_first_of_multiple() {
        let text = "```fountain\nfirst\n```\n\n```fountain\nsecond\n```";
        assert_eq!(extract_block(text), "first");
    }

    #[test]
    fn test_parse_pitch() {
        let block = "Episode Title: The Soup Rebellion\n\nPitch Paragraph: Kiddo refuses to eat soup, and the kitchen pays the price. By dinner's end everyone has learned something about stubbornness.";
        let fields = parse_pitch(block);
        assert_eq!(fields.episode_title, "The Soup Rebellion");
        assert!(fields.pitch_paragraph.starts_with("Kiddo refuses to eat soup"));
        assert!(fields.pitch_paragraph.ends_with("stubbornness."));
    }

    #[test]
    fn test_parse_pitch_multiline_paragraph() {
        let block = "Episode Title: A Title\n\nPitch Paragraph: First line.\nSecond line.";
        let fields = parse_pitch(block);
        assert_eq!(fields.pitch_paragraph, "First line.\nSecond line.");
    }

    #[test]
    fn test_parse_pitch_missing_fields() {
        let fields = parse_pitch("No structured fields at all.");
        assert!(fields.episode_title.is_empty());
        assert!(fields.pitch_paragraph.is_empty());
    }

    #[test]
    fn test_count_sfx_tags() {
        let script = "He opens the door. {{SFX: creak, 2 seconds}}\n\nShe gasps. {{SFX: sharp intake of breath, 1 second}}";
        assert_eq!(count_sfx_tags(script), 2);
        assert_eq!(count_sfx_tags("no tags here"), 0);
    }

    #[test]
    fn test_split_scenes() {
        let script = "Title: Test\n\nFADE IN:\n\nINT. TREEHOUSE - DAY\n\nKiddo looks around.\n\nEXT. GARDEN - DAY\n\nBlossom waters the plants.\n";
        let scenes = split_scenes(script);

        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].heading, "INT. TREEHOUSE - DAY");
        assert!(scenes[0].content.contains("Kiddo looks around."));
        assert_eq!(scenes[1].heading, "EXT. GARDEN - DAY");
        assert!(scenes[1].content.contains("Blossom waters the plants."));
    }

    #[test]
    fn test_split_scenes_none_found() {
        assert!(split_scenes("Just dialogue, no headings.").is_empty());
        assert!(split_scenes("").is_empty());
    }

    #[test]
    fn test_split_scenes_indented_heading() {
        let scenes = split_scenes("  INT. KITCHEN - NIGHT\nAction here.\n");
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].heading, "INT. KITCHEN - NIGHT");
    }
}
