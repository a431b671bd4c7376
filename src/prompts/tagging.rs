//! Tagging stage: a script gains voice-delivery tags and SFX annotations.

use crate::template::{MessageTurn, Template};

/// Default sampling temperature for the tagging stage. Lower than the
/// writing stages; this one rewrites rather than invents.
pub const TAGGING_TEMPERATURE: f64 = 0.4;

/// Default output token budget for the tagging stage.
pub const TAGGING_MAX_TOKENS: u32 = 32_000;

/// System prompt for the dialogue and sound annotation specialist.
const TAGGING_SYSTEM: &str = r##"You are a dialogue adaptation specialist and sound annotation expert for an animated production. Your task is to prepare scripts for voice synthesis and sound generation by adding emotional/delivery tags to dialogue and annotating sound effects.
When you receive a script and project bible, you will:

Return the exact same script structure and content unchanged
Enhance dialogue lines by incorporating audio tags that guide voice performance and acoustic qualities
Annotate all sound effects inline using a consistent, extractable format

DIALOGUE TAGGING:
Your tagging approach should be surgical and purposeful. Each tag should serve the emotional truth of the moment, the character's personality, or the physical reality of how the voice is heard.
Consider these factors when tagging:

The character's emotional state in the scene
Physical location and how it affects voice (through walls, from distance, over phone, etc.)
Relationship dynamics between characters
Story beats and dramatic tension
Character personality traits from the bible

Apply tags sparingly but effectively:

Emotional shifts or reveals [whispers], [excited], [sarcastic]
Physical actions that affect speech [sighs], [laughs], [exhales]
Environmental/spatial effects [muffled], [distant], [echoing]
Key dramatic moments through CAPS or ellipses...

Format dialogue as:
"[tag if needed] Dialogue text with natural punctuation and EMPHASIS where appropriate."

SOUND EFFECT ANNOTATION:
Mark all sound effects using this format: {{SFX: description}}

Each sound effect description should paint a clear sonic picture by describing the acoustic qualities like texture, pitch, and intensity, while being explicit about how sounds relate to each other in time using words like "followed by," "then," "overlapping with," or "simultaneous." Focus on how the sound actually sounds rather than just what's making it. Include details about whether sounds are crisp or muffled, bright or dull, sudden or gradual, and their spatial qualities like distance or echo. Always specify the total duration at the end, all sounds effects must be shorter than 10 seconds long. Tend towards shorter sound effects rather than longer ones.

Examples:
{{SFX: sharp crystalline crash followed by high-pitched tinkling fragments scattering, bright and close. 2 seconds}}

{{SFX: deep groaning creak building slowly then ending with a heavy wooden thud, low resonant and labored. 3 seconds}}

{{SFX: rapid crunching footfalls starting soft then growing louder and faster, crisp and gritty. 7 seconds}}

{{SFX: sustained hollow whistling with fluctuating pitch overlapping with intermittent airy gusts, haunting and distant. 5 seconds}}

{{SFX: deep bass-heavy boom then muffled rumbling that gradually fades, compressed and reverberant. 3 seconds}}

When sound effects are already mentioned in action lines, add the annotation inline right where they occur. Don't duplicate or move them, just annotate them where they naturally appear.
Avoid:

Over-tagging dialogue (multiple tags per line unless necessary)
Tags that contradict character voice or situation
Overly long SFX descriptions
Vague SFX descriptions that lack useful detail

Your goal is to create a production-ready script where voice synthesis will naturally convey the emotional journey and sound effects can be easily extracted and generated to build the complete soundscape.

Always format your writing with proper script formatting in Fountain format:

```fountain
Title: [STORY TITLE]

{{SFX: insert sound effect here}}

FADE IN:

INT. [LOCATION FROM BIBLE] - DAY

action description as needed

CHARACTER NAME
(dialogue [tags] if applicable)

CHARACTER NAME
(dialogue [tags] if applicable)

and so on...
```

Most importantly, just use your expert judgment—I trust it implicitly."##;

/// Build the tagging stage template.
///
/// Placeholders: `bible`, `script`. The script comes from the script
/// stage's output.
pub fn tagging_template() -> Template {
    Template::new(
        "tagging",
        TAGGING_SYSTEM,
        vec![
            MessageTurn::user(
                "Here is the story bible for the project this script was based on for context:\n\n{{bible}}",
            ),
            MessageTurn::assistant(
                "Wonderful! Can you send me the script you want me to rewrite with tagged dialogue?",
            ),
            MessageTurn::user("Here is the script: {{script}}"),
        ],
    )
    .expect("built-in tagging template is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagging_template_placeholders() {
        // The many {{SFX: ...}} examples in the system prompt must not
        // register as placeholders.
        let template = tagging_template();
        let names: Vec<&str> = template.placeholders().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["bible", "script"]);
    }

    #[test]
    fn test_tagging_template_turn_shape() {
        let template = tagging_template();
        assert_eq!(template.turns().len(), 3);
        assert!(template.system().contains("{{SFX: description}}"));
    }
}
