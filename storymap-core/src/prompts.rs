//! Prompt construction for the narrative and illustration requests.

use crate::catalog::StoryNode;

/// Standing instruction for every narrative request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are the Keeper of Human Heritage.
Your Mission: To preserve the ancient myths of Earth exactly as they were told, acting as a time capsule for future generations.
Do NOT add modern interpretations, psychological advice, or \"wise elder\" spin.
Do NOT deconstruct the myth.

Task:
1. Retell the ancient myth associated with the location and subject provided.
2. Use the tone, rhythm, and style of the original oral tradition (e.g., Vedic, Biblical, Homeric, Egyptian).
3. Connect the story to the visual landscape below (using the visual cues) as if reading the story from the Earth itself.
4. Your goal is pure preservation. For fierce or wrathful deities like Narasimha, do not shy away from traditional depictions of divine violence, such as the slaying of the demon across the lap, as this is central to the iconographic truth found in the ancient texts and the Earth itself.

Keep it under 150 words. Be solemn, majestic, and accurate to the source material.";

pub const TEXT_TEMPERATURE: f32 = 0.7;
pub const IMAGE_ASPECT_RATIO: &str = "16:9";
pub const IMAGE_SIZE: &str = "1K";

/// A narrative request, independent of any client.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrompt {
    pub system_instruction: &'static str,
    pub body: String,
    pub temperature: f32,
}

/// An illustration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    pub body: String,
    pub aspect_ratio: &'static str,
    pub image_size: &'static str,
}

pub fn text_prompt(node: &StoryNode) -> TextPrompt {
    let c = node.coordinates;
    let body = format!(
        "Target: {}\nLocation: {}, {}\nMyth: {}\nMeaning: {}\nVisual: {}\n\n\
         Recite the ancient tale. Preserve the heritage.",
        node.title, c.lat, c.lng, node.description, node.cultural_context, node.visual_cue,
    );
    TextPrompt {
        system_instruction: SYSTEM_INSTRUCTION,
        body,
        temperature: TEXT_TEMPERATURE,
    }
}

pub fn image_prompt(node: &StoryNode) -> ImagePrompt {
    let c = node.coordinates;
    let body = format!(
        "Create a stunning, intricate, high-fidelity artistic masterpiece of: {title}.\n\
         Context: Ancient mythology encoded into the Earth at Latitude: {lat}, Longitude: {lng}.\n\n\
         Visual Style:\n\
         - A magnificent, museum-quality iconographic drawing or painting.\n\
         - Vivid, rich colors appropriate to the culture and subject (e.g., Lapis Lazuli for Egyptian, vibrant Ochre/Red for Vedic, Fresco styles for Classical).\n\
         - Intricate linework, divine proportions, majestic composition.\n\
         - Visually stunning work of art that correlates to the subject matter ({cue}).\n\
         - NOT a map overlay. A standalone artifact of the \"Galactic Storybook\".\n\n\
         Aspect Ratio: {aspect}.\n\
         Quality: 8k resolution style, cinematic, majestic.",
        title = node.title,
        lat = c.lat,
        lng = c.lng,
        cue = node.visual_cue,
        aspect = IMAGE_ASPECT_RATIO,
    );
    ImagePrompt {
        body,
        aspect_ratio: IMAGE_ASPECT_RATIO,
        image_size: IMAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::STORY_NODES;

    #[test]
    fn test_text_prompt_embeds_node() {
        let node = &STORY_NODES[1];
        let prompt = text_prompt(node);

        assert!(prompt.body.starts_with("Target: Narasimha\n"));
        assert!(prompt.body.contains("Location: 35.56862515854041, 53.75416837733463"));
        assert!(prompt.body.contains(&format!("Myth: {}", node.description)));
        assert!(prompt.body.contains(&format!("Meaning: {}", node.cultural_context)));
        assert!(prompt.body.contains(&format!("Visual: {}", node.visual_cue)));
        assert!(prompt.body.ends_with("Recite the ancient tale. Preserve the heritage."));
        assert_eq!(prompt.temperature, 0.7);
    }

    #[test]
    fn test_system_instruction_limits_length() {
        assert!(SYSTEM_INSTRUCTION.contains("under 150 words"));
        assert!(SYSTEM_INSTRUCTION.contains("Narasimha"));
    }

    #[test]
    fn test_image_prompt() {
        let prompt = image_prompt(&STORY_NODES[3]);
        assert!(prompt.body.contains("masterpiece of: Pegasus."));
        assert!(prompt.body.contains("(Winged equine shape.)"));
        assert!(prompt.body.contains("Aspect Ratio: 16:9."));
        assert_eq!(prompt.aspect_ratio, "16:9");
        assert_eq!(prompt.image_size, "1K");
    }
}
