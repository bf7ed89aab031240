//! Keyword-matched first-aid assistant.
//!
//! Guidance shown while a rescue team is on its way. Matching is plain
//! substring search over the lowercased input, checked in a fixed
//! precedence order: specific conditions first, then animal type, then
//! greetings and generic situations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatAuthor {
    Assistant,
    Reporter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: ChatAuthor,
    pub text: String,
}

const GREETING: &str = "Hi! I'm your animal first aid assistant. I can help you provide \
immediate care until the rescue team arrives. What type of animal needs help?";

const BLEEDING: &[&str] = &[
    "Bleeding control:",
    "1. Use a clean cloth or gauze",
    "2. Apply firm, direct pressure",
    "3. Keep the pressure on for 5 minutes without peeking",
    "4. If blood soaks through, add more layers",
    "5. Elevate the wound above the heart if possible",
    "6. Keep the animal calm and still",
    "For severe bleeding, maintain constant pressure until help arrives.",
];

const BREATHING: &[&str] = &[
    "Breathing difficulties:",
    "1. Clear any obstruction from the mouth",
    "2. Extend the neck slightly to open the airway",
    "3. Do not tilt the head back",
    "4. Stay calm; stress worsens breathing",
    "5. Provide fresh air and watch chest movement",
    "If the animal is not breathing, close the mouth and breathe into the nose, \
one breath every 3 seconds.",
];

const SHOCK: &[&str] = &[
    "Treating shock:",
    "1. Keep the animal lying down",
    "2. Cover with a blanket, but not the head",
    "3. Keep things calm and quiet",
    "4. Do not give food or water",
    "5. Monitor breathing and pulse",
    "Signs of shock: pale gums, rapid breathing, weak pulse, cold extremities.",
];

const POISONING: &[&str] = &[
    "Suspected poisoning:",
    "1. Do NOT induce vomiting",
    "2. Remove any remaining poison from the mouth",
    "3. Keep a sample of the poison if it is safe to do so",
    "4. Keep the animal calm and still",
    "5. Note the symptoms and the time",
    "This is urgent; help is on the way.",
];

const DOG_INJURED: &[&str] = &[
    "For an injured dog:",
    "1. Approach slowly and speak softly",
    "2. Avoid sudden movements",
    "3. If conscious, check breathing",
    "4. Keep warm with a blanket or cloth",
    "5. Do not move the dog if a spine injury is suspected",
    "6. Monitor breathing and consciousness",
];

const DOG_ACCIDENT: &[&str] = &[
    "For an accident victim:",
    "1. Move to a safe area if in traffic",
    "2. Check for breathing",
    "3. Look for visible injuries",
    "4. Keep still; do not bend the limbs",
    "5. Cover with a blanket to prevent shock",
    "6. Talk calmly to comfort the animal",
    "Stay with the animal until help arrives.",
];

const CAT_INJURED: &[&str] = &[
    "For an injured cat:",
    "1. Approach slowly; cats hide when hurt",
    "2. Use a blanket to gently restrain if needed",
    "3. Keep in a dark, quiet space",
    "4. Watch for breathing difficulties",
    "5. Do not give food or water",
];

const CAT_ACCIDENT: &[&str] = &[
    "For a cat hit in an accident:",
    "1. Use a cardboard box as a stretcher",
    "2. Move gently to a safe location",
    "3. Check breathing",
    "4. Keep warm and quiet",
    "5. Note visible injuries",
];

const BIRD_INJURED: &[&str] = &[
    "For an injured bird:",
    "1. Place in a small box with air holes",
    "2. Keep warm, but not hot",
    "3. Keep quiet; stress is dangerous for birds",
    "4. Do not give food or water",
    "5. Minimise handling and keep away from pets",
];

const GENERAL: &[&str] = &[
    "General first aid steps:",
    "1. Stay calm; animals sense your stress",
    "2. Ensure your own safety first",
    "3. Keep the animal still and warm",
    "4. Do not give food or water",
    "5. Monitor breathing and note symptoms",
    "Ask me about specific injuries: \"bleeding\", \"breathing\", \"accident\", \
or \"poisoning\".",
];

const FALLBACK: &[&str] = &[
    "I can help with:",
    "Dogs: try \"dog injured\" or \"dog bleeding\"",
    "Cats: try \"cat injured\" or \"cat accident\"",
    "Birds: try \"bird injured\"",
    "Specific conditions: \"bleeding\", \"breathing\", \"accident\", \"poisoning\"",
    "Or just describe the situation and I'll help.",
];

/// Pick guidance for a free-text question.
#[must_use]
pub fn respond(input: &str) -> &'static [&'static str] {
    let input = input.to_lowercase();
    let has = |needle: &str| input.contains(needle);

    if has("bleed") {
        return BLEEDING;
    }
    if has("breath") || has("chok") {
        return BREATHING;
    }
    if has("shock") || has("unconscious") {
        return SHOCK;
    }
    if has("poison") || has("toxic") {
        return POISONING;
    }

    if has("dog") || has("puppy") {
        if has("accident") || has("hit") {
            return DOG_ACCIDENT;
        }
        return DOG_INJURED;
    }
    if has("cat") || has("kitten") {
        if has("accident") || has("hit") {
            return CAT_ACCIDENT;
        }
        return CAT_INJURED;
    }
    if has("bird") {
        return BIRD_INJURED;
    }

    if has("hi") || has("hello") || has("help") {
        return GENERAL;
    }
    if has("accident") || has("hit") || has("car") {
        return DOG_ACCIDENT;
    }

    FALLBACK
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantLog {
    messages: Vec<ChatMessage>,
}

impl Default for AssistantLog {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage {
                author: ChatAuthor::Assistant,
                text: GREETING.into(),
            }],
        }
    }
}

impl AssistantLog {
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record a question and answer it. Blank input is ignored.
    pub fn ask(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.messages.push(ChatMessage {
            author: ChatAuthor::Reporter,
            text: text.to_string(),
        });
        self.messages.push(ChatMessage {
            author: ChatAuthor::Assistant,
            text: respond(text).join("\n"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_take_precedence_over_animal_type() {
        assert_eq!(respond("my dog is bleeding"), BLEEDING);
        assert_eq!(respond("cat cannot BREATHE"), BREATHING);
        assert_eq!(respond("ate something toxic"), POISONING);
    }

    #[test]
    fn animal_type_routes_to_species_guidance() {
        assert_eq!(respond("dog hit by car"), DOG_ACCIDENT);
        assert_eq!(respond("injured puppy on the road"), DOG_INJURED);
        assert_eq!(respond("kitten in an accident"), CAT_ACCIDENT);
        assert_eq!(respond("found a bird"), BIRD_INJURED);
    }

    #[test]
    fn accidents_without_species_get_generic_accident_guidance() {
        assert_eq!(respond("road accident near the temple"), DOG_ACCIDENT);
    }

    #[test]
    fn greetings_get_the_general_guidance() {
        assert_eq!(respond("hello there"), GENERAL);
        assert_eq!(respond("please help"), GENERAL);
    }

    #[test]
    fn unknown_input_gets_the_menu() {
        assert_eq!(respond("xyzzy"), FALLBACK);
    }

    #[test]
    fn log_starts_with_a_greeting_and_ignores_blank_questions() {
        let mut log = AssistantLog::default();
        assert_eq!(log.messages().len(), 1);
        assert_eq!(log.messages()[0].author, ChatAuthor::Assistant);

        log.ask("   ");
        assert_eq!(log.messages().len(), 1);

        log.ask("dog bleeding");
        assert_eq!(log.messages().len(), 3);
        assert_eq!(log.messages()[1].author, ChatAuthor::Reporter);
        assert!(log.messages()[2].text.contains("Bleeding control"));
    }
}
