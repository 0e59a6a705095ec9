//! Reply prompt construction and acceptance.
//!
//! [`build_prompt`] renders the persona prompt sent to the text generator for a
//! candidate item. [`accept_reply`] decides whether generated text is usable,
//! rejecting empty output and text carrying a known failure marker.

use serde::{Deserialize, Serialize};

use crate::reddit::{Item, ItemKind};
use crate::sentiment::Tone;

/// Voice used for generated replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Concise, civil and on-topic.
    #[default]
    Helpful,
    /// Casual humor, slang and the occasional roast.
    Witty,
}

/// Markers that flag generated text as a non-answer.
pub const DEFAULT_REJECT_MARKERS: &[&str] = &["unable to generate", "lost it", "as an ai"];

/// Render the generation prompt for `item`.
pub fn build_prompt(persona: Persona, item: &Item, tone: Option<Tone>) -> String {
    let body = if item.body.trim().is_empty() {
        "[No body text provided]"
    } else {
        item.body.trim()
    };
    let subject = match item.kind {
        ItemKind::Post => "post",
        ItemKind::Comment => "comment",
    };

    let mut prompt = match persona {
        Persona::Helpful => format!(
            "You are a Reddit user. Your goal is to write a helpful, relevant, and concise \
             comment replying to the following Reddit {subject} in r/{sub}.\n\
             Sound like a regular Reddit user, but keep it civil and on-topic.\n\
             Do not state that you are an AI; a disclaimer is added separately.\n\
             \n\
             Title: \"{title}\"\n\
             Body: \"{body}\"\n",
            sub = item.subreddit,
            title = item.title,
        ),
        Persona::Witty => format!(
            "You're a witty, sarcastic, and sometimes deeply insightful Reddit user who \
             replies with casual humor, pop culture references, and real empathy. \
             Sometimes you roast, sometimes you're thoughtful, depending on the tone of \
             the {subject}.\n\
             Never sound like a bot. Avoid formal language and buzzwords. Slang and \
             emojis are fine, just don't be cringe. Nothing offensive.\n\
             \n\
             Here's the Reddit {subject} from r/{sub} you're replying to:\n\
             \n\
             TITLE: {title}\n\
             BODY: {body}\n",
            sub = item.subreddit,
            title = item.title,
        ),
    };

    match tone {
        Some(Tone::Negative) => prompt.push_str(
            "\nThe author seems to be having a rough time. Be kind and supportive; no roasting.\n",
        ),
        Some(Tone::Positive) => {
            prompt.push_str("\nThe author is in a good mood. Match their energy.\n")
        }
        Some(Tone::Neutral) | None => {}
    }

    match persona {
        Persona::Helpful => prompt.push_str("\nWrite a relevant comment for this:\n"),
        Persona::Witty => prompt.push_str(
            "\nWrite your Reddit comment in 2-4 sentences. Keep it real.\n",
        ),
    }
    prompt
}

/// Return the trimmed reply if it is usable, `None` otherwise.
pub fn accept_reply<S: AsRef<str>>(text: &str, reject_markers: &[S]) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if reject_markers
        .iter()
        .any(|m| !m.as_ref().is_empty() && lower.contains(&m.as_ref().to_lowercase()))
    {
        return None;
    }
    Some(trimmed.to_string())
}

/// Append the disclaimer, if any, to an accepted reply.
pub fn with_disclaimer(reply: &str, disclaimer: &str) -> String {
    if disclaimer.trim().is_empty() {
        reply.to_string()
    } else {
        format!("{reply}{disclaimer}")
    }
}
