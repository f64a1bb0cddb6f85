//! Podcast script generation.
//!
//! Remote generation is attempted first through the shared rewrite backend;
//! replies that echo the input or come back blank are rejected. The
//! template generator below is the terminal strategy and always succeeds.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::PodcastStyle;
use crate::resilience::{remote_or_local, RetryPolicy};
use crate::rewrite::{GenerationParams, RewriteBackend};
use crate::Error;

/// Turns prepared content into a narrated podcast script.
pub struct PodcastNarrator {
    backend: Arc<dyn RewriteBackend>,
    policy: RetryPolicy,
}

impl PodcastNarrator {
    pub fn new(backend: Arc<dyn RewriteBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Generate a podcast script for `content`.
    ///
    /// Unknown styles quietly become Educational. This never fails; the
    /// worst case is the deterministic template script.
    pub async fn generate_script(&self, content: &str, topic: &str, style_name: &str) -> String {
        let style = PodcastStyle::parse_or_default(style_name);
        debug!(
            style = style.name(),
            topic,
            chars = content.chars().count(),
            "echocast narration requested"
        );

        let prompt = build_prompt(content, topic, style);
        let params = GenerationParams::narration();
        let backend = &self.backend;

        remote_or_local(
            &self.policy,
            "narrate",
            backend.is_configured(),
            || async {
                let script = backend.generate(&prompt, &params).await?;
                // A script that merely parrots the content is useless to
                // narrate; treat it as a failed attempt.
                if script.trim() == content.trim() {
                    return Err(Error::service("narrate", "model echoed the input"));
                }
                Ok(script)
            },
            || Ok(template_script(content, topic, style)),
        )
        .await
        .unwrap_or_else(|_| template_script(content, topic, style))
    }
}

fn style_guidance(style: PodcastStyle) -> &'static str {
    match style {
        PodcastStyle::Conversational => {
            "Create a friendly, chatty podcast script like a casual conversation between friends."
        }
        PodcastStyle::Educational => {
            "Create an informative, educational podcast script that explains concepts clearly."
        }
        PodcastStyle::Storytelling => {
            "Create a narrative podcast script with dramatic elements and storytelling techniques."
        }
        PodcastStyle::News => {
            "Create a formal, news-style podcast script with authoritative reporting."
        }
        PodcastStyle::Interview => {
            "Create an interview-style podcast script with questions and answers."
        }
    }
}

fn build_prompt(content: &str, topic: &str, style: PodcastStyle) -> String {
    let topic = topic.trim();
    let topic_line = if topic.is_empty() {
        "General explanation"
    } else {
        topic
    };
    format!(
        "Transform the following content into an engaging podcast script.\n\
         {guidance}\n\n\
         Guidelines:\n\
         - Use a conversational tone appropriate for the {style_lower} style\n\
         - Break down complex ideas into simple, digestible parts\n\
         - Use analogies and examples to make concepts relatable\n\
         - Add a brief introduction and conclusion\n\
         - Keep it engaging and easy to follow\n\n\
         Topic: {topic_line}\n\
         Style: {style}\n\n\
         Content to transform:\n\
         {content}\n\n\
         Podcast Script:",
        guidance = style_guidance(style),
        style_lower = style.name().to_lowercase(),
        style = style.name(),
    )
}

/// Deterministic script builder: style-keyed intro, per-paragraph
/// connectives, style-keyed outro.
pub(crate) fn template_script(content: &str, topic: &str, style: PodcastStyle) -> String {
    let topic = topic.trim();
    let mut intro = match style {
        PodcastStyle::Educational => format!(
            "Welcome to the EchoCast Podcast. I'm your host, and today we're exploring {}.\n\n",
            topic_or(topic, "an important topic")
        ),
        PodcastStyle::Conversational => format!(
            "Hey there! Welcome to the show. Today we're chatting about {}.\n\n",
            topic_or(topic, "something really interesting")
        ),
        PodcastStyle::Storytelling => format!(
            "Gather round, listeners. Today's story is about {}.\n\n",
            topic_or(topic, "a remarkable journey")
        ),
        PodcastStyle::News => format!(
            "This is EchoCast News. Our top story today: {}.\n\n",
            topic_or(topic, "important developments")
        ),
        PodcastStyle::Interview => format!(
            "Welcome to EchoCast Interviews. Today we're speaking with an expert about {}.\n\n",
            topic_or(topic, "their field of expertise")
        ),
    };
    intro.push_str("Let's dive right in.\n\n");

    let mut body: Vec<String> = Vec::new();
    for (i, paragraph) in content
        .split('\n')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        let line = match style {
            PodcastStyle::Educational if i == 0 => format!("To begin with, {}", paragraph),
            PodcastStyle::Educational => format!("Another important point: {}", paragraph),
            PodcastStyle::Conversational if i == 0 => {
                format!("So, here's the thing: {}", paragraph)
            }
            PodcastStyle::Conversational => format!("And you know what else? {}", paragraph),
            PodcastStyle::Storytelling => format!("As the story goes, {}", paragraph),
            PodcastStyle::News => format!("Reports indicate that {}", paragraph),
            PodcastStyle::Interview => format!("Our expert explains: {}", paragraph),
        };
        body.push(line);
    }

    let outro = match style {
        PodcastStyle::Educational => {
            "\n\nAnd that's our lesson for today. I hope you found this information helpful and informative."
        }
        PodcastStyle::Conversational => {
            "\n\nWell, that's all the time we have for today. Thanks for hanging out and chatting with me!"
        }
        PodcastStyle::Storytelling => {
            "\n\nAnd so our story comes to an end, but the lessons remain with us."
        }
        PodcastStyle::News => {
            "\n\nThat's all for this edition of EchoCast News. Stay tuned for more updates."
        }
        PodcastStyle::Interview => {
            "\n\nThank you to our expert for sharing those valuable insights with us today."
        }
    };

    format!(
        "{}{}{}\n\nThis has been an EchoCast production.",
        intro,
        body.join(" "),
        outro
    )
}

fn topic_or(topic: &str, fallback: &str) -> String {
    if topic.is_empty() {
        fallback.to_string()
    } else {
        topic.to_lowercase()
    }
}
