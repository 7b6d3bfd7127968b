//! FAQ responder - answers free-text questions from a fixed topic table.
//!
//! Matching is a linear, first-match-wins substring scan: the input is trimmed
//! and lowercased, then each topic is tried in table order and the first one
//! with any keyword contained in the input answers. If no topic matches, a
//! small set of conversational cues (greeting, thanks, farewell) is tried in
//! that order, and failing that the fallback reply is used. The table is small
//! and curated, so there is no tokenizing, stemming or scoring, and evaluation
//! order alone decides between overlapping keywords.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A static FAQ entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    /// Unique key, also used in suggestion lists
    pub key: String,
    /// Short label shown when this topic is offered as a suggestion
    pub title: String,
    /// Lowercase phrases that select this topic when contained in the input
    pub keywords: Vec<String>,
    /// Canned answer
    pub response: String,
    /// Keys of topics to suggest after answering, in display order
    #[serde(default)]
    pub suggested_topics: Vec<String>,
}

/// Which rule produced a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// A topic from the table, by key
    Topic(String),
    /// A greeting such as "hello"
    Greeting,
    /// A thank-you
    Thanks,
    /// A goodbye
    Farewell,
    /// Nothing matched, or the input was empty
    Fallback,
}

/// A bot answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text to show the customer
    pub text: String,
    /// Topic keys to offer next
    pub suggestions: Vec<String>,
    /// Rule that produced this reply
    pub matched: MatchKind,
}

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"];
const THANKS_WORDS: &[&str] = &["thank", "thanks", "appreciate"];
const FAREWELL_WORDS: &[&str] = &["bye", "goodbye", "see you", "later"];

const GREETING_REPLY: &str =
    "Hello and welcome to the farm! Ask me about our eggs, chickens, prices or delivery.";
const THANKS_REPLY: &str = "You're welcome! Is there anything else I can help you with?";
const FAREWELL_REPLY: &str = "Goodbye! Thanks for visiting, and see you at the farm soon.";
const FALLBACK_REPLY: &str = "I'm not sure I understood that. You can ask about prices, \
    delivery, ordering or our products, or contact us directly and a person will help.";

/// Topics offered with the fallback reply and the welcome message.
pub const DEFAULT_SUGGESTIONS: &[&str] = &["pricing", "products", "delivery", "ordering"];

/// Answers customer questions from a topic table.
#[derive(Debug, Clone)]
pub struct Responder {
    topics: Vec<TopicRecord>,
}

impl Responder {
    /// Builds a responder from `topics`, in the order they will be tried.
    ///
    /// Keywords are lowercased. Duplicate topic keys are rejected.
    pub fn new(topics: Vec<TopicRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for topic in &topics {
            if !seen.insert(topic.key.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate FAQ topic key '{}'", topic.key),
                });
            }
        }

        let topics = topics
            .into_iter()
            .map(|mut topic| {
                topic.keywords = topic
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_ascii_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                topic
            })
            .collect();
        Ok(Self { topics })
    }

    /// The farm's standard FAQ table.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            topics: builtin_topics(),
        }
    }

    /// Topics in evaluation order.
    #[must_use]
    pub fn topics(&self) -> &[TopicRecord] {
        &self.topics
    }

    /// Looks up a topic by key.
    #[must_use]
    pub fn topic(&self, key: &str) -> Option<&TopicRecord> {
        self.topics.iter().find(|t| t.key == key)
    }

    /// Display label for a topic key, falling back to the key itself.
    #[must_use]
    pub fn title_of<'a>(&'a self, key: &'a str) -> &'a str {
        self.topic(key).map_or(key, |t| t.title.as_str())
    }

    /// Answers free-text `input`.
    #[must_use]
    pub fn respond(&self, input: &str) -> Reply {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return fallback();
        }

        if let Some(topic) = self
            .topics
            .iter()
            .find(|t| t.keywords.iter().any(|k| normalized.contains(k.as_str())))
        {
            return topic_reply(topic);
        }

        conversational_reply(&normalized).unwrap_or_else(fallback)
    }

    /// Answers a suggestion the customer picked, by topic key.
    #[must_use]
    pub fn respond_to_topic(&self, key: &str) -> Reply {
        self.topic(key).map_or_else(fallback, topic_reply)
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::builtin()
    }
}

fn topic_reply(topic: &TopicRecord) -> Reply {
    Reply {
        text: topic.response.clone(),
        suggestions: topic.suggested_topics.clone(),
        matched: MatchKind::Topic(topic.key.clone()),
    }
}

fn conversational_reply(normalized: &str) -> Option<Reply> {
    let contains_any = |words: &[&str]| words.iter().any(|w| normalized.contains(w));

    let (text, matched) = if contains_any(GREETING_WORDS) {
        (GREETING_REPLY, MatchKind::Greeting)
    } else if contains_any(THANKS_WORDS) {
        (THANKS_REPLY, MatchKind::Thanks)
    } else if contains_any(FAREWELL_WORDS) {
        (FAREWELL_REPLY, MatchKind::Farewell)
    } else {
        return None;
    };

    Some(Reply {
        text: text.to_string(),
        suggestions: default_suggestions(),
        matched,
    })
}

fn fallback() -> Reply {
    Reply {
        text: FALLBACK_REPLY.to_string(),
        suggestions: default_suggestions(),
        matched: MatchKind::Fallback,
    }
}

fn default_suggestions() -> Vec<String> {
    DEFAULT_SUGGESTIONS.iter().map(|s| (*s).to_string()).collect()
}

fn builtin_topics() -> Vec<TopicRecord> {
    let topic = |key: &str, title: &str, keywords: &[&str], response: &str, next: &[&str]| {
        TopicRecord {
            key: key.to_string(),
            title: title.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            response: response.to_string(),
            suggested_topics: next.iter().map(|k| (*k).to_string()).collect(),
        }
    };

    vec![
        topic(
            "pricing",
            "What are your prices?",
            &["price", "cost", "how much", "expensive", "cheap"],
            "A dozen free-range eggs is $4.50 and a tray of 30 is $10.50. Whole broilers \
             start at $12.99 and chicken breast is $9.95 per kg. Bulk and restaurant orders \
             get a discount, just ask!",
            &["ordering", "delivery", "products"],
        ),
        topic(
            "delivery",
            "Do you deliver?",
            &["deliver", "shipping", "ship", "pickup", "pick up", "collect"],
            "We deliver within 30 km of the farm on Tuesdays, Thursdays and Saturdays. \
             Orders over $40 ship free; otherwise delivery is $5. You can also pick up \
             at the farm shop any day.",
            &["ordering", "hours", "payment"],
        ),
        topic(
            "ordering",
            "How do I place an order?",
            &["order", "buy", "purchase", "checkout", "cart"],
            "Add products to your cart, then check out with your name, phone number and \
             (for delivery) your address. We confirm every order by phone the same day.",
            &["payment", "delivery", "pricing"],
        ),
        topic(
            "products",
            "What do you sell?",
            &["product", "sell", "egg", "chicken", "broiler", "meat", "chicks", "feed"],
            "We sell free-range eggs, whole broilers and cuts, day-old chicks for \
             backyard flocks, and the layer feed we use ourselves.",
            &["pricing", "quality", "ordering"],
        ),
        topic(
            "payment",
            "How can I pay?",
            &["pay", "card", "cash", "transfer", "mpesa", "invoice"],
            "We accept cash on delivery or pickup, card payments, and bank transfers for \
             bulk orders.",
            &["ordering", "delivery"],
        ),
        topic(
            "hours",
            "When are you open?",
            &["hour", "open", "close", "when can i visit", "weekend"],
            "The farm shop is open Monday to Saturday, 8am to 6pm, and Sunday mornings \
             until noon.",
            &["contact", "delivery"],
        ),
        topic(
            "contact",
            "How do I reach you?",
            &["contact", "phone", "call", "email", "whatsapp", "reach"],
            "Call or WhatsApp us on +1 555 0134, or email hello@henhouse.farm. We answer \
             within a working day.",
            &["hours", "farm"],
        ),
        topic(
            "farm",
            "Tell me about the farm",
            &["farm", "about", "who are you", "story", "visit"],
            "We're a family poultry farm raising birds on open pasture since 2009. \
             Visitors are welcome during shop hours.",
            &["quality", "hours", "contact"],
        ),
        topic(
            "quality",
            "How are the birds raised?",
            &["organic", "free range", "free-range", "antibiotic", "hormone", "healthy", "fresh"],
            "Our hens roam freely outdoors, eat a grain-based diet with no growth \
             hormones, and are only treated with antibiotics when a vet says they're sick. \
             Eggs are collected daily.",
            &["products", "farm"],
        ),
    ]
}
