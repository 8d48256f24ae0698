use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// `<anything>, <game name> turn <number>`, as written by the Dominions 5
/// server into the `<title>` of its status page.
static TITLE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*, (.+) turn (\d+)$").expect("title pattern compiles"));

/// A new turn of a hosted game, pulled from the status page title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TurnEvent {
    pub name: String,
    pub turn_number: u32,
}

impl TurnEvent {
    pub fn new(name: impl Into<String>, turn_number: u32) -> Self {
        Self {
            name: name.into(),
            turn_number,
        }
    }

    /// Announcement text.  Doubles as the key for the channel-history
    /// duplicate check, so it must stay byte-stable for equal events.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Turn {} of the Dominions 5 game {} has started",
            self.turn_number, self.name
        )
    }
}

/// Turns raw artifact content into an optional [`TurnEvent`].
///
/// Implementations must be pure: no I/O, no retained state, and no panics on
/// malformed input.  `None` means "nothing to announce this cycle".
pub trait EventExtractor {
    fn extract(&self, raw: &str) -> Option<TurnEvent>;
}

/// Reads the `<title>` of the HTML status page and matches it against the
/// server's title format.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPageExtractor;

impl EventExtractor for StatusPageExtractor {
    fn extract(&self, raw: &str) -> Option<TurnEvent> {
        let title = page_title(raw)?;
        parse_title(&title)
    }
}

fn page_title(raw: &str) -> Option<String> {
    let document = Html::parse_document(raw);
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;
    Some(element.text().collect::<String>())
}

/// Match a bare title string.  Surrounding whitespace is ignored; a turn
/// number that does not fit in `u32` counts as malformed.
pub fn parse_title(title: &str) -> Option<TurnEvent> {
    let captures = TITLE_FORMAT.captures(title.trim())?;
    let name = captures.get(1)?.as_str();
    let turn_number = captures.get(2)?.as_str().parse().ok()?;
    Some(TurnEvent::new(name, turn_number))
}
