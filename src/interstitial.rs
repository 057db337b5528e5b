use tracing::debug;

use crate::grouping::INTERSTITIAL_EVERY;

pub const BREAK_MESSAGES: [&str; 8] = [
    "You've been scrolling for a while. Maybe it's time to stop procrastinating!",
    "Hey, how about a break? You've scrolled quite a lot already.",
    "Remember: productivity matters. Maybe it's time to get back to work?",
    "Infinite scrolling isn't as productive as it looks...",
    "Have you thought about getting up to stretch your legs?",
    "How about a pause for a glass of water?",
    "Your eyes deserve a rest, don't they?",
    "That's a lot of information for one day, isn't it?",
];

/// Picks the message shown on break cards.
///
/// The message only moves when the loaded-post count crosses a multiple of
/// [`INTERSTITIAL_EVERY`], never on a plain repaint.
#[derive(Debug, Clone)]
pub struct BreakRotation {
    messages: &'static [&'static str],
    cursor: usize,
    crossings: usize,
    dismissed: bool,
}

impl Default for BreakRotation {
    fn default() -> Self {
        Self::new(&BREAK_MESSAGES)
    }
}

impl BreakRotation {
    pub fn new(messages: &'static [&'static str]) -> Self {
        Self {
            messages,
            cursor: 0,
            crossings: 0,
            dismissed: false,
        }
    }

    /// Feeds the total number of loaded posts. Returns true when the message
    /// advanced.
    pub fn observe_loaded(&mut self, loaded: usize) -> bool {
        let reached = loaded / INTERSTITIAL_EVERY;
        if reached <= self.crossings {
            // A refresh shrank the feed; start counting again from there
            self.crossings = reached;
            return false;
        }

        if !self.messages.is_empty() {
            let steps = reached - self.crossings;
            self.cursor = (self.cursor + steps) % self.messages.len();
        }
        self.crossings = reached;
        self.dismissed = false;
        debug!(loaded, cursor = self.cursor, "break message advanced");
        true
    }

    pub fn current(&self) -> Option<&'static str> {
        if self.dismissed {
            return None;
        }
        self.messages.get(self.cursor).copied()
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGES: [&str; 3] = ["a", "b", "c"];

    #[test]
    fn advances_once_per_crossing() {
        let mut rotation = BreakRotation::new(&MESSAGES);
        assert_eq!(rotation.current(), Some("a"));

        assert!(!rotation.observe_loaded(3));
        assert_eq!(rotation.current(), Some("a"));

        assert!(rotation.observe_loaded(4));
        assert_eq!(rotation.current(), Some("b"));

        assert!(!rotation.observe_loaded(7));
        assert!(!rotation.observe_loaded(7));
        assert_eq!(rotation.current(), Some("b"));
    }

    #[test]
    fn a_page_crossing_two_multiples_advances_twice() {
        let mut rotation = BreakRotation::new(&MESSAGES);
        assert!(rotation.observe_loaded(10));
        assert_eq!(rotation.current(), Some("c"));

        assert!(rotation.observe_loaded(12));
        assert_eq!(rotation.current(), Some("a"));
    }

    #[test]
    fn dismissing_hides_until_the_next_crossing() {
        let mut rotation = BreakRotation::new(&MESSAGES);
        rotation.observe_loaded(4);
        rotation.dismiss();
        assert_eq!(rotation.current(), None);

        rotation.observe_loaded(6);
        assert_eq!(rotation.current(), None);

        rotation.observe_loaded(8);
        assert_eq!(rotation.current(), Some("c"));
    }

    #[test]
    fn shrinking_feed_resets_the_threshold() {
        let mut rotation = BreakRotation::new(&MESSAGES);
        rotation.observe_loaded(8);
        assert_eq!(rotation.current(), Some("c"));

        assert!(!rotation.observe_loaded(0));
        assert!(rotation.observe_loaded(4));
        assert_eq!(rotation.current(), Some("a"));
    }

    #[test]
    fn default_pool_is_never_empty() {
        assert!(BreakRotation::default().current().is_some());
    }
}
