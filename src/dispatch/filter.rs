//! Event filters.

use std::fmt;
use std::sync::Arc;

use quarid_proto::{ChannelExt, Event};

type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// One condition an [`Event`] must satisfy for a route to fire.
#[derive(Clone)]
pub enum Filter {
    /// Command token equality, ASCII case-insensitive.
    Command(String),
    /// First parameter is a channel name.
    ChannelTarget,
    /// First parameter is not a channel name (a direct message).
    PrivateTarget,
    /// Arbitrary predicate.
    Predicate(Predicate),
}

impl Filter {
    pub fn command(command: &str) -> Self {
        Self::Command(command.to_ascii_uppercase())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Command(command) => event.is(command),
            Self::ChannelTarget => event.target().is_some_and(|t| t.is_channel_name()),
            Self::PrivateTarget => event.target().is_some_and(|t| !t.is_channel_name()),
            Self::Predicate(f) => f(event),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(c) => f.debug_tuple("Command").field(c).finish(),
            Self::ChannelTarget => f.write_str("ChannelTarget"),
            Self::PrivateTarget => f.write_str("PrivateTarget"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(line: &str) -> Event {
        line.parse().unwrap()
    }

    #[test]
    fn command_filter_ignores_case() {
        let filter = Filter::command("privmsg");
        assert!(filter.matches(&ev(":a!b@c PRIVMSG #x :hi")));
        assert!(!filter.matches(&ev(":a!b@c NOTICE #x :hi")));
    }

    #[test]
    fn target_filters() {
        let chan = ev(":a!b@c PRIVMSG #x :hi");
        let private = ev(":a!b@c PRIVMSG quarid :hi");
        assert!(Filter::ChannelTarget.matches(&chan));
        assert!(!Filter::ChannelTarget.matches(&private));
        assert!(Filter::PrivateTarget.matches(&private));
        assert!(!Filter::PrivateTarget.matches(&chan));
        assert!(!Filter::PrivateTarget.matches(&ev("PING")));
    }

    #[test]
    fn predicate_filter() {
        let filter = Filter::predicate(|e| e.origin_nick() == "a");
        assert!(filter.matches(&ev(":a!b@c PRIVMSG #x :hi")));
        assert!(!filter.matches(&ev(":z!b@c PRIVMSG #x :hi")));
        assert_eq!(format!("{filter:?}"), "Predicate(..)");
    }
}
