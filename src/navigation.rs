use url::Url;

use crate::command::Command;

pub const FEED_HOST: &str = "x.com";
pub const FEED_PATH: &str = "/home";

pub fn is_feed_location(location: &str) -> bool {
    match parse_location(location) {
        Some(Location { host, path }) => {
            host.as_deref().map_or(true, is_feed_host) && path == FEED_PATH
        }
        None => false,
    }
}

pub fn decide(location: &str, is_active: bool) -> Option<Command> {
    let Some(parsed) = parse_location(location) else {
        log::warn!("ignoring navigation to unparsable location {location:?}");
        return None;
    };
    if parsed.host.as_deref().is_some_and(|host| !is_feed_host(host)) {
        return None;
    }
    if parsed.path == FEED_PATH {
        is_active.then_some(Command::Start)
    } else {
        Some(Command::Stop)
    }
}

struct Location {
    host: Option<String>,
    path: String,
}

fn parse_location(location: &str) -> Option<Location> {
    let location = location.trim();
    if location.starts_with('/') {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location)
            .to_string();
        return Some(Location { host: None, path });
    }
    let url = Url::parse(location).ok()?;
    Some(Location {
        host: Some(url.host_str()?.to_string()),
        path: url.path().to_string(),
    })
}

fn is_feed_host(host: &str) -> bool {
    host.eq_ignore_ascii_case(FEED_HOST) || host.eq_ignore_ascii_case("www.x.com")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_the_feed_view() {
        assert!(is_feed_location("https://x.com/home"));
        assert!(is_feed_location("https://x.com/home?ref=nav#top"));
        assert!(is_feed_location("/home"));
        assert!(!is_feed_location("https://x.com/home/extra"));
        assert!(!is_feed_location("https://x.com/someone/status/1"));
        assert!(!is_feed_location("https://example.com/home"));
        assert!(!is_feed_location(""));
    }

    #[test]
    fn home_with_active_flag_starts() {
        assert_eq!(decide("https://x.com/home", true), Some(Command::Start));
    }

    #[test]
    fn home_without_active_flag_does_nothing() {
        assert_eq!(decide("https://x.com/home", false), None);
    }

    #[test]
    fn leaving_home_stops_regardless_of_flag() {
        assert_eq!(decide("https://x.com/explore", true), Some(Command::Stop));
        assert_eq!(decide("/notifications", false), Some(Command::Stop));
    }

    #[test]
    fn foreign_or_broken_locations_are_ignored() {
        assert_eq!(decide("https://example.com/explore", true), None);
        assert_eq!(decide("not a url", true), None);
    }
}
