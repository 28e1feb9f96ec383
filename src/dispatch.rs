//! Command dispatch
//!
//! Maps recognized command text to exactly one [`Action`] using ordered
//! substring tests. The first test that matches wins, so the specific
//! `"open youtube"` literal is checked before the generic `"open "` prefix.

/// YouTube home page
pub const YOUTUBE_URL: &str = "https://www.youtube.com";

/// Base of every web search
pub const SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Words that end the session
///
/// Matched anywhere in the text, so "exitstential" also exits.
pub const EXIT_WORDS: [&str; 3] = ["exit", "quit", "goodbye"];

/// What a command asks the assistant to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Speak the local time
    TellTime,
    /// Speak the local date
    TellDate,
    /// Open the YouTube home page
    OpenYouTube,
    /// Open a website
    OpenUrl(String),
    /// Start a desktop application by spoken name
    LaunchApp(String),
    /// Search the web for a query
    Search(String),
    /// "search for" with nothing after it
    AskSearchQuery,
    /// Play the first track in the music folder
    PlayMusic,
    /// Stop whatever is playing
    StopMusic,
    /// Tell a joke
    TellJoke,
    /// End the session
    Exit,
    /// Nothing matched; search the web for the whole command
    Fallback(String),
}

/// Pick the action for a command
#[must_use]
pub fn dispatch(command: &str) -> Action {
    let cmd = command.trim().to_lowercase();

    if cmd.contains("time") {
        Action::TellTime
    } else if cmd.contains("date") {
        Action::TellDate
    } else if cmd.contains("open youtube") {
        Action::OpenYouTube
    } else if let Some(target) = cmd.strip_prefix("open ") {
        open_target(target.trim())
    } else if let Some((_, query)) = cmd.split_once("search for") {
        let query = query.trim();
        if query.is_empty() {
            Action::AskSearchQuery
        } else {
            Action::Search(query.to_string())
        }
    } else if cmd.contains("play music") {
        Action::PlayMusic
    } else if cmd.contains("stop music") {
        Action::StopMusic
    } else if cmd.contains("joke") {
        Action::TellJoke
    } else if EXIT_WORDS.iter().any(|w| cmd.contains(w)) {
        Action::Exit
    } else {
        Action::Fallback(cmd)
    }
}

/// Websites contain a dot or "http"; anything else is an application
fn open_target(target: &str) -> Action {
    if target.contains('.') || target.contains("http") {
        Action::OpenUrl(to_url(target))
    } else {
        Action::LaunchApp(target.to_string())
    }
}

/// Prefix `https://` unless the target already starts with `http`
#[must_use]
pub fn to_url(target: &str) -> String {
    if target.starts_with("http") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}

/// Web search URL with whitespace-separated words joined by `+`
#[must_use]
pub fn search_url(query: &str) -> String {
    let terms: Vec<_> = query.split_whitespace().map(urlencoding::encode).collect();
    format!("{SEARCH_URL}{}", terms.join("+"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_wins_over_everything() {
        assert_eq!(dispatch("what time is it"), Action::TellTime);
        // "time" is tested before "open "
        assert_eq!(dispatch("open timetable.com"), Action::TellTime);
        // ...and before exit words
        assert_eq!(dispatch("quit wasting my time"), Action::TellTime);
    }

    #[test]
    fn test_date() {
        assert_eq!(dispatch("what's the date today"), Action::TellDate);
        // "update" contains "date"
        assert_eq!(dispatch("open update manager"), Action::TellDate);
    }

    #[test]
    fn test_open_youtube_before_generic_open() {
        assert_eq!(dispatch("open youtube"), Action::OpenYouTube);
        assert_eq!(dispatch("please open youtube now"), Action::OpenYouTube);
    }

    #[test]
    fn test_open_url_or_app() {
        assert_eq!(
            dispatch("open example.com"),
            Action::OpenUrl("https://example.com".to_string())
        );
        assert_eq!(
            dispatch("open http://intranet"),
            Action::OpenUrl("http://intranet".to_string())
        );
        assert_eq!(dispatch("open notepad"), Action::LaunchApp("notepad".to_string()));
        assert_eq!(
            dispatch("Open   Calculator "),
            Action::LaunchApp("calculator".to_string())
        );
    }

    #[test]
    fn test_open_must_be_prefix() {
        // Not a prefix, so it falls through to the fallback search
        assert_eq!(
            dispatch("please open notepad"),
            Action::Fallback("please open notepad".to_string())
        );
    }

    #[test]
    fn test_search() {
        assert_eq!(
            dispatch("search for cats and dogs"),
            Action::Search("cats and dogs".to_string())
        );
        assert_eq!(
            dispatch("can you search for rust   lifetimes "),
            Action::Search("rust   lifetimes".to_string())
        );
        assert_eq!(dispatch("search for"), Action::AskSearchQuery);
        assert_eq!(dispatch("search for    "), Action::AskSearchQuery);
    }

    #[test]
    fn test_music_and_joke() {
        assert_eq!(dispatch("play music"), Action::PlayMusic);
        assert_eq!(dispatch("stop music please"), Action::StopMusic);
        assert_eq!(dispatch("tell me a joke"), Action::TellJoke);
    }

    #[test]
    fn test_exit_words_are_unanchored() {
        assert_eq!(dispatch("exit"), Action::Exit);
        assert_eq!(dispatch("ok quit"), Action::Exit);
        assert_eq!(dispatch("goodbye"), Action::Exit);
        assert_eq!(dispatch("exitstential crisis"), Action::Exit);
    }

    #[test]
    fn test_fallback_keeps_text() {
        assert_eq!(
            dispatch("Make Me A Sandwich"),
            Action::Fallback("make me a sandwich".to_string())
        );
    }

    #[test]
    fn test_urls() {
        assert_eq!(to_url("example.com"), "https://example.com");
        assert_eq!(to_url("https://example.com"), "https://example.com");
        assert_eq!(
            search_url("cats and dogs"),
            "https://www.google.com/search?q=cats+and+dogs"
        );
        assert_eq!(search_url("c++ tutorial"), "https://www.google.com/search?q=c%2B%2B+tutorial");
    }
}
