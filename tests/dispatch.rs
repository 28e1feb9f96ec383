//! Dispatcher integration tests
//!
//! Ordering and routing properties of the command table

use hark::dispatch::{Action, EXIT_WORDS, YOUTUBE_URL, dispatch, search_url, to_url};

#[test]
fn test_every_command_maps_to_one_action() {
    let cases = [
        ("what time is it", Action::TellTime),
        ("what is the date", Action::TellDate),
        ("open youtube", Action::OpenYouTube),
        ("open rust-lang.org", Action::OpenUrl("https://rust-lang.org".to_string())),
        ("open calculator", Action::LaunchApp("calculator".to_string())),
        ("search for ferris", Action::Search("ferris".to_string())),
        ("search for", Action::AskSearchQuery),
        ("play music", Action::PlayMusic),
        ("stop music", Action::StopMusic),
        ("tell me a joke", Action::TellJoke),
        ("quit", Action::Exit),
        ("sing a song", Action::Fallback("sing a song".to_string())),
    ];

    for (command, expected) in cases {
        assert_eq!(dispatch(command), expected, "command: {command}");
    }
}

#[test]
fn test_case_and_whitespace_insensitive() {
    assert_eq!(dispatch("  WHAT TIME IS IT  "), Action::TellTime);
    assert_eq!(dispatch("Open YouTube"), Action::OpenYouTube);
    assert_eq!(
        dispatch("OPEN Example.COM"),
        Action::OpenUrl("https://example.com".to_string())
    );
}

#[test]
fn test_earlier_tests_shadow_later_ones() {
    // "time" before "search for"
    assert_eq!(dispatch("search for time zones"), Action::TellTime);
    // "date" before "play music"
    assert_eq!(dispatch("play music from that date"), Action::TellDate);
    // "search for" before "joke"
    assert_eq!(
        dispatch("search for a joke"),
        Action::Search("a joke".to_string())
    );
    // "play music" before exit words
    assert_eq!(dispatch("play music then quit"), Action::PlayMusic);
    // "open youtube" before the generic "open " prefix
    assert_eq!(dispatch("open youtube.com"), Action::OpenYouTube);
}

#[test]
fn test_open_target_classification() {
    assert_eq!(
        dispatch("open https://docs.rs"),
        Action::OpenUrl("https://docs.rs".to_string())
    );
    assert_eq!(
        dispatch("open news.ycombinator.com"),
        Action::OpenUrl("https://news.ycombinator.com".to_string())
    );
    assert_eq!(dispatch("open vlc"), Action::LaunchApp("vlc".to_string()));
    assert_eq!(
        dispatch("open google chrome"),
        Action::LaunchApp("google chrome".to_string())
    );
}

#[test]
fn test_search_query_taken_after_phrase() {
    assert_eq!(
        dispatch("please search for the borrow checker"),
        Action::Search("the borrow checker".to_string())
    );
}

#[test]
fn test_exit_words() {
    for word in EXIT_WORDS {
        assert_eq!(dispatch(word), Action::Exit);
        assert_eq!(dispatch(&format!("ok {word} now")), Action::Exit);
    }
}

#[test]
fn test_url_helpers() {
    assert_eq!(YOUTUBE_URL, "https://www.youtube.com");
    assert_eq!(to_url("http://localhost:8080"), "http://localhost:8080");
    assert_eq!(to_url("example.org/path"), "https://example.org/path");
    assert_eq!(
        search_url("  spaced   out  words "),
        "https://www.google.com/search?q=spaced+out+words"
    );
    assert_eq!(
        search_url("what is 50% of 10"),
        "https://www.google.com/search?q=what+is+50%25+of+10"
    );
}
