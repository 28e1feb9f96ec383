//! Joke source

use rand::seq::SliceRandom;

/// Produces one joke per call
pub trait JokeSource {
    fn joke(&mut self) -> String;
}

const JOKES: &[&str] = &[
    "There are 10 kinds of people: those who understand binary and those who don't.",
    "A SQL query walks into a bar, walks up to two tables and asks, can I join you?",
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I would tell you a UDP joke, but you might not get it.",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "How many programmers does it take to change a light bulb? None, that's a hardware problem.",
    "The two hardest problems in computer science are cache invalidation, naming things, and off-by-one errors.",
    "Why did the developer go broke? Because he used up all his cache.",
    "A programmer's partner says: buy a loaf of bread, and if they have eggs, get a dozen. The programmer comes home with twelve loaves.",
    "Knock knock. Race condition. Who's there?",
    "I've got a really good UDP joke to tell you, but I don't know if you'll get it.",
    "Why was the function sad after the party? It didn't get called.",
    "My code doesn't have bugs. It just develops random unexpected features.",
    "Why do Java developers wear glasses? Because they can't C sharp.",
    "To understand recursion, you must first understand recursion.",
];

/// Jokes compiled into the binary, picked at random
pub struct BuiltinJokes;

impl JokeSource for BuiltinJokes {
    fn joke(&mut self) -> String {
        JOKES
            .choose(&mut rand::thread_rng())
            .map_or_else(|| "I am out of jokes.".to_string(), |j| (*j).to_string())
    }
}
