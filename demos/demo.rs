//! End-to-end walkthrough: parse, stringify, score and profile a handful
//! of patterns, printing what the library reports for each.

use relint_core::emitters::pcre::stringify;
use relint_core::{parse, profile, score};

fn main() {
    println!("=== RegexLint core demo ===\n");

    let samples = [
        "/abc/",
        "/^\\d{4}-\\d{2}-\\d{2}$/",
        "/a*b/",
        "/(a+)+$/",
        "/(?>a+)+/",
        "/(a|a)*/",
        "/^(\\w+)\\s+\\1$/",
        "/a{1,10000}/",
    ];

    for source in samples {
        match parse(source) {
            Ok(regex) => {
                let result = profile(&regex);
                println!("Pattern:  {}", source);
                println!("Canonical: /{}/", stringify(&regex.pattern));
                println!("Score:    {}", score(&regex));
                println!("Severity: {:?}", result.severity);
                if let Some(trigger) = &result.trigger {
                    println!("Trigger:  {}", trigger);
                }
                for recommendation in &result.recommendations {
                    println!("  - {}", recommendation);
                }
                println!();
            }
            Err(err) => {
                println!("Pattern:  {}\n{}\n", source, err);
            }
        }
    }
}
