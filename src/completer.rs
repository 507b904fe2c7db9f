use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use reedline::{Completer, Span, Suggestion};
use std::sync::{Arc, Mutex, PoisonError};

use symptom_cli::commands::ReplCommand;

/// Words the REPL can complete besides its commands: column ids for
/// `\sort`, symptom names for `\open records`
#[derive(Clone, Default)]
pub struct Vocabulary {
    words: Arc<Mutex<Vec<String>>>,
}

impl Vocabulary {
    pub fn replace(&self, words: Vec<String>) {
        *self.words.lock().unwrap_or_else(PoisonError::into_inner) = words;
    }

    fn snapshot(&self) -> Vec<String> {
        self.words
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub struct CommandCompleter {
    vocabulary: Vocabulary,
    matcher: SkimMatcherV2,
}

impl CommandCompleter {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let word_start = input.rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
        let partial = &input[word_start..];

        let (candidates, description): (Vec<String>, &str) = if word_start == 0 {
            (
                ReplCommand::names().iter().map(|n| n.to_string()).collect(),
                "command",
            )
        } else {
            (self.vocabulary.snapshot(), "value")
        };

        let mut scored: Vec<(i64, String)> = candidates
            .into_iter()
            .filter_map(|c| {
                if partial.is_empty() {
                    Some((0, c))
                } else {
                    self.matcher.fuzzy_match(&c, partial).map(|score| (score, c))
                }
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        scored
            .into_iter()
            .map(|(_, value)| Suggestion {
                value,
                description: Some(description.to_string()),
                extra: None,
                span: Span {
                    start: word_start,
                    end: pos,
                },
                style: None,
                append_whitespace: word_start == 0,
            })
            .collect()
    }
}
