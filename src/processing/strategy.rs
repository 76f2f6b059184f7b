use crate::models::OcrText;
use log::debug;

/// Label-anchored match on the field's own label.
pub const SCORE_LABELLED: u8 = 3;
/// Keyword found on the line, value read from the line or its neighbour.
pub const SCORE_LINE: u8 = 2;
/// Position or whole-text guess.
pub const SCORE_FALLBACK: u8 = 1;

/// One independent way of finding a field value.
pub struct Strategy<T> {
    pub name: &'static str,
    pub score: u8,
    pub run: fn(&OcrText) -> Option<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub value: T,
    pub strategy: &'static str,
    pub score: u8,
}

/// Run every strategy and keep the highest-scoring candidate.
/// On equal scores the strategy listed first wins.
pub fn select<T>(field: &str, strategies: &[Strategy<T>], text: &OcrText) -> Option<Candidate<T>> {
    let mut best: Option<Candidate<T>> = None;
    for strategy in strategies {
        let Some(value) = (strategy.run)(text) else {
            continue;
        };
        let better = best
            .as_ref()
            .map_or(true, |current| strategy.score > current.score);
        if better {
            best = Some(Candidate {
                value,
                strategy: strategy.name,
                score: strategy.score,
            });
        }
    }

    match &best {
        Some(candidate) => debug!("{}: selected via {}", field, candidate.strategy),
        None => debug!("{}: no strategy matched", field),
    }
    best
}
