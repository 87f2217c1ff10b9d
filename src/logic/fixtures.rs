//! Fixture generation: every participant meets every other participant exactly once.

use crate::models::{FixtureAlgorithm, Match, Participant};

/// Generate the full fixture list for `n` participants (numbered `1..=n`).
///
/// Pure and deterministic: the same `n` and algorithm always yield the same sequence.
/// `n < 2` yields an empty list. Clamping `n` to configured bounds is the caller's job.
pub fn generate_fixtures(n: u32, algorithm: FixtureAlgorithm) -> Vec<Match> {
    match algorithm {
        FixtureAlgorithm::Combinatorial => combinatorial_fixtures(n),
        FixtureAlgorithm::CircleMethod => circle_method_fixtures(n),
    }
}

/// All pairs `(i, j)` with `i < j`, in lexicographic order.
pub fn combinatorial_fixtures(n: u32) -> Vec<Match> {
    (1..=n)
        .flat_map(|i| (i + 1..=n).map(move |j| Match::new(i, j, None)))
        .collect()
}

/// Circle-method schedule flattened in round order.
pub fn circle_method_fixtures(n: u32) -> Vec<Match> {
    circle_method_rounds(n).into_iter().flatten().collect()
}

/// Number of rounds the circle method produces: `n - 1` for even `n`, `n` for odd `n`.
pub fn round_count(n: u32) -> u32 {
    if n < 2 {
        0
    } else if n % 2 == 0 {
        n - 1
    } else {
        n
    }
}

/// Circle-method schedule grouped by round.
///
/// 1. Seat participants `1..=n`; add a bye seat when `n` is odd.
/// 2. Each round pairs seat `i` with seat `size - 1 - i`, skipping the bye.
/// 3. Seat 0 stays fixed; the rest rotate right by one between rounds.
pub fn circle_method_rounds(n: u32) -> Vec<Vec<Match>> {
    if n < 2 {
        return Vec::new();
    }

    // None is the bye seat.
    let mut seats: Vec<Option<Participant>> = (1..=n).map(Some).collect();
    if n % 2 == 1 {
        seats.push(None);
    }
    let size = seats.len();

    let mut rounds = Vec::with_capacity(size - 1);
    for round in 0..size - 1 {
        let matches: Vec<Match> = (0..size / 2)
            .filter_map(|i| match (seats[i], seats[size - 1 - i]) {
                (Some(a), Some(b)) => Some(Match::new(a, b, Some(round as u32 + 1))),
                _ => None,
            })
            .collect();
        rounds.push(matches);
        seats[1..].rotate_right(1);
    }
    rounds
}
