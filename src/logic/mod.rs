//! Tracker business logic: fixture generation, reconciliation, league mutations.

mod fixtures;
mod league_ops;
mod reconcile;

pub use fixtures::{
    circle_method_fixtures, circle_method_rounds, combinatorial_fixtures, generate_fixtures,
    round_count,
};
pub use league_ops::{
    is_edit_locked, progress, reset_league, set_participant_count, shift_participant_count,
    toggle_match,
};
pub use reconcile::{apply_change, filter_rows, prune_stale, replace_from_rows, valid_keys};
