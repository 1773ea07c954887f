//! Realignment observation for polyrhythmic sessions

use polygrid_core::{is_realignment, overall_lcm, Session};

/// Combined pattern length of everything currently audible, `None` when
/// nothing is.
pub fn session_lcm(session: &Session) -> Option<u64> {
    overall_lcm(session.audible_tracks().map(|t| t.step_count()))
}

/// Check one global step for a realignment boundary.
///
/// Purely observational: playback never depends on the result. Returns the
/// overall LCM when every audible track is back at its step 0
/// simultaneously.
pub fn check(session: &Session, global_step: u64) -> Option<u64> {
    let overall = session_lcm(session)?;
    is_realignment(global_step, overall).then_some(overall)
}
