//! Per-track step resolution and swing timing

/// Steps per beat (16th notes)
pub const STEPS_PER_BEAT: f64 = 4.0;

/// A global step mapped onto one track's grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalStep {
    /// Step index within the track's own loop
    pub index: u32,
    /// Whether this step receives the swing offset
    pub swung: bool,
}

/// Map a global step onto a track's grid.
///
/// The swing flag is derived from the *local* index parity, so a 5-step
/// track swings steps 1 and 3 of every cycle and never step 0, no matter
/// where the global counter sits.
///
/// # Example
/// ```
/// use polygrid_core::resolve;
/// let step = resolve(7, 5);
/// assert_eq!(step.index, 2);
/// assert!(!step.swung);
/// ```
pub fn resolve(global_step: u64, step_count: u32) -> LocalStep {
    let index = (global_step % u64::from(step_count.max(1))) as u32;
    LocalStep { index, swung: index % 2 == 1 }
}

/// Duration of one step in seconds at the given tempo
pub fn step_duration_secs(tempo_bpm: f64) -> f64 {
    60.0 / tempo_bpm / STEPS_PER_BEAT
}

/// Timing offset in seconds for a resolved step.
///
/// Odd local steps are delayed by up to half a step; even steps are never
/// shifted.
pub fn swing_offset_secs(step: LocalStep, swing_amount: f32, step_duration: f64) -> f64 {
    if step.swung {
        f64::from(swing_amount) * step_duration / 2.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_step_wraps_per_track() {
        // 5-step track over global steps 0..9
        let indices: Vec<u32> = (0..10).map(|g| resolve(g, 5).index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_swing_follows_local_parity() {
        // Local parity repeats every 5 steps for a 5-step track.
        // Global parity would alternate every 2 steps; that is the bug
        // this function exists to rule out.
        let flags: Vec<bool> = (0..10).map(|g| resolve(g, 5).swung).collect();
        assert_eq!(
            flags,
            vec![false, true, false, true, false, false, true, false, true, false]
        );
        assert_ne!(
            flags,
            vec![false, true, false, true, false, true, false, true, false, true]
        );
    }

    #[test]
    fn test_resolve_in_range_for_whitelist_counts() {
        use crate::registry::WhitelistRegistry;
        for &n in WhitelistRegistry::global().step_counts() {
            for g in [0u64, 1, n as u64 - 1, n as u64, 1_000_003] {
                let step = resolve(g, n);
                assert!(step.index < n);
                assert_eq!(u64::from(step.index), g % u64::from(n));
            }
        }
    }

    #[test]
    fn test_step_zero_never_swung() {
        for n in [3u32, 4, 5, 8, 13] {
            for cycle in 0..4u64 {
                assert!(!resolve(cycle * u64::from(n), n).swung);
            }
        }
    }

    #[test]
    fn test_swing_offset() {
        let dur = step_duration_secs(120.0);
        assert!((dur - 0.125).abs() < 1e-9);

        let swung = LocalStep { index: 1, swung: true };
        let straight = LocalStep { index: 2, swung: false };
        assert_eq!(swing_offset_secs(straight, 1.0, dur), 0.0);
        assert!((swing_offset_secs(swung, 1.0, dur) - dur / 2.0).abs() < 1e-9);
        assert!((swing_offset_secs(swung, 0.5, dur) - dur / 4.0).abs() < 1e-9);
    }
}
