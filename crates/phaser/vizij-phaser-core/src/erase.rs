//! Keyframe eraser: clears previously written phase keys over the interval for
//! every collected node, leaving the baseline in place.

use crate::frames::FrameInterval;
use crate::hierarchy::Tree;
use crate::provider::TransformProvider;

/// Clear phase keys in `interval` for all nodes of `tree`. Returns the number of
/// keys removed; a clean range yields 0.
pub fn erase_keyframes<P: TransformProvider + ?Sized>(
    provider: &mut P,
    tree: &Tree,
    interval: FrameInterval,
) -> usize {
    let mut cleared = 0usize;
    for handle in tree.handles() {
        cleared += provider.clear_keyframes(handle, interval);
    }
    if cleared > 0 {
        log::debug!(
            "cleared {cleared} key(s) on {} node(s) over [{}, {}]",
            tree.len(),
            interval.start(),
            interval.end()
        );
    }
    cleared
}
