use i_overlay::core::overlay_rule::OverlayRule;

use crate::config::BooleanOp;

impl BooleanOp {
    /// Overlay rule that computes this operation with subject `a` and clip `b`.
    pub(crate) fn overlay_rule(self) -> OverlayRule {
        match self {
            Self::Union => OverlayRule::Union,
            Self::Subtract => OverlayRule::Difference,
            Self::Intersect => OverlayRule::Intersect,
        }
    }

    /// Slice presence that survives the operation: union keeps slices of
    /// either operand, subtract only the subject's, intersect only shared ones.
    pub(crate) fn keeps_slice(self, in_a: bool, in_b: bool) -> bool {
        match self {
            Self::Union => in_a || in_b,
            Self::Subtract => in_a,
            Self::Intersect => in_a && in_b,
        }
    }
}
