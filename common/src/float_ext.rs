pub trait FloatExt: Sized {
    /// Equality within the workspace-wide [`crate::EPSILON`].
    fn approximately_eq(self, other: Self) -> bool;

    /// Equality within an explicit absolute tolerance.
    fn near(self, other: Self, tolerance: Self) -> bool;

    /// Clamp into `[-1, 1]`; correlations drift past the bounds by round-off.
    fn clamp_unit(self) -> Self;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f32
    }

    fn near(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }

    fn clamp_unit(self) -> Self {
        self.clamp(-1.0, 1.0)
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn near(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }

    fn clamp_unit(self) -> Self {
        self.clamp(-1.0, 1.0)
    }
}
