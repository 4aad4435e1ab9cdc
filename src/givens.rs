use ndarray::{ArrayBase, DataMut, Ix2};

/// A Givens Rotation
#[derive(Debug, Clone)]
pub struct GivensRotation {
    c: f64,
    s: f64,
}

impl GivensRotation {
    /// The rotation that does nothing
    pub fn identity() -> Self {
        Self { c: 1.0, s: 0.0 }
    }

    /// Computes rotation `R` such that the `y` component of `R * [x, y].t` is 0
    ///
    /// Returns `None` if `y` is 0 (no rotation needed), otherwise return the rotation and the norm
    /// of vector `[x, y]`.
    pub fn cancel_y(x: f64, y: f64) -> Option<(Self, f64)> {
        if y != 0.0 {
            let r = x.hypot(y);
            let c = x / r;
            let s = -y / r;
            Some((Self { c, s }, r))
        } else {
            None
        }
    }

    /// Computes rotation `R` such that the `x` component of `R * [x, y].t` is 0
    ///
    /// Returns `None` if `x` is 0, otherwise return the rotation and the norm of vector `[x, y]`.
    pub fn cancel_x(x: f64, y: f64) -> Option<(Self, f64)> {
        if x != 0.0 {
            let r = x.hypot(y);
            let c = y / r;
            let s = x / r;
            Some((Self { c, s }, r))
        } else {
            None
        }
    }

    /// Builds the rotation from non-normalized cosine and sine components, keeping the cosine
    /// nonnegative.
    ///
    /// Returns the rotation and the sign factored out of the components. A zero vector yields the
    /// identity rotation.
    pub fn normalize(c: f64, s: f64) -> (Self, f64) {
        let r = c.hypot(s);
        if r == 0.0 {
            return (Self::identity(), 1.0);
        }
        let sign = if c < 0.0 { -1.0 } else { 1.0 };
        (
            Self {
                c: c.abs() / r,
                s: s / (sign * r),
            },
            sign,
        )
    }

    pub fn c(&self) -> f64 {
        self.c
    }
    pub fn s(&self) -> f64 {
        self.s
    }

    /// The inverse Givens rotation
    pub fn inverse(&self) -> Self {
        Self {
            c: self.c,
            s: -self.s,
        }
    }

    /// Performs the multiplication `lhs = lhs * self` in-place.
    ///
    /// `lhs` must have exactly two columns.
    pub fn rotate_rows<S: DataMut<Elem = f64>>(&self, lhs: &mut ArrayBase<S, Ix2>) {
        debug_assert_eq!(lhs.ncols(), 2);
        let (c, s) = (self.c, self.s);

        for j in 0..lhs.nrows() {
            let a = lhs[(j, 0)];
            let b = lhs[(j, 1)];
            lhs[(j, 0)] = a * c + s * b;
            lhs[(j, 1)] = -s * a + b * c;
        }
    }

    /// Performs the multiplication `rhs = self * rhs` in-place.
    ///
    /// `rhs` must have exactly two rows.
    pub fn rotate_cols<S: DataMut<Elem = f64>>(&self, rhs: &mut ArrayBase<S, Ix2>) {
        debug_assert_eq!(rhs.nrows(), 2);
        let (c, s) = (self.c, self.s);

        for j in 0..rhs.ncols() {
            let a = rhs[(0, j)];
            let b = rhs[(1, j)];
            rhs[(0, j)] = c * a - s * b;
            rhs[(1, j)] = s * a + c * b;
        }
    }
}
