use crate::error::{Error, Result};

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// A hard disc of unit mass.
///
/// Physics-only record: rendering attributes live in [`crate::core::view`].
///
/// Fields:
/// - `r`: position [x, y]
/// - `v`: velocity [vx, vy], in surface units per step
/// - `radius`: disc radius (> 0)
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    /// Disc radius (> 0).
    pub radius: f64,
}

/// Outcome of resolving one overlapping pair: the post-collision velocities of
/// both discs and the offset that moves them apart (`a` moves by `-shift`,
/// `b` by `+shift`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub va: [f64; DIM],
    pub vb: [f64; DIM],
    pub shift: [f64; DIM],
    /// Penetration depth, `r_a + r_b - distance`.
    pub overlap: f64,
    /// Whether the discs were closing along the normal, `dot(vb - va, b - a) < 0`.
    pub approaching: bool,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` is non-positive or any component is NaN/inf.
    pub fn new(r: [f64; DIM], v: [f64; DIM], radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self { r, v, radius })
    }

    /// Returns the particle's kinetic energy: 1/2 |v|^2 (unit mass).
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.speed_sq()
    }

    #[inline]
    pub fn speed_sq(&self) -> f64 {
        dot(&self.v, &self.v)
    }

    /// Reflect off the walls of the box `[0, bounds[k]]` on every axis the disc crosses.
    ///
    /// The velocity component on a crossed axis is turned to point back inside and the
    /// coordinate is clamped to `[radius, bounds[k] - radius]`. A box narrower than the
    /// disc pins the coordinate to `radius`. Returns whether any wall was hit.
    pub fn bounce_walls(&mut self, bounds: [f64; DIM]) -> bool {
        let mut hit = false;
        for (k, &extent) in bounds.iter().enumerate() {
            let lo = self.radius;
            let hi = (extent - self.radius).max(lo);
            if self.r[k] < lo {
                self.v[k] = self.v[k].abs();
                self.r[k] = lo;
                hit = true;
            } else if self.r[k] > hi {
                self.v[k] = -self.v[k].abs();
                self.r[k] = hi;
                hit = true;
            }
        }
        hit
    }

    /// Advance position by one unit time step.
    #[inline]
    pub fn advance(&mut self) {
        for (rk, vk) in self.r.iter_mut().zip(self.v.iter()) {
            *rk += vk;
        }
    }

    /// Resolve an overlap with `other` in place. Returns whether the pair was touching.
    pub fn collide(&mut self, other: &mut Particle) -> bool {
        let Some(c) = contact(self, other) else {
            return false;
        };
        self.v = c.va;
        other.v = c.vb;
        for k in 0..DIM {
            self.r[k] -= c.shift[k];
            other.r[k] += c.shift[k];
        }
        true
    }
}

/// Compute the elastic response for two equal-mass discs if they overlap.
///
/// Both velocities are rotated into the frame whose first axis is the separation
/// `b - a`, the normal components are exchanged, and the result is rotated back.
/// Coincident centres resolve along +x since `atan2(0, 0) == 0`.
pub fn contact(a: &Particle, b: &Particle) -> Option<Contact> {
    let d = [b.r[0] - a.r[0], b.r[1] - a.r[1]];
    let dist = dot(&d, &d).sqrt();
    let reach = a.radius + b.radius;
    if dist >= reach {
        return None;
    }

    let angle = d[1].atan2(d[0]);
    let (sin, cos) = angle.sin_cos();

    let ua = rotate(a.v, sin, cos);
    let ub = rotate(b.v, sin, cos);
    // Equal masses: swap the normal components, keep the tangential ones.
    let va = unrotate([ub[0], ua[1]], sin, cos);
    let vb = unrotate([ua[0], ub[1]], sin, cos);

    let overlap = reach - dist;
    let half = 0.5 * overlap;
    Some(Contact {
        va,
        vb,
        shift: [cos * half, sin * half],
        overlap,
        approaching: ub[0] < ua[0],
    })
}

#[inline]
fn rotate(v: [f64; DIM], sin: f64, cos: f64) -> [f64; DIM] {
    [v[0] * cos + v[1] * sin, v[1] * cos - v[0] * sin]
}

#[inline]
fn unrotate(v: [f64; DIM], sin: f64, cos: f64) -> [f64; DIM] {
    [v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos]
}

#[inline]
pub(crate) fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
