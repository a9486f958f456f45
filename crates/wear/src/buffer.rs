//! Fixed-resolution raster wear buffer.
//!
//! One intensity byte per texel in surface-parameter space: high values are
//! rough, low values are polished. Dimensions are fixed for the buffer's
//! lifetime; all edits go through soft-edged elliptical stamps.

/// The raster behind a [`crate::WearSurface`].
#[derive(Debug, Clone)]
pub struct WearBuffer {
    width: u32,
    height: u32,
    texels: Vec<u8>,
    dirty: bool,
}

impl WearBuffer {
    /// Buffer filled with a uniform intensity. Dimensions must be nonzero
    /// (validated by the surface before construction).
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            texels: vec![value; width as usize * height as usize],
            dirty: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.texels[y as usize * self.width as usize + x as usize]
    }

    /// Raw texel bytes, row-major, for texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.texels
    }

    /// True if the raster changed since the last call; clears the flag.
    /// Hosts poll this to re-upload the derived texture only when needed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Stamp one soft-edged elliptical spot.
    ///
    /// The footprint is `radius` scaled per axis by `aniso` (compressing the
    /// stretched parametrization axis keeps the apparent spot size uniform).
    /// Intensity blends linearly from full `alpha` at the center to zero at
    /// the rim. With `darken_only` the blend clamps against the current
    /// value, so painting can never re-roughen a texel.
    pub fn stamp(
        &mut self,
        center_x: f64,
        center_y: f64,
        radius: f64,
        aniso: (f64, f64),
        target: u8,
        alpha: f64,
        darken_only: bool,
    ) {
        let rx = radius * aniso.0;
        let ry = radius * aniso.1;
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }

        let x0 = ((center_x - rx).floor().max(0.0)) as i64;
        let x1 = ((center_x + rx).ceil().min(self.width as f64 - 1.0)) as i64;
        let y0 = ((center_y - ry).floor().max(0.0)) as i64;
        let y1 = ((center_y + ry).ceil().min(self.height as f64 - 1.0)) as i64;
        if x1 < x0 || y1 < y0 {
            return;
        }

        let target = target as f64;
        let mut touched = false;
        for y in y0..=y1 {
            let dy = (y as f64 + 0.5 - center_y) / ry;
            for x in x0..=x1 {
                let dx = (x as f64 + 0.5 - center_x) / rx;
                let d = (dx * dx + dy * dy).sqrt();
                if d >= 1.0 {
                    continue;
                }
                let a = alpha * (1.0 - d);
                let idx = y as usize * self.width as usize + x as usize;
                let old = self.texels[idx] as f64;
                let mut value = old + (target - old) * a;
                if darken_only {
                    value = value.min(old);
                }
                self.texels[idx] = value.round().clamp(0.0, 255.0) as u8;
                touched = true;
            }
        }
        if touched {
            self.dirty = true;
        }
    }

    /// Stamp with toroidal wrap: nine repetitions at integer-width/height
    /// offsets so the seams at u=0/1 and v=0/1 stay continuous.
    #[allow(clippy::too_many_arguments)]
    pub fn stamp_wrapped(
        &mut self,
        center_x: f64,
        center_y: f64,
        radius: f64,
        aniso: (f64, f64),
        target: u8,
        alpha: f64,
        darken_only: bool,
    ) {
        for x_rep in -1i64..=1 {
            for y_rep in -1i64..=1 {
                self.stamp(
                    center_x + x_rep as f64 * self.width as f64,
                    center_y + y_rep as f64 * self.height as f64,
                    radius,
                    aniso,
                    target,
                    alpha,
                    darken_only,
                );
            }
        }
    }

    /// Fraction of texels strictly below `threshold`. Full-buffer scan —
    /// callers throttle this, never run it per event.
    pub fn fraction_below(&self, threshold: u8) -> f64 {
        if self.texels.is_empty() {
            return 0.0;
        }
        let count = self.texels.iter().filter(|&&v| v < threshold).count();
        count as f64 / self.texels.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_darkens_center_most() {
        let mut buf = WearBuffer::filled(64, 64, 128);
        buf.stamp(32.0, 32.0, 10.0, (1.0, 1.0), 32, 0.5, true);
        let center = buf.get(32, 32);
        let rim = buf.get(39, 32);
        assert!(center < rim, "center {} rim {}", center, rim);
        assert!(rim < 128);
        assert_eq!(buf.get(50, 32), 128, "outside footprint untouched");
    }

    #[test]
    fn test_darken_only_never_lightens() {
        let mut buf = WearBuffer::filled(32, 32, 16);
        // Target is lighter than every texel; darken-only must be a no-op
        buf.stamp(16.0, 16.0, 8.0, (1.0, 1.0), 200, 1.0, true);
        assert!(buf.as_bytes().iter().all(|&v| v == 16));
        // Without the clamp the same stamp lightens
        buf.stamp(16.0, 16.0, 8.0, (1.0, 1.0), 200, 1.0, false);
        assert!(buf.get(16, 16) > 16);
    }

    #[test]
    fn test_wrapped_stamp_crosses_both_seams() {
        let mut buf = WearBuffer::filled(64, 64, 128);
        buf.stamp_wrapped(0.0, 0.0, 6.0, (1.0, 1.0), 32, 0.5, true);
        // Corner spot shows up in all four corners
        assert!(buf.get(0, 0) < 128);
        assert!(buf.get(63, 0) < 128);
        assert!(buf.get(0, 63) < 128);
        assert!(buf.get(63, 63) < 128);
    }

    #[test]
    fn test_fraction_below_counts_strictly() {
        let mut buf = WearBuffer::filled(4, 4, 80);
        assert_eq!(buf.fraction_below(80), 0.0);
        buf.stamp(0.5, 0.5, 1.0, (1.0, 1.0), 0, 1.0, true);
        let frac = buf.fraction_below(80);
        assert!(frac > 0.0 && frac < 1.0);
    }

    #[test]
    fn test_dirty_flag_set_and_cleared() {
        let mut buf = WearBuffer::filled(16, 16, 128);
        assert!(!buf.take_dirty());
        buf.stamp(8.0, 8.0, 4.0, (1.0, 1.0), 32, 0.5, true);
        assert!(buf.take_dirty());
        assert!(!buf.take_dirty());
        // A stamp entirely off the raster leaves it clean
        buf.stamp(200.0, 200.0, 4.0, (1.0, 1.0), 32, 0.5, true);
        assert!(!buf.take_dirty());
    }
}
