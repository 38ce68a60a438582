//! Distance field rasterization for PNG previews

use super::PngConfig;
use crate::Result;
use crate::eval::evaluate2_batch;
use crate::export::Raster;
use crate::sdf2::Sdf2;
use glam::{DVec2, UVec2};
use sdfcad_math::Aabb2;

/// Gray level in `[0, 1]`: the surface sits at 0.5, outside scales up to
/// `dmax`, inside down to `dmin`
pub(crate) fn gray(dist: f64, dmin: f64, dmax: f64) -> f64 {
    if dist >= 0.0 {
        if dmax <= 0.0 {
            return 0.5;
        }
        (0.5 + 0.5 * dist / dmax).clamp(0.5, 1.0)
    } else {
        if dmin >= 0.0 {
            return 0.5;
        }
        (0.5 * (dist - dmin) / -dmin).clamp(0.0, 0.5)
    }
}

/// Pixel grid covering `bounds` with `pixels` along the longer side
pub(crate) fn grid_size(bounds: Aabb2, pixels: u32) -> UVec2 {
    let size = bounds.size();
    let long = size.max_element();
    let n = f64::from(pixels);
    let dims = (size / long * n).round().max(DVec2::ONE);
    dims.as_uvec2()
}

/// Sample `field` at pixel centers, row 0 at the top
pub(crate) fn rasterize<S: Sdf2 + ?Sized>(
    field: &S,
    bounds: Aabb2,
    config: &PngConfig,
) -> Result<Raster> {
    let dims = grid_size(bounds, config.pixels);
    let delta = bounds.size() / dims.as_dvec2();
    let top_left = DVec2::new(bounds.min.x, bounds.max.y);

    let points: Vec<DVec2> = (0..dims.y)
        .flat_map(|y| (0..dims.x).map(move |x| (x, y)))
        .map(|(x, y)| {
            let offset = (UVec2::new(x, y).as_dvec2() + 0.5) * delta;
            DVec2::new(top_left.x + offset.x, top_left.y - offset.y)
        })
        .collect();
    let distances = evaluate2_batch(field, &points)?;

    let (dmin, dmax) = match config.range {
        Some(range) => range,
        None => distances
            .iter()
            .fold((0.0_f64, 0.0_f64), |(lo, hi), &d| (lo.min(d), hi.max(d))),
    };

    let mut raster = Raster::new(dims.x, dims.y);
    for (px, d) in raster.pixels.iter_mut().zip(&distances) {
        *px = (255.0 * gray(*d, dmin, dmax)) as u8;
    }
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf2::{Sdf2Ext, circle};
    use approx::assert_relative_eq;

    #[test]
    fn gray_levels() {
        assert_relative_eq!(gray(0.0, -1.0, 2.0), 0.5);
        assert_relative_eq!(gray(2.0, -1.0, 2.0), 1.0);
        assert_relative_eq!(gray(1.0, -1.0, 2.0), 0.75);
        assert_relative_eq!(gray(-1.0, -1.0, 2.0), 0.0);
        assert_relative_eq!(gray(-0.5, -1.0, 2.0), 0.25);
        // clamped when a fixed range is exceeded
        assert_relative_eq!(gray(5.0, -1.0, 2.0), 1.0);
        assert_relative_eq!(gray(-5.0, -1.0, 2.0), 0.0);
        // degenerate ranges
        assert_relative_eq!(gray(0.3, -1.0, 0.0), 0.5);
        assert_relative_eq!(gray(-0.3, 0.0, 1.0), 0.5);
    }

    #[test]
    fn grid_keeps_aspect_ratio() {
        let b = Aabb2::new(DVec2::ZERO, DVec2::new(4.0, 1.0));
        assert_eq!(grid_size(b, 512), UVec2::new(512, 128));
        let thin = Aabb2::new(DVec2::ZERO, DVec2::new(1000.0, 0.1));
        assert_eq!(grid_size(thin, 100), UVec2::new(100, 1));
    }

    #[test]
    fn inside_is_darker_and_y_points_up() {
        // disc in the upper half of the frame
        let c = circle(1.0).unwrap().translate(DVec2::new(0.0, 1.5));
        let bounds = Aabb2::new(DVec2::new(-3.0, -3.0), DVec2::new(3.0, 3.0));
        let r = rasterize(&c, bounds, &PngConfig::default().with_pixels(60)).unwrap();
        assert_eq!((r.width, r.height), (60, 60));
        // pixel (30, 15) is at (0.05, 1.45): inside the disc
        assert!(r.get(30, 15) < 128);
        // the mirrored pixel is outside
        assert!(r.get(30, 45) > 128);
    }
}
