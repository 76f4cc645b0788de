//! RGBA raster helpers.
//!
//! Tiles are plain [`image::RgbaImage`] buffers. The helpers here cover the
//! three pixel operations the cache performs: stamping a small raster into a
//! larger one, cropping a square region out of a storage tile, and alpha
//! compositing one raster over another.

use image::imageops;

/// A fixed-size RGBA pixel buffer.
pub type Raster = image::RgbaImage;

/// Create a fully transparent square raster with the given pixel side.
pub fn blank(side: u32) -> Raster {
    Raster::new(side, side)
}

/// Copy `src` into `dst` at pixel position `(x, y)`, replacing pixels.
pub fn blit(dst: &mut Raster, src: &Raster, x: u32, y: u32) {
    imageops::replace(dst, src, i64::from(x), i64::from(y));
}

/// Alpha-composite `src` over `dst`, both anchored at the origin.
pub fn compose_over(dst: &mut Raster, src: &Raster) {
    imageops::overlay(dst, src, 0, 0);
}

/// Copy a `side x side` square out of `src` starting at `(x, y)`.
pub fn crop_square(src: &Raster, x: u32, y: u32, side: u32) -> Raster {
    imageops::crop_imm(src, x, y, side, side).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid(side: u32, px: Rgba<u8>) -> Raster {
        Raster::from_pixel(side, side, px)
    }

    #[test]
    fn test_blank_is_transparent() {
        let r = blank(4);
        assert_eq!(r.dimensions(), (4, 4));
        assert!(r.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn test_blit_places_source() {
        let mut dst = blank(8);
        let src = solid(2, RED);
        blit(&mut dst, &src, 4, 2);

        assert_eq!(*dst.get_pixel(4, 2), RED);
        assert_eq!(*dst.get_pixel(5, 3), RED);
        assert_eq!(*dst.get_pixel(3, 2), CLEAR);
        assert_eq!(*dst.get_pixel(4, 4), CLEAR);
    }

    #[test]
    fn test_blit_replaces_existing_pixels() {
        let mut dst = solid(4, BLUE);
        let src = solid(2, Rgba([0, 0, 0, 0]));
        blit(&mut dst, &src, 0, 0);

        // Replace semantics: the transparent stamp wins over the blue base.
        assert_eq!(*dst.get_pixel(0, 0), CLEAR);
        assert_eq!(*dst.get_pixel(2, 2), BLUE);
    }

    #[test]
    fn test_compose_over_keeps_dst_under_transparency() {
        let mut dst = solid(2, BLUE);
        let mut src = blank(2);
        src.put_pixel(0, 0, RED);
        compose_over(&mut dst, &src);

        assert_eq!(*dst.get_pixel(0, 0), RED);
        assert_eq!(*dst.get_pixel(1, 1), BLUE);
    }

    #[test]
    fn test_crop_square_extracts_region() {
        let mut src = blank(8);
        src.put_pixel(4, 2, RED);
        let out = crop_square(&src, 4, 2, 2);

        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 1), CLEAR);
    }
}
