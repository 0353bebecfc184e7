use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, IntSize, Pixmap};

/// Crops the top-left square of `source` (side = shorter side) and scales it
/// to `dimension` x `dimension`.
pub fn bake_square(source: &RgbaImage, dimension: u32) -> Option<Pixmap> {
    let side = source.width().min(source.height());
    if side == 0 || dimension == 0 {
        return None;
    }
    let cropped = imageops::crop_imm(source, 0, 0, side, side).to_image();
    let scaled = if side == dimension {
        cropped
    } else {
        imageops::resize(&cropped, dimension, dimension, FilterType::Triangle)
    };
    pixmap_from_image(&scaled)
}

/// Converts straight RGBA into tiny-skia's premultiplied layout.
pub fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let premultiplied = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[
            premultiplied.red(),
            premultiplied.green(),
            premultiplied.blue(),
            premultiplied.alpha(),
        ]);
    }
    Pixmap::from_vec(data, size)
}

pub fn image_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, color) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = color.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bake_crops_top_left_square() {
        let mut source = RgbaImage::from_pixel(6, 4, Rgba([0, 0, 255, 255]));
        for y in 0..4 {
            for x in 0..4 {
                source.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let baked = bake_square(&source, 4).expect("baked");
        assert_eq!((baked.width(), baked.height()), (4, 4));
        for color in baked.pixels() {
            assert_eq!(color.red(), 255);
            assert_eq!(color.blue(), 0);
        }
    }

    #[test]
    fn bake_rejects_empty_source() {
        assert!(bake_square(&RgbaImage::new(0, 5), 10).is_none());
        assert!(bake_square(&RgbaImage::new(5, 5), 0).is_none());
    }

    #[test]
    fn opaque_pixels_survive_conversion() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let pixmap = pixmap_from_image(&source).expect("pixmap");
        let back = image_from_pixmap(&pixmap);
        assert_eq!(back, source);
    }
}
