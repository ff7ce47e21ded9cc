/// Aspect-preserving fit of an image inside a viewport. Small images are
/// scaled up as well as down; the show fills the display either way.
pub fn fit_within(viewport_w: u32, viewport_h: u32, image_w: u32, image_h: u32) -> (u32, u32) {
    let iw = image_w.max(1) as f32;
    let ih = image_h.max(1) as f32;
    let vw = viewport_w.max(1) as f32;
    let vh = viewport_h.max(1) as f32;
    let scale = (vw / iw).min(vh / ih);
    let scale = if scale.is_finite() { scale } else { 1.0 };
    let w = (iw * scale).round().max(1.0);
    let h = (ih * scale).round().max(1.0);
    (w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_on_16x9_pillarboxes() {
        // 1000x1000 image on 1920x1080: scale = min(1.92, 1.08) = 1.08
        assert_eq!(fit_within(1920, 1080, 1000, 1000), (1080, 1080));
    }

    #[test]
    fn wide_on_16x9_letterboxes() {
        // 4000x2000 (2:1) on 1920x1080: scale = min(0.48, 0.54) = 0.48
        assert_eq!(fit_within(1920, 1080, 4000, 2000), (1920, 960));
    }

    #[test]
    fn small_image_is_upscaled() {
        assert_eq!(fit_within(100, 100, 2, 2), (100, 100));
    }

    #[test]
    fn degenerate_dimensions_stay_positive() {
        let (w, h) = fit_within(0, 0, 0, 0);
        assert!(w >= 1 && h >= 1);
    }
}
