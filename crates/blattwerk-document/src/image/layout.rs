// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Placement geometry for drawing an image onto a page. All values in points,
// origin at the bottom-left of the page.

use blattwerk_core::types::{FitMode, ImageLayout, Orientation, PageSizing};
use serde::Serialize;

/// The page an image is drawn onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

/// Where the image lands and how large it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Scale and centre an `img_w` x `img_h` image inside `page`.
///
/// The margin is clamped to half the smaller page side. `Fit` takes the
/// smaller of the two axis scales, `Fill` the larger, and `Center` the `Fit`
/// scale capped at 1.
pub fn place(img_w: f32, img_h: f32, page: PageBox, fit: FitMode) -> Placement {
    let margin = page.margin.max(0.0).min(page.width.min(page.height) / 2.0);
    let avail_w = page.width - 2.0 * margin;
    let avail_h = page.height - 2.0 * margin;

    let scale = if img_w <= 0.0 || img_h <= 0.0 {
        0.0
    } else {
        let sx = avail_w / img_w;
        let sy = avail_h / img_h;
        match fit {
            FitMode::Fit => sx.min(sy),
            FitMode::Fill => sx.max(sy),
            FitMode::Center => sx.min(sy).min(1.0),
        }
    };

    let width = img_w * scale;
    let height = img_h * scale;
    Placement {
        x: (page.width - width) / 2.0,
        y: (page.height - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// Page size in points for an image under `layout`.
pub fn page_size(img_w: u32, img_h: u32, layout: &ImageLayout) -> (f32, f32) {
    let (w, h) = match layout.sizing {
        PageSizing::MatchImage => return (img_w.max(1) as f32, img_h.max(1) as f32),
        PageSizing::Paper(paper) => paper.dimensions_pt(),
    };
    let (short, long) = (w.min(h), w.max(h));
    let landscape = match layout.orientation {
        Orientation::Portrait => false,
        Orientation::Landscape => true,
        Orientation::Auto => img_w > img_h,
    };
    if landscape { (long, short) } else { (short, long) }
}

/// Page box and placement for an image under `layout`.
pub fn layout_image(img_w: u32, img_h: u32, layout: &ImageLayout) -> (PageBox, Placement) {
    let (width, height) = page_size(img_w, img_h, layout);
    let margin = match layout.sizing {
        PageSizing::MatchImage => 0.0,
        PageSizing::Paper(_) => layout.margin,
    };
    let page = PageBox {
        width,
        height,
        margin,
    };
    (page, place(img_w as f32, img_h as f32, page, layout.fit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::types::PaperSize;

    const PAGE: PageBox = PageBox {
        width: 600.0,
        height: 800.0,
        margin: 50.0,
    };

    #[test]
    fn fit_letterboxes_inside_margins() {
        let p = place(1000.0, 500.0, PAGE, FitMode::Fit);
        assert_eq!(p.scale, 0.5);
        assert_eq!((p.width, p.height), (500.0, 250.0));
        assert_eq!((p.x, p.y), (50.0, 275.0));
    }

    #[test]
    fn fill_covers_the_box() {
        let p = place(1000.0, 500.0, PAGE, FitMode::Fill);
        assert_eq!(p.scale, 1.4);
        assert!(p.height >= 699.9 && p.width >= 500.0);
        assert_eq!(p.x, (600.0 - p.width) / 2.0);
    }

    #[test]
    fn center_never_upscales() {
        for (w, h) in [(10.0, 10.0), (120.0, 40.0), (499.0, 699.0), (4000.0, 3000.0)] {
            let p = place(w, h, PAGE, FitMode::Center);
            assert!(p.width <= w && p.height <= h, "{w}x{h} grew to {}x{}", p.width, p.height);
            assert!(p.scale <= 1.0);
        }
        let small = place(100.0, 50.0, PAGE, FitMode::Center);
        assert_eq!((small.x, small.y), (250.0, 375.0));
    }

    #[test]
    fn oversized_margin_is_clamped() {
        let page = PageBox {
            margin: 1000.0,
            ..PAGE
        };
        let p = place(100.0, 100.0, page, FitMode::Fit);
        assert_eq!(p.scale, 0.0);
        assert_eq!((p.x, p.y), (300.0, 400.0));
    }

    #[test]
    fn auto_orientation_follows_image_shape() {
        let layout = ImageLayout::default();
        let (w, h) = page_size(300, 200, &layout);
        assert!(w > h);
        let (w, h) = page_size(200, 300, &layout);
        assert!(w < h);
    }

    #[test]
    fn match_image_uses_pixels_as_points() {
        let layout = ImageLayout {
            sizing: PageSizing::MatchImage,
            margin: 40.0,
            ..ImageLayout::default()
        };
        let (page, placement) = layout_image(320, 240, &layout);
        assert_eq!((page.width, page.height, page.margin), (320.0, 240.0, 0.0));
        assert_eq!((placement.x, placement.y, placement.scale), (0.0, 0.0, 1.0));
    }

    #[test]
    fn forced_portrait_letter() {
        let layout = ImageLayout {
            sizing: PageSizing::Paper(PaperSize::Letter),
            orientation: Orientation::Portrait,
            ..ImageLayout::default()
        };
        let (w, h) = page_size(900, 100, &layout);
        assert!(w < h);
    }
}
