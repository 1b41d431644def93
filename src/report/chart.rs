use image::{ImageFormat, RgbaImage};
use log::{debug, warn};
use snafu::prelude::*;
use std::f64::consts::PI;
use std::io::Cursor;
use survey_tally::ItemAggregate;
use tiny_skia::{Pixmap, Transform};
use usvg::{Options, Tree};

/// Categorical colors for the items that did not match a scale.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#4c78a8", "#f58518", "#e45756", "#72b7b2", "#54a24b", "#eeca3b", "#b279a2", "#ff9da6",
    "#9d755d", "#bab0ac",
];

/// Inner radius of the donut, relative to the outer radius.
pub const INNER_RADIUS_RATIO: f64 = 0.4;

/// Width of the SVG canvas: the donut on the left, the legend on the right.
const SVG_WIDTH: u32 = 400;

#[derive(Debug, Snafu)]
pub enum ChartError {
    #[snafu(display("the chart has no slice with a positive count"))]
    EmptyChart {},
    #[snafu(display("invalid chart size: {size} pixels"))]
    InvalidSize { size: u32 },
    #[snafu(display("could not parse the chart SVG: {source}"))]
    ParsingSvg { source: usvg::Error },
    #[snafu(display("could not allocate a {width}x{height} pixmap"))]
    AllocatingPixmap { width: u32, height: u32 },
    #[snafu(display("could not encode the chart as PNG: {source}"))]
    EncodingPng { source: image::ImageError },
}

/// SVG parsing options with the system fonts loaded, for the legend text.
/// Loading the fonts is slow: build these once and share them.
pub fn raster_options() -> Options<'static> {
    let mut options = Options::default();
    options.fontdb_mut().load_system_fonts();
    options
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb`, as used in HTML.
    pub fn to_html(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// `RRGGBB`, as used in DrawingML.
    pub fn to_srgb(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Parses `#rrggbb` (case-insensitive).
pub fn parse_hex_color(s: &str) -> Option<Rgb> {
    let hex = s.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn palette_color(idx: usize) -> Rgb {
    parse_hex_color(DEFAULT_PALETTE[idx % DEFAULT_PALETTE.len()]).unwrap_or(Rgb(128, 128, 128))
}

#[derive(PartialEq, Debug, Clone)]
pub struct Slice {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
    pub color: Rgb,
}

/// A donut chart of the modalities of one item, slices in display order.
#[derive(PartialEq, Debug, Clone)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<Slice>,
}

impl PieChart {
    pub fn from_aggregate(title: &str, agg: &ItemAggregate) -> PieChart {
        let slices = agg
            .modalities
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                let color = match &m.color {
                    Some(c) => parse_hex_color(c).unwrap_or_else(|| {
                        warn!("from_aggregate: {:?}: invalid color {:?}", title, c);
                        palette_color(idx)
                    }),
                    None => palette_color(idx),
                };
                Slice {
                    label: m.label.clone(),
                    count: m.count,
                    percentage: m.percentage,
                    color,
                }
            })
            .collect();
        PieChart {
            title: title.to_string(),
            slices,
        }
    }

    pub fn total(&self) -> u64 {
        self.slices
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.count))
    }

    /// The (start, end) fraction of the full turn covered by each slice,
    /// starting at 12 o'clock and going clockwise.
    pub fn fractions(&self) -> Vec<(f64, f64)> {
        let total = self.total() as f64;
        let mut acc = 0.0;
        self.slices
            .iter()
            .map(|s| {
                let start = acc;
                if total > 0.0 {
                    acc += s.count as f64 / total;
                }
                (start, acc)
            })
            .collect()
    }

    /// Width and height of the SVG canvas. The legend can make it taller
    /// than the donut.
    pub fn svg_size(&self) -> (u32, u32) {
        let legend_height = 30 + 22 * self.slices.len() as u32;
        (SVG_WIDTH, legend_height.max(200))
    }

    /// The chart with its legend, as an inline SVG element. Each slice
    /// carries its count and percentage as a tooltip.
    pub fn to_svg(&self) -> String {
        let (cx, cy, r) = (100.0, 100.0, 90.0);
        let inner = r * INNER_RADIUS_RATIO;
        let (width, height) = self.svg_size();
        let mut svg = format!(
            "<svg class=\"donut\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\" role=\"img\">\n",
            width, height
        );
        for (slice, (f0, f1)) in self.slices.iter().zip(self.fractions()) {
            if f1 - f0 <= 0.0 {
                continue;
            }
            let tooltip = format!(
                "<title>{} : {} ({:.1}%)</title>",
                quick_xml::escape::escape(slice.label.as_str()),
                slice.count,
                slice.percentage
            );
            let color = slice.color.to_html();
            if f1 - f0 >= 0.9999 {
                // A single arc cannot draw a full turn.
                svg.push_str(&format!(
                    "  <circle cx=\"{}\" cy=\"{}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\">{}</circle>\n",
                    cx,
                    cy,
                    (r + inner) / 2.0,
                    color,
                    r - inner,
                    tooltip
                ));
                continue;
            }
            let point = |radius: f64, f: f64| {
                let a = f * 2.0 * PI;
                (cx + radius * a.sin(), cy - radius * a.cos())
            };
            let large = if f1 - f0 > 0.5 { 1 } else { 0 };
            let (ox0, oy0) = point(r, f0);
            let (ox1, oy1) = point(r, f1);
            let (ix1, iy1) = point(inner, f1);
            let (ix0, iy0) = point(inner, f0);
            svg.push_str(&format!(
                "  <path d=\"M {:.2} {:.2} A {r} {r} 0 {large} 1 {:.2} {:.2} L {:.2} {:.2} A {inner} {inner} 0 {large} 0 {:.2} {:.2} Z\" fill=\"{}\">{}</path>\n",
                ox0, oy0, ox1, oy1, ix1, iy1, ix0, iy0, color, tooltip,
                r = r, inner = inner, large = large
            ));
        }
        for (idx, slice) in self.slices.iter().enumerate() {
            let y = 20 + 22 * idx;
            svg.push_str(&format!(
                "  <rect x=\"220\" y=\"{}\" width=\"14\" height=\"14\" fill=\"{}\"/><text x=\"242\" y=\"{}\" font-family=\"sans-serif\" font-size=\"12\">{}</text>\n",
                y,
                slice.color.to_html(),
                y + 11,
                quick_xml::escape::escape(slice.label.as_str())
            ));
        }
        svg.push_str("</svg>");
        svg
    }

    /// Renders the chart and its legend as a PNG `width` pixels wide, with a
    /// transparent background. The height follows the SVG aspect ratio.
    pub fn rasterize_png(&self, width: u32, options: &Options) -> Result<Vec<u8>, ChartError> {
        ensure!(width > 0 && width <= 4096, InvalidSizeSnafu { size: width });
        ensure!(self.total() > 0, EmptyChartSnafu {});

        let (svg_width, svg_height) = self.svg_size();
        let scale = width as f32 / svg_width as f32;
        let height = (svg_height as f32 * scale).round() as u32;

        let tree = Tree::from_data(self.to_svg().as_bytes(), options).context(ParsingSvgSnafu {})?;
        let mut pixmap = Pixmap::new(width, height).context(AllocatingPixmapSnafu { width, height })?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        // The pixmap stores premultiplied alpha.
        let rgba: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        let img = RgbaImage::from_raw(width, height, rgba)
            .context(AllocatingPixmapSnafu { width, height })?;

        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)
            .context(EncodingPngSnafu {})?;
        let bytes = buf.into_inner();
        debug!(
            "rasterize_png: {:?}: {}x{} pixels, {} bytes",
            self.title,
            width,
            height,
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use survey_tally::{Coloring, ModalityAggregate};

    fn chart(counts: &[(&str, u64, Option<&str>)]) -> PieChart {
        let total: u64 = counts.iter().map(|(_, c, _)| *c).sum();
        let agg = ItemAggregate {
            total,
            modalities: counts
                .iter()
                .map(|(l, c, color)| ModalityAggregate {
                    label: l.to_string(),
                    count: *c,
                    percentage: if total > 0 {
                        *c as f64 * 100.0 / total as f64
                    } else {
                        0.0
                    },
                    color: color.map(|s| s.to_string()),
                })
                .collect(),
            coloring: Coloring::Automatic,
        };
        PieChart::from_aggregate("Q", &agg)
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#1b7837"), Some(Rgb(0x1b, 0x78, 0x37)));
        assert_eq!(parse_hex_color("#F46D43"), Some(Rgb(0xf4, 0x6d, 0x43)));
        assert_eq!(parse_hex_color("1b7837"), None);
        assert_eq!(parse_hex_color("#1b78"), None);
        assert_eq!(Rgb(0x1b, 0x78, 0x37).to_srgb(), "1B7837");
    }

    #[test]
    fn palette_and_scale_colors() {
        let c = chart(&[("a", 1, Some("#1b7837")), ("b", 1, None), ("c", 1, Some("oops"))]);
        assert_eq!(c.slices[0].color, Rgb(0x1b, 0x78, 0x37));
        assert_eq!(c.slices[1].color.to_html(), DEFAULT_PALETTE[1]);
        assert_eq!(c.slices[2].color.to_html(), DEFAULT_PALETTE[2]);
    }

    #[test]
    fn fractions_from_top() {
        let c = chart(&[("a", 1, None), ("b", 0, None), ("c", 3, None)]);
        assert_eq!(c.fractions(), vec![(0.0, 0.25), (0.25, 0.25), (0.25, 1.0)]);
    }

    #[test]
    fn svg_has_tooltips() {
        let c = chart(&[("Oui & plus", 3, None), ("Non", 1, None)]);
        let svg = c.to_svg();
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("<title>Oui &amp; plus : 3 (75.0%)</title>"));
        let full = chart(&[("Oui", 2, None), ("Non", 0, None)]).to_svg();
        assert_eq!(full.matches("<circle").count(), 1);
    }

    #[test]
    fn png_output() {
        let c = chart(&[("a", 1, Some("#ff0000")), ("b", 1, Some("#0000ff"))]);
        let png = c.rasterize_png(400, &Options::default()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (400, 200));
        // Right half of the donut is the first slice, left half the second one.
        assert_eq!(img.get_pixel(150, 100), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(50, 100), &Rgba([0, 0, 255, 255]));
        // The hole
        assert_eq!(img.get_pixel(100, 100)[3], 0);
        // Legend swatches, in slice order
        assert_eq!(img.get_pixel(227, 27), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(227, 49), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn png_height_follows_legend() {
        let labels: Vec<String> = (0..12).map(|i| format!("m{}", i)).collect();
        let counts: Vec<(&str, u64, Option<&str>)> =
            labels.iter().map(|l| (l.as_str(), 1, None)).collect();
        let c = chart(&counts);
        assert_eq!(c.svg_size(), (400, 294));
        let png = c.rasterize_png(200, &Options::default()).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (200, 147));
    }

    #[test]
    fn png_failures() {
        let empty = chart(&[("a", 0, None)]);
        assert!(matches!(
            empty.rasterize_png(60, &Options::default()),
            Err(ChartError::EmptyChart {})
        ));
        let c = chart(&[("a", 1, None)]);
        assert!(matches!(
            c.rasterize_png(0, &Options::default()),
            Err(ChartError::InvalidSize { .. })
        ));
    }
}
