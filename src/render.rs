use crate::layout::{Layout, LinearGradient, Paint, PolylinePrimitive, Primitive, TextPrimitive};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

#[cfg(feature = "png")]
use crate::config::RenderConfig;

/// Style of the ID-carrying text elements; [`crate::hyperlink`] keys on it.
pub const HIDDEN_TEXT_STYLE: &str = "fill-opacity:0";

/// Serializes a layout to SVG, one element per line.
///
/// Gradients are collected into `<defs>` up front and referenced by the
/// rectangles that use them.
pub fn render_svg(layout: &Layout, theme: &Theme) -> String {
    let width = layout.width;
    let height = layout.height;
    let mut svg = String::new();

    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );

    let gradients: Vec<&LinearGradient> = layout
        .rects()
        .filter_map(|rect| match &rect.fill {
            Paint::Gradient(gradient) => Some(gradient),
            Paint::Color(_) => None,
        })
        .collect();
    svg.push_str("<defs>\n");
    for (idx, gradient) in gradients.iter().enumerate() {
        svg.push_str(&gradient_svg(idx, gradient));
    }
    svg.push_str("</defs>\n");

    let _ = writeln!(
        svg,
        "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{}\" />",
        theme.background
    );

    let mut gradient_idx = 0;
    for primitive in &layout.primitives {
        match primitive {
            Primitive::Rect(rect) => {
                let fill = match &rect.fill {
                    Paint::Color(color) => escape_xml(color),
                    Paint::Gradient(_) => {
                        let reference = format!("url(#fade{gradient_idx})");
                        gradient_idx += 1;
                        reference
                    }
                };
                let _ = writeln!(
                    svg,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{fill}\" />",
                    rect.x, rect.y, rect.width, rect.height
                );
            }
            Primitive::Polyline(line) => svg.push_str(&polyline_svg(line)),
            Primitive::Text(text) => svg.push_str(&text_svg(text, theme)),
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn gradient_svg(idx: usize, gradient: &LinearGradient) -> String {
    let mut out = format!(
        "<linearGradient id=\"fade{idx}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">\n",
        gradient.x1, gradient.y1, gradient.x2, gradient.y2
    );
    for stop in &gradient.stops {
        let _ = writeln!(
            out,
            "<stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\" />",
            stop.offset,
            escape_xml(&stop.color),
            stop.opacity
        );
    }
    out.push_str("</linearGradient>\n");
    out
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        if idx > 0 {
            d.push(' ');
        }
        let command = if idx == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{command}{x},{y}");
    }
    d
}

fn polyline_svg(line: &PolylinePrimitive) -> String {
    format!(
        "<path d=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" />\n",
        points_to_path(&line.points),
        escape_xml(&line.stroke),
        line.stroke_width
    )
}

fn text_svg(text: &TextPrimitive, theme: &Theme) -> String {
    let font_family = theme
        .font_family
        .as_deref()
        .map(|family| format!(" font-family=\"{}\"", escape_xml(family)))
        .unwrap_or_default();
    let style = if text.hidden {
        format!(" style=\"{HIDDEN_TEXT_STYLE}\"")
    } else {
        String::new()
    };
    format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"{}\"{font_family} fill=\"{}\"{style}>{}</text>\n",
        text.x,
        text.y,
        text.font_size,
        escape_xml(&theme.text_color),
        escape_xml(&text.text)
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid PNG size {}x{}", render_cfg.width, render_cfg.height))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Inverse of [`escape_xml`].
pub(crate) fn unescape_xml(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
