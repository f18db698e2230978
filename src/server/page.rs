//! HTML rendering for the single studio page
//!
//! Everything the user sees is one self-contained page: the themed form,
//! warning banners, the generated image with its download link, the
//! history bar chart, and (on full page loads) the welcome audio element.
//! Images and audio travel as data URIs so the server never writes a file.

use crate::color::RgbColor;
use crate::qr::Warning;
use std::fmt::Write as _;

/// Current form field values, echoed back into the rendered inputs.
#[derive(Debug, Clone)]
pub struct FormValues {
    /// Text to encode
    pub text: String,
    /// Module color
    pub foreground: RgbColor,
    /// Background color
    pub background: RgbColor,
    /// Logo overlay checkbox
    pub add_logo: bool,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            text: String::new(),
            foreground: RgbColor::default_foreground(),
            background: RgbColor::default_background(),
            add_logo: false,
        }
    }
}

/// A successful generation, ready to display and download.
#[derive(Debug, Clone)]
pub struct QrResult {
    /// PNG as a data URI for the inline `<img>`
    pub image_uri: String,
    /// Random download filename, `qrcode_<32 hex>.png`
    pub filename: String,
}

/// Everything one page render needs.
pub struct PageView<'a> {
    /// Field values to echo into the form
    pub form: FormValues,
    /// Warning banners to show above the result area
    pub warnings: &'a [Warning],
    /// Generated image, when this render follows a successful generation
    pub result: Option<QrResult>,
    /// Session history, oldest first
    pub history: &'a [String],
    /// Welcome audio data URI, only set on full page loads
    pub audio_uri: Option<String>,
}

/// Render the complete page.
pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>QR Code Studio</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    if let Some(audio) = &view.audio_uri {
        let _ = write!(
            html,
            "<audio autoplay><source src=\"{audio}\" type=\"audio/mp3\">\
             Your browser does not support the audio element.</audio>\n"
        );
    }

    html.push_str("<h1 class=\"title\">QR Code Studio</h1>\n");
    html.push_str(
        "<p class=\"tagline\">Generate colorful QR codes for URLs, texts, or any data.</p>\n",
    );

    for warning in view.warnings {
        let _ = write!(
            html,
            "<div class=\"warning\">&#9888; {}</div>\n",
            escape_html(&warning.to_string())
        );
    }

    render_form(&mut html, &view.form);

    if let Some(result) = &view.result {
        let _ = write!(
            html,
            "<div class=\"result\">\n<img src=\"{}\" alt=\"Generated QR code\">\n\
             <a class=\"download\" href=\"{}\" download=\"{}\" type=\"image/png\">\
             Download QR Code</a>\n</div>\n",
            result.image_uri,
            result.image_uri,
            escape_html(&result.filename)
        );
    }

    if !view.history.is_empty() {
        html.push_str("<h2>QR Code History</h2>\n");
        html.push_str(&history_chart(view.history));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render the 404 page for unknown paths.
pub fn render_not_found(path: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <title>Not Found</title></head><body>\
         <h1>404</h1><p>No such page: {}</p>\
         <p><a href=\"/\">Back to the studio</a></p></body></html>\n",
        escape_html(path)
    )
}

fn render_form(html: &mut String, form: &FormValues) {
    let _ = write!(
        html,
        "<form class=\"studio\" method=\"post\" action=\"/generate\">\n\
         <label>Enter text or URL to generate a QR code:\n\
         <input type=\"text\" name=\"data\" value=\"{text}\" autofocus></label>\n\
         <label>Foreground color\n\
         <input type=\"color\" name=\"fg\" value=\"{fg}\"></label>\n\
         <label>Background color\n\
         <input type=\"color\" name=\"bg\" value=\"{bg}\"></label>\n\
         <label><input type=\"checkbox\" name=\"logo\"{logo}> Add logo to QR code</label>\n\
         <button type=\"submit\">Generate QR Code</button>\n\
         </form>\n",
        text = escape_html(&form.text),
        fg = form.foreground,
        bg = form.background,
        logo = if form.add_logo { " checked" } else { "" },
    );
}

/// Build an inline SVG bar chart of the session history.
///
/// Duplicate inputs are merged into one bar whose height is the submission
/// count; bars keep first-seen order.
fn history_chart(history: &[String]) -> String {
    let mut labels: Vec<&str> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for entry in history {
        match labels.iter().position(|label| *label == entry.as_str()) {
            Some(index) => counts[index] += 1,
            None => {
                labels.push(entry);
                counts.push(1);
            }
        }
    }

    let max_count = counts.iter().copied().max().unwrap_or(1);
    let bar_width = 60u32;
    let gap = 30u32;
    let plot_height = 220u32;
    let label_band = 40u32;
    let width = (labels.len() as u32) * (bar_width + gap) + gap;
    let height = plot_height + label_band;

    let mut svg = String::with_capacity(1024);
    let _ = write!(
        svg,
        "<svg class=\"chart\" viewBox=\"0 0 {width} {height}\" width=\"{width}\" \
         height=\"{height}\" role=\"img\" aria-label=\"Submission counts per input\">\n"
    );

    for (index, (label, count)) in labels.iter().zip(&counts).enumerate() {
        let bar_height = (plot_height as f64 * (*count as f64 / max_count as f64)) as u32;
        let x = gap + index as u32 * (bar_width + gap);
        let y = plot_height - bar_height;
        let text_x = x + bar_width / 2;
        let _ = write!(
            svg,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{bar_width}\" height=\"{bar_height}\" \
             fill=\"#FF8A00\"><title>{title}: {count}</title></rect>\n\
             <text x=\"{text_x}\" y=\"{label_y}\" text-anchor=\"middle\" \
             class=\"chart-label\">{text}</text>\n",
            title = escape_html(label),
            label_y = plot_height + 20,
            text = escape_html(&truncate_label(label)),
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn truncate_label(label: &str) -> String {
    const MAX: usize = 10;
    if label.chars().count() <= MAX {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX - 1).collect();
        format!("{head}\u{2026}")
    }
}

/// Escape text for safe interpolation into HTML content and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = "<style>\n\
    body { background-color: #1E1E1E; color: white; font-family: sans-serif; \
           text-align: center; }\n\
    .title { color: #FF8A00; font-size: 35px; font-weight: bold; \
             text-shadow: 2px 2px 10px rgba(255, 138, 0, 0.8); }\n\
    .studio input, .studio button { border-radius: 12px; padding: 12px; \
             border: 2px solid #FF8A00; font-size: 16px; margin: 6px; }\n\
    .studio label { display: block; margin: 10px 0; }\n\
    .studio button { background: linear-gradient(145deg, #ff8a00, #da1b60); \
             color: white; font-weight: bold; cursor: pointer; }\n\
    .warning { background: #5A3A00; border: 1px solid #FF8A00; \
             border-radius: 8px; padding: 10px; margin: 10px auto; \
             max-width: 480px; }\n\
    .result img { margin-top: 16px; max-width: 60vw; }\n\
    .download { display: block; margin: 12px; color: #FF8A00; }\n\
    .chart-label { fill: white; font-size: 12px; }\n\
</style>\n";

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_view() -> PageView<'static> {
        PageView {
            form: FormValues::default(),
            warnings: &[],
            result: None,
            history: &[],
            audio_uri: None,
        }
    }

    #[test]
    fn form_page_contains_all_widgets() {
        let html = render(&empty_view());
        assert!(html.contains("name=\"data\""));
        assert!(html.contains("name=\"fg\""));
        assert!(html.contains("name=\"bg\""));
        assert!(html.contains("name=\"logo\""));
        assert!(html.contains("action=\"/generate\""));
        assert!(!html.contains("<audio"));
        assert!(!html.contains("QR Code History"));
    }

    #[test]
    fn audio_element_appears_only_when_supplied() {
        let mut view = empty_view();
        view.audio_uri = Some("data:audio/mp3;base64,QUJD".to_string());
        let html = render(&view);
        assert!(html.contains("<audio autoplay>"));
        assert!(html.contains("data:audio/mp3;base64,QUJD"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut view = empty_view();
        view.form.text = "<script>alert(1)</script>".to_string();
        let html = render(&view);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn chart_merges_duplicates_in_first_seen_order() {
        let history = vec![
            "alpha".to_string(),
            "beta".to_string(),
            "alpha".to_string(),
        ];
        let svg = history_chart(&history);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("alpha: 2"));
        assert!(svg.contains("beta: 1"));
        assert!(svg.find("alpha").unwrap() < svg.find("beta").unwrap());
    }

    #[test]
    fn result_block_offers_download_with_filename() {
        let mut view = empty_view();
        view.result = Some(QrResult {
            image_uri: "data:image/png;base64,AAAA".to_string(),
            filename: "qrcode_0123.png".to_string(),
        });
        let html = render(&view);
        assert!(html.contains("download=\"qrcode_0123.png\""));
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn long_labels_are_truncated_for_the_axis() {
        assert_eq!(truncate_label("short"), "short");
        let truncated = truncate_label("a-very-long-history-entry");
        assert!(truncated.ends_with('\u{2026}'));
        assert_eq!(truncated.chars().count(), 10);
    }
}
