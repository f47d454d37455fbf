//! PDF document assembly.
//!
//! Owns the whole layout state: the page list, the cursor position and the
//! page-break decisions. Fonts and image decoding belong to the PDF
//! library; this module only sequences placement. The output file is
//! written atomically: serialize to a temporary file, rename on success.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor};
use std::path::{Path, PathBuf};

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Rgb,
};

use super::markup::{parse_inline, wrap_spans, SpanStyle};
use super::paginate::plan_host_pages;
use super::scan::HostSection;
use super::ReportError;

// A4 portrait, all distances in millimeters measured from the page top.
const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN_LEFT: f64 = 10.0;
const CONTENT_TOP: f64 = 30.0;
const CONTENT_BOTTOM: f64 = 277.0;
const LINE_HEIGHT: f64 = 5.0;
const BODY_SIZE: f64 = 12.0;
const HEADER_SIZE: f64 = 15.0;
const FOOTER_Y: f64 = 285.0;
const IMAGE_X: f64 = 10.0;
const IMAGE_WIDTH: f64 = 180.0;
const IMAGE_TOP_GAP: f64 = 10.0;
/// Vertical band reserved per image regardless of its aspect ratio.
const IMAGE_BAND: f64 = 70.0;

const MM_PER_PT: f64 = 0.352_778;
/// Estimated average glyph advance as a fraction of the font size.
const AVG_GLYPH_EM: f64 = 0.5;

/// Cover page and header strings.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    /// Document title, repeated in the banner of every page.
    pub title: String,
    pub customer: String,
    /// Free-text time-frame descriptor for the cover page.
    pub timeframe: String,
    /// Optional logo PNG for the page header.
    pub logo: Option<PathBuf>,
}

/// Counters reported after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportStats {
    pub pages: usize,
    pub hosts: usize,
}

fn text_width_mm(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * AVG_GLYPH_EM * MM_PER_PT
}

struct DocumentWriter {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    sans: IndirectFontRef,
    sans_bold: IndirectFontRef,
    sans_oblique: IndirectFontRef,
    body: IndirectFontRef,
    body_bold: IndirectFontRef,
    body_italic: IndirectFontRef,
    body_bold_italic: IndirectFontRef,
    /// Cursor on the current page, mm from the top edge.
    cursor_y: f64,
}

impl DocumentWriter {
    fn new(meta: &ReportMeta) -> Result<Self, ReportError> {
        let (doc, cover_page, cover_layer) =
            PdfDocument::new(meta.title.as_str(), Mm(210.0), Mm(297.0), "content");
        let font = |doc: &PdfDocumentReference, f: BuiltinFont| {
            doc.add_builtin_font(f)
                .map_err(|e| ReportError::Pdf(e.to_string()))
        };
        let sans = font(&doc, BuiltinFont::Helvetica)?;
        let sans_bold = font(&doc, BuiltinFont::HelveticaBold)?;
        let sans_oblique = font(&doc, BuiltinFont::HelveticaOblique)?;
        let body = font(&doc, BuiltinFont::TimesRoman)?;
        let body_bold = font(&doc, BuiltinFont::TimesBold)?;
        let body_italic = font(&doc, BuiltinFont::TimesItalic)?;
        let body_bold_italic = font(&doc, BuiltinFont::TimesBoldItalic)?;

        Ok(Self {
            doc,
            pages: vec![(cover_page, cover_layer)],
            sans,
            sans_bold,
            sans_oblique,
            body,
            body_bold,
            body_italic,
            body_bold_italic,
            cursor_y: CONTENT_TOP,
        })
    }

    fn layer(&self, index: usize) -> PdfLayerReference {
        let (page, layer) = self.pages[index];
        self.doc.get_page(page).get_layer(layer)
    }

    fn current_layer(&self) -> PdfLayerReference {
        self.layer(self.pages.len() - 1)
    }

    /// Start a fresh page; the cursor and the per-page image budget reset.
    fn add_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(210.0), Mm(297.0), "content");
        self.pages.push((page, layer));
        self.cursor_y = CONTENT_TOP;
    }

    /// Draw text with the page-top y coordinate convention.
    fn text_at(&self, text: &str, size: f64, x: f64, y_top: f64, font: &IndirectFontRef) {
        self.current_layer()
            .use_text(text, size as _, Mm(x as _), Mm((PAGE_H - y_top) as _), font);
    }

    fn span_font(&self, style: SpanStyle) -> &IndirectFontRef {
        match (style.bold, style.italic) {
            (false, false) => &self.body,
            (true, false) => &self.body_bold,
            (false, true) => &self.body_italic,
            (true, true) => &self.body_bold_italic,
        }
    }

    fn cover(&mut self, meta: &ReportMeta) {
        self.text_at(&meta.title, 32.0, MARGIN_LEFT, 110.0, &self.sans);
        self.text_at(
            &format!("Customer: {}", meta.customer),
            24.0,
            MARGIN_LEFT,
            125.0,
            &self.sans,
        );
        self.text_at(
            &format!("Date: {}", meta.timeframe),
            16.0,
            MARGIN_LEFT,
            137.0,
            &self.sans,
        );
    }

    fn host_banner(&mut self, section: &HostSection) {
        self.text_at(
            &format!("Host {} : {}", section.number, section.name),
            BODY_SIZE,
            MARGIN_LEFT,
            self.cursor_y,
            &self.sans,
        );
        self.cursor_y += 10.0;
    }

    fn continued_banner(&mut self, name: &str) {
        self.text_at(
            &format!("Host: {name} (continued)"),
            BODY_SIZE,
            MARGIN_LEFT,
            self.cursor_y,
            &self.sans,
        );
        self.cursor_y += 6.0;
    }

    /// Render the section body with inline markup, breaking pages as the
    /// text overflows. Text continuation pages carry no banner.
    fn body_text(&mut self, info: &str) {
        let max_chars =
            ((PAGE_W - 2.0 * MARGIN_LEFT) / (BODY_SIZE * AVG_GLYPH_EM * MM_PER_PT)) as usize;
        let lines = wrap_spans(&parse_inline(info), max_chars);
        for line in &lines {
            if self.cursor_y + LINE_HEIGHT > CONTENT_BOTTOM {
                self.add_page();
            }
            let mut x = MARGIN_LEFT;
            for (text, style) in &line.spans {
                self.text_at(text, BODY_SIZE, x, self.cursor_y, self.span_font(*style));
                x += text_width_mm(text, BODY_SIZE);
            }
            self.cursor_y += LINE_HEIGHT;
        }
        self.cursor_y += LINE_HEIGHT;
    }

    /// Place one image at the fixed width, reserving the fixed band.
    fn place_image(&mut self, path: &Path) -> Result<(), ReportError> {
        let file = File::open(path)?;
        let decoder = PngDecoder::new(BufReader::new(file))
            .map_err(|e| ReportError::Pdf(format!("{}: {e}", path.display())))?;
        let image = Image::try_from(decoder)
            .map_err(|e| ReportError::Pdf(format!("{}: {e}", path.display())))?;

        let width_px = image.image.width.0 as f64;
        let height_px = image.image.height.0 as f64;
        // Resolution chosen so the placed width is exactly IMAGE_WIDTH.
        let dpi = width_px * 25.4 / IMAGE_WIDTH;
        let display_height = height_px * IMAGE_WIDTH / width_px;
        let bottom_from_page_bottom = PAGE_H - (self.cursor_y + IMAGE_TOP_GAP + display_height);

        image.add_to_layer(
            self.current_layer(),
            ImageTransform {
                translate_x: Some(Mm(IMAGE_X as _)),
                translate_y: Some(Mm(bottom_from_page_bottom as _)),
                dpi: Some(dpi as _),
                ..Default::default()
            },
        );
        self.cursor_y += IMAGE_BAND;
        Ok(())
    }

    fn render_host(&mut self, section: &HostSection) {
        self.add_page();
        self.host_banner(section);
        self.body_text(&section.info);

        for page in plan_host_pages(&section.images) {
            if page.continued {
                self.add_page();
                self.continued_banner(&section.name);
            }
            for image in &page.images {
                if let Err(err) = self.place_image(image) {
                    tracing::warn!("skipping image: {}", err);
                }
            }
        }
    }

    /// Final pass once the page count is known: header banner, optional
    /// logo and the `Page X/Y` footer on every page. Then the atomic save.
    fn finish(self, meta: &ReportMeta, output: &Path) -> Result<ReportStats, ReportError> {
        let logo_bytes = meta.logo.as_ref().and_then(|path| match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!("logo {} unreadable, skipping: {}", path.display(), err);
                None
            }
        });

        let total = self.pages.len();
        for index in 0..total {
            let layer = self.layer(index);

            if let Some(bytes) = &logo_bytes {
                if let Err(err) = place_logo(&layer, bytes) {
                    tracing::warn!("logo not embeddable, skipping: {}", err);
                }
            }

            layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
            let title_x = (PAGE_W - text_width_mm(&meta.title, HEADER_SIZE)) / 2.0;
            layer.use_text(
                meta.title.as_str(),
                HEADER_SIZE as _,
                Mm(title_x as _),
                Mm((PAGE_H - 14.0) as _),
                &self.sans_bold,
            );

            let footer = format!("Page {}/{}", index + 1, total);
            let footer_x = (PAGE_W - text_width_mm(&footer, 8.0)) / 2.0;
            layer.set_fill_color(Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None)));
            layer.use_text(
                footer.as_str(),
                8.0,
                Mm(footer_x as _),
                Mm((PAGE_H - FOOTER_Y) as _),
                &self.sans_oblique,
            );
        }

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.doc
                .save(&mut writer)
                .map_err(|e| ReportError::Pdf(e.to_string()))?;
        }
        tmp.persist(output)
            .map_err(|e| ReportError::Persist(e.to_string()))?;

        Ok(ReportStats {
            pages: total,
            hosts: 0,
        })
    }
}

fn place_logo(layer: &PdfLayerReference, bytes: &[u8]) -> Result<(), ReportError> {
    let decoder =
        PngDecoder::new(Cursor::new(bytes)).map_err(|e| ReportError::Pdf(e.to_string()))?;
    let image = Image::try_from(decoder).map_err(|e| ReportError::Pdf(e.to_string()))?;
    let width_px = image.image.width.0 as f64;
    let height_px = image.image.height.0 as f64;
    const LOGO_WIDTH: f64 = 33.0;
    let dpi = width_px * 25.4 / LOGO_WIDTH;
    let display_height = height_px * LOGO_WIDTH / width_px;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(10.0)),
            translate_y: Some(Mm((PAGE_H - 8.0 - display_height) as _)),
            dpi: Some(dpi as _),
            ..Default::default()
        },
    );
    Ok(())
}

/// Assemble and atomically write the whole report.
pub fn write_report(
    sections: &[HostSection],
    meta: &ReportMeta,
    output: &Path,
) -> Result<ReportStats, ReportError> {
    let mut writer = DocumentWriter::new(meta)?;
    writer.cover(meta);
    for section in sections {
        writer.render_host(section);
    }
    let mut stats = writer.finish(meta, output)?;
    stats.hosts = sections.len();
    tracing::info!(
        "report written: {} ({} hosts, {} pages)",
        output.display(),
        stats.hosts,
        stats.pages
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ReportMeta {
        ReportMeta {
            title: "Zabbix Weekly Report".into(),
            customer: "ACME Inc.".into(),
            timeframe: "2026-07-27 to 2026-08-03".into(),
            logo: None,
        }
    }

    fn section(number: usize, name: &str, info: &str, images: Vec<PathBuf>) -> HostSection {
        HostSection {
            number,
            name: name.into(),
            info: info.into(),
            images,
        }
    }

    #[test]
    fn test_cover_plus_one_page_per_text_only_host() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("report.pdf");
        let sections = vec![
            section(1, "db01", "All quiet.", vec![]),
            section(2, "web01", "Some <b>load</b> spikes.", vec![]),
        ];
        let stats = write_report(&sections, &meta(), &out).unwrap();
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.hosts, 2);

        let bytes = fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_page_plan_drives_continuation_pages() {
        let tmp = tempfile::tempdir().unwrap();
        // Seven unreadable images: pages follow the plan even when every
        // placement is skipped.
        let images: Vec<PathBuf> = (0..7)
            .map(|i| {
                let path = tmp.path().join(format!("graph_{i}.png"));
                fs::write(&path, b"not a png").unwrap();
                path
            })
            .collect();
        let out = tmp.path().join("report.pdf");
        let sections = vec![section(1, "web01", "busy host", images)];
        let stats = write_report(&sections, &meta(), &out).unwrap();
        // cover + section page + two continuation pages
        assert_eq!(stats.pages, 4);
    }

    #[test]
    fn test_long_body_breaks_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("report.pdf");
        let long = "word ".repeat(5_000);
        let sections = vec![section(1, "db01", &long, vec![])];
        let stats = write_report(&sections, &meta(), &out).unwrap();
        assert!(stats.pages > 2);
    }

    #[test]
    fn test_no_partial_file_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("report.pdf");
        write_report(&[], &meta(), &out).unwrap();
        // only the finished artifact exists in the directory
        let entries: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["report.pdf".to_string()]);
    }
}
