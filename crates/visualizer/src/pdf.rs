//! Multi-page PDF output, one full-page picture per saved frame.
//!
//! Every page holds a single deflated RGB image. The whole document is
//! rewritten after each page so the file on disk is always complete.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::ZlibEncoder;

use crate::error::VisualizerError;

/// PDF user-space units per inch
const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone)]
struct Page {
    width: u32,
    height: u32,
    dpi: u32,
    image: Vec<u8>,
}

impl Page {
    fn media_box(&self) -> (f64, f64) {
        let scale = POINTS_PER_INCH / self.dpi.max(1) as f64;
        (self.width as f64 * scale, self.height as f64 * scale)
    }
}

/// A PDF file that grows by one page per [`PdfBook::add_page`].
#[derive(Debug, Clone)]
pub struct PdfBook {
    path: PathBuf,
    pages: Vec<Page>,
}

impl PdfBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pages: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Appends a page showing `rgb`, row-major from the top left, 3 bytes
    /// per pixel, and rewrites the file.
    pub fn add_page(&mut self, size: (u32, u32), dpi: u32, rgb: &[u8]) -> Result<(), VisualizerError> {
        let expected = size.0 as usize * size.1 as usize * 3;
        if rgb.len() != expected {
            return Err(VisualizerError::Config(format!(
                "page of {}x{} needs {expected} bytes, got {}",
                size.0,
                size.1,
                rgb.len()
            )));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        let image = encoder
            .write_all(rgb)
            .and_then(|()| encoder.finish())
            .map_err(|source| self.io_error(source))?;
        self.pages.push(Page {
            width: size.0,
            height: size.1,
            dpi,
            image,
        });

        let document = self.to_bytes();
        fs::write(&self.path, document).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> VisualizerError {
        VisualizerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Serializes the document.
    ///
    /// Object 1 is the catalog and object 2 the page tree. Page `k` uses
    /// objects `3 + 3k` (page), `4 + 3k` (content stream) and `5 + 3k` (image).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = PdfWriter::default();
        out.raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        out.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");
        let kids: Vec<String> = (0..self.pages.len())
            .map(|k| format!("{} 0 R", 3 + 3 * k))
            .collect();
        out.object(
            2,
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), kids.len()).as_bytes(),
        );

        for (k, page) in self.pages.iter().enumerate() {
            let id = 3 + 3 * k;
            let (width, height) = page.media_box();
            out.object(
                id,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width:.2} {height:.2}] \
                     /Resources << /XObject << /Im0 {} 0 R >> >> /Contents {} 0 R >>",
                    id + 2,
                    id + 1
                )
                .as_bytes(),
            );
            let content = format!("q {width:.2} 0 0 {height:.2} 0 0 cm /Im0 Do Q");
            out.stream(id + 1, "", content.as_bytes());
            out.stream(
                id + 2,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode ",
                    page.width, page.height
                ),
                &page.image,
            );
        }

        out.finish()
    }
}

/// Byte buffer that remembers where each object starts.
#[derive(Default)]
struct PdfWriter {
    bytes: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn raw(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn begin(&mut self, id: usize) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.bytes.len());
        self.raw(format!("{id} 0 obj\n").as_bytes());
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.begin(id);
        self.raw(body);
        self.raw(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, dictionary: &str, data: &[u8]) {
        self.begin(id);
        self.raw(format!("<< {dictionary}/Length {} >>\nstream\n", data.len()).as_bytes());
        self.raw(data);
        self.raw(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref = self.bytes.len();
        let size = self.offsets.len() + 1;
        let mut table = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            table.push_str(&format!("{offset:010} 00000 n \n"));
        }
        table.push_str(&format!(
            "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n"
        ));
        self.raw(table.as_bytes());
        self.bytes
    }
}
