//! PDF Document wrapper

use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{encode_win_ansi, generate_text_operators, TextRenderContext};
use crate::{PdfError, Result, A4_HEIGHT, A4_WIDTH};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::path::Path;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Helvetica font object shared by page text and field appearances
    standard_font: Option<ObjectId>,
    /// Helvetica resource name per page (page number -> resource name)
    page_font_names: HashMap<usize, String>,
    /// Current text color
    current_text_color: Color,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl PdfDocument {
    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("CFC_Renewal_Form.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            standard_font: None,
            page_font_names: HashMap::new(),
            current_text_color: Color::default(),
            page_content_buffer: HashMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Set the text color used by subsequent `insert_text` calls
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Insert a single line of Helvetica text
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate of the baseline start in points
    /// * `y` - Y coordinate of the baseline in points (from bottom)
    /// * `font_size` - Font size in points
    ///
    /// # Returns
    /// Number of characters replaced because WinAnsiEncoding has no code for them
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        font_size: f32,
    ) -> Result<usize> {
        let page_id = self.page_id(page)?;

        // Skip empty text - nothing to render
        if text.is_empty() {
            return Ok(0);
        }

        let font_name = match self.page_font_names.get(&page) {
            Some(name) => name.clone(),
            None => {
                let font_id = self.standard_font_id();
                let name = self.add_page_resource(page_id, b"Font", "Helv", font_id)?;
                self.page_font_names.insert(page, name.clone());
                name
            }
        };

        let encoded = encode_win_ansi(text);
        let ctx = TextRenderContext {
            font_name,
            font_size,
            color: self.current_text_color,
        };

        let operators = generate_text_operators(&encoded.literal, x, y, &ctx);
        self.buffer_content(page, &operators);

        Ok(encoded.replaced)
    }

    /// Draw a straight stroked line
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `from` - Start point in points
    /// * `to` - End point in points
    /// * `width` - Stroke width in points
    /// * `color` - Stroke color
    pub fn draw_line(
        &mut self,
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        width: f64,
        color: Color,
    ) -> Result<()> {
        self.page_id(page)?;

        let operators = format!(
            "q\n{} {} {} RG\n{width} w\n{} {} m\n{} {} l\nS\nQ\n",
            color.r, color.g, color.b, from.0, from.1, to.0, to.1
        );
        self.buffer_content(page, operators.as_bytes());

        Ok(())
    }

    /// Insert an image scaled relative to its pixel size
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate of the lower-left corner in points
    /// * `y` - Y coordinate of the lower-left corner in points
    /// * `scale` - Factor applied to the pixel dimensions (1 pixel = 1 point)
    ///
    /// # Returns
    /// The drawn (width, height) in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        scale: f64,
    ) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;

        let xobject = ImageXObject::from_bytes(data)
            .map_err(|e| PdfError::ImageError(format!("Failed to create image XObject: {e}")))?;

        let mut stream = xobject.to_pdf_stream();
        if let Some(smask) = xobject.to_smask_stream() {
            let smask_id = self.inner.add_object(smask);
            stream.dict.set("SMask", Object::Reference(smask_id));
        }
        let image_id = self.inner.add_object(stream);

        let resource_name = self.add_page_resource(page_id, b"XObject", "Im", image_id)?;

        let (width, height) = xobject.scaled(scale);
        let operators = generate_image_operators(&resource_name, x, y, width, height);
        self.buffer_content(page, &operators);

        Ok((width, height))
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush_content_buffers()?;

        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        // Drop objects that flattening left unreachable (field dictionaries)
        self.inner.prune_objects();

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Page content as it will be written: the existing (decompressed)
    /// content stream followed by any operators buffered since opening
    pub fn page_content(&self, page: usize) -> Result<Vec<u8>> {
        let page_id = self.page_id(page)?;
        let mut content = self.existing_page_content(page_id)?;
        if let Some(buffered) = self.page_content_buffer.get(&page) {
            content.extend_from_slice(buffered);
        }
        Ok(content)
    }

    /// Resolve a 1-indexed page number to its object id
    pub(crate) fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 || page > pages.len() {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Follow a reference to its target object
    pub(crate) fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.inner.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// Resolve an object (direct or referenced) to an owned dictionary
    pub(crate) fn resolve_dict(&self, object: &Object) -> Option<Dictionary> {
        self.resolve(object)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
    }

    /// Object id of the document catalog
    pub(crate) fn catalog_id(&self) -> Result<ObjectId> {
        self.inner
            .trailer
            .get(b"Root")
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?
            .as_reference()
            .map_err(|_| PdfError::ParseError("Root is not a reference".to_string()))
    }

    /// Standard Helvetica font object, created on first use
    pub(crate) fn standard_font_id(&mut self) -> ObjectId {
        if let Some(id) = self.standard_font {
            return id;
        }

        let id = self.inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.standard_font = Some(id);
        id
    }

    /// Resources dictionary in effect for a page, following inheritance
    /// through the page tree
    fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let dict = self.inner.get_object(current_id)?.as_dict()?;

            if let Ok(resources) = dict.get(b"Resources") {
                return Ok(self.resolve_dict(resources).unwrap_or_default());
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(Dictionary::new())
    }

    /// Register an object in a page's Resources under a fresh name
    ///
    /// The page receives its own direct copy of the resources, so shared or
    /// inherited resource dictionaries of other pages stay untouched.
    ///
    /// # Returns
    /// The resource name (e.g., "Im1") to use in the content stream
    pub(crate) fn add_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &[u8],
        prefix: &str,
        object_id: ObjectId,
    ) -> Result<String> {
        let mut resources = self.effective_resources(page_id)?;
        let mut entries = resources
            .get(category)
            .ok()
            .and_then(|o| self.resolve_dict(o))
            .unwrap_or_default();

        let mut n = 1;
        let name = loop {
            let candidate = format!("{prefix}{n}");
            if !entries.has(candidate.as_bytes()) {
                break candidate;
            }
            n += 1;
        };

        entries.set(name.as_bytes(), Object::Reference(object_id));
        resources.set(category, Object::Dictionary(entries));

        let page_dict = self.inner.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    /// Buffer content operators for a page (written at save time)
    pub(crate) fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    ///
    /// Called once during save/to_bytes. Writes a single new stream object
    /// per page holding the existing content followed by the buffered
    /// operators.
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Decompressed content of a page, concatenating content arrays
    fn existing_page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.inner.get_object(page_id)?.as_dict()?;

        let content = match page_dict.get(b"Contents").map(|c| self.resolve(c)) {
            Ok(Ok(Object::Stream(stream))) => decoded_content(stream)?,
            Ok(Ok(Object::Array(arr))) => {
                let mut combined = Vec::new();
                for obj in arr {
                    if let Ok(Object::Stream(stream)) = self.resolve(obj) {
                        combined.extend_from_slice(&decoded_content(stream)?);
                        combined.push(b'\n');
                    }
                }
                combined
            }
            _ => Vec::new(),
        };

        Ok(content)
    }

    /// Append content to a page's content stream
    ///
    /// The existing content is wrapped in q/Q so that graphics state it
    /// leaves behind does not leak into the appended operators.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;
        let existing = self.existing_page_content(page_id)?;

        let mut new_content = Vec::with_capacity(existing.len() + content.len() + 8);
        if !existing.is_empty() {
            new_content.extend_from_slice(b"q\n");
            new_content.extend_from_slice(&existing);
            new_content.extend_from_slice(b"\nQ\n");
        }
        new_content.extend_from_slice(content);

        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));

        let page_dict = self.inner.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Contents", Object::Reference(stream_id));

        Ok(())
    }

    /// Add a blank page to the end of the document
    ///
    /// Creates a new blank A4 page (595.28 x 841.89 points) with empty content.
    ///
    /// # Returns
    /// New page number (1-indexed)
    ///
    /// # Example
    /// ```ignore
    /// let mut doc = PdfDocument::open("single-page.pdf")?;
    /// let new_page = doc.add_blank_page()?;
    /// assert_eq!(new_page, 2);
    /// ```
    pub fn add_blank_page(&mut self) -> Result<usize> {
        let page_count = self.page_count();

        let catalog_id = self.catalog_id()?;
        let pages_id = self
            .inner
            .get_object(catalog_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?
            .get(b"Pages")
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))?
            .as_reference()
            .map_err(|_| PdfError::ParseError("Pages is not a reference".to_string()))?;

        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), Vec::new()));

        let new_page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), A4_WIDTH.into(), A4_HEIGHT.into()],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        });

        // Get the current Kids array
        let pages_dict = self
            .inner
            .get_object(pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;
        let mut kids_array = pages_dict
            .get(b"Kids")
            .map_err(|_| PdfError::ParseError("Pages object missing Kids array".to_string()))
            .and_then(|kids| self.resolve(kids))?
            .as_array()
            .map_err(|_| PdfError::ParseError("Kids is not an array".to_string()))?
            .clone();
        let current_count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .map_err(|_| PdfError::ParseError("Pages object missing Count".to_string()))?;

        kids_array.push(Object::Reference(new_page_id));

        let pages_dict = self.inner.get_object_mut(pages_id)?.as_dict_mut()?;
        pages_dict.set("Kids", Object::Array(kids_array));
        pages_dict.set("Count", Object::Integer(current_count + 1));

        Ok(page_count + 1)
    }
}

/// Content of a stream with its filters removed
///
/// A stream whose filters cannot be undone is an error: rewriting its raw
/// bytes into an unfiltered stream would corrupt the page.
fn decoded_content(stream: &Stream) -> Result<Vec<u8>> {
    if !stream.dict.has(b"Filter") {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| PdfError::ParseError(format!("Cannot decode page content stream: {e}")))
}
