//! AcroForm fields: lookup, value writing and flattening

use crate::document::PdfDocument;
use crate::text::{encode_win_ansi, simple_word_wrap};
use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Field flag: text field may hold multiple lines
const FF_MULTILINE: i64 = 1 << 12;
/// Field flag: button is a radio button
const FF_RADIO: i64 = 1 << 15;
/// Field flag: button is a push button
const FF_PUSHBUTTON: i64 = 1 << 16;
/// Annotation flag: do not display
const ANNOT_HIDDEN: i64 = 1 << 1;

/// Guard against cyclic /Kids references
const MAX_FIELD_DEPTH: usize = 32;

/// Kind of an interactive form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    CheckBox,
    RadioGroup,
    PushButton,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_type(field_type: Option<&[u8]>, flags: i64) -> Self {
        match field_type {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") if flags & FF_PUSHBUTTON != 0 => Self::PushButton,
            Some(b"Btn") if flags & FF_RADIO != 0 => Self::RadioGroup,
            Some(b"Btn") => Self::CheckBox,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::CheckBox => "checkbox",
            Self::RadioGroup => "radio group",
            Self::PushButton => "push button",
            Self::Choice => "choice",
            Self::Signature => "signature",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A terminal form field and its widget annotations
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name (partial names joined with '.')
    pub name: String,
    pub kind: FieldKind,
    /// Field flags (/Ff), inherited from ancestors when absent
    pub flags: i64,
    /// Default appearance string (/DA), inherited from ancestors or the form
    pub default_appearance: Option<String>,
    /// Object id of the field dictionary
    pub id: ObjectId,
    /// Widget annotations; the field itself when field and widget are merged
    pub widgets: Vec<ObjectId>,
}

/// Attributes passed down the field hierarchy
#[derive(Clone, Copy)]
struct Inherited<'a> {
    field_type: Option<&'a [u8]>,
    flags: i64,
    default_appearance: Option<&'a [u8]>,
}

/// Where a widget's normal appearance stream lives
enum AppearanceRef {
    Indirect(ObjectId),
    Inline(Stream),
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise PDFDocEncoding)
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Encode a field value as a PDF text string
fn encode_text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Read a four-number rectangle, normalized to [llx, lly, urx, ury]
fn rectangle(object: &Object) -> Option<[f64; 4]> {
    let values = object.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let (x1, y1) = (number(&values[0])?, number(&values[1])?);
    let (x2, y2) = (number(&values[2])?, number(&values[3])?);
    Some([x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)])
}

/// Font size operand of the `Tf` operator in a default appearance string
fn font_size_from_da(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let tf = tokens.iter().position(|&t| t == "Tf")?;
    tokens.get(tf.checked_sub(1)?)?.parse().ok()
}

/// Font size used when the default appearance asks for auto sizing (0)
fn auto_font_size(height: f64, multiline: bool) -> f64 {
    if multiline {
        10.0
    } else {
        (height * 0.7).clamp(4.0, 12.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Content stream of a text field appearance
///
/// Returns the content and the number of characters WinAnsi could not encode.
fn text_appearance_content(
    value: &str,
    width: f64,
    height: f64,
    font_size: f64,
    multiline: bool,
) -> (String, usize) {
    let mut replaced = 0;
    let mut content = String::from("/Tx BMC\nq\n");

    // Clip to the field interior
    content.push_str(&format!(
        "1 1 {} {} re\nW\nn\nBT\n/Helv {} Tf\n0 g\n",
        round2(width - 2.0),
        round2(height - 2.0),
        round2(font_size)
    ));

    if multiline {
        let max_chars = ((width - 4.0) / (font_size * 0.5)).floor().max(1.0) as usize;
        content.push_str(&format!(
            "2 {} Td\n{} TL\n",
            round2(height - 2.0 - font_size),
            round2(font_size * 1.15)
        ));
        for (i, line) in simple_word_wrap(value, max_chars).iter().enumerate() {
            let encoded = encode_win_ansi(line);
            replaced += encoded.replaced;
            if i > 0 {
                content.push_str("T*\n");
            }
            content.push_str(&format!("{} Tj\n", encoded.literal));
        }
    } else {
        let baseline = ((height - font_size * 0.72) / 2.0).max(1.0);
        let encoded = encode_win_ansi(value);
        replaced += encoded.replaced;
        content.push_str(&format!("2 {} Td\n{} Tj\n", round2(baseline), encoded.literal));
    }

    content.push_str("ET\nQ\nEMC\n");
    (content, replaced)
}

impl PdfDocument {
    /// Whether the catalog carries an interactive form
    pub fn has_form(&self) -> bool {
        self.acro_form().is_ok()
    }

    /// List all terminal fields of the interactive form
    pub fn form_fields(&self) -> Result<Vec<FormField>> {
        let acro_form = self.acro_form()?;

        let roots: Vec<ObjectId> = acro_form
            .get(b"Fields")
            .ok()
            .and_then(|f| self.resolve(f).ok())
            .and_then(|f| f.as_array().ok())
            .map(|arr| arr.iter().filter_map(|o| o.as_reference().ok()).collect())
            .unwrap_or_default();

        let inherited = Inherited {
            field_type: None,
            flags: 0,
            default_appearance: acro_form.get(b"DA").and_then(Object::as_str).ok(),
        };

        let mut fields = Vec::new();
        for root in roots {
            self.collect_fields(root, "", inherited, 0, &mut fields)?;
        }

        Ok(fields)
    }

    /// Look up a field by its fully qualified name
    pub fn form_field(&self, name: &str) -> Result<FormField> {
        self.form_fields()?
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| PdfError::FieldNotFound(name.to_string()))
    }

    /// Current value (/V) of a field; checkbox states are returned as names
    pub fn field_value(&self, name: &str) -> Result<Option<String>> {
        let field = self.form_field(name)?;
        let dict = self.inner().get_object(field.id)?.as_dict()?;

        let value = match dict.get(b"V").map(|v| self.resolve(v)) {
            Ok(Ok(Object::String(bytes, _))) => Some(decode_text_string(bytes)),
            Ok(Ok(Object::Name(name))) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        };
        Ok(value)
    }

    /// Set the value of a text field and regenerate its widget appearances
    ///
    /// Appearances are drawn with Helvetica; multiline fields wrap on
    /// whitespace.
    ///
    /// # Returns
    /// Number of characters that could not be drawn with WinAnsiEncoding
    pub fn set_text_field(&mut self, name: &str, value: &str) -> Result<usize> {
        let field = self.expect_field(name, FieldKind::Text)?;

        let mut replaced = 0;
        for &widget_id in &field.widgets {
            replaced += self.regenerate_text_appearance(&field, widget_id, value)?;
        }

        self.inner_mut()
            .get_object_mut(field.id)?
            .as_dict_mut()?
            .set("V", encode_text_string(value));

        Ok(replaced)
    }

    /// Check or uncheck a checkbox
    ///
    /// The on-state name is taken from the widget's normal appearance
    /// dictionary; "Yes" is used when the widget declares none.
    pub fn set_check_box(&mut self, name: &str, checked: bool) -> Result<()> {
        let field = self.expect_field(name, FieldKind::CheckBox)?;

        let field_on_state = field
            .widgets
            .iter()
            .find_map(|&w| self.on_state(w))
            .unwrap_or_else(|| b"Yes".to_vec());

        for &widget_id in &field.widgets {
            let state = match self.on_state(widget_id) {
                Some(on) if checked && on == field_on_state => on,
                None if checked => field_on_state.clone(),
                _ => b"Off".to_vec(),
            };
            self.inner_mut()
                .get_object_mut(widget_id)?
                .as_dict_mut()?
                .set("AS", Object::Name(state));
        }

        let value = if checked {
            field_on_state
        } else {
            b"Off".to_vec()
        };
        self.inner_mut()
            .get_object_mut(field.id)?
            .as_dict_mut()?
            .set("V", Object::Name(value));

        Ok(())
    }

    /// Flatten the interactive form into page content
    ///
    /// Every visible widget's normal appearance is drawn onto its page as a
    /// form XObject, widget annotations are removed from the pages and the
    /// /AcroForm entry is removed from the catalog. After this call the
    /// document has no form fields.
    ///
    /// # Returns
    /// Number of widgets drawn onto pages
    pub fn flatten_form(&mut self) -> Result<usize> {
        let fields = match self.form_fields() {
            Ok(fields) => fields,
            Err(PdfError::NoForm) => return Ok(0),
            Err(e) => return Err(e),
        };

        let default_resources = self
            .acro_form()?
            .get(b"DR")
            .ok()
            .and_then(|dr| self.resolve_dict(dr));
        let widget_pages = self.widget_pages();

        let widgets: Vec<ObjectId> = fields
            .iter()
            .flat_map(|f| f.widgets.iter().copied())
            .collect();

        let mut baked = 0;
        for &widget_id in &widgets {
            let Some(&page) = widget_pages.get(&widget_id) else {
                continue;
            };
            if self.bake_widget(widget_id, page, default_resources.as_ref())? {
                baked += 1;
            }
        }

        let widget_set: HashSet<ObjectId> = widgets.into_iter().collect();
        for page in 1..=self.page_count() {
            self.remove_annotations(page, &widget_set)?;
        }

        let catalog_id = self.catalog_id()?;
        self.inner_mut()
            .get_object_mut(catalog_id)?
            .as_dict_mut()?
            .remove(b"AcroForm");

        Ok(baked)
    }

    fn acro_form(&self) -> Result<Dictionary> {
        let catalog = self.inner().get_object(self.catalog_id()?)?.as_dict()?;
        catalog
            .get(b"AcroForm")
            .ok()
            .and_then(|form| self.resolve_dict(form))
            .ok_or(PdfError::NoForm)
    }

    fn expect_field(&self, name: &str, expected: FieldKind) -> Result<FormField> {
        let field = self.form_field(name)?;
        if field.kind != expected {
            return Err(PdfError::FieldTypeMismatch {
                name: name.to_string(),
                expected,
                actual: field.kind,
            });
        }
        Ok(field)
    }

    fn collect_fields<'a>(
        &'a self,
        id: ObjectId,
        parent_name: &str,
        inherited: Inherited<'a>,
        depth: usize,
        out: &mut Vec<FormField>,
    ) -> Result<()> {
        if depth > MAX_FIELD_DEPTH {
            return Err(PdfError::ParseError(
                "Form field hierarchy too deep".to_string(),
            ));
        }

        let dict = self.inner().get_object(id)?.as_dict()?;

        let partial = match dict.get(b"T").map(|t| self.resolve(t)) {
            Ok(Ok(Object::String(bytes, _))) => Some(decode_text_string(bytes)),
            _ => None,
        };
        let name = match partial {
            Some(partial) if parent_name.is_empty() => partial,
            Some(partial) => format!("{parent_name}.{partial}"),
            None => parent_name.to_string(),
        };

        let inherited = Inherited {
            field_type: dict
                .get(b"FT")
                .and_then(Object::as_name)
                .ok()
                .or(inherited.field_type),
            flags: dict
                .get(b"Ff")
                .and_then(Object::as_i64)
                .unwrap_or(inherited.flags),
            default_appearance: dict
                .get(b"DA")
                .and_then(Object::as_str)
                .ok()
                .or(inherited.default_appearance),
        };

        let kids: Vec<ObjectId> = dict
            .get(b"Kids")
            .ok()
            .and_then(|k| self.resolve(k).ok())
            .and_then(|k| k.as_array().ok())
            .map(|arr| arr.iter().filter_map(|o| o.as_reference().ok()).collect())
            .unwrap_or_default();

        // Kids with a partial name are child fields, the rest are widgets
        let (children, mut widgets): (Vec<ObjectId>, Vec<ObjectId>) =
            kids.into_iter().partition(|&kid| {
                self.inner()
                    .get_object(kid)
                    .and_then(Object::as_dict)
                    .map(|d| d.has(b"T"))
                    .unwrap_or(false)
            });

        for &child in &children {
            self.collect_fields(child, &name, inherited, depth + 1, out)?;
        }

        if children.is_empty() && widgets.is_empty() {
            widgets.push(id);
        }

        if !widgets.is_empty() {
            out.push(FormField {
                name,
                kind: FieldKind::from_type(inherited.field_type, inherited.flags),
                flags: inherited.flags,
                default_appearance: inherited
                    .default_appearance
                    .map(|da| String::from_utf8_lossy(da).into_owned()),
                id,
                widgets,
            });
        }

        Ok(())
    }

    fn regenerate_text_appearance(
        &mut self,
        field: &FormField,
        widget_id: ObjectId,
        value: &str,
    ) -> Result<usize> {
        let widget = self.inner().get_object(widget_id)?.as_dict()?;

        let Some(rect) = widget.get(b"Rect").ok().and_then(rectangle) else {
            return Ok(0);
        };
        let widget_da = widget
            .get(b"DA")
            .and_then(Object::as_str)
            .ok()
            .map(|da| String::from_utf8_lossy(da).into_owned());

        let multiline = field.flags & FF_MULTILINE != 0;
        let (width, height) = (rect[2] - rect[0], rect[3] - rect[1]);
        let font_size = widget_da
            .as_deref()
            .or(field.default_appearance.as_deref())
            .and_then(font_size_from_da)
            .filter(|&size| size > 0.0)
            .unwrap_or_else(|| auto_font_size(height, multiline));

        let (content, replaced) =
            text_appearance_content(value, width, height, font_size, multiline);

        let font_id = self.standard_font_id();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), (width as f32).into(), (height as f32).into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "Helv" => font_id },
                },
            },
            content.into_bytes(),
        );
        let stream_id = self.inner_mut().add_object(stream);

        self.inner_mut()
            .get_object_mut(widget_id)?
            .as_dict_mut()?
            .set("AP", dictionary! { "N" => stream_id });

        Ok(replaced)
    }

    /// First non-Off state name in a widget's normal appearance dictionary
    fn on_state(&self, widget_id: ObjectId) -> Option<Vec<u8>> {
        let widget = self.inner().get_object(widget_id).ok()?.as_dict().ok()?;
        let appearance = self.resolve_dict(widget.get(b"AP").ok()?)?;
        let normal = self.resolve_dict(appearance.get(b"N").ok()?)?;

        normal
            .iter()
            .map(|(state, _)| state)
            .find(|state| state.as_slice() != b"Off")
            .cloned()
    }

    fn appearance_for(&self, normal: &Object, state: Option<&[u8]>) -> Option<AppearanceRef> {
        match normal {
            Object::Reference(id) => match self.inner().get_object(*id).ok()? {
                Object::Stream(_) => Some(AppearanceRef::Indirect(*id)),
                Object::Dictionary(states) => self.appearance_for(states.get(state?).ok()?, None),
                _ => None,
            },
            Object::Stream(stream) => Some(AppearanceRef::Inline(stream.clone())),
            Object::Dictionary(states) => self.appearance_for(states.get(state?).ok()?, None),
            _ => None,
        }
    }

    /// Page number of every widget, from page /Annots with /P as fallback
    fn widget_pages(&self) -> HashMap<ObjectId, usize> {
        let mut widget_pages = HashMap::new();
        let pages = self.inner().get_pages();

        for (&number, &page_id) in &pages {
            let annots = self
                .inner()
                .get_object(page_id)
                .and_then(Object::as_dict)
                .ok()
                .and_then(|page| page.get(b"Annots").ok())
                .and_then(|a| self.resolve(a).ok())
                .and_then(|a| a.as_array().ok());

            for annot in annots.into_iter().flatten() {
                if let Ok(id) = annot.as_reference() {
                    widget_pages.insert(id, number as usize);
                }
            }
        }

        let page_numbers: HashMap<ObjectId, usize> = pages
            .iter()
            .map(|(&number, &id)| (id, number as usize))
            .collect();
        for (&id, object) in &self.inner().objects {
            if widget_pages.contains_key(&id) {
                continue;
            }
            let page = object
                .as_dict()
                .ok()
                .and_then(|d| d.get(b"P").ok())
                .and_then(|p| p.as_reference().ok())
                .and_then(|p| page_numbers.get(&p));
            if let Some(&page) = page {
                widget_pages.insert(id, page);
            }
        }

        widget_pages
    }

    /// Draw a widget's appearance onto its page
    ///
    /// Returns false for hidden widgets and widgets without an appearance.
    fn bake_widget(
        &mut self,
        widget_id: ObjectId,
        page: usize,
        default_resources: Option<&Dictionary>,
    ) -> Result<bool> {
        let widget = self.inner().get_object(widget_id)?.as_dict()?;

        let flags = widget.get(b"F").and_then(Object::as_i64).unwrap_or(0);
        if flags & ANNOT_HIDDEN != 0 {
            return Ok(false);
        }

        let Some(rect) = widget.get(b"Rect").ok().and_then(rectangle) else {
            return Ok(false);
        };
        let state = widget
            .get(b"AS")
            .and_then(Object::as_name)
            .ok()
            .map(<[u8]>::to_vec);
        let appearance = widget
            .get(b"AP")
            .ok()
            .and_then(|ap| self.resolve_dict(ap))
            .and_then(|ap| {
                ap.get(b"N")
                    .ok()
                    .and_then(|normal| self.appearance_for(normal, state.as_deref()))
            });

        let appearance_id = match appearance {
            Some(AppearanceRef::Indirect(id)) => id,
            Some(AppearanceRef::Inline(stream)) => self.inner_mut().add_object(stream),
            None => return Ok(false),
        };

        let stream = self
            .inner_mut()
            .get_object_mut(appearance_id)?
            .as_stream_mut()?;
        stream.dict.set("Type", "XObject");
        stream.dict.set("Subtype", "Form");
        if !stream.dict.has(b"Resources") {
            if let Some(resources) = default_resources {
                stream.dict.set("Resources", resources.clone());
            }
        }
        let bbox = match stream.dict.get(b"BBox").ok().and_then(rectangle) {
            Some(bbox) => bbox,
            None => {
                let bbox = [0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]];
                stream.dict.set(
                    "BBox",
                    Object::Array(vec![
                        0.into(),
                        0.into(),
                        (bbox[2] as f32).into(),
                        (bbox[3] as f32).into(),
                    ]),
                );
                bbox
            }
        };

        // Map the appearance bounding box onto the annotation rectangle
        let (bbox_width, bbox_height) = (bbox[2] - bbox[0], bbox[3] - bbox[1]);
        let sx = if bbox_width > 0.0 {
            (rect[2] - rect[0]) / bbox_width
        } else {
            1.0
        };
        let sy = if bbox_height > 0.0 {
            (rect[3] - rect[1]) / bbox_height
        } else {
            1.0
        };
        let tx = rect[0] - bbox[0] * sx;
        let ty = rect[1] - bbox[1] * sy;

        let page_id = self.page_id(page)?;
        let name = self.add_page_resource(page_id, b"XObject", "FlatWidget", appearance_id)?;
        let operators = format!(
            "q\n{} 0 0 {} {} {} cm\n/{name} Do\nQ\n",
            round2(sx),
            round2(sy),
            round2(tx),
            round2(ty)
        );
        self.buffer_content(page, operators.as_bytes());

        Ok(true)
    }

    fn remove_annotations(&mut self, page: usize, widgets: &HashSet<ObjectId>) -> Result<()> {
        let page_id = self.page_id(page)?;
        let page_dict = self.inner().get_object(page_id)?.as_dict()?;

        let Some(annots) = page_dict
            .get(b"Annots")
            .ok()
            .and_then(|a| self.resolve(a).ok())
            .and_then(|a| a.as_array().ok())
        else {
            return Ok(());
        };

        let kept: Vec<Object> = annots
            .iter()
            .filter(|annot| {
                annot
                    .as_reference()
                    .map(|id| !widgets.contains(&id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        let page_dict = self.inner_mut().get_object_mut(page_id)?.as_dict_mut()?;
        if kept.is_empty() {
            page_dict.remove(b"Annots");
        } else {
            page_dict.set("Annots", kept);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;
    use pretty_assertions::assert_eq;

    /// One page with a text field, a hierarchical multiline text field and
    /// a checkbox whose on-state is named "On"
    fn form_document() -> PdfDocument {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        let company_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("CompanyName"),
            "Rect" => vec![100.into(), 700.into(), 300.into(), 720.into()],
            "P" => page_id,
        });

        let contact_id = doc.new_object_id();
        let details_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => contact_id,
            "T" => Object::string_literal("Details"),
            "Ff" => FF_MULTILINE,
            "DA" => Object::string_literal("/Helv 10 Tf 0 g"),
            "Rect" => vec![100.into(), 500.into(), 300.into(), 600.into()],
            "P" => page_id,
        });
        doc.objects.insert(
            contact_id,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal("Contact"),
                "FT" => "Tx",
                "Kids" => vec![details_id.into()],
            }),
        );

        let on_id = doc.add_object(Stream::new(
            dictionary! { "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()] },
            b"0 g 1 1 8 8 re f".to_vec(),
        ));
        let off_id = doc.add_object(Stream::new(
            dictionary! { "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()] },
            Vec::new(),
        ));
        let check_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal("Check Box 20"),
            "Rect" => vec![181.into(), 423.into(), 191.into(), 433.into()],
            "AP" => dictionary! { "N" => dictionary! { "On" => on_id, "Off" => off_id } },
            "AS" => "Off",
            "V" => "Off",
            "P" => page_id,
        });

        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m\n".to_vec()));
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Annots" => vec![company_id.into(), details_id.into(), check_id.into()],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => dictionary! {
                "Fields" => vec![company_id.into(), contact_id.into(), check_id.into()],
                "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            },
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        PdfDocument::open_from_bytes(&bytes).unwrap()
    }

    fn appearance_content(doc: &PdfDocument, widget_id: ObjectId) -> String {
        let widget = doc.inner().get_object(widget_id).unwrap().as_dict().unwrap();
        let normal = widget
            .get(b"AP")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"N")
            .unwrap()
            .as_reference()
            .unwrap();
        let stream = doc.inner().get_object(normal).unwrap().as_stream().unwrap();
        String::from_utf8(stream.content.clone()).unwrap()
    }

    #[test]
    fn test_form_fields_resolve_hierarchy() {
        let doc = form_document();
        let fields: Vec<(String, FieldKind)> = doc
            .form_fields()
            .unwrap()
            .into_iter()
            .map(|f| (f.name, f.kind))
            .collect();

        assert_eq!(
            fields,
            vec![
                ("CompanyName".to_string(), FieldKind::Text),
                ("Contact.Details".to_string(), FieldKind::Text),
                ("Check Box 20".to_string(), FieldKind::CheckBox),
            ]
        );
    }

    #[test]
    fn test_field_kind_from_flags() {
        assert_eq!(FieldKind::from_type(Some(b"Btn"), 0), FieldKind::CheckBox);
        assert_eq!(FieldKind::from_type(Some(b"Btn"), FF_RADIO), FieldKind::RadioGroup);
        assert_eq!(
            FieldKind::from_type(Some(b"Btn"), FF_PUSHBUTTON),
            FieldKind::PushButton
        );
        assert_eq!(FieldKind::from_type(None, 0), FieldKind::Unknown);
    }

    #[test]
    fn test_set_text_field_writes_value_and_appearance() {
        let mut doc = form_document();
        doc.set_text_field("CompanyName", "Acme Ltd").unwrap();

        assert_eq!(
            doc.field_value("CompanyName").unwrap(),
            Some("Acme Ltd".to_string())
        );

        let field = doc.form_field("CompanyName").unwrap();
        let content = appearance_content(&doc, field.widgets[0]);
        assert!(content.starts_with("/Tx BMC\n"));
        // Auto size: 20pt high field caps at 12pt
        assert!(content.contains("/Helv 12 Tf"));
        assert!(content.contains("(Acme Ltd) Tj"));
        assert!(content.ends_with("EMC\n"));
    }

    #[test]
    fn test_multiline_field_wraps() {
        let mut doc = form_document();
        let text = "Burst pipe in the server room damaged two racks and the raised floor";
        doc.set_text_field("Contact.Details", text).unwrap();

        let field = doc.form_field("Contact.Details").unwrap();
        let content = appearance_content(&doc, field.widgets[0]);
        assert!(content.contains("/Helv 10 Tf"));
        assert!(content.contains("T*\n"));
        assert!(content.contains("(Burst pipe in the server room damaged) Tj"));
    }

    #[test]
    fn test_non_ascii_value_round_trips() {
        let mut doc = form_document();
        let replaced = doc.set_text_field("CompanyName", "Café Ωmega").unwrap();

        assert_eq!(replaced, 1);
        assert_eq!(
            doc.field_value("CompanyName").unwrap(),
            Some("Café Ωmega".to_string())
        );
    }

    #[test]
    fn test_set_check_box_uses_declared_on_state() {
        let mut doc = form_document();

        doc.set_check_box("Check Box 20", true).unwrap();
        assert_eq!(doc.field_value("Check Box 20").unwrap(), Some("On".to_string()));
        let field = doc.form_field("Check Box 20").unwrap();
        let widget = doc.inner().get_object(field.widgets[0]).unwrap().as_dict().unwrap();
        assert_eq!(widget.get(b"AS").unwrap().as_name().unwrap(), b"On");

        doc.set_check_box("Check Box 20", false).unwrap();
        assert_eq!(doc.field_value("Check Box 20").unwrap(), Some("Off".to_string()));
    }

    #[test]
    fn test_type_mismatch_and_missing_field() {
        let mut doc = form_document();

        let err = doc.set_text_field("Check Box 20", "x").unwrap_err();
        assert!(matches!(
            err,
            PdfError::FieldTypeMismatch {
                expected: FieldKind::Text,
                actual: FieldKind::CheckBox,
                ..
            }
        ));

        let err = doc.set_check_box("Check Box 99", true).unwrap_err();
        assert!(matches!(err, PdfError::FieldNotFound(name) if name == "Check Box 99"));
    }

    #[test]
    fn test_flatten_bakes_widgets_and_removes_form() {
        let mut doc = form_document();
        doc.set_text_field("CompanyName", "Acme Ltd").unwrap();
        doc.set_text_field("Contact.Details", "None").unwrap();
        doc.set_check_box("Check Box 20", true).unwrap();

        assert_eq!(doc.flatten_form().unwrap(), 3);
        assert!(!doc.has_form());
        assert!(matches!(doc.form_fields(), Err(PdfError::NoForm)));

        let page_id = doc.page_id(1).unwrap();
        let page = doc.inner().get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.get(b"Annots").is_err());

        let content = String::from_utf8(doc.page_content(1).unwrap()).unwrap();
        assert!(content.starts_with("0 0 m\n"));
        assert!(content.contains("q\n1 0 0 1 100 700 cm\n/FlatWidget1 Do\nQ\n"));
        assert!(content.contains("q\n1 0 0 1 181 423 cm\n/FlatWidget3 Do\nQ\n"));
    }

    #[test]
    fn test_flatten_skips_widgets_without_appearance() {
        let mut doc = form_document();
        // Only the checkbox has an appearance before any value is written
        assert_eq!(doc.flatten_form().unwrap(), 1);
    }

    #[test]
    fn test_flatten_without_form_is_noop() {
        let mut doc = form_document();
        doc.flatten_form().unwrap();
        assert_eq!(doc.flatten_form().unwrap(), 0);
    }

    #[test]
    fn test_font_size_from_da() {
        assert_eq!(font_size_from_da("/Helv 0 Tf 0 g"), Some(0.0));
        assert_eq!(font_size_from_da("0 g /TiRo 9.5 Tf"), Some(9.5));
        assert_eq!(font_size_from_da("0 g"), None);
    }

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"Check Box 24"), "Check Box 24");
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x41, 0x03, 0xA9]), "AΩ");
    }
}
