use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::XmlError;
use crate::parser::envelope::malformed;

/// Text content of the first element named `name`, in document order.
///
/// The whole document is read, so a fragment that is malformed after the
/// match is still rejected. Text of nested elements and CDATA sections is
/// included. `Ok(None)` means the document parsed but has no such element
/// (an empty document included).
pub fn find_element_text(xml: &str, name: &str) -> Result<Option<String>, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut capture_depth: Option<usize> = None;
    let mut current: Option<String> = None;
    let mut found: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                if found.is_none() && current.is_none() && e.local_name().as_ref() == name.as_bytes() {
                    current = Some(String::new());
                    capture_depth = Some(depth);
                }
            }
            Event::Empty(e) => {
                if found.is_none() && current.is_none() && e.local_name().as_ref() == name.as_bytes() {
                    found = Some(String::new());
                }
                if depth == 0 {
                    break;
                }
            }
            Event::End(_) => {
                if capture_depth == Some(depth) {
                    found = current.take();
                    capture_depth = None;
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Event::Text(e) => {
                if let Some(buf) = current.as_mut() {
                    let text = e.unescape().map_err(|e| malformed(&reader, e))?;
                    buf.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(buf) = current.as_mut() {
                    let text = std::str::from_utf8(&e).map_err(|e| malformed(&reader, e))?;
                    buf.push_str(text);
                }
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(XmlError::UnexpectedEof { open: depth });
                }
                break;
            }
            _ => {}
        }
    }

    Ok(found)
}
