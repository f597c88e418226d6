use quick_xml::events::Event;
use quick_xml::Reader;

use crate::auth::stage::Stage;
use crate::error::XmlError;

static BODY_ELEMENT: &str = "Body";

/// Extract the escaped return field of a SOAP response envelope.
///
/// Walks `<root>/Body/<response>/<return>` by local name (namespace
/// prefixes are ignored, the root may be named anything) and returns the
/// unescaped text of the return field. Reading stops at the end of the root
/// element. A well-formed envelope without the field yields an empty string.
pub fn extract_return(xml: &[u8], stage: Stage) -> Result<String, XmlError> {
    let path = [BODY_ELEMENT, stage.response_element(), stage.return_element()];
    let mut reader = Reader::from_reader(xml);

    // local names of the open elements, root first
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut root_seen = false;
    let mut capture: Option<String> = None;
    let mut value: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(e) => {
                root_seen = true;
                open.push(e.local_name().as_ref().to_vec());
                if value.is_none() && capture.is_none() && on_path(&open, &path) {
                    capture = Some(String::new());
                }
            }
            Event::Empty(e) => {
                if !root_seen {
                    break;
                }
                open.push(e.local_name().as_ref().to_vec());
                if value.is_none() && capture.is_none() && on_path(&open, &path) {
                    value = Some(String::new());
                }
                open.pop();
            }
            Event::End(_) => {
                if capture.is_some() && on_path(&open, &path) {
                    value = capture.take();
                }
                open.pop();
                if open.is_empty() {
                    break;
                }
            }
            Event::Text(e) if open.len() == path.len() + 1 => {
                if let Some(buf) = capture.as_mut() {
                    let text = e.unescape().map_err(|e| malformed(&reader, e))?;
                    buf.push_str(&text);
                }
            }
            Event::CData(e) if open.len() == path.len() + 1 => {
                if let Some(buf) = capture.as_mut() {
                    let text = std::str::from_utf8(&e).map_err(|e| malformed(&reader, e))?;
                    buf.push_str(text);
                }
            }
            Event::Eof => {
                if !root_seen {
                    return Err(XmlError::NoRoot);
                }
                return Err(XmlError::UnexpectedEof { open: open.len() });
            }
            _ => {}
        }
    }

    Ok(value.unwrap_or_default())
}

fn on_path(open: &[Vec<u8>], path: &[&str]) -> bool {
    open.len() == path.len() + 1
        && open[1..]
            .iter()
            .zip(path)
            .all(|(name, expected)| name.as_slice() == expected.as_bytes())
}

pub(crate) fn malformed<R>(reader: &Reader<R>, err: impl std::fmt::Display) -> XmlError {
    XmlError::Malformed {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}
