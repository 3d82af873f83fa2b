//! Request body parsing.

use flatstack_s3_model::types::CreateBucketConfiguration;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::XmlError;

/// Trait for deserializing S3 types from XML.
///
/// The root element has already been consumed by the caller; the
/// implementation reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize XML into a typed value, requiring a specific root element.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed, the root element is not
/// `root_element`, or deserialization fails.
pub fn from_xml<T: S3Deserialize>(root_element: &str, xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?;
                if tag_name != root_element {
                    return Err(XmlError::UnexpectedElement(tag_name.to_owned()));
                }
                return T::deserialize_xml(&mut reader);
            }
            Event::Empty(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?;
                return Err(XmlError::MissingElement(format!(
                    "children of empty <{tag_name}/>"
                )));
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            _ => {}
        }
    }
}

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

impl S3Deserialize for CreateBucketConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut location_constraint = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "LocationConstraint" => {
                            location_constraint = Some(read_text_content(reader)?);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::Empty(e) if e.name().as_ref() == b"LocationConstraint" => {
                    location_constraint = Some(String::new());
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in CreateBucketConfiguration".to_string(),
                    ));
                }
                _ => {}
            }
        }

        // The bucket layer supports a single region, so the constraint is mandatory.
        if location_constraint.is_none() {
            return Err(XmlError::MissingElement("LocationConstraint".to_string()));
        }

        Ok(CreateBucketConfiguration {
            location_constraint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "CreateBucketConfiguration";

    #[test]
    fn test_should_parse_location_constraint() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <CreateBucketConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
              <LocationConstraint>us-east-1</LocationConstraint>
            </CreateBucketConfiguration>"#;
        let config: CreateBucketConfiguration = from_xml(ROOT, xml).expect("should parse");
        assert_eq!(config.location_constraint.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_should_skip_unknown_children() {
        let xml = b"<CreateBucketConfiguration><Bucket><Type>Directory</Type></Bucket>\
                    <LocationConstraint>eu-west-1</LocationConstraint></CreateBucketConfiguration>";
        let config: CreateBucketConfiguration = from_xml(ROOT, xml).expect("should parse");
        assert_eq!(config.location_constraint.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_should_reject_wrong_root() {
        let xml = b"<Tagging><TagSet/></Tagging>";
        let result: Result<CreateBucketConfiguration, _> = from_xml(ROOT, xml);
        assert!(matches!(result, Err(XmlError::UnexpectedElement(name)) if name == "Tagging"));
    }

    #[test]
    fn test_should_reject_missing_location_constraint() {
        let xml = b"<CreateBucketConfiguration></CreateBucketConfiguration>";
        let result: Result<CreateBucketConfiguration, _> = from_xml(ROOT, xml);
        assert!(matches!(result, Err(XmlError::MissingElement(_))));
    }

    #[test]
    fn test_should_reject_truncated_document() {
        let xml = b"<CreateBucketConfiguration><LocationConstraint>us-east-1";
        let result: Result<CreateBucketConfiguration, _> = from_xml(ROOT, xml);
        assert!(result.is_err());
    }
}
