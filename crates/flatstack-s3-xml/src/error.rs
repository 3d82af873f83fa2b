//! XML error type and `<Error>` response bodies.

use std::io;

use flatstack_s3_model::S3Error;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

/// Errors that can occur during XML serialization or deserialization.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

/// Format an S3 error as a flat `<Error>` document.
///
/// `ArgumentName`/`ArgumentValue` are written when the error names an
/// offending request argument.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>InvalidArgument</Code>
///   <Message>Invalid Encoding Method specified in Request</Message>
///   <ArgumentName>encoding-type</ArgumentName>
///   <ArgumentValue>zip</ArgumentValue>
///   <RequestId>3f0c...</RequestId>
/// </Error>
/// ```
#[must_use]
pub fn error_to_xml(err: &S3Error, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, err, request_id) {
        tracing::error!(error = %e, "failed to serialize S3 error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(buf: &mut Vec<u8>, err: &S3Error, request_id: &str) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(err.code.as_str()))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(&err.message))?;
        if let Some(name) = &err.argument_name {
            w.create_element("ArgumentName")
                .write_text_content(BytesText::new(name))?;
        }
        if let Some(value) = &err.argument_value {
            w.create_element("ArgumentValue")
                .write_text_content(BytesText::new(value))?;
        }
        if let Some(res) = &err.resource {
            w.create_element("Resource")
                .write_text_content(BytesText::new(res))?;
        }
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use flatstack_s3_model::S3ErrorCode;

    use super::*;

    fn render(err: &S3Error, request_id: &str) -> String {
        String::from_utf8(error_to_xml(err, request_id)).expect("valid UTF-8")
    }

    #[test]
    fn test_should_format_error_with_resource() {
        let xml = render(&S3Error::no_such_bucket("/mybucket"), "tx000001");

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Code>NoSuchBucket</Code>"));
        assert!(xml.contains("<Message>The specified bucket does not exist</Message>"));
        assert!(xml.contains("<Resource>/mybucket</Resource>"));
        assert!(xml.contains("<RequestId>tx000001</RequestId>"));
    }

    #[test]
    fn test_should_format_argument_fields() {
        let err = S3Error::invalid_argument(
            "version-id-marker",
            "abc",
            "A version-id marker cannot be specified without a key marker.",
        );
        let xml = render(&err, "tx000002");

        assert!(xml.contains("<Code>InvalidArgument</Code>"));
        assert!(xml.contains("<ArgumentName>version-id-marker</ArgumentName>"));
        assert!(xml.contains("<ArgumentValue>abc</ArgumentValue>"));
        assert!(!xml.contains("<Resource>"));
    }

    #[test]
    fn test_should_escape_special_characters() {
        let err = S3Error::with_message(S3ErrorCode::ServiceUnavailable, "queue < 1 & busy");
        let xml = render(&err, "tx000003");

        assert!(xml.contains("queue &lt; 1 &amp; busy"));
    }
}
