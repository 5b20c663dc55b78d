pub mod cobertura;

use std::str;

use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

use crate::error::{CovgateError, Result};
use crate::model::CoverageData;

/// Every format parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into our uniform coverage model.
    fn parse(&self, input: &[u8]) -> Result<CoverageData>;
}

/// Look up a single attribute by local name, unescaped.
pub(crate) fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes().filter_map(|a| a.ok()).find_map(|attr| {
        if attr.key.local_name().as_ref() == name {
            attr.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

/// Wrap a quick-xml error with the reader's current byte offset.
pub(crate) fn xml_err<R>(source: quick_xml::Error, reader: &Reader<R>) -> CovgateError {
    CovgateError::Xml {
        source,
        position: reader.buffer_position(),
    }
}

/// Lossy UTF-8 view of an element name, for error messages.
pub(crate) fn element_name(name: &[u8]) -> String {
    str::from_utf8(name)
        .map(str::to_string)
        .unwrap_or_else(|_| String::from_utf8_lossy(name).into_owned())
}
