/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure (as emitted by coverlet and friends):
///   <coverage line-rate="..." ...>
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="MyApp.Core">
///         <classes>
///           <class name="MyApp.Core.Foo" filename="src/Foo.cs" ...>
///             <methods>
///               <method name="..." signature="...">
///                 <lines><line number="..." hits="..."/></lines>
///               </method>
///             </methods>
///             <lines>
///               <line number="..." hits="..." branch="false"/>
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Some generators nest packages, or skip the `<classes>` wrapper. We do not
/// rely on a fixed depth: every `<class>` is attributed to its nearest
/// enclosing `<package>`, and every `<line>` to its nearest enclosing `<class>`.
use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use super::{element_name, get_attr, xml_err, Parser};
use crate::error::{CovgateError, Result};
use crate::model::*;

pub struct CoberturaParser;

impl Parser for CoberturaParser {
    fn parse(&self, input: &[u8]) -> Result<CoverageData> {
        parse(input)
    }
}

/// An open `<class>` element plus the index of each line number seen so far.
struct OpenClass {
    class: ClassCoverage,
    line_index: HashMap<u32, usize>,
}

impl OpenClass {
    fn new(package: &str, e: &BytesStart) -> Self {
        Self {
            class: ClassCoverage::new(
                package.to_string(),
                get_attr(e, b"name").unwrap_or_default(),
                get_attr(e, b"filename").unwrap_or_default(),
            ),
            line_index: HashMap::new(),
        }
    }

    fn record_line(&mut self, e: &BytesStart) {
        let Some(line_number) =
            get_attr(e, b"number").and_then(|n| n.trim().parse::<u32>().ok())
        else {
            return;
        };
        let hit_count = get_attr(e, b"hits")
            .and_then(|h| h.trim().parse::<u64>().ok())
            .unwrap_or(0);

        // Lines appear under both <method><lines> and <class><lines>; keep
        // one entry per number with the max hit count.
        if let Some(&idx) = self.line_index.get(&line_number) {
            let line = &mut self.class.lines[idx];
            line.hit_count = line.hit_count.max(hit_count);
        } else {
            self.line_index.insert(line_number, self.class.lines.len());
            self.class.lines.push(LineCoverage {
                line_number,
                hit_count,
            });
        }
    }

    fn finish(mut self) -> ClassCoverage {
        self.class.lines.sort_by_key(|l| l.line_number);
        self.class
    }
}

/// Parse Cobertura XML coverage data from raw bytes.
pub fn parse(input: &[u8]) -> Result<CoverageData> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut data = CoverageData::new();
    let mut buf = Vec::new();

    let mut depth: usize = 0;
    let mut seen_root = false;
    let mut packages: Vec<String> = Vec::new();
    let mut classes: Vec<OpenClass> = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => return Err(xml_err(e, &reader)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    if seen_root {
                        return Err(CovgateError::Parse(
                            "multiple root elements in coverage document".to_string(),
                        ));
                    }
                    if e.name().as_ref() != b"coverage" {
                        return Err(CovgateError::Parse(format!(
                            "expected <coverage> root element, found <{}>",
                            element_name(e.name().as_ref())
                        )));
                    }
                    seen_root = true;
                }
                if is_start_event {
                    depth += 1;
                }

                match e.name().as_ref() {
                    b"package" => {
                        // A self-closing <package/> has no classes and no End event.
                        if is_start_event {
                            packages.push(get_attr(e, b"name").unwrap_or_default());
                        }
                    }
                    b"class" => {
                        let package = packages.last().map(String::as_str).unwrap_or("");
                        let open = OpenClass::new(package, e);
                        if is_start_event {
                            classes.push(open);
                        } else {
                            data.classes.push(open.finish());
                        }
                    }
                    b"line" => {
                        if let Some(open) = classes.last_mut() {
                            open.record_line(e);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                match e.name().as_ref() {
                    b"package" => {
                        packages.pop();
                    }
                    b"class" => {
                        if let Some(open) = classes.pop() {
                            data.classes.push(open.finish());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(_)) | Ok(Event::CData(_)) if depth == 0 => {
                return Err(CovgateError::Parse(
                    "text content outside of the root element".to_string(),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(CovgateError::Parse(
            "empty document: no <coverage> element".to_string(),
        ));
    }
    if depth != 0 {
        return Err(CovgateError::Parse(
            "unexpected end of document inside an open element".to_string(),
        ));
    }

    debug!(
        classes = data.classes.len(),
        lines = data.line_count(),
        "parsed cobertura document"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cobertura() {
        let input = include_bytes!("../../tests/fixtures/sample_cobertura.xml");
        let data = CoberturaParser.parse(input).unwrap();

        assert_eq!(data.classes.len(), 2);

        let foo = &data.classes[0];
        assert_eq!(foo.package, "MyApp.Core");
        assert_eq!(foo.name, "MyApp.Core.Foo");
        assert_eq!(foo.filename, "src/MyApp.Core/Foo.cs");
        // Lines 5-7 appear under both <method> and <class>: 4 unique lines.
        assert_eq!(foo.lines.len(), 4);
        assert_eq!(foo.lines[0].line_number, 5);
        assert_eq!(foo.lines[0].hit_count, 3);
        assert_eq!(foo.lines[2].line_number, 7);
        assert_eq!(foo.lines[2].hit_count, 0);
        assert_eq!(foo.covered(), 3);

        let bar = &data.classes[1];
        assert_eq!(bar.name, "MyApp.Core.Bar");
        assert_eq!(bar.lines.len(), 2);
        assert_eq!(bar.covered(), 0);
    }

    #[test]
    fn test_missing_hits_default_to_zero() {
        let input = br#"<coverage><packages><package name="P"><classes>
            <class name="C" filename="c.cs"><lines>
              <line number="1"/>
              <line number="2" hits="4"/>
              <line hits="9"/>
            </lines></class>
        </classes></package></packages></coverage>"#;
        let data = parse(input).unwrap();
        let lines = &data.classes[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].hit_count, 0);
        assert_eq!(lines[1].hit_count, 4);
    }

    #[test]
    fn test_missing_names_default_to_empty() {
        let input = br#"<coverage><package><class><line number="3" hits="1"/></class></package></coverage>"#;
        let data = parse(input).unwrap();
        assert_eq!(data.classes.len(), 1);
        assert_eq!(data.classes[0].package, "");
        assert_eq!(data.classes[0].name, "");
        assert_eq!(data.classes[0].lines[0].line_number, 3);
    }

    #[test]
    fn test_nested_packages_attribute_to_nearest() {
        let input = include_bytes!("../../tests/fixtures/nested_packages.xml");
        let data = parse(input).unwrap();

        let names: Vec<(&str, &str)> = data
            .classes
            .iter()
            .map(|c| (c.package.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Outer.Inner", "Outer.Inner.Deep"),
                ("Outer", "Outer.Shallow"),
            ]
        );
    }

    #[test]
    fn test_class_without_package() {
        let input = br#"<coverage><classes><class name="Loose" filename="l.cs">
            <lines><line number="1" hits="1"/></lines></class></classes></coverage>"#;
        let data = parse(input).unwrap();
        assert_eq!(data.classes[0].package, "");
        assert_eq!(data.classes[0].name, "Loose");
    }

    #[test]
    fn test_empty_document_is_error() {
        assert!(matches!(parse(b""), Err(CovgateError::Parse(_))));
        assert!(matches!(parse(b"   \n"), Err(CovgateError::Parse(_))));
    }

    #[test]
    fn test_wrong_root_is_error() {
        let err = parse(b"<report name=\"x\"></report>").unwrap_err();
        assert!(err.to_string().contains("<report>"));
    }

    #[test]
    fn test_truncated_document_is_error() {
        let input = br#"<coverage><packages><package name="P"><classes>"#;
        assert!(parse(input).is_err());
    }

    #[test]
    fn test_mismatched_tags_is_error() {
        let input = br#"<coverage><packages></classes></coverage>"#;
        assert!(matches!(parse(input), Err(CovgateError::Xml { .. })));
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse(b"hello world").is_err());
    }
}
