//! XML to JSON conversion for point-table payloads.
//!
//! The upstream sometimes delivers standings as XML. The conversion mirrors
//! what the display clients already expect: attributes are merged into the
//! element object, single children stay objects (arrays are not forced),
//! repeated children are promoted to arrays, and element text lands under
//! `_` when it coexists with attributes or children.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn finish(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        let value = if self.children.is_empty() {
            // Leaf element: its text, or "" when empty.
            Value::String(text)
        } else {
            let mut map = self.children;
            if !text.is_empty() {
                map.insert("_".to_string(), Value::String(text));
            }
            Value::Object(map)
        };
        (self.name, value)
    }
}

/// Parse an XML document into its nested-object JSON form. The root object
/// maps the document element's name to its converted value.
pub fn xml_to_value(xml: &str) -> Result<Value, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut root: Map<String, Value> = Map::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let (name, value) = element_from_start(&start)?.finish();
                insert_child(parent_map(&mut stack, &mut root), name, value);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    let (name, value) = element.finish();
                    insert_child(parent_map(&mut stack, &mut root), name, value);
                }
            }
            Event::Eof => break,
            // Declaration, comments, doctype, processing instructions.
            _ => {}
        }
    }

    Ok(Value::Object(root))
}

fn element_from_start(start: &BytesStart) -> Result<Element, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut children = Map::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        insert_child(&mut children, key, Value::String(value));
    }
    Ok(Element {
        name,
        children,
        text: String::new(),
    })
}

fn parent_map<'a>(
    stack: &'a mut [Element],
    root: &'a mut Map<String, Value>,
) -> &'a mut Map<String, Value> {
    match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => root,
    }
}

/// Insert a child value, promoting repeated names to arrays.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_elements_become_strings() {
        let value = xml_to_value(
            r#"<?xml version="1.0"?><match><home>Arsenal</home><away>Chelsea</away></match>"#,
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"match": {"home": "Arsenal", "away": "Chelsea"}})
        );
    }

    #[test]
    fn test_attributes_merged_into_object() {
        let value =
            xml_to_value(r#"<team name="Arsenal" played="10"><points>25</points></team>"#).unwrap();
        assert_eq!(
            value,
            json!({"team": {"name": "Arsenal", "played": "10", "points": "25"}})
        );
    }

    #[test]
    fn test_repeated_children_become_array_single_stays_object() {
        let value = xml_to_value(
            r#"<standings>
                 <team name="A"><points>3</points></team>
                 <team name="B"><points>1</points></team>
                 <season>2026</season>
               </standings>"#,
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"standings": {
                "team": [
                    {"name": "A", "points": "3"},
                    {"name": "B", "points": "1"}
                ],
                "season": "2026"
            }})
        );
    }

    #[test]
    fn test_mixed_text_lands_under_underscore() {
        let value = xml_to_value(r#"<note lang="en">final table</note>"#).unwrap();
        assert_eq!(value, json!({"note": {"lang": "en", "_": "final table"}}));
    }

    #[test]
    fn test_empty_and_self_closing_elements() {
        let value = xml_to_value(r#"<row><rank/><team></team></row>"#).unwrap();
        assert_eq!(value, json!({"row": {"rank": "", "team": ""}}));
    }

    #[test]
    fn test_entities_unescaped() {
        let value = xml_to_value(r#"<team>Br&#252;gge &amp; Co</team>"#).unwrap();
        assert_eq!(value, json!({"team": "Brügge & Co"}));
    }

    #[test]
    fn test_mismatched_end_tag_is_an_error() {
        assert!(xml_to_value(r#"<a></b>"#).is_err());
    }
}
