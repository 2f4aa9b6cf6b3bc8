use assert_json_diff::assert_json_eq;
use gpp_codec::fields::FieldValue;
use gpp_codec::sections::Section;
use gpp_codec::v1::ConsentString;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Deserialize)]
pub struct ExpectedSection {
    section: String,
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct Fixture {
    gpp_string: String,
    expected_sections: Vec<ExpectedSection>,
    /// The string produced when encoding the decoded sections again, if not `gpp_string`.
    #[serde(default)]
    encoded: Option<String>,
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Integer(n) => json!(n),
        FieldValue::IntegerList(v) => json!(v),
        FieldValue::Boolean(b) => json!(b),
        FieldValue::IdSet(ids) => json!(ids),
    }
}

fn section_to_json(section: &Section) -> Value {
    let fields = section
        .fields()
        .iter()
        .map(|(name, value)| (name.to_string(), field_to_json(value)))
        .collect::<Map<_, _>>();
    json!({ "section": section.id().name(), "fields": fields })
}

impl Fixture {
    pub fn load<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        let f = File::open(p)?;
        let fixture: Self = serde_json::from_reader(&f)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(fixture)
    }

    /// Decodes the string, compares every section field by field, then checks the encoding of the
    /// decoded sections.
    pub fn check(&self) {
        let consent = match ConsentString::parse(&self.gpp_string) {
            Ok(parsed) => parsed.consent,
            Err(e) => panic!("decode error: {e}"),
        };

        let actual = consent.sections().map(section_to_json).collect::<Vec<_>>();
        let expected = self
            .expected_sections
            .iter()
            .map(|s| json!({ "section": s.section, "fields": s.fields }))
            .collect::<Vec<_>>();
        assert_json_eq!(actual, expected);

        let encoded = self.encoded.as_deref().unwrap_or(&self.gpp_string);
        assert_eq!(consent.encode(), encoded);
    }
}
