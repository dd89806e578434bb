//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to
//! ISO 32000-1:2008.

use crate::object::{Dictionary, Object, ObjectRef};
use std::io::{self, Write};

/// Serializer for PDF objects.
///
/// Converts PDF Object types to their byte representation following
/// the ISO 32000-1 syntax rules. Dictionary keys are written in sorted
/// order and no whitespace is written beyond what separates tokens, so
/// output is deterministic and compact.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// Create an object serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj)?;
        Ok(buf)
    }

    /// Serialize an object to a string (for debugging).
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        let mut buf = Vec::new();
        match self.write_object(&mut buf, obj) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(e) => format!("<unserializable: {}>", e),
        }
    }

    /// Write an indirect object definition.
    ///
    /// Format: `{id} {gen} obj\n{object}\nendobj\n`
    pub fn write_indirect<W: Write + ?Sized>(
        &self,
        w: &mut W,
        reference: ObjectRef,
        obj: &Object,
    ) -> io::Result<()> {
        writeln!(w, "{} {} obj", reference.id, reference.gen)?;
        self.write_object(w, obj)?;
        write!(w, "\nendobj\n")
    }

    /// Serialize an indirect object definition.
    pub fn serialize_indirect(&self, reference: ObjectRef, obj: &Object) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_indirect(&mut buf, reference, obj)?;
        Ok(buf)
    }

    /// Write an object.
    pub fn write_object<W: Write + ?Sized>(&self, w: &mut W, obj: &Object) -> io::Result<()> {
        match obj {
            Object::Null => write!(w, "null"),
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => self.write_real(w, *r),
            Object::String(s) => self.write_string(w, s),
            Object::Name(n) => self.write_name(w, n),
            Object::Array(arr) => self.write_array(w, arr),
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Stream { dict, data } => self.write_stream(w, dict, data),
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen),
        }
    }

    /// Write a real number with appropriate precision.
    fn write_real<W: Write + ?Sized>(&self, w: &mut W, value: f64) -> io::Result<()> {
        if value.fract() == 0.0 {
            write!(w, "{}", value as i64)
        } else {
            let formatted = format!("{:.5}", value);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            write!(w, "{}", trimmed)
        }
    }

    /// Write a PDF string.
    ///
    /// Uses literal string syntax `(...)` with proper escaping,
    /// or hex string syntax `<...>` for binary data such as digests.
    fn write_string<W: Write + ?Sized>(&self, w: &mut W, data: &[u8]) -> io::Result<()> {
        let is_printable = data
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

        if is_printable {
            write!(w, "(")?;
            for &byte in data {
                match byte {
                    b'(' => write!(w, "\\(")?,
                    b')' => write!(w, "\\)")?,
                    b'\\' => write!(w, "\\\\")?,
                    b'\n' => write!(w, "\\n")?,
                    b'\r' => write!(w, "\\r")?,
                    b'\t' => write!(w, "\\t")?,
                    _ => w.write_all(&[byte])?,
                }
            }
            write!(w, ")")
        } else {
            write!(w, "<")?;
            for byte in data {
                write!(w, "{:02X}", byte)?;
            }
            write!(w, ">")
        }
    }

    /// Write a PDF name, escaping delimiters and non-regular bytes as `#xx`.
    fn write_name<W: Write + ?Sized>(&self, w: &mut W, name: &str) -> io::Result<()> {
        write!(w, "/")?;
        for byte in name.bytes() {
            match byte {
                b'!'
                | b'"'
                | b'$'
                | b'&'
                | b'\''
                | b'*'..=b'.'
                | b'0'..=b':'
                | b';'
                | b'='
                | b'?'
                | b'@'
                | b'A'..=b'Z'
                | b'\\'
                | b'^'..=b'z'
                | b'|'
                | b'~' => w.write_all(&[byte])?,
                _ => write!(w, "#{:02X}", byte)?,
            }
        }
        Ok(())
    }

    fn write_array<W: Write + ?Sized>(&self, w: &mut W, arr: &[Object]) -> io::Result<()> {
        write!(w, "[")?;
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            self.write_object(w, obj)?;
        }
        write!(w, "]")
    }

    fn write_dictionary<W: Write + ?Sized>(&self, w: &mut W, dict: &Dictionary) -> io::Result<()> {
        write!(w, "<<")?;

        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();

        for key in keys {
            self.write_name(w, key)?;
            write!(w, " ")?;
            self.write_object(w, &dict[key])?;
        }
        write!(w, ">>")
    }

    /// Write a PDF stream. `Length` always reflects the payload being written.
    fn write_stream<W: Write + ?Sized>(
        &self,
        w: &mut W,
        dict: &Dictionary,
        data: &[u8],
    ) -> io::Result<()> {
        let mut dict_with_length = dict.clone();
        dict_with_length.insert("Length".to_string(), Object::Integer(data.len() as i64));

        self.write_dictionary(w, &dict_with_length)?;
        write!(w, "\nstream\n")?;
        w.write_all(data)?;
        write!(w, "\nendstream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_scalars() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::Null), "null");
        assert_eq!(s.serialize_to_string(&Object::Boolean(false)), "false");
        assert_eq!(s.serialize_to_string(&Object::Integer(-123)), "-123");
    }

    #[test]
    fn test_serialize_real() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::Real(3.14258)), "3.14258");
        assert_eq!(s.serialize_to_string(&Object::Real(1.0)), "1");
        assert_eq!(s.serialize_to_string(&Object::Real(0.5)), "0.5");
    }

    #[test]
    fn test_serialize_string() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::String(b"Hello".to_vec())), "(Hello)");
        assert_eq!(
            s.serialize_to_string(&Object::String(b"Test (parens)".to_vec())),
            "(Test \\(parens\\))"
        );
    }

    #[test]
    fn test_serialize_binary_string_as_hex() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::String(vec![0x00, 0xFF, 0x80])), "<00FF80>");
    }

    #[test]
    fn test_serialize_name_with_special_chars() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::name("Type")), "/Type");
        assert_eq!(s.serialize_to_string(&Object::name("A B")), "/A#20B");
        assert_eq!(s.serialize_to_string(&Object::name("a/b(c)")), "/a#2Fb#28c#29");
    }

    #[test]
    fn test_serialize_dictionary_sorted() {
        let s = ObjectSerializer::new();
        let dict = Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Count", Object::Integer(1)),
        ]);
        assert_eq!(s.serialize_to_string(&dict), "<</Count 1/Type /Page>>");
    }

    #[test]
    fn test_default_output_has_no_layout_whitespace() {
        let nested = Object::dict(vec![
            ("Resources", Object::dict(vec![("ProcSet", Object::Array(vec![Object::name("PDF")]))])),
            ("Type", Object::name("Page")),
        ]);
        let text = ObjectSerializer::default().serialize_to_string(&nested);
        assert_eq!(text, "<</Resources <</ProcSet [/PDF]>>/Type /Page>>");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_serialize_indirect() {
        let s = ObjectSerializer::new();
        let bytes = s.serialize_indirect(ObjectRef::new(1, 0), &Object::Integer(42)).unwrap();
        assert_eq!(bytes, b"1 0 obj\n42\nendobj\n");
    }

    #[test]
    fn test_serialize_stream_overrides_stale_length() {
        let s = ObjectSerializer::new();
        let mut dict = Dictionary::new();
        dict.insert("Length".to_string(), Object::Integer(999));

        let stream = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"stream data"),
        };

        let result = s.serialize_to_string(&stream);
        assert_eq!(result, "<</Length 11>>\nstream\nstream data\nendstream");
    }
}
