//! PDF object types.
//!
//! Objects are plain values. Links between indirect objects are always
//! [`ObjectRef`] values resolved through the [`ObjectStore`](crate::store::ObjectStore),
//! never owning pointers.

use std::collections::HashMap;

/// Dictionary payload of a PDF dictionary or stream.
pub type Dictionary = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: Dictionary,
        /// Stream data
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::Reference(r)
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Build a name object.
    pub fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    /// Build a dictionary object from key/value pairs.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Mutable dictionary access. Works for both Dictionary and Stream objects.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Mutable array access.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to real number. Integers are widened.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Collect every indirect reference held by this object, in encounter order.
    ///
    /// `Parent` entries are skipped: they are back-references used for
    /// attribute inheritance and following them would pull a page's whole
    /// ancestry (and every sibling) into a dependency closure.
    pub fn references(&self) -> Vec<ObjectRef> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<ObjectRef>) {
        match self {
            Object::Reference(r) => out.push(*r),
            Object::Array(arr) => {
                for item in arr {
                    item.collect_references(out);
                }
            },
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                // Sorted keys keep the closure order deterministic.
                let mut keys: Vec<_> = dict.keys().filter(|k| k.as_str() != "Parent").collect();
                keys.sort();
                for key in keys {
                    dict[key].collect_references(out);
                }
            },
            _ => {},
        }
    }

    /// Rewrite every reference through `mapping`.
    ///
    /// References missing from the mapping point at objects that no longer
    /// exist; they are replaced with `null`. Returns how many were dropped.
    pub fn rewrite_references(&mut self, mapping: &HashMap<ObjectRef, ObjectRef>) -> usize {
        match self {
            Object::Reference(r) => match mapping.get(r) {
                Some(new_ref) => {
                    *r = *new_ref;
                    0
                },
                None => {
                    log::warn!("Dangling reference {} replaced with null", r);
                    *self = Object::Null;
                    1
                },
            },
            Object::Array(arr) => arr
                .iter_mut()
                .map(|item| item.rewrite_references(mapping))
                .sum(),
            Object::Dictionary(dict) | Object::Stream { dict, .. } => dict
                .values_mut()
                .map(|value| value.rewrite_references(mapping))
                .sum(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_integer() {
        let obj = Object::Integer(42);
        assert_eq!(obj.as_integer(), Some(42));
        assert!(obj.as_name().is_none());
        assert!(!obj.is_null());
    }

    #[test]
    fn test_object_name() {
        let obj = Object::name("Type");
        assert_eq!(obj.as_name(), Some("Type"));
        assert!(obj.as_integer().is_none());
    }

    #[test]
    fn test_object_real_widens_integers() {
        assert_eq!(Object::Real(0.5).as_real(), Some(0.5));
        assert_eq!(Object::Integer(612).as_real(), Some(612.0));
        assert!(Object::Null.as_real().is_none());
    }

    #[test]
    fn test_object_stream_dict_access() {
        let mut dict = HashMap::new();
        dict.insert("Length".to_string(), Object::Integer(100));
        let mut obj = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"stream data"),
        };

        assert_eq!(obj.as_dict().unwrap().get("Length").unwrap().as_integer(), Some(100));
        obj.as_dict_mut()
            .unwrap()
            .insert("Filter".to_string(), Object::name("FlateDecode"));
        assert!(obj.as_dict().unwrap().contains_key("Filter"));
    }

    #[test]
    fn test_object_ref_display() {
        let obj_ref = ObjectRef::new(10, 0);
        assert_eq!(format!("{}", obj_ref), "10 0 R");
        assert_eq!(Object::from(obj_ref).as_reference(), Some(obj_ref));
    }

    #[test]
    fn test_references_skip_parent() {
        let obj = Object::dict(vec![
            ("Parent", ObjectRef::new(1, 0).into()),
            ("Contents", ObjectRef::new(5, 0).into()),
            (
                "Resources",
                Object::dict(vec![(
                    "Font",
                    Object::Array(vec![ObjectRef::new(7, 0).into(), Object::Integer(3)]),
                )]),
            ),
        ]);

        assert_eq!(obj.references(), vec![ObjectRef::new(5, 0), ObjectRef::new(7, 0)]);
    }

    #[test]
    fn test_rewrite_references() {
        let mut mapping = HashMap::new();
        mapping.insert(ObjectRef::new(4, 0), ObjectRef::new(1, 0));

        let mut obj = Object::dict(vec![
            ("Kids", Object::Array(vec![ObjectRef::new(4, 0).into(), ObjectRef::new(9, 2).into()])),
            ("Parent", ObjectRef::new(4, 0).into()),
        ]);

        let dropped = obj.rewrite_references(&mapping);
        assert_eq!(dropped, 1);

        let dict = obj.as_dict().unwrap();
        assert_eq!(dict["Parent"].as_reference(), Some(ObjectRef::new(1, 0)));
        let kids = dict["Kids"].as_array().unwrap();
        assert_eq!(kids[0].as_reference(), Some(ObjectRef::new(1, 0)));
        assert!(kids[1].is_null());
    }

    #[test]
    fn test_object_ref_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ObjectRef::new(1, 0));
        set.insert(ObjectRef::new(2, 0));
        set.insert(ObjectRef::new(1, 0)); // Duplicate

        assert_eq!(set.len(), 2);
    }
}
