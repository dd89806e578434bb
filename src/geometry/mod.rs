//! Page geometry.
//!
//! Rectangles are stored as origin plus size, and written to PDF as the
//! `[llx lly urx ury]` arrays used by `MediaBox` and friends.

use crate::object::Object;

/// A rectangle in default user space (1/72 inch units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of lower-left corner
    pub x: f64,
    /// Y coordinate of lower-left corner
    pub y: f64,
    /// Width of rectangle
    pub width: f64,
    /// Height of rectangle
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_assembly::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 612.0, 792.0);
    /// assert_eq!(rect.width, 612.0);
    /// assert_eq!(rect.height, 792.0);
    /// ```
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points, in any order.
    pub fn from_points(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// ISO A4 (210mm x 297mm).
    pub fn a4() -> Self {
        Self::new(0.0, 0.0, 595.0, 842.0)
    }

    /// US Letter (8.5" x 11").
    pub fn letter() -> Self {
        Self::new(0.0, 0.0, 612.0, 792.0)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// PDF rectangle array `[llx lly urx ury]`.
    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.x),
            Object::Real(self.y),
            Object::Real(self.right()),
            Object::Real(self.top()),
        ])
    }

    /// Parse a PDF rectangle array. Integers and reals are both accepted.
    pub fn from_object(obj: &Object) -> Option<Self> {
        let arr = obj.as_array()?;
        if arr.len() != 4 {
            return None;
        }
        let mut coords = [0.0; 4];
        for (slot, value) in coords.iter_mut().zip(arr) {
            *slot = value.as_real()?;
        }
        Some(Self::from_points(coords[0], coords[1], coords[2], coords[3]))
    }
}
