//! Translation transform.

use super::trait_::Transform;
use crate::spatial::{Point, Vector};

/// Translation transform: `T(x) = x + offset`.
#[derive(Debug, Clone, Copy)]
pub struct TranslationTransform<const D: usize> {
    offset: Vector<D>,
}

impl<const D: usize> TranslationTransform<D> {
    /// Create a new translation transform with the given offset.
    pub fn new(offset: Vector<D>) -> Self {
        Self { offset }
    }

    /// Get the translation offset.
    pub fn offset(&self) -> &Vector<D> {
        &self.offset
    }
}

impl<const D: usize> Transform<D> for TranslationTransform<D> {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        *point + self.offset
    }

    fn inverse(&self) -> Option<Box<dyn Transform<D>>> {
        Some(Box::new(TranslationTransform::new(-self.offset)))
    }
}
