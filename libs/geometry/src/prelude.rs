//! An import prelude that re-exports commonly used items.

pub use crate::arc::{arc_points, circle_polygon};
pub use crate::bbox::Bbox;
pub use crate::path::Path;
pub use crate::point::{Point, Vector};
pub use crate::polygon::Polygon;
pub use crate::rect::Rect;
pub use crate::region::Region;
pub use crate::transform::{Transform, Transformation};
