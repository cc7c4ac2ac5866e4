//! Shape flags: a bitmask classifying a node and its children.

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Node category and children category, packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShapeFlags(pub u16);

impl ShapeFlags {
    pub const NONE: ShapeFlags = ShapeFlags(0);
    pub const ELEMENT: ShapeFlags = ShapeFlags(1);
    pub const FUNCTIONAL_COMPONENT: ShapeFlags = ShapeFlags(1 << 1);
    pub const STATEFUL_COMPONENT: ShapeFlags = ShapeFlags(1 << 2);
    pub const TEXT_CHILDREN: ShapeFlags = ShapeFlags(1 << 3);
    pub const ARRAY_CHILDREN: ShapeFlags = ShapeFlags(1 << 4);
    pub const SLOTS_CHILDREN: ShapeFlags = ShapeFlags(1 << 5);
    pub const COMPONENT: ShapeFlags =
        ShapeFlags(Self::STATEFUL_COMPONENT.0 | Self::FUNCTIONAL_COMPONENT.0);

    /// Whether any bit of `other` is set in `self`.
    pub fn intersects(self, other: ShapeFlags) -> bool {
        (self.0 & other.0) != 0
    }

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: ShapeFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_element(self) -> bool {
        self.intersects(Self::ELEMENT)
    }

    pub fn is_component(self) -> bool {
        self.intersects(Self::COMPONENT)
    }

    pub fn has_text_children(self) -> bool {
        self.intersects(Self::TEXT_CHILDREN)
    }

    pub fn has_array_children(self) -> bool {
        self.intersects(Self::ARRAY_CHILDREN)
    }
}

impl BitOr for ShapeFlags {
    type Output = ShapeFlags;
    fn bitor(self, rhs: Self) -> Self::Output {
        ShapeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShapeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ShapeFlags {
    type Output = ShapeFlags;
    fn bitand(self, rhs: Self) -> Self::Output {
        ShapeFlags(self.0 & rhs.0)
    }
}
