use bytemuck::{Pod, Zeroable};
use std::ops::Range;

/// One slot of the unit table.
///
/// The fields are laid out in column order, so a unit can be cast
/// to and from the 8 bytes it occupies across the attribute columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Unit {
    /// Unit type, see [`type_name`].
    pub kind: u8,
    /// Horizontal tile position.
    pub x: u8,
    /// Vertical tile position.
    pub y: u8,
    /// Attribute A.
    pub a: u8,
    /// Attribute B.
    pub b: u8,
    /// Attribute C.
    pub c: u8,
    /// Attribute D.
    pub d: u8,
    /// Health, or attribute H for units that don't have any.
    pub health: u8,
}

impl Unit {
    /// Constructs a new instance from the default.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a unit from its column bytes, in column order.
    #[inline]
    #[must_use]
    pub fn from_columns(bytes: [u8; 8]) -> Self {
        bytemuck::cast(bytes)
    }

    /// Returns the column bytes of this unit, in column order.
    #[inline]
    #[must_use]
    pub fn to_columns(self) -> [u8; 8] {
        bytemuck::cast(self)
    }

    /// Whether this slot is unused.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind == 0
    }
}

/// A range of unit slots sharing a role.
///
/// Roles are purely positional, nothing in a unit records them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitGroup {
    /// The player, slot 0.
    Player,
    /// Robots, slots 1 to 27.
    Robots,
    /// Slots 28 to 31, used by the game itself.
    Reserved,
    /// Doors, transporters, lifts and the like, slots 32 to 47.
    DoorsAndTransport,
    /// Hidden items, slots 48 to 63.
    HiddenObjects,
}

impl UnitGroup {
    /// All groups, in slot order.
    pub const ALL: [UnitGroup; 5] = [
        UnitGroup::Player,
        UnitGroup::Robots,
        UnitGroup::Reserved,
        UnitGroup::DoorsAndTransport,
        UnitGroup::HiddenObjects,
    ];

    /// The slots belonging to this group.
    #[must_use]
    pub fn slots(self) -> Range<usize> {
        match self {
            UnitGroup::Player => 0..1,
            UnitGroup::Robots => 1..28,
            UnitGroup::Reserved => 28..32,
            UnitGroup::DoorsAndTransport => 32..48,
            UnitGroup::HiddenObjects => 48..64,
        }
    }

    /// Number of slots in this group.
    #[inline]
    #[must_use]
    pub fn slot_count(self) -> usize {
        self.slots().len()
    }

    /// Returns the group a slot belongs to, if any.
    #[must_use]
    pub fn of_slot(slot: usize) -> Option<UnitGroup> {
        UnitGroup::ALL
            .into_iter()
            .find(|group| group.slots().contains(&slot))
    }
}

/// Unit type of the player.
pub const PLAYER: u8 = 1;
/// Unit type of doors.
pub const DOOR: u8 = 10;
/// Unit type of keys.
pub const KEY: u8 = 128;

/// Returns the display name of a unit type, if it is a known one.
#[must_use]
pub fn type_name(kind: u8) -> Option<&'static str> {
    Some(match kind {
        0 => "Unknown",
        1 => "Player",
        2 => "HBot l/r",
        3 => "HBot u/d",
        4 => "HBot chase attack mode",
        7 => "Transporter pad",
        9 => "Evilbot",
        10 => "Door",
        16 => "Trash comp",
        17 => "RBot u/d",
        18 => "RBot l/r",
        19 => "Lift",
        22 => "Water raft",
        128 => "Key",
        129 => "Time bomb",
        130 => "EMP",
        131 => "Pistol",
        132 => "Plasma gun",
        133 => "Medkit",
        134 => "Magnet",
        _ => return None,
    })
}

/// Labels of attributes A, B, C, D and H for a unit type.
///
/// Every label starts with the letter of its attribute.
#[must_use]
pub fn attribute_labels(kind: u8) -> [&'static str; 5] {
    const ROBOT: [&str; 5] = ["A", "B", "C", "D", "Health"];
    const ITEM: [&str; 5] = [
        "A: Quantity (between 1 and 255)",
        "B",
        "C: Extend search area horizontal (between 0 and 127)",
        "D: Extend search area vertical (between 0 and 63)",
        "H",
    ];
    match kind {
        1..=4 | 9 | 17 | 18 => ROBOT,
        7 => [
            "A: Activation (0=always active 1=only active when all robots are dead)",
            "B: Destination (0=completes level 1=send to coordinates)",
            "C: X-coordinate",
            "D: Y-coordinate",
            "H",
        ],
        DOOR => [
            "A: Orientation (0=horizontal 1=vertical)",
            "B: Current State (0=opening-A 1=opening-B 2=OPEN / 3=closing-A 4=closing-B 5-CLOSED)",
            "C: Locking (0=unlocked / 1=locked spade 2=locked heart 3=locked star)",
            "D",
            "H",
        ],
        19 => [
            "A",
            "B: Current State (0=opening-A 1=opening-B 2=OPEN / 3=closing-A 4=closing-B 5-CLOSED)",
            "C: Which floor corresponds to this unit?",
            "D: Max number of levels (number should be between 2 and 5)",
            "H",
        ],
        22 => [
            "A: Current direction (0=left 1=right)",
            "B: Left-most coordinate",
            "C: Right-most coordinate",
            "D",
            "H",
        ],
        KEY => [
            "A: 0=SPADE 1=HEART 2=STAR",
            "B",
            "C: Extend search area horizontal (between 0 and 127)",
            "D: Extend search area vertical (between 0 and 63)",
            "H",
        ],
        129..=134 => ITEM,
        _ => ["A", "B", "C", "D", "H"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_cover_the_table() {
        let mut next = 0;
        for group in UnitGroup::ALL {
            assert_eq!(group.slots().start, next);
            next = group.slots().end;
        }
        assert_eq!(next, 64);
        assert_eq!(UnitGroup::Robots.slot_count(), 27);
        assert_eq!(UnitGroup::of_slot(31), Some(UnitGroup::Reserved));
        assert_eq!(UnitGroup::of_slot(64), None);
    }

    #[test]
    fn column_order_cast() {
        let unit = Unit::from_columns([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(unit.kind, 1);
        assert_eq!(unit.health, 8);
        assert_eq!(unit.to_columns(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn labels_start_with_their_letter() {
        for kind in 0..=u8::MAX {
            for (label, letter) in attribute_labels(kind).iter().zip("ABCDH".chars()) {
                assert!(label.starts_with(letter), "{kind}: {label}");
            }
        }
    }
}
