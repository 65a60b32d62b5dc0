use crate::{Error, Format, LevelImage, TileGrid, Unit};
use std::path::Path;

#[derive(Clone)]
struct Snapshot {
    tiles: TileGrid,
    units: Vec<Unit>,
}

/// An editable level with undo and redo.
///
/// Every edit that changes something saves a full copy of the map
/// and unit table, which is cheap at 8 KiB per level.
#[derive(Clone)]
pub struct MapModel {
    image: LevelImage,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Default for MapModel {
    fn default() -> Self {
        Self::new(Format::Pet)
    }
}

impl MapModel {
    /// A blank level in the given layout.
    #[must_use]
    pub fn new(format: Format) -> Self {
        Self::from_image(LevelImage::blank(format))
    }

    /// Edit an already decoded level.
    #[must_use]
    pub fn from_image(image: LevelImage) -> Self {
        MapModel {
            image,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Load a level file for editing.
    ///
    /// # Errors
    /// Errors if the file can't be read or decoded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        LevelImage::load(path).map(Self::from_image)
    }

    /// Save the level to a file.
    ///
    /// # Errors
    /// The file failed to be written.
    pub fn save(&self, path: impl AsRef<Path>, target: Format) -> Result<(), Error> {
        self.image.save(path, target)
    }

    /// Returns the level being edited.
    #[inline]
    #[must_use]
    pub fn image(&self) -> &LevelImage {
        &self.image
    }

    /// Stop editing and return the level.
    #[must_use]
    pub fn into_image(self) -> LevelImage {
        self.image
    }

    /// Get the tile at a position.
    /// Returns None if the cell is empty or out of bounds.
    #[must_use]
    pub fn get_tile(&self, x: usize, y: usize) -> Option<u8> {
        self.image.tiles.get((x, y)).copied().flatten()
    }

    /// Set the tile at a position, returning whether anything changed.
    ///
    /// Out of bounds positions are ignored.
    pub fn set_tile(&mut self, x: usize, y: usize, tile: Option<u8>) -> bool {
        match self.image.tiles.get((x, y)) {
            Some(&current) if current != tile => {
                self.push_undo();
                self.image.tiles[(x, y)] = tile;
                true
            }
            _ => false,
        }
    }

    /// Get the unit in a slot.
    #[must_use]
    pub fn get_unit(&self, slot: usize) -> Option<&Unit> {
        self.image.units.get(slot)
    }

    /// Replace the unit in a slot.
    ///
    /// # Errors
    /// Errors if the level has no such slot.
    pub fn set_unit(&mut self, slot: usize, unit: Unit) -> Result<(), Error> {
        let current = *self.get_unit(slot).ok_or(Error::SlotOutOfRange(slot))?;
        if current != unit {
            self.push_undo();
            self.image.units[slot] = unit;
        }
        Ok(())
    }

    /// Clear the unit in a slot. The player in slot 0 can't be removed.
    ///
    /// # Errors
    /// Errors if the slot is the player's, or the level has no such slot.
    pub fn delete_unit(&mut self, slot: usize) -> Result<(), Error> {
        if slot == 0 {
            return Err(Error::ReservedSlot(slot));
        }
        self.set_unit(slot, Unit::default())
    }

    /// Revert the last edit. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.redo_stack.push(current);
        true
    }

    /// Reapply the last undone edit. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.undo_stack.push(current);
        true
    }

    /// Whether [`MapModel::undo`] would do anything.
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether [`MapModel::redo`] would do anything.
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tiles: self.image.tiles.clone(),
            units: self.image.units.clone(),
        }
    }

    fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
    }

    fn restore(&mut self, snapshot: Snapshot) -> Snapshot {
        let current = self.snapshot();
        self.image.tiles = snapshot.tiles;
        self.image.units = snapshot.units;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAP_HEIGHT, MAP_WIDTH};

    #[test]
    fn tiles_with_history() {
        let mut model = MapModel::new(Format::Msd);
        assert_eq!(model.get_tile(3, 4), None);
        assert!(model.set_tile(3, 4, Some(17)));
        assert!(!model.set_tile(3, 4, Some(17)), "same tile is not a change");
        assert!(!model.set_tile(MAP_WIDTH, 0, Some(1)));
        assert!(!model.set_tile(0, MAP_HEIGHT, Some(1)));
        assert!(!model.set_tile(0, 1 << 57, Some(9)), "must not wrap around");
        assert!(!model.set_tile(usize::MAX, usize::MAX, Some(9)));
        assert_eq!(model.get_tile(0, 1 << 57), None);
        assert!(model.set_tile(3, 4, None));
        assert_eq!(model.get_tile(3, 4), None);

        assert!(model.undo());
        assert_eq!(model.get_tile(3, 4), Some(17));
        assert!(model.undo());
        assert_eq!(model.get_tile(3, 4), None);
        assert!(!model.undo());
        assert!(model.redo());
        assert_eq!(model.get_tile(3, 4), Some(17));

        // A new edit drops what could be redone.
        assert!(model.set_tile(0, 0, Some(1)));
        assert!(!model.can_redo());
    }

    #[test]
    fn units() {
        let mut model = MapModel::new(Format::Pet);
        let robot = Unit {
            kind: 9,
            x: 10,
            y: 20,
            health: 5,
            ..Unit::default()
        };
        model.set_unit(5, robot).expect("slot 5 exists");
        assert_eq!(model.get_unit(5), Some(&robot));
        assert!(matches!(model.set_unit(66, robot), Err(Error::SlotOutOfRange(66))));
        assert!(matches!(model.delete_unit(0), Err(Error::ReservedSlot(0))));
        model.delete_unit(5).expect("slot 5 exists");
        assert_eq!(model.get_unit(5), Some(&Unit::default()));
        assert!(model.undo());
        assert_eq!(model.get_unit(5), Some(&robot));
        assert_eq!(model.get_unit(0).map(|unit| unit.kind), Some(crate::PLAYER));
    }
}
