use serde::{Deserialize, Serialize};

/// Side length of every lobby, in world units.
pub const ZONE_SIZE: i32 = 8;

/// Identifier returned when a point falls outside every configured zone.
pub const NO_ZONE: u8 = 0;

/// World coordinate reported by the host for the local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal world coordinate.
    pub x: i32,
    /// Vertical world coordinate.
    pub y: i32,
}

impl WorldPoint {
    /// Build a point from raw coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Offset of a point from the minimum corner of the lobby it stands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeOffset {
    /// Units east of the lobby's minimum x.
    pub x: i32,
    /// Units north of the lobby's minimum y.
    pub y: i32,
}

impl std::fmt::Display for RelativeOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Origin of a lobby as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneOrigin {
    /// Lobby identifier, 1-based.
    pub id: u8,
    /// Minimum x of the lobby.
    pub x: i32,
    /// Minimum y of the lobby.
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Zone {
    id: u8,
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

impl Zone {
    fn from_origin(origin: ZoneOrigin) -> Self {
        Self {
            id: origin.id,
            min_x: origin.x,
            max_x: origin.x + ZONE_SIZE - 1,
            min_y: origin.y,
            max_y: origin.y + ZONE_SIZE - 1,
        }
    }

    fn contains(&self, point: WorldPoint) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }
}

/// Fixed set of square lobbies scanned in construction order.
#[derive(Debug, Clone)]
pub struct SpatialZoneMap {
    zones: Vec<Zone>,
}

impl SpatialZoneMap {
    /// Build the map from lobby origins; each becomes an 8x8 square.
    pub fn new(origins: impl IntoIterator<Item = ZoneOrigin>) -> Self {
        Self {
            zones: origins.into_iter().map(Zone::from_origin).collect(),
        }
    }

    /// Id of the first zone containing `point`, or [`NO_ZONE`].
    pub fn classify(&self, point: WorldPoint) -> u8 {
        self.zones
            .iter()
            .find(|zone| zone.contains(point))
            .map_or(NO_ZONE, |zone| zone.id)
    }

    /// Offset of `point` from the minimum corner of `zone_id`, if that zone exists.
    pub fn relative_offset(&self, point: WorldPoint, zone_id: u8) -> Option<RelativeOffset> {
        self.zones
            .iter()
            .find(|zone| zone.id == zone_id)
            .map(|zone| RelativeOffset {
                x: point.x - zone.min_x,
                y: point.y - zone.min_y,
            })
    }

    /// Number of configured zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether no zones are configured.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl Default for SpatialZoneMap {
    fn default() -> Self {
        Self::new(default_lobbies())
    }
}

/// The ten lobbies of the minigame waiting area.
pub fn default_lobbies() -> Vec<ZoneOrigin> {
    [
        (1, 2576, 5291),
        (2, 2584, 5291),
        (3, 2595, 5291),
        (4, 2603, 5291),
        (5, 2576, 5281),
        (6, 2584, 5281),
        (7, 2595, 5281),
        (8, 2603, 5281),
        (9, 2576, 5271),
        (10, 2584, 5271),
    ]
    .into_iter()
    .map(|(id, x, y)| ZoneOrigin { id, x, y })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_minimum_and_maximum_corners() {
        let map = SpatialZoneMap::default();
        assert_eq!(map.classify(WorldPoint::new(2576, 5291)), 1);
        assert_eq!(map.classify(WorldPoint::new(2583, 5298)), 1);
        assert_eq!(map.classify(WorldPoint::new(2584, 5291)), 2);
        assert_eq!(map.classify(WorldPoint::new(2591, 5278)), 10);
    }

    #[test]
    fn points_outside_every_zone_map_to_zero() {
        let map = SpatialZoneMap::default();
        assert_eq!(map.classify(WorldPoint::new(2592, 5291)), NO_ZONE);
        assert_eq!(map.classify(WorldPoint::new(2576, 5299)), NO_ZONE);
        assert_eq!(map.classify(WorldPoint::new(2575, 5291)), NO_ZONE);
        assert_eq!(map.classify(WorldPoint::new(0, 0)), NO_ZONE);
    }

    #[test]
    fn first_matching_zone_wins_on_overlap() {
        let map = SpatialZoneMap::new([
            ZoneOrigin { id: 4, x: 0, y: 0 },
            ZoneOrigin { id: 2, x: 4, y: 4 },
        ]);
        assert_eq!(map.classify(WorldPoint::new(5, 5)), 4);
        assert_eq!(map.classify(WorldPoint::new(10, 10)), 2);
    }

    #[test]
    fn relative_offset_is_measured_from_minimum_corner() {
        let map = SpatialZoneMap::default();
        let offset = map.relative_offset(WorldPoint::new(2606, 5295), 4).unwrap();
        assert_eq!(offset, RelativeOffset { x: 3, y: 4 });
        assert_eq!(offset.to_string(), "(3,4)");
    }

    #[test]
    fn relative_offset_for_unknown_zone_is_none() {
        let map = SpatialZoneMap::default();
        assert!(map.relative_offset(WorldPoint::new(2606, 5295), 0).is_none());
        assert!(map.relative_offset(WorldPoint::new(2606, 5295), 11).is_none());
    }

    #[test]
    fn default_layout_has_ten_lobbies_and_empty_layout_matches_nothing() {
        let map = SpatialZoneMap::default();
        assert_eq!(map.len(), 10);
        assert!(!map.is_empty());

        let empty = SpatialZoneMap::new(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.classify(WorldPoint::new(2578, 5293)), NO_ZONE);
    }
}
