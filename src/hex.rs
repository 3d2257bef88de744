use serde::{Deserialize, Serialize};

/// Axial hex coordinate. The implicit third cube axis is `s = -q - r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0 };

    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    pub fn distance(&self, other: &HexCoord) -> u32 {
        hex_distance(*self, *other)
    }

    pub fn key(&self) -> String {
        format!("{},{}", self.q, self.r)
    }
}

/// Ring walk order. Changing it reshuffles every region id.
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

pub fn hex_distance(a: HexCoord, b: HexCoord) -> u32 {
    let dq = (a.q - b.q).unsigned_abs();
    let dr = (a.r - b.r).unsigned_abs();
    let ds = (a.s() - b.s()).unsigned_abs();
    (dq + dr + ds) / 2
}

/// `count` coordinates spiralling out from the origin, ring by ring.
///
/// Each ring starts at its `(-radius, radius)` corner and walks the six
/// directions `radius` steps each, stopping as soon as `count` is reached.
pub fn hex_spiral(count: usize) -> Vec<HexCoord> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return out;
    }
    out.push(HexCoord::ORIGIN);

    let mut radius = 1;
    while out.len() < count {
        let (mut q, mut r) = (-radius, radius);
        'ring: for (dq, dr) in DIRECTIONS {
            for _ in 0..radius {
                if out.len() >= count {
                    break 'ring;
                }
                out.push(HexCoord::new(q, r));
                q += dq;
                r += dr;
            }
        }
        radius += 1;
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct HexCellView {
    pub index: usize,
    pub key: String,
    pub q: i32,
    pub r: i32,
    pub s: i32,
    pub ring: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexSpiralView {
    pub cell_count: usize,
    pub cells: Vec<HexCellView>,
}

impl From<&[HexCoord]> for HexSpiralView {
    fn from(coords: &[HexCoord]) -> Self {
        let cells = coords
            .iter()
            .enumerate()
            .map(|(index, coord)| HexCellView {
                index,
                key: coord.key(),
                q: coord.q,
                r: coord.r,
                s: coord.s(),
                ring: coord.distance(&HexCoord::ORIGIN),
            })
            .collect();
        Self {
            cell_count: coords.len(),
            cells,
        }
    }
}

pub fn spiral_json(count: usize) -> String {
    let coords = hex_spiral(count);
    let view = HexSpiralView::from(coords.as_slice());
    serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
}
