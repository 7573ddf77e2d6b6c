use super::vec2::Vec2;

// Type aliases for data values.
pub type Segment2 = [Vec2; 2];
pub type Triangle2 = [Vec2; 3];

// Type aliases for data structure indices.
// This is to know, when a function accepts or returns a usize, what it is for.
pub type VertexIdx = usize;
pub type EdgeIdx = usize;
pub type TriIdx = usize;
/// Index of a segment in the input slice of a sweep.
pub type SegmentIdx = usize;
