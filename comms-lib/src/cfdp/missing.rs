use heapless::Vec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::FileDataPdu;
use crate::bits::{BitReader, BitWriter};
use crate::payload::Payload;

/// Byte range `[start_offset, end_offset)` of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentRequest {
    pub start_offset: u32,
    pub end_offset: u32,
}

impl SegmentRequest {
    pub const LEN: usize = 8;

    #[must_use]
    pub const fn new(start_offset: u32, end_offset: u32) -> Self {
        Self {
            start_offset,
            end_offset,
        }
    }

    /// Construct from the provided bytes, or `None` if there are not enough bytes.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Self> {
        if dat.len() < Self::LEN {
            return None;
        }
        let mut r = BitReader::new(dat);
        Some(Self::new(r.get_u32(), r.get_u32()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_offset >= self.end_offset
    }
}

impl Payload for SegmentRequest {
    fn size(&self) -> usize {
        Self::LEN
    }

    fn write_to(&self, dst: &mut [u8]) {
        BitWriter::new(dst)
            .put_u32(self.start_offset)
            .put_u32(self.end_offset);
    }
}

/// The parts of a file that have not been received yet.
///
/// This is a set of disjoint segments, not a sequence: updates reorder it.
/// It holds at most `N` segments. When it is full, a received range that
/// would split a segment in two is not recorded, so the set may then claim
/// bytes are missing that have already arrived, but never the other way round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MissingSegments<const N: usize> {
    segments: Vec<SegmentRequest, N>,
}

impl<const N: usize> MissingSegments<N> {
    /// Nothing missing.
    #[must_use]
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    /// All of a file of `file_size` bytes missing.
    #[must_use]
    pub fn for_file(file_size: u32) -> Self {
        let mut missing = Self::new();
        if file_size > 0 {
            // Cannot fail unless N is 0, in which case nothing can be tracked
            let _ = missing.segments.push(SegmentRequest::new(0, file_size));
        }
        missing
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SegmentRequest] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.segments.is_full()
    }

    /// Total number of missing bytes.
    #[must_use]
    pub fn missing_bytes(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| u64::from(s.end_offset.saturating_sub(s.start_offset)))
            .sum()
    }
}

/// Remove the range carried by `pdu` from `missing`.
///
/// The first segment the range lies strictly inside of is split in two (unless
/// `missing` is full), or the first segment sharing its start or end with the
/// range is shrunk by the range's length and dropped once empty. At most one
/// segment is changed, so a range spanning several segments must be split by
/// the caller. A range overlapping no segment leaves `missing` unchanged.
pub fn update_missing_file_data<const N: usize>(
    missing: &mut MissingSegments<N>,
    pdu: &FileDataPdu<'_>,
) {
    let start = u64::from(pdu.offset);
    let end = start + pdu.file_data.len() as u64;
    let segments = &mut missing.segments;
    let is_full = segments.is_full();

    for i in 0..segments.len() {
        let segment = segments[i];
        let segment_start = u64::from(segment.start_offset);
        let segment_end = u64::from(segment.end_offset);

        if segment_start < start && end < segment_end {
            if !is_full {
                segments[i].end_offset = pdu.offset;
                // end < segment_end so it fits into u32, and there is room
                let _ = segments.push(SegmentRequest::new(end as u32, segment.end_offset));
                trace!(start, end, "split missing segment");
            }
            return;
        }
        if segment_start == start || segment_end == end {
            let (new_start, new_end) = if segment_start == start {
                (end, segment_end)
            } else {
                (segment_start, start)
            };
            if new_start >= new_end {
                segments.swap_remove(i);
            } else {
                // Both bounds lie within the old segment
                segments[i] = SegmentRequest::new(new_start as u32, new_end as u32);
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn received<const N: usize>(missing: &mut MissingSegments<N>, offset: u32, len: usize) {
        let data = vec![0u8; len];
        update_missing_file_data(missing, &FileDataPdu::new(offset, &data));
    }

    fn segments<const N: usize>(missing: &MissingSegments<N>) -> HashSet<(u32, u32)> {
        missing
            .as_slice()
            .iter()
            .map(|s| (s.start_offset, s.end_offset))
            .collect()
    }

    #[test]
    fn receiving_whole_file_in_order() {
        let mut missing = MissingSegments::<4>::for_file(30);
        for offset in (0..30).step_by(10) {
            received(&mut missing, offset, 10);
        }
        assert!(missing.is_empty());
    }

    #[test]
    fn empty_file_has_nothing_missing() {
        assert!(MissingSegments::<4>::for_file(0).is_empty());
    }

    #[test]
    fn out_of_order_reception() {
        let mut missing = MissingSegments::<4>::for_file(100);

        received(&mut missing, 200, 10);
        assert_eq!(segments(&missing), HashSet::from([(0, 100)]));

        received(&mut missing, 0, 10);
        assert_eq!(segments(&missing), HashSet::from([(10, 100)]));

        received(&mut missing, 90, 10);
        assert_eq!(segments(&missing), HashSet::from([(10, 90)]));

        received(&mut missing, 40, 30);
        assert_eq!(segments(&missing), HashSet::from([(10, 40), (70, 90)]));

        // Already received
        received(&mut missing, 50, 10);
        assert_eq!(segments(&missing), HashSet::from([(10, 40), (70, 90)]));

        received(&mut missing, 10, 30);
        assert_eq!(segments(&missing), HashSet::from([(70, 90)]));

        received(&mut missing, 72, 2);
        received(&mut missing, 76, 2);
        received(&mut missing, 80, 2);
        assert_eq!(
            segments(&missing),
            HashSet::from([(70, 72), (74, 76), (78, 80), (82, 90)])
        );
        assert!(missing.is_full());

        // A split does not fit anymore
        received(&mut missing, 84, 2);
        assert_eq!(missing.len(), 4);
        assert!(segments(&missing).contains(&(82, 90)));

        // Starts at a segment but spans several, only the first is updated
        received(&mut missing, 70, 20);
        assert_eq!(segments(&missing), HashSet::from([(74, 76), (78, 80), (82, 90)]));

        received(&mut missing, 74, 2);
        received(&mut missing, 78, 2);
        received(&mut missing, 82, 8);
        assert!(missing.is_empty());
    }

    #[test]
    fn removal_reorders_segments() {
        let mut missing = MissingSegments::<4>::for_file(100);
        received(&mut missing, 20, 10);
        received(&mut missing, 60, 10);
        assert_eq!(
            missing.as_slice(),
            [
                SegmentRequest::new(0, 20),
                SegmentRequest::new(30, 60),
                SegmentRequest::new(70, 100),
            ]
        );

        received(&mut missing, 0, 20);
        assert_eq!(
            missing.as_slice(),
            [SegmentRequest::new(70, 100), SegmentRequest::new(30, 60)]
        );
        assert_eq!(missing.missing_bytes(), 60);
    }

    #[test]
    fn shrink_from_end() {
        let mut missing = MissingSegments::<2>::for_file(50);
        received(&mut missing, 45, 5);
        assert_eq!(missing.as_slice(), [SegmentRequest::new(0, 45)]);
    }

    #[test]
    fn range_past_segment_end_removes_it() {
        let mut missing = MissingSegments::<2>::for_file(50);
        received(&mut missing, 0, 60);
        assert!(missing.is_empty());
    }

    #[test]
    fn segment_request_wire_format() {
        let request = SegmentRequest::new(0x1111_2222, 0x3333_4444);
        let mut dst = [0u8; SegmentRequest::LEN];
        request.write_to(&mut dst);
        assert_eq!(dst, [0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44]);
        assert_eq!(SegmentRequest::decode(&dst), Some(request));
        assert_eq!(SegmentRequest::decode(&dst[..7]), None);
    }
}
