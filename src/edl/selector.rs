//! Deterministic clip selection.

use super::{ClipCandidate, SelectionParams, TranscriptSegment};
use tracing::debug;

/// Rank segments and greedily pick non-overlapping clips.
///
/// Segments outside `[min_duration, max_duration]` or scoring below
/// `min_score` are dropped. The rest are ordered by score, then duration
/// (both descending), then start time and input position (ascending), and
/// accepted in that order unless they overlap an accepted clip. The returned
/// clips are in acceptance order.
pub fn select(segments: &[TranscriptSegment], params: &SelectionParams) -> Vec<ClipCandidate> {
    if params.max_clips == 0 || segments.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, &TranscriptSegment, f64)> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.start.is_finite() && s.end.is_finite() && s.end >= s.start)
        .map(|(i, s)| (i, s, s.score(params.laughter_bonus)))
        .filter(|(_, s, score)| {
            let duration = s.duration();
            duration >= params.min_duration
                && duration <= params.max_duration
                && *score >= params.min_score
        })
        .collect();

    candidates.sort_by(|(ia, a, sa), (ib, b, sb)| {
        sb.total_cmp(sa)
            .then_with(|| b.duration().total_cmp(&a.duration()))
            .then_with(|| a.start.total_cmp(&b.start))
            .then_with(|| ia.cmp(ib))
    });

    let mut selected: Vec<ClipCandidate> = Vec::new();
    for (index, segment, score) in candidates {
        let clip = ClipCandidate {
            start: segment.start,
            end: segment.end,
            duration: segment.duration(),
            score,
            segment_indices: vec![index],
            text: segment.text.clone(),
        };

        if selected.iter().any(|accepted| accepted.overlaps(&clip)) {
            debug!(index, start = clip.start, end = clip.end, "Skipping overlapping segment");
            continue;
        }

        selected.push(clip);
        if selected.len() >= params.max_clips {
            break;
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min: f64, max: f64, clips: usize) -> SelectionParams {
        SelectionParams {
            min_duration: min,
            max_duration: max,
            max_clips: clips,
            min_score: 0.0,
            laughter_bonus: 2.0,
        }
    }

    fn spans(clips: &[ClipCandidate]) -> Vec<(f64, f64)> {
        clips.iter().map(|c| (c.start, c.end)).collect()
    }

    fn example() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 10.0, "a").with_score(5.0),
            TranscriptSegment::new(8.0, 15.0, "b").with_score(9.0),
            TranscriptSegment::new(20.0, 30.0, "c").with_score(5.0).with_laughter(),
        ]
    }

    #[test]
    fn test_worked_example() {
        let clips = select(&example(), &params(5.0, 20.0, 2));
        assert_eq!(spans(&clips), vec![(8.0, 15.0), (20.0, 30.0)]);
        assert_eq!(clips[1].score, 7.0);
        assert_eq!(clips[0].segment_indices, vec![1]);
    }

    #[test]
    fn test_overlapping_lower_score_rejected() {
        let clips = select(&example(), &params(5.0, 20.0, 3));
        assert_eq!(spans(&clips), vec![(8.0, 15.0), (20.0, 30.0)]);
    }

    #[test]
    fn test_empty_and_zero_clips() {
        assert!(select(&[], &params(0.0, 100.0, 5)).is_empty());
        assert!(select(&example(), &params(0.0, 100.0, 0)).is_empty());
    }

    #[test]
    fn test_touching_segments_do_not_overlap() {
        let segments = vec![
            TranscriptSegment::new(0.0, 10.0, "a").with_score(1.0),
            TranscriptSegment::new(10.0, 20.0, "b").with_score(1.0),
        ];
        let clips = select(&segments, &params(1.0, 60.0, 5));
        assert_eq!(clips.len(), 2);
    }

    #[test]
    fn test_tie_breaks() {
        let segments = vec![
            TranscriptSegment::new(100.0, 110.0, "late").with_score(3.0),
            TranscriptSegment::new(0.0, 10.0, "early").with_score(3.0),
            TranscriptSegment::new(50.0, 65.0, "long").with_score(3.0),
        ];
        let clips = select(&segments, &params(1.0, 60.0, 5));
        let texts: Vec<_> = clips.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["long", "early", "late"]);
    }

    #[test]
    fn test_filters_duration_and_score() {
        let segments = vec![
            TranscriptSegment::new(0.0, 2.0, "short").with_score(10.0),
            TranscriptSegment::new(10.0, 100.0, "long").with_score(10.0),
            TranscriptSegment::new(200.0, 210.0, "dull").with_score(0.5),
            TranscriptSegment::new(300.0, 310.0, "keep").with_score(1.5),
            TranscriptSegment::new(400.0, 390.0, "backwards").with_score(10.0),
        ];
        let p = SelectionParams {
            min_score: 1.0,
            ..params(5.0, 20.0, 10)
        };
        let clips = select(&segments, &p);
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].text, "keep");
    }

    #[test]
    fn test_properties_over_generated_inputs() {
        // Deterministic pseudo-random segment sets.
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        for _ in 0..200 {
            let count = (next() % 40) as usize;
            let segments: Vec<TranscriptSegment> = (0..count)
                .map(|i| {
                    let start = (next() % 600) as f64;
                    let len = (next() % 45) as f64;
                    let mut seg = TranscriptSegment::new(start, start + len, format!("s{}", i));
                    if next() % 3 != 0 {
                        seg.funny_score = Some((next() % 10) as f64);
                    }
                    seg.laughter = next() % 4 == 0;
                    seg
                })
                .collect();

            let p = SelectionParams {
                min_duration: 5.0,
                max_duration: 30.0,
                max_clips: (next() % 8) as usize,
                min_score: 2.0,
                laughter_bonus: 2.0,
            };

            let clips = select(&segments, &p);
            assert!(clips.len() <= p.max_clips);
            for (i, a) in clips.iter().enumerate() {
                assert!(a.duration >= p.min_duration && a.duration <= p.max_duration);
                assert!(a.score >= p.min_score);
                for b in &clips[i + 1..] {
                    assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
                }
            }
            assert_eq!(clips, select(&segments, &p));

            assert!(clips.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}
