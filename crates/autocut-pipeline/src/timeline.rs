//! Timeline synthesis.
//!
//! Converts retained segments of one source file into a gap-free
//! edit-decision list and renders it as an FCPXML 1.10 document that
//! references the source non-destructively.
//!
//! # Algorithm
//!
//! A running offset starts at zero. Each segment becomes one entry
//! `{offset, source_start: start, duration: end - start}` and the offset
//! advances by that duration, so gaps in the source collapse and the
//! timeline length is the sum of segment durations.

use std::fmt::{self, Write as _};
use std::path::Path;

use autocut_media::{FrameRate, VideoInfo};
use autocut_models::{EditDecision, EditDecisionList, Segment};

use crate::error::{StageError, StageResult};

const FORMAT_ID: &str = "r1";
const ASSET_ID: &str = "r2";
const EVENT_NAME: &str = "Auto Edited";
const PROJECT_NAME: &str = "Cleaned Timeline";

/// Edit-decision list plus the source format it is placed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub edits: EditDecisionList,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

/// Build the edit-decision list for `segments` in the given order.
///
/// Overlapping or out-of-order segments are placed as given.
pub fn synthesize(segments: &[Segment], source: &VideoInfo) -> StageResult<Timeline> {
    if segments.is_empty() {
        return Err(StageError::NoSegments);
    }

    let mut offset = 0.0;
    let mut entries = Vec::with_capacity(segments.len());
    for seg in segments {
        let duration = seg.end - seg.start;
        entries.push(EditDecision {
            offset,
            source_start: seg.start,
            duration,
        });
        offset += duration;
    }

    Ok(Timeline {
        edits: EditDecisionList::new(entries),
        width: source.width,
        height: source.height,
        frame_rate: source.frame_rate,
    })
}

fn seconds(t: f64) -> String {
    format!("{:.3}s", t)
}

/// Escape a string for use inside a double-quoted XML attribute.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

impl Timeline {
    pub fn total_duration(&self) -> f64 {
        self.edits.total_duration()
    }

    /// Frame duration as an exact rational, e.g. `1001/30000s`.
    pub fn frame_duration(&self) -> String {
        let (num, den) = self.frame_rate.frame_duration();
        format!("{}/{}s", num, den)
    }

    /// `AutoFormat<w>x<h>@<whole fps>`
    pub fn format_name(&self) -> String {
        format!(
            "AutoFormat{}x{}@{}",
            self.width,
            self.height,
            self.frame_rate.as_f64().trunc() as u64
        )
    }

    /// Render the FCPXML document. `asset_src` should be absolute.
    pub fn to_fcpxml(&self, asset_src: &Path) -> StageResult<String> {
        let mut xml = String::new();
        self.write_fcpxml(&mut xml, asset_src)
            .map_err(|e| StageError::capability(format!("failed to render timeline: {}", e)))?;
        Ok(xml)
    }

    fn write_fcpxml(&self, xml: &mut String, asset_src: &Path) -> fmt::Result {
        let src = format!("file://{}", asset_src.display());

        writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(xml, "<!DOCTYPE fcpxml>")?;
        writeln!(xml, r#"<fcpxml version="1.10">"#)?;
        writeln!(xml, "  <resources>")?;
        writeln!(
            xml,
            r#"    <format id="{}" name="{}" frameDuration="{}" width="{}" height="{}"/>"#,
            FORMAT_ID,
            escape_attr(&self.format_name()),
            self.frame_duration(),
            self.width,
            self.height
        )?;
        writeln!(
            xml,
            r#"    <asset id="{}" src="{}" start="0s" hasVideo="1" hasAudio="1" format="{}"/>"#,
            ASSET_ID,
            escape_attr(&src),
            FORMAT_ID
        )?;
        writeln!(xml, "  </resources>")?;
        writeln!(xml, "  <library>")?;
        writeln!(xml, r#"    <event name="{}">"#, EVENT_NAME)?;
        writeln!(xml, r#"      <project name="{}">"#, PROJECT_NAME)?;
        writeln!(
            xml,
            r#"        <sequence format="{}" duration="{}" tcStart="0s" tcFormat="NDF">"#,
            FORMAT_ID,
            seconds(self.total_duration())
        )?;
        writeln!(xml, "          <spine>")?;
        for (i, edit) in self.edits.iter().enumerate() {
            writeln!(
                xml,
                r#"            <clip name="Segment {}" ref="{}" offset="{}" start="{}" duration="{}"/>"#,
                i + 1,
                ASSET_ID,
                seconds(edit.offset),
                seconds(edit.source_start),
                seconds(edit.duration)
            )?;
        }
        writeln!(xml, "          </spine>")?;
        writeln!(xml, "        </sequence>")?;
        writeln!(xml, "      </project>")?;
        writeln!(xml, "    </event>")?;
        writeln!(xml, "  </library>")?;
        writeln!(xml, "</fcpxml>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> VideoInfo {
        VideoInfo {
            duration: 60.0,
            width: 1920,
            height: 1080,
            frame_rate: FrameRate::parse("30000/1001").unwrap(),
            codec: "h264".to_string(),
        }
    }

    fn segs(ranges: &[(f64, f64)]) -> Vec<Segment> {
        ranges.iter().map(|(s, e)| Segment::new(*s, *e, "x")).collect()
    }

    #[test]
    fn test_offsets_accumulate_across_gaps() {
        let timeline = synthesize(&segs(&[(0.0, 2.0), (5.0, 8.0), (10.0, 10.5)]), &source()).unwrap();
        let triples: Vec<_> = timeline
            .edits
            .iter()
            .map(|e| (e.offset, e.source_start, e.duration))
            .collect();
        assert_eq!(triples, vec![(0.0, 0.0, 2.0), (2.0, 5.0, 3.0), (5.0, 10.0, 0.5)]);
        assert!((timeline.total_duration() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_segments_fail() {
        assert!(matches!(synthesize(&[], &source()), Err(StageError::NoSegments)));
    }

    #[test]
    fn test_overlapping_segments_placed_in_given_order() {
        let timeline = synthesize(&segs(&[(4.0, 6.0), (1.0, 5.0)]), &source()).unwrap();
        let offsets: Vec<_> = timeline.edits.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0.0, 2.0]);
        assert!((timeline.total_duration() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_record() {
        let timeline = synthesize(&segs(&[(0.0, 1.0)]), &source()).unwrap();
        assert_eq!(timeline.frame_duration(), "1001/30000s");
        assert_eq!(timeline.format_name(), "AutoFormat1920x1080@29");
    }

    #[test]
    fn test_fcpxml_document() {
        let timeline = synthesize(&segs(&[(0.0, 2.0), (5.0, 8.0), (10.0, 10.5)]), &source()).unwrap();
        let xml = timeline.to_fcpxml(Path::new("/out/denoised/talk & co.mp4")).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<format id="r1" name="AutoFormat1920x1080@29" frameDuration="1001/30000s""#));
        assert!(xml.contains(r#"src="file:///out/denoised/talk &amp; co.mp4""#));
        assert!(xml.contains(r#"duration="5.500s" tcStart="0s" tcFormat="NDF""#));
        assert!(xml.contains(
            r#"<clip name="Segment 2" ref="r2" offset="2.000s" start="5.000s" duration="3.000s"/>"#
        ));
        assert_eq!(xml.matches("<clip ").count(), 3);
        assert!(xml.ends_with("  </library>\n</fcpxml>\n"));
    }

    #[test]
    fn test_fcpxml_is_deterministic() {
        let timeline = synthesize(&segs(&[(0.0, 2.0)]), &source()).unwrap();
        let path = Path::new("/a.mp4");
        assert_eq!(timeline.to_fcpxml(path).unwrap(), timeline.to_fcpxml(path).unwrap());
    }
}
