//! Joining synthesized segments into one audio file.

/// Combines the audio of consecutive chunks into one file.
pub trait AudioAssembler: Send + Sync {
    /// File extension of the assembled output, without the dot.
    fn extension(&self) -> &'static str;

    fn assemble(&self, segments: &[Vec<u8>]) -> Vec<u8>;
}

const ID3V2_HEADER_LEN: usize = 10;
const ID3V2_FOOTER_FLAG: u8 = 0x10;
const ID3V1_LEN: usize = 128;

/// Concatenates MPEG audio frames.
///
/// MP3 frames are self-delimiting, so segments can be joined end to end once
/// their tags are out of the way. The first segment's ID3v2 tag is kept as
/// the file's tag; every other ID3v2 tag and all ID3v1 trailers are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3Assembler;

impl AudioAssembler for Mp3Assembler {
    fn extension(&self) -> &'static str {
        "mp3"
    }

    fn assemble(&self, segments: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::with_capacity(segments.iter().map(Vec::len).sum());
        for (i, segment) in segments.iter().enumerate() {
            let tag_len = id3v2_len(segment);
            if i == 0 {
                out.extend_from_slice(&segment[..tag_len]);
            }
            out.extend_from_slice(frames(&segment[tag_len..]));
        }
        out
    }
}

/// Length of the ID3v2 tags at the start of `data`, zero when there is none.
fn id3v2_len(data: &[u8]) -> usize {
    let mut pos = 0;
    while let Some(len) = single_id3v2_len(&data[pos..]) {
        pos += len;
    }
    pos
}

fn single_id3v2_len(data: &[u8]) -> Option<usize> {
    if data.len() < ID3V2_HEADER_LEN || &data[..3] != b"ID3" {
        return None;
    }
    let size = data[6..10]
        .iter()
        .try_fold(0usize, |acc, &b| (b < 0x80).then_some((acc << 7) | b as usize))?;
    let footer = if data[5] & ID3V2_FOOTER_FLAG != 0 {
        ID3V2_HEADER_LEN
    } else {
        0
    };
    Some((ID3V2_HEADER_LEN + size + footer).min(data.len()))
}

/// `data` without a trailing ID3v1 tag.
fn frames(data: &[u8]) -> &[u8] {
    if data.len() >= ID3V1_LEN && data[data.len() - ID3V1_LEN..].starts_with(b"TAG") {
        &data[..data.len() - ID3V1_LEN]
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id3v2(body: &[u8]) -> Vec<u8> {
        let size = body.len();
        let mut tag = b"ID3\x04\x00\x00".to_vec();
        tag.extend([
            ((size >> 21) & 0x7f) as u8,
            ((size >> 14) & 0x7f) as u8,
            ((size >> 7) & 0x7f) as u8,
            (size & 0x7f) as u8,
        ]);
        tag.extend_from_slice(body);
        tag
    }

    fn id3v1() -> Vec<u8> {
        let mut tag = b"TAG".to_vec();
        tag.resize(ID3V1_LEN, b' ');
        tag
    }

    fn segment(tag_body: &[u8], frames: &[u8], trailer: bool) -> Vec<u8> {
        let mut data = id3v2(tag_body);
        data.extend_from_slice(frames);
        if trailer {
            data.extend(id3v1());
        }
        data
    }

    #[test]
    fn test_keeps_first_tag_only() {
        let first = segment(b"title-one", b"\xff\xfbAAA", true);
        let second = segment(&[0u8; 200], b"\xff\xfbBBB", true);
        let joined = Mp3Assembler.assemble(&[first, second]);

        let mut expected = id3v2(b"title-one");
        expected.extend_from_slice(b"\xff\xfbAAA\xff\xfbBBB");
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_untagged_segments() {
        let joined = Mp3Assembler.assemble(&[b"\xff\xfb1".to_vec(), b"\xff\xfb2".to_vec()]);
        assert_eq!(joined, b"\xff\xfb1\xff\xfb2");
        assert!(Mp3Assembler.assemble(&[]).is_empty());
    }

    #[test]
    fn test_footer_and_stacked_tags() {
        let mut tagged = id3v2(b"x");
        tagged[5] = ID3V2_FOOTER_FLAG;
        tagged.extend_from_slice(b"3DI\x04\x00\x10\x00\x00\x00\x01");
        tagged.extend(id3v2(b"yy"));
        let len = tagged.len();
        tagged.extend_from_slice(b"\xff\xfbZ");

        assert_eq!(id3v2_len(&tagged), len);
        assert_eq!(
            Mp3Assembler.assemble(&[b"\xff\xfbA".to_vec(), tagged]),
            b"\xff\xfbA\xff\xfbZ"
        );
    }

    #[test]
    fn test_truncated_tag() {
        let mut data = id3v2(&[0u8; 50]);
        data.truncate(20);
        assert_eq!(id3v2_len(&data), 20);
        assert_eq!(Mp3Assembler.assemble(&[b"A".to_vec(), data]), b"A");
    }
}
