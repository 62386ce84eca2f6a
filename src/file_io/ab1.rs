//! For reading AB1 trace files. (Applied Biosystem's sequencing)
//! [BioPython docs](https://biopython.org/wiki/ABI_traces)
//! [BioPython code](https://github.com/biopython/biopython/blob/master/Bio/SeqIO/AbiIO.py)
//!
//! ABIF is a tagged binary container: a 4-byte magic, a root directory entry
//! at byte 6, and a table of 28-byte directory entries, each naming a typed
//! payload. We pull out the analyzed channel traces (`DATA` 9-12), the base
//! calls (`PBAS` 2) and the per-base trace positions (`PLOC` 2).

use std::{fs, path::Path};

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::{
    error::TraceError,
    trace::{Channel, TraceData},
};

/// Byte length of one ABIF directory entry.
const DIR_ENTRY_SIZE: usize = 28;
/// Offset of the root directory entry within the file header.
const ROOT_DIR_OFFSET: usize = 6;

/// ABIF element type codes for the payloads we read.
const ELEM_CHAR: i16 = 2;
const ELEM_SHORT: i16 = 4;

#[derive(Clone, Copy, Debug)]
struct DirEntry {
    name: [u8; 4],
    number: i32,
    element_type: i16,
    data_size: i32,
    data_offset: i32,
    /// The raw offset field; payloads of four bytes or fewer live inline in
    /// these bytes instead of at `data_offset`.
    offset_bytes: [u8; 4],
}

impl DirEntry {
    fn parse(buf: &[u8]) -> Self {
        Self {
            name: [buf[0], buf[1], buf[2], buf[3]],
            number: BigEndian::read_i32(&buf[4..8]),
            element_type: BigEndian::read_i16(&buf[8..10]),
            // Element size (10..12) and element count (12..16) are implied
            // by the type and the payload size for everything we read.
            data_size: BigEndian::read_i32(&buf[16..20]),
            data_offset: BigEndian::read_i32(&buf[20..24]),
            offset_bytes: [buf[20], buf[21], buf[22], buf[23]],
        }
    }

    fn data(&self, buf: &[u8]) -> Result<Vec<u8>, TraceError> {
        let size = usize::try_from(self.data_size)
            .map_err(|_| unreadable("directory entry with negative payload size"))?;

        if size <= 4 {
            return Ok(self.offset_bytes[..size].to_vec());
        }

        let start = usize::try_from(self.data_offset)
            .map_err(|_| unreadable("directory entry with negative payload offset"))?;
        Ok(field(buf, start, size)?.to_vec())
    }

    fn expect_type(&self, element_type: i16) -> Result<(), TraceError> {
        if self.element_type != element_type {
            return Err(unreadable(&format!(
                "unexpected element type {} for tag {}{}",
                self.element_type,
                String::from_utf8_lossy(&self.name),
                self.number,
            )));
        }
        Ok(())
    }

    /// Number of directory entries described by the root entry, whose
    /// payload is the directory itself.
    fn entry_count(&self) -> i32 {
        self.data_size / DIR_ENTRY_SIZE as i32
    }
}

fn unreadable(reason: &str) -> TraceError {
    TraceError::UnreadableTraceFile(reason.to_owned())
}

fn field(buf: &[u8], start: usize, len: usize) -> Result<&[u8], TraceError> {
    buf.get(start..start + len)
        .ok_or_else(|| unreadable("payload runs past the end of the file"))
}

/// The analyzed trace data lives in `DATA` fields 9-12, in G, A, T, C dye
/// order.
fn channel_for_tag(number: i32) -> Option<Channel> {
    match number {
        9 => Some(Channel::G),
        10 => Some(Channel::A),
        11 => Some(Channel::T),
        12 => Some(Channel::C),
        _ => None,
    }
}

fn read_i16_array(data: &[u8]) -> Vec<i32> {
    data.chunks_exact(2)
        .map(|c| BigEndian::read_i16(c) as i32)
        .collect()
}

fn read_u16_array(data: &[u8]) -> Vec<usize> {
    data.chunks_exact(2)
        .map(|c| BigEndian::read_u16(c) as usize)
        .collect()
}

/// Parse an in-memory ABIF image into a trace record.
pub fn parse_ab1(buf: &[u8]) -> Result<TraceData, TraceError> {
    if buf.len() < ROOT_DIR_OFFSET + DIR_ENTRY_SIZE {
        return Err(unreadable("file too short for an ABIF header"));
    }
    if &buf[0..4] != b"ABIF" {
        return Err(unreadable("file does not start with ABIF"));
    }

    let root = DirEntry::parse(&buf[ROOT_DIR_OFFSET..ROOT_DIR_OFFSET + DIR_ENTRY_SIZE]);
    let count = usize::try_from(root.entry_count())
        .map_err(|_| unreadable("negative directory entry count"))?;
    let dir_start = usize::try_from(root.data_offset)
        .map_err(|_| unreadable("negative directory offset"))?;

    let mut channels: [Option<Vec<i32>>; 4] = [None, None, None, None];
    let mut base_calls: Option<String> = None;
    let mut base_pos: Option<Vec<usize>> = None;

    for i in 0..count {
        let entry = DirEntry::parse(field(buf, dir_start + i * DIR_ENTRY_SIZE, DIR_ENTRY_SIZE)?);

        match (&entry.name, entry.number) {
            (b"DATA", number) => {
                let Some(channel) = channel_for_tag(number) else {
                    continue; // Raw-trace and status DATA fields; not used.
                };
                entry.expect_type(ELEM_SHORT)?;
                channels[channel.index()] = Some(read_i16_array(&entry.data(buf)?));
            }
            (b"PBAS", 2) => {
                entry.expect_type(ELEM_CHAR)?;
                let calls = String::from_utf8(entry.data(buf)?)
                    .map_err(|_| unreadable("base calls are not valid text"))?;
                base_calls = Some(calls.to_ascii_uppercase());
            }
            (b"PLOC", 2) => {
                entry.expect_type(ELEM_SHORT)?;
                base_pos = Some(read_u16_array(&entry.data(buf)?));
            }
            _ => (),
        }
    }

    // Channel storage order is A, G, C, T; see `Channel::index`.
    let [Some(ch_a), Some(ch_g), Some(ch_c), Some(ch_t)] = channels else {
        return Err(unreadable("missing one or more analyzed channel traces"));
    };
    let sequence = base_calls.ok_or_else(|| unreadable("missing base calls (PBAS2)"))?;
    let base_pos = base_pos.ok_or_else(|| unreadable("missing base positions (PLOC2)"))?;

    let len = ch_a.len();
    if ch_g.len() != len || ch_c.len() != len || ch_t.len() != len {
        return Err(unreadable("channel traces have differing lengths"));
    }
    if sequence.len() != base_pos.len() {
        return Err(unreadable("base calls and base positions disagree in count"));
    }

    debug!(
        "parsed trace: {} samples, {} called bases",
        len,
        sequence.len()
    );

    Ok(TraceData::new([ch_a, ch_g, ch_c, ch_t], sequence, base_pos))
}

/// Read a trace file from disk. Fails with [`TraceError::UnreadableTraceFile`]
/// if the format cannot be parsed.
pub fn import_ab1(path: &Path) -> Result<TraceData, TraceError> {
    let buf = fs::read(path)?;
    parse_ab1(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn push_entry(
        dir: &mut Vec<u8>,
        name: &[u8; 4],
        number: i32,
        element_type: i16,
        element_size: i16,
        num_elements: i32,
        data_size: i32,
        offset_bytes: [u8; 4],
    ) {
        dir.extend_from_slice(name);
        dir.extend_from_slice(&number.to_be_bytes());
        dir.extend_from_slice(&element_type.to_be_bytes());
        dir.extend_from_slice(&element_size.to_be_bytes());
        dir.extend_from_slice(&num_elements.to_be_bytes());
        dir.extend_from_slice(&data_size.to_be_bytes());
        dir.extend_from_slice(&offset_bytes);
        dir.extend_from_slice(&0i32.to_be_bytes()); // data handle
    }

    fn shorts_be(vals: &[i16]) -> Vec<u8> {
        vals.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    /// A minimal ABIF image: four channels of four samples, four base calls
    /// with positions. The base calls fit in four bytes and exercise the
    /// inline-payload path.
    fn synthetic_ab1() -> Vec<u8> {
        let mut buf = b"ABIF".to_vec();
        buf.extend_from_slice(&0x0101i16.to_be_bytes()); // version

        // Root entry placeholder; filled in once offsets are known.
        let root_at = buf.len();
        buf.resize(buf.len() + DIR_ENTRY_SIZE, 0);

        // Payload region.
        let channel_data: [(i32, [i16; 4]); 4] = [
            (9, [10, 20, 30, 40]),  // G
            (10, [11, 21, 31, 41]), // A
            (11, [12, 22, 32, 42]), // T
            (12, [13, 23, 33, 43]), // C
        ];
        let mut payload_offsets = Vec::new();
        for (_, samples) in &channel_data {
            payload_offsets.push(buf.len() as i32);
            buf.extend_from_slice(&shorts_be(samples));
        }
        let ploc_offset = buf.len() as i32;
        buf.extend_from_slice(&shorts_be(&[0, 1, 2, 3]));

        // Directory.
        let dir_start = buf.len();
        let mut dir = Vec::new();
        for ((number, _), offset) in channel_data.iter().zip(&payload_offsets) {
            push_entry(&mut dir, b"DATA", *number, 4, 2, 4, 8, offset.to_be_bytes());
        }
        push_entry(&mut dir, b"PBAS", 2, 2, 1, 4, 4, *b"ACGT");
        push_entry(&mut dir, b"PLOC", 2, 4, 2, 4, 8, ploc_offset.to_be_bytes());
        let entry_count = (dir.len() / DIR_ENTRY_SIZE) as i32;
        buf.extend_from_slice(&dir);

        // Root entry: its payload is the directory.
        let mut root = Vec::new();
        push_entry(
            &mut root,
            b"tdir",
            1,
            1023,
            DIR_ENTRY_SIZE as i16,
            entry_count,
            entry_count * DIR_ENTRY_SIZE as i32,
            (dir_start as i32).to_be_bytes(),
        );
        buf[root_at..root_at + DIR_ENTRY_SIZE].copy_from_slice(&root);

        buf
    }

    #[test]
    fn parses_synthetic_trace() {
        let trace = parse_ab1(&synthetic_ab1()).unwrap();

        assert_eq!(trace.seq_length, 4);
        assert_eq!(trace.channel(Channel::G), &[10, 20, 30, 40]);
        assert_eq!(trace.channel(Channel::A), &[11, 21, 31, 41]);
        assert_eq!(trace.channel(Channel::T), &[12, 22, 32, 42]);
        assert_eq!(trace.channel(Channel::C), &[13, 23, 33, 43]);
        assert_eq!(trace.sequence, "ACGT");
        assert_eq!(trace.base_pos, vec![0, 1, 2, 3]);
        assert_eq!(trace.initial_offset, 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = synthetic_ab1();
        buf[0..4].copy_from_slice(b"JUNK");
        assert!(matches!(
            parse_ab1(&buf),
            Err(TraceError::UnreadableTraceFile(_))
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut buf = synthetic_ab1();
        buf.truncate(40); // Header plus root entry only.
        assert!(matches!(
            parse_ab1(&buf),
            Err(TraceError::UnreadableTraceFile(_))
        ));
    }
}
