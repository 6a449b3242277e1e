//! Word-packed command stream for batching agent updates
//!
//! Brains, or a host on the other side of an FFI or wasm boundary, queue
//! commands during a frame and the crowd applies them in one pass. The
//! stream is a flat buffer of little-endian `u32` words:
//!
//! ```text
//! header  = (size_in_words << 16) | command_type   // size includes the header
//! payload = size - 1 words
//! ...
//! 0                                                 // terminator
//! ```
//!
//! One word is always kept free for the terminator.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use trinav::PolyId;
use trinav_common::{Error, Result};

/// Default capacity of a command buffer in words
pub const DEFAULT_COMMAND_WORDS: usize = 65_536;

/// Replace an agent's corridor
pub const CMD_SET_CORRIDOR: u16 = 1;

/// What to do with the corners after a corridor is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CorridorAction {
    /// Keep the current corners
    SetOnly = 1,
    /// Head straight for the end target
    SetAndStraightCorner = 2,
    /// Run the funnel on the new corridor
    SetAndRecalcCorners = 3,
}

impl CorridorAction {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::SetOnly),
            2 => Some(Self::SetAndStraightCorner),
            3 => Some(Self::SetAndRecalcCorners),
            _ => None,
        }
    }
}

/// Decoded [`CMD_SET_CORRIDOR`] command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCorridor {
    /// Agent ordinal in the crowd
    pub agent: u32,
    pub action: CorridorAction,
    /// Polygon corridor, current polygon first
    pub corridor: Vec<PolyId>,
}

impl SetCorridor {
    /// Decodes the payload words of a [`CMD_SET_CORRIDOR`] command
    pub fn decode(mut payload: &[u8]) -> Result<Self> {
        let short = |_| Error::CommandBuffer("set corridor command is truncated".to_string());
        let agent = payload.read_u32::<LittleEndian>().map_err(short)?;
        let raw_action = payload.read_u32::<LittleEndian>().map_err(short)?;
        let action = CorridorAction::from_u32(raw_action)
            .ok_or_else(|| Error::CommandBuffer(format!("unknown corridor action {raw_action}")))?;

        let mut corridor = Vec::with_capacity(payload.len() / 4);
        while let Ok(poly) = payload.read_u32::<LittleEndian>() {
            corridor.push(poly);
        }
        Ok(Self {
            agent,
            action,
            corridor,
        })
    }
}

/// One command read back from a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'b> {
    pub kind: u16,
    /// Payload bytes, a whole number of words
    pub payload: &'b [u8],
}

impl Command<'_> {
    /// Payload as words
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.payload.chunks_exact(4).map(LittleEndian::read_u32)
    }
}

/// Writer side of the command stream
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    bytes: Vec<u8>,
    capacity_words: usize,
    cursor: usize,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_COMMAND_WORDS)
    }
}

impl CommandBuffer {
    /// Creates a committed, empty buffer of `capacity_words` words
    pub fn with_capacity(capacity_words: usize) -> Self {
        let capacity_words = capacity_words.max(1);
        Self {
            bytes: vec![0; capacity_words * 4],
            capacity_words,
            cursor: 0,
        }
    }

    pub fn capacity_words(&self) -> usize {
        self.capacity_words
    }

    /// Words written in the current frame
    pub fn len_words(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Raw stream bytes, for handing the buffer across a boundary
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Starts a new frame, discarding the previous one
    pub fn begin_frame(&mut self) {
        self.cursor = 0;
        self.put(0, 0);
    }

    /// Terminates the frame so readers stop after the last command
    pub fn commit_frame(&mut self) {
        self.put(self.cursor, 0);
    }

    fn put(&mut self, word: usize, value: u32) {
        LittleEndian::write_u32(&mut self.bytes[word * 4..word * 4 + 4], value);
    }

    /// Writes the header of a command with `payload_words` payload words and
    /// returns the index of its first payload word
    fn reserve(&mut self, kind: u16, payload_words: usize) -> Result<usize> {
        if kind == 0 {
            return Err(Error::CommandBuffer("command type 0 is the terminator".to_string()));
        }
        let size = payload_words + 1;
        if size > u16::MAX as usize {
            return Err(Error::CommandBuffer(format!(
                "command of {size} words exceeds the header limit"
            )));
        }
        if self.cursor + size >= self.capacity_words {
            return Err(Error::CommandBuffer(format!(
                "command buffer full: {} of {} words used, {size} more requested",
                self.cursor, self.capacity_words
            )));
        }
        let header = ((size as u32) << 16) | kind as u32;
        self.put(self.cursor, header);
        let payload_start = self.cursor + 1;
        self.cursor += size;
        Ok(payload_start)
    }

    /// Appends a command of type `kind`
    pub fn write_command(&mut self, kind: u16, payload: &[u32]) -> Result<()> {
        let start = self.reserve(kind, payload.len())?;
        for (i, &word) in payload.iter().enumerate() {
            self.put(start + i, word);
        }
        Ok(())
    }

    /// Appends a [`CMD_SET_CORRIDOR`] command
    pub fn write_set_corridor(&mut self, agent: u32, action: CorridorAction, corridor: &[PolyId]) -> Result<()> {
        let start = self.reserve(CMD_SET_CORRIDOR, corridor.len() + 2)?;
        self.put(start, agent);
        self.put(start + 1, action as u32);
        for (i, &poly) in corridor.iter().enumerate() {
            self.put(start + 2 + i, poly);
        }
        Ok(())
    }

    /// Reader over the committed frame
    pub fn reader(&self) -> CommandReader<'_> {
        CommandReader::new(&self.bytes)
    }
}

/// Iterates the commands of a committed stream up to its terminator
#[derive(Debug, Clone)]
pub struct CommandReader<'b> {
    bytes: &'b [u8],
    cursor: usize,
}

impl<'b> CommandReader<'b> {
    /// Reads a stream produced by [`CommandBuffer`] or an external writer
    pub fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }
}

impl<'b> Iterator for CommandReader<'b> {
    type Item = Command<'b>;

    fn next(&mut self) -> Option<Self::Item> {
        let words = self.bytes.len() / 4;
        if self.cursor >= words {
            return None;
        }
        let header = LittleEndian::read_u32(&self.bytes[self.cursor * 4..]);
        if header == 0 {
            return None;
        }
        let kind = (header & 0xffff) as u16;
        let size = (header >> 16) as usize;
        if size == 0 || self.cursor + size > words {
            log::error!(
                "malformed command header {header:#010x} at word {}, dropping the rest of the frame",
                self.cursor
            );
            self.cursor = words;
            return None;
        }

        let payload = &self.bytes[(self.cursor + 1) * 4..(self.cursor + size) * 4];
        self.cursor += size;
        Some(Command { kind, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_corridor_layout() {
        let mut buffer = CommandBuffer::with_capacity(16);
        buffer.begin_frame();
        buffer
            .write_set_corridor(4, CorridorAction::SetAndStraightCorner, &[7, 8])
            .unwrap();
        buffer.commit_frame();

        let words: Vec<u32> = buffer.as_bytes()[..24]
            .chunks_exact(4)
            .map(LittleEndian::read_u32)
            .collect();
        assert_eq!(words, vec![(5 << 16) | 1, 4, 2, 7, 8, 0]);

        let commands: Vec<_> = buffer.reader().collect();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].kind, CMD_SET_CORRIDOR);
        let decoded = SetCorridor::decode(commands[0].payload).unwrap();
        assert_eq!(decoded.agent, 4);
        assert_eq!(decoded.action, CorridorAction::SetAndStraightCorner);
        assert_eq!(decoded.corridor, vec![7, 8]);
    }

    #[test]
    fn test_terminator_word_is_reserved() {
        let mut buffer = CommandBuffer::with_capacity(4);
        buffer.begin_frame();
        // Header plus two words leaves exactly the terminator
        buffer.write_command(9, &[1, 2]).unwrap();
        assert_eq!(buffer.len_words(), 3);
        let err = buffer.write_command(9, &[]).unwrap_err();
        assert!(matches!(err, Error::CommandBuffer(_)));
        buffer.commit_frame();
        assert_eq!(buffer.reader().count(), 1);
    }

    #[test]
    fn test_begin_frame_discards_previous_commands() {
        let mut buffer = CommandBuffer::default();
        buffer.begin_frame();
        buffer.write_command(3, &[42]).unwrap();
        buffer.commit_frame();
        buffer.begin_frame();
        assert!(buffer.is_empty());
        assert_eq!(buffer.reader().count(), 0);
    }

    #[test]
    fn test_reader_walks_commands_by_size() {
        let mut buffer = CommandBuffer::with_capacity(32);
        buffer.begin_frame();
        buffer.write_command(77, &[1, 2, 3]).unwrap();
        buffer.write_set_corridor(0, CorridorAction::SetOnly, &[5]).unwrap();
        buffer.commit_frame();

        let commands: Vec<_> = buffer.reader().collect();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].kind, 77);
        assert_eq!(commands[0].words().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(commands[1].kind, CMD_SET_CORRIDOR);
    }

    #[test]
    fn test_malformed_stream_stops_reading() {
        let mut bytes = vec![0u8; 12];
        // Claims 9 words in a 3-word buffer
        LittleEndian::write_u32(&mut bytes[0..4], (9 << 16) | 1);
        assert_eq!(CommandReader::new(&bytes).count(), 0);

        let mut bytes = vec![0u8; 8];
        LittleEndian::write_u32(&mut bytes[0..4], 5);
        assert_eq!(CommandReader::new(&bytes).count(), 0);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(SetCorridor::decode(&[1, 0, 0, 0]).is_err());
        let mut payload = vec![0u8; 8];
        LittleEndian::write_u32(&mut payload[4..8], 9);
        assert!(SetCorridor::decode(&payload).is_err());
        assert_eq!(CorridorAction::from_u32(3), Some(CorridorAction::SetAndRecalcCorners));
        assert_eq!(CorridorAction::from_u32(0), None);
    }
}
