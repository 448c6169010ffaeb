use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use mercury_types::{RecordId, StoredEvent};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::filter::EventFilter;
use crate::traits::EventStore;

/// Flush/sync strategy for the log file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` after every append (an append is durable when it returns).
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Configuration for a [`FileEventStore`].
#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Largest payload a frame may declare. Events are small JSON objects, so a
/// longer length header means the header itself is damaged.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

struct LogState {
    file: File,
    /// Current end of the last complete frame.
    offset: u64,
    events: Vec<StoredEvent>,
    ids: HashSet<RecordId>,
}

/// Event store backed by a single append-only file.
///
/// On-disk format, one frame per event:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (JSON-encoded StoredEvent)]
/// ```
///
/// Opening the store reads every frame. A frame cut short at the end of the
/// file is a torn write from a crash (its append never returned success),
/// so it is dropped and the file truncated back to the last whole frame.
/// The tail only counts as torn when no intact frame follows it; otherwise
/// the short frame's length header is damaged and `open` fails. A complete
/// frame that fails its CRC or cannot be decoded is corruption too.
///
/// The log file is locked exclusively for as long as the store is open, so
/// a second process (or a second store in this one) cannot append behind
/// the first one's back.
pub struct FileEventStore {
    path: PathBuf,
    config: LogConfig,
    inner: RwLock<LogState>,
}

impl FileEventStore {
    /// Open (or create) the log at the given path and load its events.
    pub fn open(path: &Path, config: LogConfig) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        if let Err(e) = fs2::FileExt::try_lock_exclusive(&file) {
            return Err(if e.kind() == fs2::lock_contended_error().kind() {
                StoreError::Unavailable(format!(
                    "log {} is locked by another process",
                    path.display()
                ))
            } else {
                e.into()
            });
        }

        let (events, offset) = read_frames(path)?;
        let file_len = file.metadata()?.len();
        if offset < file_len {
            warn!(
                path = %path.display(),
                dropped_bytes = file_len - offset,
                "truncated frame at end of log; discarding torn write"
            );
            file.set_len(offset)?;
        }

        let mut ids = HashSet::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            if !ids.insert(event.record_id.clone()) {
                return Err(StoreError::Corrupt {
                    offset,
                    reason: format!(
                        "record id {} appears more than once (frame {index})",
                        event.record_id
                    ),
                });
            }
        }

        info!(path = %path.display(), events = events.len(), "event log opened");

        Ok(Self {
            path: path.to_path_buf(),
            config,
            inner: RwLock::new(LogState {
                file,
                offset,
                events,
                ids,
            }),
        })
    }

    /// Re-read every frame from disk, bypassing the in-memory index.
    pub fn recover(&self) -> StoreResult<Vec<StoredEvent>> {
        let _guard = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let (events, _) = read_frames(&self.path)?;
        Ok(events)
    }

    /// Byte offset just past the last complete frame.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self.inner.read().map_err(|_| StoreError::Poisoned)?.offset)
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for FileEventStore {
    fn append(&self, event: &StoredEvent) -> StoreResult<StoredEvent> {
        let payload =
            serde_json::to_vec(event).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len()).map_err(|_| {
            StoreError::Serialization(format!("event of {} bytes is too large", payload.len()))
        })?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if state.ids.contains(&event.record_id) {
            return Err(StoreError::DuplicateRecord(event.record_id.clone()));
        }

        let frame_offset = state.offset;
        if let Err(e) = write_frame(&mut state.file, &frame, self.config.sync_mode) {
            // Drop whatever part of the frame reached the file so the next
            // append starts on a frame boundary.
            if let Err(rollback) = state.file.set_len(frame_offset) {
                warn!(offset = frame_offset, error = %rollback, "failed to roll back partial frame");
            }
            return Err(e.into());
        }

        state.offset = frame_offset + frame.len() as u64;
        state.ids.insert(event.record_id.clone());
        state.events.push(event.clone());

        debug!(offset = frame_offset, len = payload.len(), record = %event.record_id, "log append");
        Ok(event.clone())
    }

    fn select_all(&self) -> StoreResult<Vec<StoredEvent>> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.events.clone())
    }

    fn query_recent(&self, limit: usize, filter: &EventFilter) -> StoreResult<Vec<StoredEvent>> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut matched: Vec<&StoredEvent> =
            state.events.iter().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self
            .inner
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .events
            .len())
    }
}

impl std::fmt::Debug for FileEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEventStore")
            .field("path", &self.path)
            .field("sync_mode", &self.config.sync_mode)
            .finish()
    }
}

fn write_frame(file: &mut File, frame: &[u8], sync_mode: SyncMode) -> std::io::Result<()> {
    file.write_all(frame)?;
    file.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        file.sync_data()?;
    }
    Ok(())
}

/// Decode all complete frames. Returns the events and the offset just past
/// the last complete frame; anything after it is an incomplete tail.
fn read_frames(path: &Path) -> StoreResult<(Vec<StoredEvent>, u64)> {
    let bytes = fs::read(path)?;
    let mut events = Vec::new();
    let mut pos = 0usize;

    while pos + HEADER_SIZE <= bytes.len() {
        let offset = pos as u64;
        let length = u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
            as usize;
        let expected_crc =
            u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]);

        if length == 0 {
            return Err(StoreError::Corrupt {
                offset,
                reason: "zero-length frame".into(),
            });
        }
        if length > MAX_FRAME_SIZE {
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("frame length {length} exceeds the {MAX_FRAME_SIZE} byte limit"),
            });
        }

        let start = pos + HEADER_SIZE;
        let end = start + length;
        if end > bytes.len() {
            if let Some(next) = find_intact_frame(&bytes, start) {
                return Err(StoreError::Corrupt {
                    offset,
                    reason: format!(
                        "frame length {length} runs past the end of the log, \
                         but an intact frame follows at offset {next}"
                    ),
                });
            }
            // Incomplete final frame.
            break;
        }

        let payload = &bytes[start..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"),
            });
        }

        let event: StoredEvent = serde_json::from_slice(payload).map_err(|e| StoreError::Corrupt {
            offset,
            reason: format!("undecodable event: {e}"),
        })?;
        events.push(event);
        pos = end;
    }

    debug!(recovered = events.len(), "log scan complete");
    Ok((events, pos as u64))
}

/// Offset of the first position at or after `from` holding a frame whose
/// payload fits in the file and passes its CRC.
fn find_intact_frame(bytes: &[u8], from: usize) -> Option<usize> {
    (from..bytes.len().saturating_sub(HEADER_SIZE)).find(|&pos| {
        let length =
            u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]) as usize;
        let crc = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]);
        let start = pos + HEADER_SIZE;
        length > 0
            && length <= MAX_FRAME_SIZE
            && start + length <= bytes.len()
            && crc32fast::hash(&bytes[start..start + length]) == crc
    })
}
