//! Owns every loaded [`Chunk`], wires neighbor links, and drives a background
//! save worker. See [`crate::grid::Grid`] for the world-space façade built on
//! top of this.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use log::{debug, error, warn};
use nalgebra::Point3;
use parking_lot::Mutex;

use crate::chunk::{Chunk, ChunkHandle};
use crate::codec::{Reader, Version, Writer};
use crate::coord::ChunkCoord;
use crate::error::{CoreError, Result};
use crate::mesh::Direction;

const SAVE_QUEUE_CAPACITY: usize = 256;
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The on-disk chunk byte store: an external collaborator (file-system
/// primitives are out of scope, §1/§6) that this manager persists through.
pub trait ChunkStorage: Send + Sync {
    fn load_chunk(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>>;
    fn save_chunk(&self, coord: ChunkCoord, bytes: &[u8]) -> Result<()>;
}

fn serialize_chunk(chunk: &Chunk) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(std::io::Cursor::new(&mut buf), Version::CURRENT)?;
        chunk.write_object(&mut w)?;
    }
    Ok(buf)
}

fn deserialize_chunk(coord: ChunkCoord, bytes: &[u8]) -> Result<Chunk> {
    let mut r = Reader::new(std::io::Cursor::new(bytes))?;
    Chunk::read_object(coord, &mut r)
}

fn save_worker_loop<S: ChunkStorage>(
    rx: crossbeam_channel::Receiver<ChunkHandle>,
    storage: Arc<S>,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match rx.recv_timeout(WORKER_POLL_INTERVAL) {
            Ok(handle) => {
                let coord = handle.read().coord();
                let bytes = match serialize_chunk(&handle.read()) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        error!("failed to serialize chunk {:?} for save: {}", coord, err);
                        continue;
                    }
                };
                match storage.save_chunk(coord, &bytes) {
                    Ok(()) => {
                        handle.write().mark_clean();
                        debug!("saved chunk {:?}", coord);
                    }
                    Err(err) => error!("failed to save chunk {:?}: {}", coord, err),
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Chunk store and lifecycle manager: `chunksMutex`/`dirtyChunksMutex` from
/// §4.E/§5 are `chunks`/`dirty_chunks` below.
pub struct ChunkManager<S: ChunkStorage> {
    storage: Arc<S>,
    size: Mutex<i32>,
    chunks: Mutex<HashMap<ChunkCoord, ChunkHandle>>,
    dirty_chunks: Mutex<HashSet<ChunkCoord>>,
    save_tx: Sender<ChunkHandle>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<S: ChunkStorage + 'static> ChunkManager<S> {
    pub fn new(storage: S, chunk_size: i32) -> Self {
        let storage = Arc::new(storage);
        let (save_tx, save_rx) = bounded(SAVE_QUEUE_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_storage = Arc::clone(&storage);
        let worker_shutdown = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("chunk-save-worker".into())
            .spawn(move || save_worker_loop(save_rx, worker_storage, worker_shutdown))
            .expect("failed to spawn chunk save worker thread");

        ChunkManager {
            storage,
            size: Mutex::new(chunk_size),
            chunks: Mutex::new(HashMap::new()),
            dirty_chunks: Mutex::new(HashSet::new()),
            save_tx,
            shutdown,
            worker: Some(worker),
        }
    }

    pub fn chunk_size(&self) -> i32 {
        *self.size.lock()
    }

    /// Legal only while no chunks are loaded.
    pub fn set_chunk_size(&self, size: i32) -> Result<()> {
        let mut current = self.size.lock();
        if !self.chunks.lock().is_empty() {
            return Err(CoreError::validation(
                "ChunkManager::set_chunk_size",
                "chunk size can only change while the manager holds no loaded chunks",
            ));
        }
        *current = size;
        Ok(())
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        self.chunks.lock().get(&coord).cloned()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.lock().contains_key(&coord)
    }

    /// If loaded, returns the existing handle. Otherwise deserializes from
    /// storage, falling through to [`ChunkManager::create_chunk`] if absent
    /// on disk (or unreadable — logged and treated as absent).
    pub fn load_chunk(&self, coord: ChunkCoord) -> Result<ChunkHandle> {
        if let Some(existing) = self.get(coord) {
            return Ok(existing);
        }
        match self.storage.load_chunk(coord) {
            Ok(Some(bytes)) => match deserialize_chunk(coord, &bytes) {
                Ok(chunk) => self.insert_loaded(coord, chunk),
                Err(err) => {
                    error!("chunk {:?} failed to deserialize, regenerating empty: {}", coord, err);
                    self.create_chunk(coord)
                }
            },
            Ok(None) => self.create_chunk(coord),
            Err(err) => {
                error!("failed to read chunk {:?} from storage: {}", coord, err);
                self.create_chunk(coord)
            }
        }
    }

    pub fn create_chunk(&self, coord: ChunkCoord) -> Result<ChunkHandle> {
        let size = self.chunk_size();
        let mut chunk = Chunk::new(coord);
        chunk.initialize(size)?;
        chunk.mark_clean();
        self.insert_loaded(coord, chunk)
    }

    /// Wraps an already-built chunk in a handle, wires its neighbor slots,
    /// and inserts it into the map. Used both by [`Self::load_chunk`]/
    /// [`Self::create_chunk`] and by callers (like [`crate::grid::Grid`])
    /// that deserialize chunks themselves and need to hand the manager a
    /// finished [`Chunk`] rather than a coordinate to build one from.
    pub(crate) fn insert_loaded(&self, coord: ChunkCoord, chunk: Chunk) -> Result<ChunkHandle> {
        let handle: ChunkHandle = Arc::new(parking_lot::RwLock::new(chunk));
        self.update_chunk_neighbors(coord, &handle);
        self.chunks.lock().insert(coord, Arc::clone(&handle));
        debug!("loaded chunk {:?}", coord);
        Ok(handle)
    }

    /// Wires `handle`'s six neighbor slots from whatever is already loaded,
    /// and the reciprocal slot on each of those neighbors.
    pub fn update_chunk_neighbors(&self, coord: ChunkCoord, handle: &ChunkHandle) {
        let chunks = self.chunks.lock();
        for &dir in &Direction::ALL {
            let neighbor_coord = coord.offset_by_direction(dir as usize);
            if let Some(neighbor) = chunks.get(&neighbor_coord) {
                handle.write().set_neighbor(dir, Some(Arc::clone(neighbor)));
                neighbor.write().set_neighbor(dir.opposite(), Some(Arc::clone(handle)));
            }
        }
    }

    /// If dirty, enqueues the handle for the save worker; unlinks it from
    /// every neighbor; removes it from the map. Handles held elsewhere
    /// remain valid.
    pub fn unload_chunk(&self, coord: ChunkCoord) -> Result<()> {
        let Some(handle) = self.chunks.lock().remove(&coord) else {
            return Ok(());
        };

        let neighbors: Vec<(Direction, ChunkHandle)> = Direction::ALL
            .iter()
            .filter_map(|&dir| handle.read().neighbor(dir).map(|n| (dir, n)))
            .collect();
        for (dir, neighbor) in neighbors {
            neighbor.write().set_neighbor(dir.opposite(), None);
        }

        self.dirty_chunks.lock().remove(&coord);
        if handle.read().is_dirty() {
            if self.save_tx.send(handle).is_err() {
                warn!("save worker unavailable, chunk {:?} was not persisted", coord);
            }
        }
        debug!("unloaded chunk {:?}", coord);
        Ok(())
    }

    pub fn mark_dirty(&self, coord: ChunkCoord) {
        self.dirty_chunks.lock().insert(coord);
    }

    /// Drains `dirty_chunks`, enqueuing each still-loaded chunk to the save
    /// worker.
    pub fn save_modified_chunks(&self) {
        let coords: Vec<ChunkCoord> = self.dirty_chunks.lock().drain().collect();
        let chunks = self.chunks.lock();
        for coord in coords {
            if let Some(handle) = chunks.get(&coord) {
                if self.save_tx.send(Arc::clone(handle)).is_err() {
                    warn!("save worker unavailable, chunk {:?} was not persisted", coord);
                }
            }
        }
    }

    /// Linear scan, filtered by distance from `point` to each chunk's
    /// bounds center.
    pub fn chunks_around_point(&self, point: Point3<f32>, radius: f32) -> Vec<ChunkHandle> {
        self.chunks
            .lock()
            .values()
            .filter(|handle| {
                let center = handle.read().bounds().center();
                nalgebra::distance(&center, &point) <= radius
            })
            .cloned()
            .collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.lock().len()
    }
}

impl<S: ChunkStorage> Drop for ChunkManager<S> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as StdMutex;

    #[derive(Default)]
    struct MemoryStorage {
        files: StdMutex<HashMap<ChunkCoord, Vec<u8>>>,
    }

    impl ChunkStorage for MemoryStorage {
        fn load_chunk(&self, coord: ChunkCoord) -> Result<Option<Vec<u8>>> {
            Ok(self.files.lock().get(&coord).cloned())
        }

        fn save_chunk(&self, coord: ChunkCoord, bytes: &[u8]) -> Result<()> {
            self.files.lock().insert(coord, bytes.to_vec());
            Ok(())
        }
    }

    #[test]
    fn load_falls_through_to_create_when_absent() {
        let manager = ChunkManager::new(MemoryStorage::default(), 16);
        let handle = manager.load_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        assert!(handle.read().is_empty());
        assert_eq!(manager.loaded_count(), 1);
    }

    #[test]
    fn update_chunk_neighbors_links_both_directions() {
        let manager = ChunkManager::new(MemoryStorage::default(), 16);
        let a = manager.create_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        let b = manager.create_chunk(ChunkCoord::new(1, 0, 0)).unwrap();
        assert!(a.read().neighbor(Direction::PosX).is_some());
        assert!(b.read().neighbor(Direction::NegX).is_some());
    }

    #[test]
    fn unload_unlinks_and_persists_dirty_chunks() {
        let manager = ChunkManager::new(MemoryStorage::default(), 16);
        let coord = ChunkCoord::new(0, 0, 0);
        let handle = manager.create_chunk(coord).unwrap();
        handle
            .write()
            .set_voxel(1, 1, 1, crate::voxel::Voxel::new(1, 0))
            .unwrap();
        assert!(handle.read().is_dirty());

        manager.unload_chunk(coord).unwrap();
        assert!(!manager.is_loaded(coord));

        // Give the save worker a moment to drain the queue.
        std::thread::sleep(Duration::from_millis(150));
        let reloaded = manager.load_chunk(coord).unwrap();
        assert_eq!(reloaded.read().get_voxel(1, 1, 1), crate::voxel::Voxel::new(1, 0));
    }

    #[test]
    fn set_chunk_size_rejected_while_chunks_loaded() {
        let manager = ChunkManager::new(MemoryStorage::default(), 16);
        manager.create_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        assert!(manager.set_chunk_size(32).is_err());
    }
}
