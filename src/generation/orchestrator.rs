//! Owns the generator graph (noise sources, biome manager, feature
//! placement, distribution control, named parameter sets) and a background
//! pre-generation worker that drains a priority-ordered task queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::aabb::Aabb;
use crate::biome::BiomeManager;
use crate::chunk::Chunk;
use crate::coord::ChunkCoord;
use crate::distribution::DistributionControl;
use crate::error::Result;
use crate::feature::FeaturePlacement;
use crate::generation::context::GenerationContext;
use crate::generation::parameters::GenerationParameters;
use crate::generation::terrain::generate_terrain;
use crate::noise::NoiseGenerator;
use crate::util::hash_str;

const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A queued pre-generation request: every chunk coordinate in `coords`,
/// generated with `parameter_id`, lower `priority` values served first.
struct GenerationTask {
    id: u64,
    coords: Vec<ChunkCoord>,
    parameter_id: String,
    priority: i32,
    cursor: usize,
    canceled: bool,
}

impl GenerationTask {
    fn is_complete(&self) -> bool {
        self.cursor >= self.coords.len()
    }
}

struct Shared {
    seed: Mutex<u32>,
    noise: Mutex<HashMap<String, NoiseGenerator>>,
    parameters: Mutex<HashMap<String, GenerationParameters>>,
    biomes: Mutex<BiomeManager>,
    features: Mutex<HashMap<String, FeaturePlacement>>,
    distributions: Mutex<HashMap<String, DistributionControl>>,
    tasks: Mutex<Vec<GenerationTask>>,
    next_task_id: Mutex<u64>,
    chunk_size: Mutex<i32>,
    pregenerated: Mutex<HashMap<ChunkCoord, Chunk>>,
}

impl Shared {
    /// Runs the terrain -> biome -> feature pipeline for a single chunk.
    /// Terrain failure aborts immediately; biome/feature failures are
    /// logged and the pipeline continues to the next stage.
    fn generate_chunk(&self, coord: ChunkCoord, parameter_id: &str, chunk: &mut Chunk) -> Result<()> {
        let seed = *self.seed.lock();
        let noise = self.noise.lock();
        let default_noise = noise.get("default").expect("default noise generator always registered");
        let terrain_noise = noise.get("terrain").unwrap_or(default_noise);
        let cave_noise = noise.get("caves").unwrap_or(default_noise);

        let params_guard = self.parameters.lock();
        let params = params_guard.get(parameter_id).unwrap_or_else(|| {
            warn!("unknown parameter set `{parameter_id}`, falling back to `default`");
            params_guard.get("default").expect("default parameter set always registered")
        });

        let features_guard = self.features.lock();
        let feature_placement = features_guard.get(parameter_id).or_else(|| features_guard.get("default"));

        let distributions_guard = self.distributions.lock();
        let distribution = distributions_guard.get(parameter_id).or_else(|| distributions_guard.get("default"));

        let biomes = self.biomes.lock();

        let world_bounds = Aabb::new(
            nalgebra::Point3::new(f32::MIN / 2.0, params.min_height(), f32::MIN / 2.0),
            nalgebra::Point3::new(f32::MAX / 2.0, params.max_height(), f32::MAX / 2.0),
        );

        let ctx = GenerationContext::full(
            coord,
            params,
            default_noise,
            terrain_noise,
            cave_noise,
            feature_placement,
            distribution,
            Some(&*biomes),
            seed,
            world_bounds,
            chunk.size(),
        );

        generate_terrain(coord, &ctx, chunk)?;

        if let Err(err) = biomes.generate_biome_data(coord, &ctx, chunk) {
            error!("biome pass failed for chunk {coord:?}: {err}");
        }

        if let Some(placement) = feature_placement {
            for type_id in placement.type_ids() {
                let placements = placement.find_placements_in_chunk(type_id, 4, &ctx, chunk);
                debug!("chunk {coord:?} placed {} instances of feature {type_id}", placements.len());
            }
        }

        Ok(())
    }
}

/// O(n) scan of the task list for the lowest-priority task with work left,
/// matching the original's plain-vector scan rather than a priority heap.
fn pick_next_task(tasks: &mut [GenerationTask]) -> Option<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.canceled && !t.is_complete())
        .min_by_key(|(_, t)| t.priority)
        .map(|(i, _)| i)
}

fn pregen_worker_loop(shared: Arc<Shared>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let next = {
            let mut tasks = shared.tasks.lock();
            pick_next_task(&mut tasks).map(|i| {
                let coord = tasks[i].coords[tasks[i].cursor];
                let parameter_id = tasks[i].parameter_id.clone();
                tasks[i].cursor += 1;
                (coord, parameter_id)
            })
        };

        let Some((coord, parameter_id)) = next else {
            thread::sleep(WORKER_POLL_INTERVAL);
            continue;
        };

        let size = *shared.chunk_size.lock();
        let mut chunk = Chunk::new(coord);
        if let Err(err) = chunk.initialize(size) {
            error!("pre-generation failed to initialize chunk {coord:?}: {err}");
            continue;
        }
        if let Err(err) = shared.generate_chunk(coord, &parameter_id, &mut chunk) {
            error!("pre-generation failed for chunk {coord:?}: {err}");
            continue;
        }
        shared.pregenerated.lock().insert(coord, chunk);
    }
}

/// Generates and pre-generates chunks against whichever named
/// [`GenerationParameters`] set a caller selects. Holds one biome manager
/// and three noise generators (`default`, `terrain`, `caves`) shared
/// across every chunk it produces, plus a background worker that drains a
/// priority-ordered queue of pre-generation requests into an internal
/// result cache (see [`GenerationOrchestrator::take_pregenerated`]).
pub struct GenerationOrchestrator {
    shared: Arc<Shared>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl GenerationOrchestrator {
    pub fn new(seed: u32) -> Self {
        Self::with_chunk_size(seed, 16)
    }

    pub fn with_chunk_size(seed: u32, chunk_size: i32) -> Self {
        let mut noise = HashMap::new();
        noise.insert("default".to_string(), NoiseGenerator::new(seed));
        let mut terrain_noise = NoiseGenerator::new(seed ^ hash_str("terrain"));
        terrain_noise.preset_terrain(true);
        noise.insert("terrain".to_string(), terrain_noise);
        let mut cave_noise = NoiseGenerator::new(seed ^ hash_str("caves"));
        cave_noise.preset_caves();
        noise.insert("caves".to_string(), cave_noise);

        let mut parameters = HashMap::new();
        parameters.insert("default".to_string(), GenerationParameters::new());

        let mut features = HashMap::new();
        features.insert("default".to_string(), FeaturePlacement::new());

        let mut distributions = HashMap::new();
        distributions.insert("default".to_string(), DistributionControl::new());

        let shared = Arc::new(Shared {
            seed: Mutex::new(seed),
            noise: Mutex::new(noise),
            parameters: Mutex::new(parameters),
            biomes: Mutex::new(BiomeManager::new(seed ^ hash_str("biomes"))),
            features: Mutex::new(features),
            distributions: Mutex::new(distributions),
            tasks: Mutex::new(Vec::new()),
            next_task_id: Mutex::new(0),
            chunk_size: Mutex::new(chunk_size),
            pregenerated: Mutex::new(HashMap::new()),
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_shared = Arc::clone(&shared);
        let worker_shutdown = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("generation-pregen-worker".into())
            .spawn(move || pregen_worker_loop(worker_shared, worker_shutdown))
            .expect("failed to spawn pre-generation worker thread");

        GenerationOrchestrator { shared, shutdown, worker: Some(worker) }
    }

    pub fn set_seed(&self, seed: u32) {
        *self.shared.seed.lock() = seed;
        let mut noise = self.shared.noise.lock();
        for (name, gen) in noise.iter_mut() {
            gen.set_seed(seed ^ hash_str(name));
        }
        self.shared.biomes.lock().set_seed(seed ^ hash_str("biomes"));
    }

    pub fn seed(&self) -> u32 {
        *self.shared.seed.lock()
    }

    pub fn register_parameters(&self, id: impl Into<String>, params: GenerationParameters) {
        self.shared.parameters.lock().insert(id.into(), params);
    }

    pub fn register_feature_placement(&self, id: impl Into<String>, placement: FeaturePlacement) {
        self.shared.features.lock().insert(id.into(), placement);
    }

    pub fn register_distribution_control(&self, id: impl Into<String>, control: DistributionControl) {
        self.shared.distributions.lock().insert(id.into(), control);
    }

    pub fn biomes(&self) -> &Mutex<BiomeManager> {
        &self.shared.biomes
    }

    pub fn generate_chunk(&self, coord: ChunkCoord, parameter_id: &str, chunk: &mut Chunk) -> Result<()> {
        self.shared.generate_chunk(coord, parameter_id, chunk)
    }

    /// Queues a background pre-generation request; returns its task id.
    pub fn queue_pregeneration(&self, coords: Vec<ChunkCoord>, parameter_id: impl Into<String>, priority: i32) -> u64 {
        let mut next_id = self.shared.next_task_id.lock();
        let id = *next_id;
        *next_id += 1;
        self.shared.tasks.lock().push(GenerationTask {
            id,
            coords,
            parameter_id: parameter_id.into(),
            priority,
            cursor: 0,
            canceled: false,
        });
        id
    }

    pub fn cancel_pregeneration(&self, task_id: u64) -> bool {
        let mut tasks = self.shared.tasks.lock();
        match tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.canceled = true;
                true
            }
            None => false,
        }
    }

    pub fn pending_task_count(&self) -> usize {
        self.shared.tasks.lock().iter().filter(|t| !t.canceled && !t.is_complete()).count()
    }

    /// Removes and returns a chunk the background worker finished
    /// pre-generating for `coord`, if any.
    pub fn take_pregenerated(&self, coord: ChunkCoord) -> Option<Chunk> {
        self.shared.pregenerated.lock().remove(&coord)
    }
}

impl Drop for GenerationOrchestrator {
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

    #[test]
    fn generate_chunk_fills_something() {
        let orchestrator = GenerationOrchestrator::new(1);
        let mut chunk = Chunk::new(ChunkCoord::ZERO);
        chunk.initialize(16).unwrap();
        orchestrator.generate_chunk(ChunkCoord::ZERO, "default", &mut chunk).unwrap();
        let any_solid = (0..16).any(|y| chunk.get_voxel(0, y, 0).type_id != 0);
        assert!(any_solid);
    }

    #[test]
    fn set_seed_propagates_to_subordinates() {
        let orchestrator = GenerationOrchestrator::new(1);
        orchestrator.set_seed(99);
        assert_eq!(orchestrator.seed(), 99);
        assert_eq!(orchestrator.shared.noise.lock().get("default").unwrap().seed(), 99 ^ hash_str("default"));
    }

    #[test]
    fn cancel_pregeneration_removes_task_from_pending_count() {
        let orchestrator = GenerationOrchestrator::new(1);
        let id = orchestrator.queue_pregeneration(vec![ChunkCoord::ZERO], "default", 0);
        assert_eq!(orchestrator.pending_task_count(), 1);
        assert!(orchestrator.cancel_pregeneration(id));
        assert_eq!(orchestrator.pending_task_count(), 0);
    }

    #[test]
    fn queued_pregeneration_eventually_populates_cache() {
        let orchestrator = GenerationOrchestrator::new(1);
        orchestrator.queue_pregeneration(vec![ChunkCoord::new(5, 0, 5)], "default", 0);

        let mut found = None;
        for _ in 0..200 {
            if let Some(chunk) = orchestrator.take_pregenerated(ChunkCoord::new(5, 0, 5)) {
                found = Some(chunk);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(found.is_some(), "background worker never produced the requested chunk");
    }
}
